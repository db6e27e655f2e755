//! Prefix layout guard.
//!
//! The first write transaction records the prefix table in a metadata table.
//! Opening the store with a build whose table differs is refused: rows
//! written under the old bytes would become unreachable.

use crate::error::{Error, Result};
use crate::prefix::{Prefix, STORE_KEY};
use redb::{ReadTransaction, ReadableTable, TableDefinition, TableError, WriteTransaction};
use tracing::{info, warn};

/// Metadata table, kept apart from the governors key space.
pub const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("rdkgovernors_meta");

/// Metadata key holding the recorded prefix layout.
pub const PREFIX_LAYOUT_KEY: &str = "prefix_layout";

/// Records the prefix layout on first use and verifies it afterwards.
pub fn ensure_prefix_layout(txn: &WriteTransaction) -> Result<()> {
    check_layout(txn, &Prefix::layout_fingerprint())
}

/// Verifies the recorded prefix layout inside a read transaction.
///
/// Call it once per read transaction before reading the governors table;
/// [`super::open_governors_read_table`] does. A store that has never been
/// written carries no layout and passes.
pub fn verify_prefix_layout(txn: &ReadTransaction) -> Result<()> {
    verify_layout(txn, &Prefix::layout_fingerprint())
}

fn check_layout(txn: &WriteTransaction, current: &[u8]) -> Result<()> {
    let mut meta = txn.open_table(META_TABLE)?;
    let stored = meta.get(PREFIX_LAYOUT_KEY)?.map(|guard| guard.value().to_vec());

    match stored {
        None => {
            meta.insert(PREFIX_LAYOUT_KEY, current)?;
            info!(store = STORE_KEY, prefixes = current.len(), "recorded prefix layout");
            Ok(())
        }
        Some(stored) => compare_layout(stored, current),
    }
}

fn verify_layout(txn: &ReadTransaction, current: &[u8]) -> Result<()> {
    let meta = match txn.open_table(META_TABLE) {
        Ok(meta) => meta,
        Err(TableError::TableDoesNotExist(_)) => return Ok(()),
        Err(err) => return Err(err.into()),
    };
    let stored = meta.get(PREFIX_LAYOUT_KEY)?.map(|guard| guard.value().to_vec());

    match stored {
        None => Ok(()),
        Some(stored) => compare_layout(stored, current),
    }
}

fn compare_layout(stored: Vec<u8>, current: &[u8]) -> Result<()> {
    if stored == current {
        return Ok(());
    }

    // bytes the store still uses that no kind resolves to anymore
    let orphaned: Vec<u8> = stored
        .iter()
        .copied()
        .filter(|byte| Prefix::from_byte(*byte).is_none())
        .collect();

    warn!(
        store = STORE_KEY,
        stored = %hex::encode_upper(&stored),
        current = %hex::encode_upper(current),
        orphaned = %hex::encode_upper(&orphaned),
        "prefix layout changed on an existing store"
    );
    Err(Error::PrefixLayoutChanged {
        stored,
        current: current.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::{Database, ReadableDatabase};
    use tempfile::NamedTempFile;

    #[test]
    fn test_layout_recorded_then_accepted() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;

        for _ in 0..2 {
            let txn = db.begin_write()?;
            ensure_prefix_layout(&txn)?;
            txn.commit()?;
        }

        Ok(())
    }

    #[test]
    fn test_reassigned_prefix_is_refused() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;

        let txn = db.begin_write()?;
        ensure_prefix_layout(&txn)?;
        txn.commit()?;

        let mut moved = Prefix::layout_fingerprint();
        moved[2] = 0x24;

        let txn = db.begin_write()?;
        match check_layout(&txn, &moved) {
            Err(Error::PrefixLayoutChanged { stored, current }) => {
                assert_eq!(stored, Prefix::layout_fingerprint());
                assert_eq!(current, moved);
            }
            other => panic!("expected layout mismatch, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_unwritten_store_passes_read_check() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;

        let txn = db.begin_read()?;
        verify_prefix_layout(&txn)?;

        Ok(())
    }

    #[test]
    fn test_read_check_refuses_changed_layout() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;

        let txn = db.begin_write()?;
        ensure_prefix_layout(&txn)?;
        txn.commit()?;

        let txn = db.begin_read()?;
        verify_prefix_layout(&txn)?;
        drop(txn);

        // a layout written by a build that still used 0x24
        let mut older = Prefix::layout_fingerprint();
        older[4] = 0x24;
        let txn = db.begin_write()?;
        {
            let mut meta = txn.open_table(META_TABLE)?;
            meta.insert(PREFIX_LAYOUT_KEY, older.as_slice())?;
        }
        txn.commit()?;

        let txn = db.begin_read()?;
        match verify_prefix_layout(&txn) {
            Err(Error::PrefixLayoutChanged { stored, current }) => {
                assert_eq!(stored, older);
                assert_eq!(current, Prefix::layout_fingerprint());
            }
            other => panic!("expected layout mismatch, got {:?}", other),
        }

        Ok(())
    }
}
