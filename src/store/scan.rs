//! Range scans over the governors table.
//!
//! Every scan is bounded to one prefix region so it never reads rows of
//! another entity kind.

use crate::encoding::key::prefix_end;
use crate::Result;
use redb::ReadableTable;
use std::ops::Bound;

/// Raw key and value of one row.
pub type Row = (Vec<u8>, Vec<u8>);

/// Scan direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Collects rows in `[start, end)`, or `[start, ..)` when `end` is `None`.
///
/// Stops after `limit` rows when one is given.
pub fn scan_range<T>(
    table: &T,
    start: &[u8],
    end: Option<&[u8]>,
    order: Order,
    limit: Option<usize>,
) -> Result<Vec<Row>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let upper = match end {
        Some(end) => Bound::Excluded(end),
        None => Bound::Unbounded,
    };
    let range = table.range::<&[u8]>((Bound::Included(start), upper))?;
    let limit = limit.unwrap_or(usize::MAX);

    let mut rows = Vec::new();
    match order {
        Order::Ascending => {
            for entry in range.take(limit) {
                let (key, value) = entry?;
                rows.push((key.value().to_vec(), value.value().to_vec()));
            }
        }
        Order::Descending => {
            for entry in range.rev().take(limit) {
                let (key, value) = entry?;
                rows.push((key.value().to_vec(), value.value().to_vec()));
            }
        }
    }

    Ok(rows)
}

/// Collects every row whose key starts with `prefix`.
pub fn scan_prefix<T>(
    table: &T,
    prefix: &[u8],
    order: Order,
    limit: Option<usize>,
) -> Result<Vec<Row>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let end = prefix_end(prefix);
    scan_range(table, prefix, end.as_deref(), order, limit)
}
