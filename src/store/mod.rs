//! Governors store facade over a redb byte table.
//!
//! Every entity lives in one `&[u8] -> &[u8]` table named after the store
//! key; the prefix byte of each key selects its region. Records under primary
//! keys are opaque bytes, secondary index rows are empty, and powers are
//! stored as big-endian `u64`.
//!
//! The traits only compute keys and move bytes. Keeping indexes in step with
//! the records they point at is the caller's job, with one convenience:
//! [`GovernorsTable::update_governor_power`] swaps a governor's power-rank row.

pub mod meta;
pub mod scan;

use crate::config::GovernorsConfig;
use crate::encoding::key::inclusive_end;
use crate::error::{Error, KeyError, Result};
use crate::keys::{self, DelegationAddrs};
use crate::prefix::{Prefix, STORE_KEY};
use crate::types::Governor;
use chrono::{DateTime, Utc};
use redb::{ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use tracing::debug;

pub use meta::{ensure_prefix_layout, verify_prefix_layout, META_TABLE};
pub use scan::{scan_prefix, scan_range, Order, Row};

/// The table holding the whole governors key space.
pub const GOVERNORS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new(STORE_KEY);

/// Matured queue entry: maturity time and stored value.
pub type QueueEntry = (DateTime<Utc>, Vec<u8>);

/// Matured governor queue entry: maturity time, height and stored value.
pub type GovernorQueueEntry = (DateTime<Utc>, u64, Vec<u8>);

/// Verifies the prefix layout and opens the governors table.
pub fn open_governors_table(
    txn: &WriteTransaction,
) -> Result<redb::Table<'_, &'static [u8], &'static [u8]>> {
    ensure_prefix_layout(txn)?;
    Ok(txn.open_table(GOVERNORS_TABLE)?)
}

/// Verifies the prefix layout and opens the governors table for reading.
pub fn open_governors_read_table(
    txn: &ReadTransaction,
) -> Result<redb::ReadOnlyTable<&'static [u8], &'static [u8]>> {
    verify_prefix_layout(txn)?;
    Ok(txn.open_table(GOVERNORS_TABLE)?)
}

const EMPTY: &[u8] = &[];

fn decode_power(value: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = value.try_into().map_err(|_| KeyError::LengthMismatch {
        declared: 8,
        remaining: value.len(),
    })?;
    Ok(u64::from_be_bytes(bytes))
}

/// Read operations over the governors table.
pub trait GovernorsReadOnlyTable {
    /// Record of the governor with `operator`.
    fn governor(&self, operator: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Operator addresses ordered by descending power, at most `limit` of them.
    fn governors_by_power(&self, limit: Option<usize>) -> Result<Vec<Vec<u8>>>;

    /// Operator stored under the consensus address `cons_addr`.
    fn governor_by_cons_addr(&self, cons_addr: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Bonded power of `operator` as of the last block.
    fn last_governor_power(&self, operator: &[u8]) -> Result<Option<u64>>;

    /// Every bonded operator with its last power, in key order.
    fn last_governor_powers(&self) -> Result<Vec<(Vec<u8>, u64)>>;

    fn last_total_power(&self) -> Result<Option<u64>>;

    fn delegation(&self, delegator: &[u8], governor: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Governor addresses and records of every delegation from `delegator`.
    fn delegations_of(&self, delegator: &[u8]) -> Result<Vec<Row>>;

    fn unbonding_delegation(&self, delegator: &[u8], governor: &[u8])
        -> Result<Option<Vec<u8>>>;

    /// Delegator addresses and records of unbonding delegations out of `governor`.
    fn unbonding_delegations_from(&self, governor: &[u8]) -> Result<Vec<Row>>;

    fn redelegation(&self, delegator: &[u8], src: &[u8], dst: &[u8])
        -> Result<Option<Vec<u8>>>;

    /// Primary keys and records of redelegations leaving `src`.
    fn redelegations_from(&self, src: &[u8]) -> Result<Vec<Row>>;

    /// Primary keys and records of redelegations arriving at `dst`.
    fn redelegations_to(&self, dst: &[u8]) -> Result<Vec<Row>>;

    /// Primary keys and records of redelegations by `delegator` arriving at `dst`.
    fn redelegations_by_delegator_to(&self, delegator: &[u8], dst: &[u8]) -> Result<Vec<Row>>;

    /// Unbonding queue entries maturing at or before `now`.
    fn matured_unbonding_queue(&self, now: &DateTime<Utc>) -> Result<Vec<QueueEntry>>;

    /// Redelegation queue entries maturing at or before `now`.
    fn matured_redelegation_queue(&self, now: &DateTime<Utc>) -> Result<Vec<QueueEntry>>;

    /// Governor queue entries with time at or before `now` and height at or
    /// below `height`.
    fn matured_governor_queue(
        &self,
        now: &DateTime<Utc>,
        height: u64,
    ) -> Result<Vec<GovernorQueueEntry>>;

    fn historical_info(&self, height: u64) -> Result<Option<Vec<u8>>>;
}

fn get_bytes<T>(table: &T, key: &[u8]) -> Result<Option<Vec<u8>>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
}

/// Follows index rows back to their primary rows.
fn resolve_index<T, F>(table: &T, index_prefix: &[u8], to_primary: F) -> Result<Vec<Row>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
    F: Fn(&[u8]) -> keys::Result<Vec<u8>>,
{
    let mut rows = Vec::new();
    for (index_key, _) in scan_prefix(table, index_prefix, Order::Ascending, None)? {
        let primary = to_primary(&index_key)?;
        match get_bytes(table, &primary)? {
            Some(value) => rows.push((primary, value)),
            None => return Err(Error::DanglingIndex { index_key }),
        }
    }
    Ok(rows)
}

fn matured_time_queue<T>(table: &T, prefix: Prefix, now: &DateTime<Utc>) -> Result<Vec<QueueEntry>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let end = inclusive_end(&keys::time_key(prefix, now)?);
    let rows = scan_range(table, &prefix.as_key(), Some(end.as_slice()), Order::Ascending, None)?;

    let mut entries = Vec::with_capacity(rows.len());
    for (key, value) in rows {
        entries.push((keys::parse_time_key(prefix, &key)?, value));
    }
    Ok(entries)
}

impl<T> GovernorsReadOnlyTable for T
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    fn governor(&self, operator: &[u8]) -> Result<Option<Vec<u8>>> {
        get_bytes(self, &keys::governor_key(operator)?)
    }

    fn governors_by_power(&self, limit: Option<usize>) -> Result<Vec<Vec<u8>>> {
        let rows = scan_prefix(
            self,
            &Prefix::GovernorsByPower.as_key(),
            Order::Descending,
            limit,
        )?;

        let mut operators = Vec::with_capacity(rows.len());
        for (key, _) in &rows {
            operators.push(keys::parse_governor_power_rank_key(key)?);
        }
        Ok(operators)
    }

    fn governor_by_cons_addr(&self, cons_addr: &[u8]) -> Result<Option<Vec<u8>>> {
        get_bytes(self, &keys::governor_by_cons_addr_key(cons_addr)?)
    }

    fn last_governor_power(&self, operator: &[u8]) -> Result<Option<u64>> {
        let key = keys::last_governor_power_key(operator)?;
        get_bytes(self, &key)?
            .map(|value| decode_power(&value))
            .transpose()
    }

    fn last_governor_powers(&self) -> Result<Vec<(Vec<u8>, u64)>> {
        let rows = scan_prefix(
            self,
            &Prefix::LastGovernorPower.as_key(),
            Order::Ascending,
            None,
        )?;

        let mut powers = Vec::with_capacity(rows.len());
        for (key, value) in &rows {
            let operator = keys::address_from_last_governor_power_key(key)?;
            powers.push((operator.to_vec(), decode_power(value)?));
        }
        Ok(powers)
    }

    fn last_total_power(&self) -> Result<Option<u64>> {
        let key = keys::last_total_power_key();
        get_bytes(self, &key)?
            .map(|value| decode_power(&value))
            .transpose()
    }

    fn delegation(&self, delegator: &[u8], governor: &[u8]) -> Result<Option<Vec<u8>>> {
        get_bytes(self, &keys::delegation_key(delegator, governor)?)
    }

    fn delegations_of(&self, delegator: &[u8]) -> Result<Vec<Row>> {
        let prefix = keys::delegations_key(delegator)?;
        let rows = scan_prefix(self, &prefix, Order::Ascending, None)?;

        let mut delegations = Vec::with_capacity(rows.len());
        for (key, value) in rows {
            let DelegationAddrs { governor, .. } = keys::parse_delegation_key(&key)?;
            delegations.push((governor.to_vec(), value));
        }
        Ok(delegations)
    }

    fn unbonding_delegation(
        &self,
        delegator: &[u8],
        governor: &[u8],
    ) -> Result<Option<Vec<u8>>> {
        get_bytes(self, &keys::ubd_key(delegator, governor)?)
    }

    fn unbonding_delegations_from(&self, governor: &[u8]) -> Result<Vec<Row>> {
        let prefix = keys::ubds_by_governor_index_key(governor)?;
        let rows = resolve_index(self, &prefix, keys::ubd_key_from_governor_index_key)?;

        let mut unbondings = Vec::with_capacity(rows.len());
        for (key, value) in rows {
            let DelegationAddrs { delegator, .. } = keys::parse_ubd_key(&key)?;
            unbondings.push((delegator.to_vec(), value));
        }
        Ok(unbondings)
    }

    fn redelegation(&self, delegator: &[u8], src: &[u8], dst: &[u8]) -> Result<Option<Vec<u8>>> {
        get_bytes(self, &keys::red_key(delegator, src, dst)?)
    }

    fn redelegations_from(&self, src: &[u8]) -> Result<Vec<Row>> {
        let prefix = keys::reds_from_governor_src_index_key(src)?;
        resolve_index(self, &prefix, keys::red_key_from_governor_src_index_key)
    }

    fn redelegations_to(&self, dst: &[u8]) -> Result<Vec<Row>> {
        let prefix = keys::reds_to_governor_dst_index_key(dst)?;
        resolve_index(self, &prefix, keys::red_key_from_governor_dst_index_key)
    }

    fn redelegations_by_delegator_to(&self, delegator: &[u8], dst: &[u8]) -> Result<Vec<Row>> {
        let prefix = keys::reds_by_delegator_to_governor_dst_index_key(delegator, dst)?;
        resolve_index(self, &prefix, keys::red_key_from_governor_dst_index_key)
    }

    fn matured_unbonding_queue(&self, now: &DateTime<Utc>) -> Result<Vec<QueueEntry>> {
        matured_time_queue(self, Prefix::UnbondingQueue, now)
    }

    fn matured_redelegation_queue(&self, now: &DateTime<Utc>) -> Result<Vec<QueueEntry>> {
        matured_time_queue(self, Prefix::RedelegationQueue, now)
    }

    fn matured_governor_queue(
        &self,
        now: &DateTime<Utc>,
        height: u64,
    ) -> Result<Vec<GovernorQueueEntry>> {
        let end = inclusive_end(&keys::governor_queue_key(now, height)?);
        let rows = scan_range(
            self,
            &Prefix::GovernorQueue.as_key(),
            Some(end.as_slice()),
            Order::Ascending,
            None,
        )?;

        // the range also holds earlier times queued at later heights
        let mut matured = Vec::new();
        for (key, value) in rows {
            let (time, key_height) = keys::parse_governor_queue_key(&key)?;
            if time <= *now && key_height <= height {
                matured.push((time, key_height, value));
            }
        }
        Ok(matured)
    }

    fn historical_info(&self, height: u64) -> Result<Option<Vec<u8>>> {
        get_bytes(self, &keys::historical_info_key(height))
    }
}

/// Write operations over the governors table.
pub trait GovernorsTable: GovernorsReadOnlyTable {
    fn set_governor(&mut self, operator: &[u8], record: &[u8]) -> Result<()>;

    fn remove_governor(&mut self, operator: &[u8]) -> Result<()>;

    /// Writes the power-rank row of `governor`.
    fn set_governor_by_power_index(
        &mut self,
        governor: &Governor,
        config: &GovernorsConfig,
    ) -> Result<()>;

    /// Removes the power-rank row `governor` had when it was written.
    fn delete_governor_by_power_index(
        &mut self,
        governor: &Governor,
        config: &GovernorsConfig,
    ) -> Result<()>;

    /// Replaces the power-rank row of `old` with the one of `new`.
    ///
    /// Both keys are resolved before the table is touched, so a failure
    /// leaves the old row in place.
    fn update_governor_power(
        &mut self,
        old: &Governor,
        new: &Governor,
        config: &GovernorsConfig,
    ) -> Result<()>;

    fn set_governor_by_cons_addr(&mut self, cons_addr: &[u8], operator: &[u8]) -> Result<()>;

    fn set_last_governor_power(&mut self, operator: &[u8], power: u64) -> Result<()>;

    fn delete_last_governor_power(&mut self, operator: &[u8]) -> Result<()>;

    fn set_last_total_power(&mut self, power: u64) -> Result<()>;

    fn set_delegation(&mut self, delegator: &[u8], governor: &[u8], record: &[u8])
        -> Result<()>;

    fn remove_delegation(&mut self, delegator: &[u8], governor: &[u8]) -> Result<()>;

    /// Writes the record and its governor index row.
    fn set_unbonding_delegation(
        &mut self,
        delegator: &[u8],
        governor: &[u8],
        record: &[u8],
    ) -> Result<()>;

    /// Removes the record and its governor index row.
    fn remove_unbonding_delegation(&mut self, delegator: &[u8], governor: &[u8]) -> Result<()>;

    /// Writes the record and both governor index rows.
    fn set_redelegation(
        &mut self,
        delegator: &[u8],
        src: &[u8],
        dst: &[u8],
        record: &[u8],
    ) -> Result<()>;

    /// Removes the record and both governor index rows.
    fn remove_redelegation(&mut self, delegator: &[u8], src: &[u8], dst: &[u8]) -> Result<()>;

    fn set_unbonding_queue_entry(&mut self, matures_at: &DateTime<Utc>, value: &[u8])
        -> Result<()>;

    fn set_redelegation_queue_entry(
        &mut self,
        matures_at: &DateTime<Utc>,
        value: &[u8],
    ) -> Result<()>;

    fn set_governor_queue_entry(
        &mut self,
        matures_at: &DateTime<Utc>,
        height: u64,
        value: &[u8],
    ) -> Result<()>;

    /// Removes and returns the unbonding queue entries matured at `now`.
    fn dequeue_matured_unbonding_queue(&mut self, now: &DateTime<Utc>)
        -> Result<Vec<QueueEntry>>;

    /// Removes and returns the redelegation queue entries matured at `now`.
    fn dequeue_matured_redelegation_queue(
        &mut self,
        now: &DateTime<Utc>,
    ) -> Result<Vec<QueueEntry>>;

    /// Removes and returns the governor queue entries matured at `now` and `height`.
    fn dequeue_matured_governor_queue(
        &mut self,
        now: &DateTime<Utc>,
        height: u64,
    ) -> Result<Vec<GovernorQueueEntry>>;

    fn set_historical_info(&mut self, height: u64, record: &[u8]) -> Result<()>;

    fn delete_historical_info(&mut self, height: u64) -> Result<()>;
}

impl<'txn> GovernorsTable for redb::Table<'txn, &'static [u8], &'static [u8]> {
    fn set_governor(&mut self, operator: &[u8], record: &[u8]) -> Result<()> {
        self.insert(keys::governor_key(operator)?.as_slice(), record)?;
        Ok(())
    }

    fn remove_governor(&mut self, operator: &[u8]) -> Result<()> {
        self.remove(keys::governor_key(operator)?.as_slice())?;
        Ok(())
    }

    fn set_governor_by_power_index(
        &mut self,
        governor: &Governor,
        config: &GovernorsConfig,
    ) -> Result<()> {
        let key = keys::governors_by_power_index_key(governor, config)?;
        debug!(
            operator = %governor.operator_address,
            power = governor.consensus_power(config),
            "set power index"
        );
        self.insert(key.as_slice(), EMPTY)?;
        Ok(())
    }

    fn delete_governor_by_power_index(
        &mut self,
        governor: &Governor,
        config: &GovernorsConfig,
    ) -> Result<()> {
        let key = keys::governors_by_power_index_key(governor, config)?;
        debug!(
            operator = %governor.operator_address,
            power = governor.consensus_power(config),
            "delete power index"
        );
        self.remove(key.as_slice())?;
        Ok(())
    }

    fn update_governor_power(
        &mut self,
        old: &Governor,
        new: &Governor,
        config: &GovernorsConfig,
    ) -> Result<()> {
        let stale = keys::governors_by_power_index_key(old, config)?;
        let fresh = keys::governors_by_power_index_key(new, config)?;
        debug!(
            operator = %new.operator_address,
            old_power = old.consensus_power(config),
            new_power = new.consensus_power(config),
            "update power index"
        );
        self.remove(stale.as_slice())?;
        self.insert(fresh.as_slice(), EMPTY)?;
        Ok(())
    }

    fn set_governor_by_cons_addr(&mut self, cons_addr: &[u8], operator: &[u8]) -> Result<()> {
        self.insert(keys::governor_by_cons_addr_key(cons_addr)?.as_slice(), operator)?;
        Ok(())
    }

    fn set_last_governor_power(&mut self, operator: &[u8], power: u64) -> Result<()> {
        let key = keys::last_governor_power_key(operator)?;
        self.insert(key.as_slice(), &power.to_be_bytes()[..])?;
        Ok(())
    }

    fn delete_last_governor_power(&mut self, operator: &[u8]) -> Result<()> {
        self.remove(keys::last_governor_power_key(operator)?.as_slice())?;
        Ok(())
    }

    fn set_last_total_power(&mut self, power: u64) -> Result<()> {
        self.insert(
            keys::last_total_power_key().as_slice(),
            &power.to_be_bytes()[..],
        )?;
        Ok(())
    }

    fn set_delegation(&mut self, delegator: &[u8], governor: &[u8], record: &[u8]) -> Result<()> {
        self.insert(keys::delegation_key(delegator, governor)?.as_slice(), record)?;
        Ok(())
    }

    fn remove_delegation(&mut self, delegator: &[u8], governor: &[u8]) -> Result<()> {
        self.remove(keys::delegation_key(delegator, governor)?.as_slice())?;
        Ok(())
    }

    fn set_unbonding_delegation(
        &mut self,
        delegator: &[u8],
        governor: &[u8],
        record: &[u8],
    ) -> Result<()> {
        let key = keys::ubd_key(delegator, governor)?;
        let index = keys::ubd_by_governor_index_key(delegator, governor)?;
        self.insert(key.as_slice(), record)?;
        self.insert(index.as_slice(), EMPTY)?;
        Ok(())
    }

    fn remove_unbonding_delegation(&mut self, delegator: &[u8], governor: &[u8]) -> Result<()> {
        let key = keys::ubd_key(delegator, governor)?;
        let index = keys::ubd_by_governor_index_key(delegator, governor)?;
        self.remove(key.as_slice())?;
        self.remove(index.as_slice())?;
        Ok(())
    }

    fn set_redelegation(
        &mut self,
        delegator: &[u8],
        src: &[u8],
        dst: &[u8],
        record: &[u8],
    ) -> Result<()> {
        let key = keys::red_key(delegator, src, dst)?;
        let by_src = keys::red_by_governor_src_index_key(delegator, src, dst)?;
        let by_dst = keys::red_by_governor_dst_index_key(delegator, src, dst)?;
        self.insert(key.as_slice(), record)?;
        self.insert(by_src.as_slice(), EMPTY)?;
        self.insert(by_dst.as_slice(), EMPTY)?;
        Ok(())
    }

    fn remove_redelegation(&mut self, delegator: &[u8], src: &[u8], dst: &[u8]) -> Result<()> {
        let key = keys::red_key(delegator, src, dst)?;
        let by_src = keys::red_by_governor_src_index_key(delegator, src, dst)?;
        let by_dst = keys::red_by_governor_dst_index_key(delegator, src, dst)?;
        self.remove(key.as_slice())?;
        self.remove(by_src.as_slice())?;
        self.remove(by_dst.as_slice())?;
        Ok(())
    }

    fn set_unbonding_queue_entry(&mut self, matures_at: &DateTime<Utc>, value: &[u8]) -> Result<()> {
        self.insert(keys::unbonding_delegation_time_key(matures_at)?.as_slice(), value)?;
        Ok(())
    }

    fn set_redelegation_queue_entry(
        &mut self,
        matures_at: &DateTime<Utc>,
        value: &[u8],
    ) -> Result<()> {
        self.insert(keys::redelegation_time_key(matures_at)?.as_slice(), value)?;
        Ok(())
    }

    fn set_governor_queue_entry(
        &mut self,
        matures_at: &DateTime<Utc>,
        height: u64,
        value: &[u8],
    ) -> Result<()> {
        self.insert(keys::governor_queue_key(matures_at, height)?.as_slice(), value)?;
        Ok(())
    }

    fn dequeue_matured_unbonding_queue(&mut self, now: &DateTime<Utc>) -> Result<Vec<QueueEntry>> {
        let matured = self.matured_unbonding_queue(now)?;
        for (time, _) in &matured {
            self.remove(keys::unbonding_delegation_time_key(time)?.as_slice())?;
        }
        debug!(count = matured.len(), %now, "dequeued matured unbonding entries");
        Ok(matured)
    }

    fn dequeue_matured_redelegation_queue(
        &mut self,
        now: &DateTime<Utc>,
    ) -> Result<Vec<QueueEntry>> {
        let matured = self.matured_redelegation_queue(now)?;
        for (time, _) in &matured {
            self.remove(keys::redelegation_time_key(time)?.as_slice())?;
        }
        debug!(count = matured.len(), %now, "dequeued matured redelegation entries");
        Ok(matured)
    }

    fn dequeue_matured_governor_queue(
        &mut self,
        now: &DateTime<Utc>,
        height: u64,
    ) -> Result<Vec<GovernorQueueEntry>> {
        let matured = self.matured_governor_queue(now, height)?;
        for (time, key_height, _) in &matured {
            self.remove(keys::governor_queue_key(time, *key_height)?.as_slice())?;
        }
        debug!(count = matured.len(), %now, height, "dequeued matured governor entries");
        Ok(matured)
    }

    fn set_historical_info(&mut self, height: u64, record: &[u8]) -> Result<()> {
        self.insert(keys::historical_info_key(height).as_slice(), record)?;
        Ok(())
    }

    fn delete_historical_info(&mut self, height: u64) -> Result<()> {
        self.remove(keys::historical_info_key(height).as_slice())?;
        Ok(())
    }
}
