//! Key-space encoding for a delegated-proof-of-stake governors registry.
//!
//! Governors, delegations, unbonding delegations, redelegations and their
//! maturity queues are addressed in one ordered byte key space. Each key is a
//! reserved prefix byte followed by self-delimiting fields, so prefix scans
//! stay inside one entity kind and every secondary index key can be
//! rearranged back into its primary key.
//!
//! [`keys`] holds the pure builders and parsers. [`store`] applies them to a
//! redb table for callers that keep their state there.

pub mod address;
pub mod config;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod prefix;
pub mod store;
pub mod types;

// Re-export common types for convenience
pub use config::GovernorsConfig;
pub use error::{Error, KeyError, Result};
pub use prefix::{Prefix, MODULE_NAME, QUERIER_ROUTE, ROUTER_KEY, STORE_KEY};
pub use store::{
    open_governors_read_table, open_governors_table, GovernorsReadOnlyTable, GovernorsTable,
    GOVERNORS_TABLE,
};
pub use types::Governor;
