//! The note synchronization algorithm.
//!
//! A sync call runs inside one [`store::SyncSession`]: incoming records are
//! applied in dependency order under last-write-wins ([`applier`]), explicit
//! deletion directives are resolved ([`tombstone`]), the change feed since
//! the client's cursor is built ([`feed`]) and the new cursor is persisted.
//! [`orchestrator::SyncService`] drives the whole sequence.

pub mod applier;
pub mod error;
pub mod feed;
pub mod memory;
pub mod orchestrator;
pub mod payload;
pub mod pg;
pub mod store;
pub mod tombstone;

pub use error::{StoreError, SyncError};
pub use orchestrator::{SyncConfig, SyncOutcome, SyncReport, SyncService};
pub use payload::{SyncRequest, SyncResponse};
