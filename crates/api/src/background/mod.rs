//! Background tasks.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`, stopping when its [`CancellationToken`]
//! fires.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod tombstone_retention;
