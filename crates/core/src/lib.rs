//! Shared vocabulary for the note synchronization service.
//!
//! Everything in this crate is pure: entity kinds and their dependency
//! graph, last-write-wins rules, deletion targets, cursor strategies and the
//! tombstone retention policy. Persistence and HTTP live in other crates.

pub mod cursor;
pub mod deletion;
pub mod entity;
pub mod error;
pub mod lww;
pub mod retention;
pub mod types;
