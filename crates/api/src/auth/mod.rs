//! Authentication primitives.
//!
//! - [`jwt`] -- access-token validation (and signing, for tooling and tests).

pub mod jwt;
