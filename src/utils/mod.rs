//! Utility functions and helpers
//!
//! SHA-256 hashing and wall-clock helpers shared by the ledger engine.

pub mod crypto;

pub use crypto::{current_timestamp, sha256_digest, sha256_digest_parts};
