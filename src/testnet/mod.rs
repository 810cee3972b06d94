//! Shared fixtures for unit tests
//!
//! Low-difficulty proof of work, pre-mined chains, node settings and an
//! in-process transport that wires nodes together without sockets.

pub mod test_utils;

pub use test_utils::*;
