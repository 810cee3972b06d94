//! Core ledger functionality
//!
//! Blocks and transactions, the canonical hasher, proof-of-work sealing and
//! the in-memory chain with its pending pool.

pub mod block;
pub mod chain;
pub mod hasher;
pub mod proof_of_work;

pub use block::{Block, Transaction, GENESIS_PREVIOUS_HASH, GENESIS_PROOF, GENESIS_TIMESTAMP};
pub use chain::Chain;
pub use hasher::{canonical_json, digest, HashTemplate};
pub use proof_of_work::{ProofOfWork, SealOutcome, DEFAULT_DIFFICULTY};
