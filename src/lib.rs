//! # peer-ledger
//!
//! A small peer-to-peer proof-of-work ledger node. Each node keeps an
//! append-only chain of blocks in memory, seals pending transactions with a
//! hash-prefix proof of work, and converges with its peers by adopting the
//! longest valid chain it can find.
//!
//! ## Layout
//! - `core/`: blocks, the canonical hasher, proof of work, the chain
//! - `network/`: peer registry, protocol and transport, consensus, broadcast, server
//! - `node/`: the aggregate every request goes through
//! - `config/`: layered node settings
//! - `cli/`: command-line parsing for the node and its client
//! - `utils/`: hashing and time helpers

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod node;
pub mod utils;

#[cfg(test)]
pub mod testnet;

pub use cli::{Command, Opt};
pub use config::Config;
pub use core::{Block, Chain, ProofOfWork, SealOutcome, Transaction};
pub use error::{BlockRejection, LedgerError, Result};
pub use network::{
    BroadcastReport, Broadcaster, ChainSnapshot, ConsensusResolver, PeerAddress, PeerRegistry,
    PeerTransport, Request, Resolution, Response, Server, TcpTransport,
};
pub use node::{InboundOutcome, MineOutcome, Node, Registration};
pub use utils::{current_timestamp, sha256_digest};
