//! Peer protocol and transport
//!
//! Every exchange is one JSON [`Request`] written by the caller followed by
//! one JSON [`Response`] from the node, then the connection is closed.

use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::network::PeerAddress;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Messages a node accepts, from clients and from other nodes alike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    SubmitTransaction { sender: String, data: Value },
    Mine,
    GetChain,
    NewBlock { block: Block },
    RegisterPeers { peers: Vec<String> },
    ListPeers,
    Resolve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    TransactionQueued {
        index: u64,
    },
    Forged {
        block: Block,
        delivered: usize,
        failed: usize,
    },
    Superseded,
    Chain {
        chain: Vec<Block>,
        length: usize,
    },
    BlockAccepted {
        index: u64,
    },
    BlockConflict {
        reason: String,
        replaced: bool,
        length: usize,
    },
    BlockRejected {
        reason: String,
    },
    Peers {
        peers: Vec<String>,
    },
    Resolved {
        replaced: bool,
        chain: Vec<Block>,
    },
    Error {
        message: String,
    },
}

/// A chain as reported by a peer. `length` is the peer's claim and is not
/// trusted to match `chain`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

/// Outbound calls a node makes to its peers.
pub trait PeerTransport: Send + Sync {
    fn fetch_chain(&self, peer: &PeerAddress) -> Result<ChainSnapshot>;

    /// Succeeds only if the peer committed the block.
    fn send_block(&self, peer: &PeerAddress, block: &Block) -> Result<()> {
        let request = Request::NewBlock {
            block: block.clone(),
        };
        match self.request(peer, &request)? {
            Response::BlockAccepted { .. } => Ok(()),
            Response::BlockRejected { reason } | Response::BlockConflict { reason, .. } => Err(
                LedgerError::Network(format!("{peer} refused block {}: {reason}", block.get_index())),
            ),
            other => Err(unexpected(peer, &other)),
        }
    }

    fn send_peers(&self, peer: &PeerAddress, peers: &[PeerAddress]) -> Result<()> {
        let request = Request::RegisterPeers {
            peers: peers.iter().map(ToString::to_string).collect(),
        };
        match self.request(peer, &request)? {
            Response::Peers { .. } => Ok(()),
            other => Err(unexpected(peer, &other)),
        }
    }
}

fn unexpected(peer: &PeerAddress, response: &Response) -> LedgerError {
    match response {
        Response::Error { message } => LedgerError::Network(format!("{peer} replied: {message}")),
        other => LedgerError::Network(format!("Unexpected response from {peer}: {other:?}")),
    }
}
