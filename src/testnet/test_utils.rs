//! Test utilities for ledger testing

use crate::config::Config;
use crate::core::{Block, Chain, ProofOfWork, SealOutcome};
use crate::error::{LedgerError, Result};
use crate::network::{ChainSnapshot, PeerAddress, PeerTransport};
use crate::node::{InboundOutcome, Node};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Difficulty low enough for tests to seal blocks instantly
pub const TEST_DIFFICULTY: &str = "00";

pub fn easy_pow() -> ProofOfWork {
    ProofOfWork::new(TEST_DIFFICULTY).unwrap()
}

/// Genesis followed by `count` sealed blocks, each carrying one distinct transaction
pub fn mine_blocks(pow: &ProofOfWork, count: usize) -> Vec<Block> {
    let mut chain = Chain::new();
    for seq in 0..count {
        chain.append_transaction("miner", json!({ "seq": seq }));
        let candidate = chain.build_candidate(0).unwrap();
        match pow.seal(candidate, || false) {
            SealOutcome::Sealed(block) => chain.commit(block),
            SealOutcome::Superseded => unreachable!("nothing can supersede a test seal"),
        }
    }
    chain.get_blocks().to_vec()
}

/// Node settings on the loopback interface with an easy difficulty and no gossip
pub fn test_config(port: u16) -> Config {
    Config {
        address: format!("127.0.0.1:{port}"),
        node_id: format!("node-{port}"),
        difficulty: TEST_DIFFICULTY.to_string(),
        peers: vec![],
        gossip: false,
        connect_timeout_ms: 1000,
        io_timeout_ms: 1000,
    }
}

/// In-process transport.
///
/// A peer is reachable when it serves a fixed snapshot or is routed to a live
/// [`Node`]; every other peer fails as unreachable.
#[derive(Default)]
pub struct MockTransport {
    snapshots: Mutex<HashMap<PeerAddress, ChainSnapshot>>,
    nodes: Mutex<Vec<(PeerAddress, Weak<Node>)>>,
    fetches: Mutex<Vec<PeerAddress>>,
    sent_blocks: Mutex<Vec<(PeerAddress, Block)>>,
    sent_peers: Mutex<Vec<(PeerAddress, Vec<PeerAddress>)>>,
}

impl MockTransport {
    pub fn new() -> MockTransport {
        MockTransport::default()
    }

    pub fn serve_chain(&self, peer: PeerAddress, chain: Vec<Block>) {
        let length = chain.len();
        self.serve_snapshot(peer, ChainSnapshot { chain, length });
    }

    pub fn serve_snapshot(&self, peer: PeerAddress, snapshot: ChainSnapshot) {
        self.snapshots.lock().unwrap().insert(peer, snapshot);
    }

    /// Deliver calls for `peer` to `node`.
    pub fn route(&self, peer: PeerAddress, node: Arc<Node>) {
        self.nodes.lock().unwrap().push((peer, Arc::downgrade(&node)));
    }

    pub fn fetches(&self) -> Vec<PeerAddress> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn sent_blocks(&self) -> Vec<(PeerAddress, Block)> {
        self.sent_blocks.lock().unwrap().clone()
    }

    pub fn sent_peers(&self) -> Vec<(PeerAddress, Vec<PeerAddress>)> {
        self.sent_peers.lock().unwrap().clone()
    }

    // the lock is released before the node is called, nodes call back in here
    fn routed(&self, peer: &PeerAddress) -> Option<Arc<Node>> {
        self.nodes
            .lock()
            .unwrap()
            .iter()
            .find(|(address, _)| address.same_endpoint(peer))
            .and_then(|(_, node)| node.upgrade())
    }

    fn serves(&self, peer: &PeerAddress) -> bool {
        self.snapshots.lock().unwrap().contains_key(peer)
    }

    fn unreachable(peer: &PeerAddress) -> LedgerError {
        LedgerError::PeerUnreachable {
            peer: peer.to_string(),
            reason: "no such test peer".to_string(),
        }
    }
}

impl PeerTransport for MockTransport {
    fn fetch_chain(&self, peer: &PeerAddress) -> Result<ChainSnapshot> {
        self.fetches.lock().unwrap().push(peer.clone());
        if let Some(node) = self.routed(peer) {
            return node.chain_snapshot();
        }
        self.snapshots
            .lock()
            .unwrap()
            .get(peer)
            .cloned()
            .ok_or_else(|| Self::unreachable(peer))
    }

    fn send_block(&self, peer: &PeerAddress, block: &Block) -> Result<()> {
        if let Some(node) = self.routed(peer) {
            match node.receive_block(block.clone())? {
                InboundOutcome::Accepted { .. } => {}
                other => {
                    return Err(LedgerError::Network(format!(
                        "{peer} refused block {}: {other:?}",
                        block.get_index()
                    )))
                }
            }
        } else if !self.serves(peer) {
            return Err(Self::unreachable(peer));
        }
        self.sent_blocks
            .lock()
            .unwrap()
            .push((peer.clone(), block.clone()));
        Ok(())
    }

    fn send_peers(&self, peer: &PeerAddress, peers: &[PeerAddress]) -> Result<()> {
        if let Some(node) = self.routed(peer) {
            let raw: Vec<String> = peers.iter().map(ToString::to_string).collect();
            node.register_peers(&raw)?;
        } else if !self.serves(peer) {
            return Err(Self::unreachable(peer));
        }
        self.sent_peers
            .lock()
            .unwrap()
            .push((peer.clone(), peers.to_vec()));
        Ok(())
    }
}
