//! The ledger node aggregate
//!
//! A [`Node`] owns one chain, one peer registry and the identity it mines
//! under. It is built once at startup and shared (behind an `Arc`) by every
//! request handler; all engine operations go through it.
//!
//! Locking rules:
//! - chain mutations take the chain write lock and never overlap;
//! - proof-of-work runs without any lock and only locks again to commit;
//! - peer I/O (resolve, announce, gossip) happens with no lock held.

use crate::config::Config;
use crate::core::{Block, Chain, ProofOfWork, SealOutcome, Transaction};
use crate::error::{BlockRejection, LedgerError, Result};
use crate::network::{
    BroadcastReport, Broadcaster, ChainSnapshot, ConsensusResolver, PeerAddress, PeerRegistry,
    PeerTransport, Resolution,
};
use log::{info, warn};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const MINING_REWARD: u64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum MineOutcome {
    Forged {
        block: Block,
        report: BroadcastReport,
    },
    /// Another block reached the tip first; mine again on top of it.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundOutcome {
    Accepted { index: u64 },
    /// The block did not link to our tip; a resolve round was run.
    Conflict {
        reason: BlockRejection,
        resolution: Resolution,
    },
    Rejected { reason: BlockRejection },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub added: Vec<PeerAddress>,
    pub peers: Vec<PeerAddress>,
    pub gossip: Option<BroadcastReport>,
}

pub struct Node {
    identifier: String,
    pow: ProofOfWork,
    chain: RwLock<Chain>,
    peers: PeerRegistry,
    transport: Arc<dyn PeerTransport>,
    // bumped under the chain write lock whenever the tip changes
    tip_version: AtomicU64,
    gossip: bool,
}

impl Node {
    pub fn new(config: &Config, transport: Arc<dyn PeerTransport>) -> Result<Node> {
        config.validate()?;
        Ok(Node {
            identifier: config.node_id.clone(),
            pow: config.proof_of_work()?,
            chain: RwLock::new(Chain::new()),
            peers: PeerRegistry::new(config.self_address()?),
            transport,
            tip_version: AtomicU64::new(0),
            gossip: config.gossip,
        })
    }

    pub fn get_identifier(&self) -> &str {
        self.identifier.as_str()
    }

    pub fn get_self_address(&self) -> &PeerAddress {
        self.peers.get_self_address()
    }

    pub fn proof_of_work(&self) -> &ProofOfWork {
        &self.pow
    }

    /// Queue a client transaction; returns the index it should land in.
    pub fn submit_transaction(&self, sender: &str, data: Value) -> Result<u64> {
        let index = self.chain_write()?.append_transaction(sender, data);
        info!("Queued transaction from {sender} for block {index}");
        Ok(index)
    }

    pub fn pending_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.chain_read()?.get_pending().to_vec())
    }

    pub fn chain_snapshot(&self) -> Result<ChainSnapshot> {
        let chain = self.chain_read()?;
        Ok(ChainSnapshot {
            chain: chain.get_blocks().to_vec(),
            length: chain.len(),
        })
    }

    pub fn chain_length(&self) -> Result<usize> {
        Ok(self.chain_read()?.len())
    }

    /// Seal the pending pool plus a reward transaction, commit, and announce.
    pub fn mine(&self) -> Result<MineOutcome> {
        let (candidate, version) = {
            let chain = self.chain_read()?;
            let mut candidate = chain.build_candidate(0)?;
            candidate.push_transaction(self.reward_transaction());
            (candidate, self.tip_version.load(Ordering::Acquire))
        };

        let block = match self.pow.seal(candidate, || {
            self.tip_version.load(Ordering::Acquire) != version
        }) {
            SealOutcome::Sealed(block) => block,
            SealOutcome::Superseded => {
                info!("Mining superseded by a block received meanwhile");
                return Ok(MineOutcome::Superseded);
            }
        };

        {
            let mut chain = self.chain_write()?;
            // the tip may have moved after the last staleness poll
            if let Err(reason) = chain.validate_block(&block, &self.pow) {
                info!(
                    "Sealed block {} no longer fits the tip: {reason}",
                    block.get_index()
                );
                return Ok(MineOutcome::Superseded);
            }
            chain.commit(block.clone());
            self.bump_tip();
        }
        info!("New block forged: {} ({})", block.get_index(), block.hash());

        let peers = self.peers.list()?;
        let report = Broadcaster::new(self.transport.as_ref()).announce(&block, &peers);
        Ok(MineOutcome::Forged { block, report })
    }

    /// Take a block announced by a peer.
    pub fn receive_block(&self, block: Block) -> Result<InboundOutcome> {
        let reason = {
            let mut chain = self.chain_write()?;
            match chain.validate_block(&block, &self.pow) {
                Ok(()) => {
                    let index = block.get_index();
                    chain.commit(block);
                    self.bump_tip();
                    info!("Accepted block {index} from peer");
                    return Ok(InboundOutcome::Accepted { index });
                }
                Err(reason) => reason,
            }
        };

        if reason.is_linkage() {
            warn!(
                "Inbound block {} conflicts with our tip ({reason}), resolving",
                block.get_index()
            );
            let resolution = self.resolve()?;
            Ok(InboundOutcome::Conflict { reason, resolution })
        } else {
            warn!("Rejected inbound block {}: {reason}", block.get_index());
            Ok(InboundOutcome::Rejected { reason })
        }
    }

    /// Normalize and add peers, then gossip the new set if anything changed.
    pub fn register_peers(&self, raw: &[String]) -> Result<Registration> {
        let mut parsed = Vec::new();
        for entry in raw {
            match PeerAddress::parse(entry) {
                Ok(address) => parsed.push(address),
                Err(e) => warn!("Skipping peer entry: {e}"),
            }
        }
        if parsed.is_empty() {
            return Err(LedgerError::MalformedPeerList(
                "please supply at least one host:port address".to_string(),
            ));
        }

        let mut added = Vec::new();
        for address in parsed {
            if self.peers.register(address.clone())? {
                added.push(address);
            }
        }
        let peers = self.peers.list()?;

        let gossip = if self.gossip && !added.is_empty() {
            let mut known = peers.clone();
            known.push(self.get_self_address().clone());
            Some(Broadcaster::new(self.transport.as_ref()).gossip_peers(&known, &peers))
        } else {
            None
        };

        Ok(Registration {
            added,
            peers,
            gossip,
        })
    }

    pub fn list_peers(&self) -> Result<Vec<PeerAddress>> {
        self.peers.list()
    }

    /// Adopt the longest valid peer chain if it beats ours.
    pub fn resolve(&self) -> Result<Resolution> {
        let local_length = self.chain_length()?;
        let peers = self.peers.list()?;
        let candidate = ConsensusResolver::new(self.transport.as_ref(), &self.pow)
            .find_longer_chain(local_length, &peers);

        let mut chain = self.chain_write()?;
        let replaced = match candidate {
            // our chain may have grown while peers were being asked
            Some(blocks) if blocks.len() > chain.len() => {
                chain.replace(blocks, &self.pow)?;
                self.bump_tip();
                true
            }
            Some(_) => {
                info!("Local chain grew past the peer candidate during resolve");
                false
            }
            None => false,
        };
        if replaced {
            info!("Our chain was replaced, new length {}", chain.len());
        } else {
            info!("Our chain is authoritative (length {})", chain.len());
        }

        Ok(Resolution {
            replaced,
            chain: chain.get_blocks().to_vec(),
        })
    }

    fn reward_transaction(&self) -> Transaction {
        Transaction::new(self.identifier.as_str(), json!({ "reward": MINING_REWARD }))
    }

    fn bump_tip(&self) {
        self.tip_version.fetch_add(1, Ordering::Release);
    }

    fn chain_read(&self) -> Result<RwLockReadGuard<'_, Chain>> {
        self.chain
            .read()
            .map_err(|e| LedgerError::Lock(format!("Failed to acquire chain lock: {e}")))
    }

    fn chain_write(&self) -> Result<RwLockWriteGuard<'_, Chain>> {
        self.chain
            .write()
            .map_err(|e| LedgerError::Lock(format!("Failed to acquire chain lock: {e}")))
    }
}
