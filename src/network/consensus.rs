//! Longest-valid-chain resolution
//!
//! A peer's chain only wins if it is strictly longer than everything seen so
//! far (starting from the local length) and validates end to end. Peers that
//! cannot be reached, answer with garbage, or report a length that does not
//! match the chain they sent are skipped.

use crate::core::{Block, Chain, ProofOfWork};
use crate::error::Result;
use crate::network::{PeerAddress, PeerTransport};
use log::{debug, info, warn};

/// Outcome of a resolve round
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub replaced: bool,
    pub chain: Vec<Block>,
}

pub struct ConsensusResolver<'a, T: PeerTransport + ?Sized> {
    transport: &'a T,
    pow: &'a ProofOfWork,
}

impl<'a, T: PeerTransport + ?Sized> ConsensusResolver<'a, T> {
    pub fn new(transport: &'a T, pow: &'a ProofOfWork) -> Self {
        Self { transport, pow }
    }

    /// Longest valid chain among `peers` that beats `local_length`, if any.
    pub fn find_longer_chain(&self, local_length: usize, peers: &[PeerAddress]) -> Option<Vec<Block>> {
        let mut max_length = local_length;
        let mut best = None;

        for peer in peers {
            let snapshot = match self.transport.fetch_chain(peer) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Skipping {peer} during resolve: {e}");
                    continue;
                }
            };

            if snapshot.length <= max_length {
                debug!(
                    "Chain from {peer} has length {}, need more than {max_length}",
                    snapshot.length
                );
                continue;
            }
            if snapshot.length != snapshot.chain.len() {
                warn!(
                    "Discarding chain from {peer}: reported length {} but sent {} blocks",
                    snapshot.length,
                    snapshot.chain.len()
                );
                continue;
            }
            if let Err(e) = Chain::check_chain(&snapshot.chain, self.pow) {
                warn!("Discarding chain from {peer}: {e}");
                continue;
            }

            info!("Found longer valid chain at {peer} (length {})", snapshot.length);
            max_length = snapshot.length;
            best = Some(snapshot.chain);
        }

        best
    }

    /// Replace `local` wholesale with the best peer chain, if one beats it.
    ///
    /// Callers sharing the chain across threads should run
    /// [`ConsensusResolver::find_longer_chain`] without holding their lock and
    /// only lock to swap, as `Node::resolve` does.
    pub fn resolve(&self, local: &mut Chain, peers: &[PeerAddress]) -> Result<Resolution> {
        let replaced = match self.find_longer_chain(local.len(), peers) {
            Some(blocks) => {
                local.replace(blocks, self.pow)?;
                true
            }
            None => false,
        };
        Ok(Resolution {
            replaced,
            chain: local.get_blocks().to_vec(),
        })
    }
}
