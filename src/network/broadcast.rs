use crate::core::Block;
use crate::error::Result;
use crate::network::{PeerAddress, PeerTransport};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::thread;

/// How many peers accepted a broadcast and how many refused it or could not be reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Fire-and-forget fan-out to peers, one thread per peer.
///
/// A failed send is logged and counted; it never stops the other sends and
/// never turns into an error for the caller.
pub struct Broadcaster<'a, T: PeerTransport + ?Sized> {
    transport: &'a T,
}

impl<'a, T: PeerTransport + ?Sized> Broadcaster<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Push a freshly committed block to every peer.
    pub fn announce(&self, block: &Block, peers: &[PeerAddress]) -> BroadcastReport {
        let report = self.fan_out(peers, |peer| self.transport.send_block(peer, block));
        info!(
            "Announced block {} to {} of {} peers",
            block.get_index(),
            report.delivered,
            peers.len()
        );
        report
    }

    /// Share `known` (our peer set, usually including ourselves) with `peers`.
    pub fn gossip_peers(&self, known: &[PeerAddress], peers: &[PeerAddress]) -> BroadcastReport {
        let report = self.fan_out(peers, |peer| self.transport.send_peers(peer, known));
        info!(
            "Gossiped {} addresses to {} of {} peers",
            known.len(),
            report.delivered,
            peers.len()
        );
        report
    }

    fn fan_out<F>(&self, peers: &[PeerAddress], send: F) -> BroadcastReport
    where
        F: Fn(&PeerAddress) -> Result<()> + Sync,
    {
        let send = &send;
        thread::scope(|scope| {
            let handles: Vec<_> = peers
                .iter()
                .map(|peer| (peer, scope.spawn(move || send(peer))))
                .collect();

            let mut report = BroadcastReport::default();
            for (peer, handle) in handles {
                match handle.join() {
                    Ok(Ok(())) => report.delivered += 1,
                    Ok(Err(e)) => {
                        warn!("Failed to reach {peer}: {e}");
                        report.failed += 1;
                    }
                    Err(_) => {
                        warn!("Send to {peer} panicked");
                        report.failed += 1;
                    }
                }
            }
            report
        })
    }
}
