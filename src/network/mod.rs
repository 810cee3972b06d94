//! Peer-to-peer networking
//!
//! Peer addressing and the registry, the request/response protocol and its
//! TCP transport, longest-chain consensus, fan-out broadcasting, and the
//! server loop that exposes a node to clients and peers.

pub mod broadcast;
pub mod consensus;
pub mod peers;
pub mod server;
pub mod transport;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use consensus::{ConsensusResolver, Resolution};
pub use peers::{PeerAddress, PeerRegistry};
pub use server::Server;
pub use transport::{ChainSnapshot, PeerTransport, Request, Response, TcpTransport};
