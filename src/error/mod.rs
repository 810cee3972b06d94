//! Error handling for the ledger node
//!
//! One error type covers the engine, the peer transport and the process
//! surface. Per-peer failures are usually logged and swallowed by the caller
//! rather than propagated; see `network::consensus` and `network::broadcast`.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Why an inbound or freshly sealed block cannot extend the local tip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRejection {
    /// `previous_hash` does not match the digest of the current tip
    BrokenLink,
    /// Linked to the tip but carries an index other than tip + 1
    IndexGap,
    /// The block digest does not start with the difficulty prefix
    InsufficientProof,
}

impl BlockRejection {
    /// Linkage failures mean we may be on a different fork than the sender.
    pub fn is_linkage(&self) -> bool {
        matches!(self, BlockRejection::BrokenLink | BlockRejection::IndexGap)
    }
}

impl fmt::Display for BlockRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockRejection::BrokenLink => write!(f, "previous hash does not match the tip"),
            BlockRejection::IndexGap => write!(f, "index does not follow the tip"),
            BlockRejection::InsufficientProof => write!(f, "proof does not satisfy difficulty"),
        }
    }
}

/// Error types for ledger operations
#[derive(Debug, Clone)]
pub enum LedgerError {
    /// A candidate chain failed full validation
    InvalidChain(String),
    /// A block failed validation against the tip
    InvalidBlock(BlockRejection),
    /// Transport failure while talking to one peer
    PeerUnreachable { peer: String, reason: String },
    /// A registration request carried no usable address
    MalformedPeerList(String),
    /// Sealing was abandoned because the tip moved underneath it
    StaleMiningWork,
    /// Protocol-level failures (unexpected replies, remote errors)
    Network(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File and socket I/O errors
    Io(String),
    /// Configuration errors
    Config(String),
    /// A poisoned lock
    Lock(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InvalidChain(msg) => write!(f, "Invalid chain: {msg}"),
            LedgerError::InvalidBlock(reason) => write!(f, "Invalid block: {reason}"),
            LedgerError::PeerUnreachable { peer, reason } => {
                write!(f, "Peer {peer} unreachable: {reason}")
            }
            LedgerError::MalformedPeerList(msg) => write!(f, "Malformed peer list: {msg}"),
            LedgerError::StaleMiningWork => write!(f, "Mining work superseded by a new tip"),
            LedgerError::Network(msg) => write!(f, "Network error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Lock(msg) => write!(f, "Lock error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

impl From<BlockRejection> for LedgerError {
    fn from(reason: BlockRejection) -> Self {
        LedgerError::InvalidBlock(reason)
    }
}
