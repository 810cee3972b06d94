// Peer addresses and the registry of known peers.

use crate::error::{LedgerError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

const LOOPBACK_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "::1", "0.0.0.0"];

/// A peer endpoint normalized to `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddress {
    host: String,
    port: u16,
}

impl PeerAddress {
    pub fn new(host: &str, port: u16) -> PeerAddress {
        PeerAddress {
            host: host.to_ascii_lowercase(),
            port,
        }
    }

    /// Accepts `host:port`, `scheme://host:port` and either form with a path.
    pub fn parse(raw: &str) -> Result<PeerAddress> {
        let trimmed = raw.trim();
        let without_scheme = match trimmed.split_once("://") {
            Some((_, rest)) => rest,
            None => trimmed,
        };
        let authority = without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        // drop any userinfo
        let authority = authority.rsplit('@').next().unwrap_or_default();

        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| LedgerError::MalformedPeerList(format!("{raw:?} has no port")))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(LedgerError::MalformedPeerList(format!("{raw:?} has no host")));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| LedgerError::MalformedPeerList(format!("{raw:?} has a bad port: {e}")))?;

        Ok(PeerAddress::new(host, port))
    }

    pub fn get_host(&self) -> &str {
        self.host.as_str()
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// Same endpoint, treating the loopback spellings as one host.
    pub fn same_endpoint(&self, other: &PeerAddress) -> bool {
        if self.port != other.port {
            return false;
        }
        self.host == other.host
            || (LOOPBACK_HOSTS.contains(&self.host.as_str())
                && LOOPBACK_HOSTS.contains(&other.host.as_str()))
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for PeerAddress {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        PeerAddress::parse(s)
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        PeerAddress::parse(&value)
    }
}

impl From<PeerAddress> for String {
    fn from(address: PeerAddress) -> Self {
        address.to_string()
    }
}

/// Known peers in insertion order, without duplicates or the node itself.
///
/// There is no removal: an unreachable peer stays registered for the session.
pub struct PeerRegistry {
    self_address: PeerAddress,
    inner: RwLock<Vec<PeerAddress>>,
}

impl PeerRegistry {
    pub fn new(self_address: PeerAddress) -> PeerRegistry {
        PeerRegistry {
            self_address,
            inner: RwLock::new(vec![]),
        }
    }

    pub fn get_self_address(&self) -> &PeerAddress {
        &self.self_address
    }

    /// Insert `address`; returns whether the registry changed.
    pub fn register(&self, address: PeerAddress) -> Result<bool> {
        if address.same_endpoint(&self.self_address) {
            debug!("Ignoring registration of own address {address}");
            return Ok(false);
        }
        let mut inner = self
            .inner
            .write()
            .map_err(|e| LedgerError::Lock(format!("Failed to acquire peer lock: {e}")))?;
        if inner.iter().any(|known| known.same_endpoint(&address)) {
            return Ok(false);
        }
        info!("Registered peer {address}");
        inner.push(address);
        Ok(true)
    }

    pub fn list(&self) -> Result<Vec<PeerAddress>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| LedgerError::Lock(format!("Failed to acquire peer lock: {e}")))?;
        Ok(inner.clone())
    }

    pub fn contains(&self, address: &PeerAddress) -> Result<bool> {
        Ok(self
            .list()?
            .iter()
            .any(|known| known.same_endpoint(address)))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
