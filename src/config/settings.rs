use crate::core::{ProofOfWork, DEFAULT_DIFFICULTY};
use crate::error::{LedgerError, Result};
use crate::network::PeerAddress;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_NODE_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_TIMEOUT_MS: u64 = 5000;

const NODE_ADDRESS_KEY: &str = "NODE_ADDRESS";
const NODE_ID_KEY: &str = "NODE_ID";
const DIFFICULTY_KEY: &str = "DIFFICULTY";
const PEERS_KEY: &str = "PEERS";

/// Node settings, built once at startup and handed to the node.
///
/// Layers, lowest precedence first: defaults, TOML file, environment, CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Listen address, also our own address for the self-registration guard
    pub address: String,
    pub node_id: String,
    pub difficulty: String,
    /// Seed peers registered at startup
    pub peers: Vec<String>,
    /// Share the peer set with peers whenever it grows
    pub gossip: bool,
    pub connect_timeout_ms: u64,
    pub io_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: String::from(DEFAULT_NODE_ADDR),
            node_id: new_node_id(),
            difficulty: String::from(DEFAULT_DIFFICULTY),
            peers: vec![],
            gossip: true,
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            io_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Random identifier without hyphens, used as the mining reward recipient
pub fn new_node_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Config {
    /// Defaults, overlaid with `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    LedgerError::Config(format!("Failed to read {}: {e}", path.display()))
                })?;
                Config::from_toml_str(&text)?
            }
            None => Config::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_env(&mut self) {
        self.apply_vars(|key| env::var(key).ok());
    }

    /// Overlay values from a variable lookup such as the environment.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(NODE_ADDRESS_KEY) {
            self.address = addr;
        }
        if let Some(node_id) = lookup(NODE_ID_KEY) {
            self.node_id = node_id;
        }
        if let Some(difficulty) = lookup(DIFFICULTY_KEY) {
            self.difficulty = difficulty;
        }
        if let Some(peers) = lookup(PEERS_KEY) {
            self.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|peer| !peer.is_empty())
                .map(String::from)
                .collect();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_id.trim().is_empty() {
            return Err(LedgerError::Config("node_id must not be empty".to_string()));
        }
        self.self_address()?;
        self.proof_of_work()?;
        Ok(())
    }

    pub fn self_address(&self) -> Result<PeerAddress> {
        PeerAddress::parse(&self.address)
            .map_err(|e| LedgerError::Config(format!("Invalid node address: {e}")))
    }

    pub fn proof_of_work(&self) -> Result<ProofOfWork> {
        ProofOfWork::new(&self.difficulty)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}
