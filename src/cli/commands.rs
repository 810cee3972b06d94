use crate::config::DEFAULT_NODE_ADDR;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "peer-ledger")]
pub struct Opt {
    /// Node the client subcommands talk to
    #[arg(long = "node", global = true, default_value = DEFAULT_NODE_ADDR)]
    pub node: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a ledger node")]
    StartNode {
        #[arg(long = "config", help = "TOML configuration file")]
        config: Option<PathBuf>,
        #[arg(long = "addr", help = "Listen address (host:port)")]
        addr: Option<String>,
        #[arg(long = "difficulty", help = "Required hex prefix of block digests")]
        difficulty: Option<String>,
        #[arg(long = "peer", help = "Seed peer to register at startup (repeatable)")]
        peers: Vec<String>,
    },
    #[command(name = "submit", about = "Queue a transaction on the node")]
    Submit {
        #[arg(long = "sender", help = "Sender of the transaction")]
        sender: String,
        #[arg(long = "data", value_parser = parse_json, help = "Transaction payload as JSON")]
        data: Value,
    },
    #[command(name = "mine", about = "Seal the pending transactions into a block")]
    Mine,
    #[command(name = "chain", about = "Print the node's full chain")]
    Chain,
    #[command(name = "register", about = "Register peers with the node")]
    Register {
        #[arg(required = true, help = "Peer addresses (host:port or URL)")]
        peers: Vec<String>,
    },
    #[command(name = "peers", about = "List the node's peers")]
    Peers,
    #[command(name = "resolve", about = "Adopt the longest valid chain among peers")]
    Resolve,
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("Invalid JSON payload: {e}"))
}
