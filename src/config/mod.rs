//! Configuration management
//!
//! Node settings layered from defaults, an optional TOML file, environment
//! variables and command-line flags.

pub mod settings;

pub use settings::{new_node_id, Config, DEFAULT_NODE_ADDR};
