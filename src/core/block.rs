use crate::core::hasher;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel `previous_hash` carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";
/// Pre-agreed proof of the genesis block; it is never checked against difficulty.
pub const GENESIS_PROOF: u64 = 100;
/// Every node starts from the same genesis so their chains share a root.
pub const GENESIS_TIMESTAMP: f64 = 0.0;

/// A client submission. `data` is any JSON value; nothing about it is validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub data: Value,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, data: Value) -> Transaction {
        Transaction {
            sender: sender.into(),
            data,
        }
    }
}

// Field order here is the wire order; the digest uses sorted keys regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: f64,
    transactions: Vec<Transaction>,
    proof: u64,
    previous_hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        timestamp: f64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Block {
        Block {
            index,
            timestamp,
            transactions,
            proof,
            previous_hash,
        }
    }

    pub fn genesis() -> Block {
        Block::new(
            1,
            GENESIS_TIMESTAMP,
            Vec::new(),
            GENESIS_PROOF,
            GENESIS_PREVIOUS_HASH.to_string(),
        )
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_proof(&self) -> u64 {
        self.proof
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 1 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// Hex SHA-256 over the canonical encoding.
    pub fn hash(&self) -> String {
        hasher::digest(self)
    }

    pub(crate) fn with_proof(mut self, proof: u64) -> Block {
        self.proof = proof;
        self
    }

    pub(crate) fn push_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_genesis_block_fields() {
        let genesis = Block::genesis();
        assert_eq!(genesis.get_index(), 1);
        assert_eq!(genesis.get_proof(), 100);
        assert_eq!(genesis.get_previous_hash(), "1");
        assert!(genesis.get_transactions().is_empty());
        assert!(genesis.is_genesis());
    }

    #[test]
    fn test_genesis_is_identical_everywhere() {
        assert_eq!(Block::genesis().hash(), Block::genesis().hash());
    }

    #[test]
    fn test_wire_field_names() {
        let block = Block::new(
            2,
            1.5,
            vec![Transaction::new("alice", json!("x"))],
            7,
            "abc".to_string(),
        );
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["index"], json!(2));
        assert_eq!(value["timestamp"], json!(1.5));
        assert_eq!(value["proof"], json!(7));
        assert_eq!(value["previous_hash"], json!("abc"));
        assert_eq!(value["transactions"][0]["sender"], json!("alice"));
        assert_eq!(value["transactions"][0]["data"], json!("x"));
    }

    #[test]
    fn test_with_proof_changes_hash() {
        let block = Block::genesis();
        let reproofed = block.clone().with_proof(101);
        assert_eq!(reproofed.get_proof(), 101);
        assert_ne!(block.hash(), reproofed.hash());
    }

    #[test]
    fn test_hash_survives_json_transfer() {
        // sub-second timestamps sit on the edge of f64 precision
        for i in 0..10_000u32 {
            let block = Block::new(
                u64::from(i) + 2,
                1_792_448_564.0 + f64::from(i) * 0.000123457,
                vec![Transaction::new("alice", json!({ "n": i }))],
                u64::from(i),
                "00ab".to_string(),
            );
            let text = serde_json::to_string(&block).unwrap();
            let received: Block = serde_json::from_str(&text).unwrap();
            assert_eq!(received.get_timestamp(), block.get_timestamp());
            assert_eq!(received.hash(), block.hash());
        }
    }
}
