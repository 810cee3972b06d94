// The committed block sequence plus the pool of transactions waiting for a block.
// Everything lives in memory; a restart begins again from genesis.

use crate::core::{Block, ProofOfWork, Transaction};
use crate::error::{BlockRejection, LedgerError, Result};
use crate::utils::current_timestamp;
use log::info;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Chain {
    // never empty: index 0 is always a genesis block
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    pub fn new() -> Chain {
        Chain {
            blocks: vec![Block::genesis()],
            pending: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn get_blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn get_pending(&self) -> &[Transaction] {
        self.pending.as_slice()
    }

    /// Queue a transaction; returns the index of the block it is expected in.
    pub fn append_transaction(&mut self, sender: &str, data: Value) -> u64 {
        self.pending.push(Transaction::new(sender, data));
        self.tip().get_index() + 1
    }

    /// Unsealed successor of the tip carrying the whole pending pool.
    pub fn build_candidate(&self, proof: u64) -> Result<Block> {
        let tip = self.tip();
        Ok(Block::new(
            tip.get_index() + 1,
            current_timestamp()?,
            self.pending.clone(),
            proof,
            tip.hash(),
        ))
    }

    /// Append an already validated block.
    ///
    /// Pending transactions sealed into the block leave the pool; anything
    /// submitted after the candidate was built stays queued for the next one.
    pub fn commit(&mut self, block: Block) {
        for sealed in block.get_transactions() {
            if let Some(pos) = self.pending.iter().position(|tx| tx == sealed) {
                self.pending.remove(pos);
            }
        }
        info!(
            "Committed block {} ({} transactions), {} still pending",
            block.get_index(),
            block.get_transactions().len(),
            self.pending.len()
        );
        self.blocks.push(block);
    }

    /// Check that `block` can extend the current tip.
    pub fn validate_block(
        &self,
        block: &Block,
        pow: &ProofOfWork,
    ) -> std::result::Result<(), BlockRejection> {
        let tip = self.tip();
        if block.get_previous_hash() != tip.hash() {
            return Err(BlockRejection::BrokenLink);
        }
        if block.get_index() != tip.get_index() + 1 {
            return Err(BlockRejection::IndexGap);
        }
        if !pow.validate(block) {
            return Err(BlockRejection::InsufficientProof);
        }
        Ok(())
    }

    /// Whether `blocks` forms a valid chain on its own.
    pub fn validate_full(blocks: &[Block], pow: &ProofOfWork) -> bool {
        Self::check_chain(blocks, pow).is_ok()
    }

    /// Like [`Chain::validate_full`] but says which link is broken.
    pub fn check_chain(blocks: &[Block], pow: &ProofOfWork) -> Result<()> {
        let first = blocks
            .first()
            .ok_or_else(|| LedgerError::InvalidChain("chain is empty".to_string()))?;
        if first.get_index() != 1 {
            return Err(LedgerError::InvalidChain(format!(
                "chain starts at index {}",
                first.get_index()
            )));
        }

        for pair in blocks.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            if cur.get_previous_hash() != prev.hash() {
                return Err(LedgerError::InvalidChain(format!(
                    "block {} does not link to block {}",
                    cur.get_index(),
                    prev.get_index()
                )));
            }
            if cur.get_index() != prev.get_index() + 1 {
                return Err(LedgerError::InvalidChain(format!(
                    "block {} follows block {}",
                    cur.get_index(),
                    prev.get_index()
                )));
            }
            if !pow.validate(cur) {
                return Err(LedgerError::InvalidChain(format!(
                    "block {} has an insufficient proof",
                    cur.get_index()
                )));
            }
        }
        Ok(())
    }

    /// Swap in `blocks` wholesale. The pending pool is kept.
    pub fn replace(&mut self, blocks: Vec<Block>, pow: &ProofOfWork) -> Result<()> {
        Self::check_chain(&blocks, pow)?;
        info!(
            "Replacing local chain of length {} with one of length {}",
            self.blocks.len(),
            blocks.len()
        );
        self.blocks = blocks;
        Ok(())
    }
}
