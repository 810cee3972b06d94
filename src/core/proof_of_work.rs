use crate::core::hasher::{self, HashTemplate};
use crate::core::Block;
use crate::error::{LedgerError, Result};
use log::{debug, info};

pub const DEFAULT_DIFFICULTY: &str = "0000";

/// Result of a sealing attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SealOutcome {
    Sealed(Block),
    /// The tip changed while searching; the work is void.
    Superseded,
}

/// Hex-prefix difficulty predicate and nonce search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: String,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        ProofOfWork {
            difficulty: DEFAULT_DIFFICULTY.to_string(),
        }
    }
}

impl ProofOfWork {
    /// `difficulty` must be a non-empty run of hex digits, e.g. `"0000"`.
    pub fn new(difficulty: &str) -> Result<ProofOfWork> {
        if difficulty.is_empty() {
            return Err(LedgerError::Config("difficulty must not be empty".to_string()));
        }
        if !difficulty.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerError::Config(format!(
                "difficulty must be hex digits, got {difficulty:?}"
            )));
        }
        Ok(ProofOfWork {
            difficulty: difficulty.to_ascii_lowercase(),
        })
    }

    pub fn get_difficulty(&self) -> &str {
        self.difficulty.as_str()
    }

    pub fn meets_difficulty(&self, digest: &str) -> bool {
        digest.starts_with(self.difficulty.as_str())
    }

    /// Whether the block, proof included, hashes under the difficulty prefix.
    pub fn validate(&self, block: &Block) -> bool {
        self.meets_difficulty(&hasher::digest(block))
    }

    /// Search proofs upward from zero until the digest meets the difficulty.
    ///
    /// `is_stale` is polled before every increment; once it returns true the
    /// search stops and reports [`SealOutcome::Superseded`].
    pub fn seal<F>(&self, candidate: Block, mut is_stale: F) -> SealOutcome
    where
        F: FnMut() -> bool,
    {
        let template = HashTemplate::new(&candidate);
        let mut proof: u64 = 0;

        info!(
            "Mining block {} with difficulty {}",
            candidate.get_index(),
            self.difficulty
        );
        loop {
            let digest = template.digest_with_proof(proof);
            if self.meets_difficulty(&digest) {
                info!(
                    "Sealed block {} with proof {proof}: {digest}",
                    candidate.get_index()
                );
                return SealOutcome::Sealed(candidate.with_proof(proof));
            }
            if is_stale() {
                debug!(
                    "Abandoning block {} after {proof} attempts, tip moved",
                    candidate.get_index()
                );
                return SealOutcome::Superseded;
            }
            proof = match proof.checked_add(1) {
                Some(next) => next,
                None => return SealOutcome::Superseded,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;
    use serde_json::json;
    use std::cell::Cell;

    fn candidate() -> Block {
        Block::new(
            2,
            1700000000.5,
            vec![Transaction::new("alice", json!("x"))],
            0,
            Block::genesis().hash(),
        )
    }

    #[test]
    fn test_difficulty_must_be_hex() {
        assert!(ProofOfWork::new("00").is_ok());
        assert!(ProofOfWork::new("0a").is_ok());
        assert!(ProofOfWork::new("").is_err());
        assert!(ProofOfWork::new("zz").is_err());
        assert_eq!(ProofOfWork::new("AB").unwrap().get_difficulty(), "ab");
    }

    #[test]
    fn test_default_difficulty() {
        assert_eq!(ProofOfWork::default().get_difficulty(), "0000");
    }

    #[test]
    fn test_seal_meets_difficulty() {
        let pow = ProofOfWork::new("000").unwrap();
        match pow.seal(candidate(), || false) {
            SealOutcome::Sealed(block) => {
                assert!(block.hash().starts_with("000"));
                assert!(pow.validate(&block));
            }
            SealOutcome::Superseded => panic!("nothing should supersede this search"),
        }
    }

    #[test]
    fn test_seal_finds_smallest_proof() {
        let pow = ProofOfWork::new("00").unwrap();
        let SealOutcome::Sealed(block) = pow.seal(candidate(), || false) else {
            panic!("expected a sealed block");
        };
        let base = candidate();
        for proof in 0..block.get_proof() {
            assert!(!pow.validate(&base.clone().with_proof(proof)));
        }
    }

    #[test]
    fn test_seal_aborts_when_stale() {
        let pow = ProofOfWork::new("ffffffff").unwrap();
        let polls = Cell::new(0);
        let outcome = pow.seal(candidate(), || {
            polls.set(polls.get() + 1);
            polls.get() > 3
        });
        assert_eq!(outcome, SealOutcome::Superseded);
        assert_eq!(polls.get(), 4);
    }

    #[test]
    fn test_validate_rejects_unsealed_block() {
        let pow = ProofOfWork::new("ffffffff").unwrap();
        assert!(!pow.validate(&candidate()));
    }
}
