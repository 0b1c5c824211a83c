use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::NavError;

/// Ranks used when no configuration overrides them
pub const DEFAULT_RANKS: [&str; 7] = [
    "kingdom", "phylum", "class", "order", "family", "genus", "species",
];

/// The fixed, ordered list of taxonomic ranks a navigator walks through.
///
/// Every level index used by the navigator is an offset into this sequence.
/// The sequence is shared behind an `Arc` and never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RankSequence {
    ranks: Arc<[String]>,
}

impl RankSequence {
    /// Build a sequence, rejecting empty lists, blank names and duplicates
    pub fn new<I, S>(ranks: I) -> Result<Self, NavError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ranks: Vec<String> = ranks.into_iter().map(Into::into).collect();

        if ranks.is_empty() {
            return Err(NavError::InvalidRanks("rank sequence is empty".to_string()));
        }
        for (i, rank) in ranks.iter().enumerate() {
            if rank.trim().is_empty() {
                return Err(NavError::InvalidRanks(format!("rank at position {} is blank", i)));
            }
            if ranks[..i].contains(rank) {
                return Err(NavError::InvalidRanks(format!("rank '{}' appears more than once", rank)));
            }
        }

        Ok(Self { ranks: ranks.into() })
    }

    pub fn index_of(&self, rank: &str) -> Option<usize> {
        self.ranks.iter().position(|r| r == rank)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.ranks.get(index).map(String::as_str)
    }

    /// Rank that follows `index`, if any
    pub fn next_after(&self, index: usize) -> Option<&str> {
        self.get(index + 1)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ranks.iter().map(String::as_str)
    }
}

impl Default for RankSequence {
    fn default() -> Self {
        Self {
            ranks: DEFAULT_RANKS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for RankSequence {
    type Error = NavError;

    fn try_from(ranks: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(ranks)
    }
}

impl From<RankSequence> for Vec<String> {
    fn from(seq: RankSequence) -> Self {
        seq.ranks.to_vec()
    }
}
