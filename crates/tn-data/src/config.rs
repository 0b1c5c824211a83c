//! Navigator configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use tn_core::navigation::DEFAULT_RANKS;
use tn_core::RankSequence;

use crate::DataError;

/// Settings read from a JSON configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigatorConfig {
    /// Rank names, top to bottom
    pub ranks: Vec<String>,

    /// Announcements buffered per navigator
    pub channel_capacity: usize,

    /// Child loads kept by the cache
    pub cache_entries: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            ranks: DEFAULT_RANKS.iter().map(|r| r.to_string()).collect(),
            channel_capacity: tn_core::channel::DEFAULT_CAPACITY,
            cache_entries: 256,
        }
    }
}

impl NavigatorConfig {
    /// Read a configuration file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        self.rank_sequence()?;
        if self.channel_capacity == 0 {
            return Err(DataError::Config("channelCapacity must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn rank_sequence(&self) -> Result<RankSequence, DataError> {
        Ok(RankSequence::new(self.ranks.iter().cloned())?)
    }
}
