//! Errors raised by the navigator

use thiserror::Error;

use crate::navigation::ChildRequest;

/// Errors that can occur while navigating a taxonomy
#[derive(Error, Debug)]
pub enum NavError {
    #[error("rank '{0}' is not part of the rank sequence")]
    UnknownRank(String),

    #[error("no navigation session is active")]
    NotStarted,

    #[error("the first level is still loading")]
    FirstLevelLoading,

    #[error("node '{value}' is not loaded at level {level}")]
    NodeNotLoaded { level: usize, value: String },

    #[error("discarded stale child load (generation {generation})")]
    StaleLoad { generation: u64 },

    #[error("failed to load {} children of {} '{}'", .request.child_level, .request.parent_level, .request.parent_value)]
    LoadFailed {
        request: ChildRequest,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid rank sequence: {0}")]
    InvalidRanks(String),
}
