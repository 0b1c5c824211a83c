use serde::{Deserialize, Serialize};

mod engine;
mod rank;
mod state;
mod subscriber;

pub use engine::Navigator;
pub use rank::{RankSequence, DEFAULT_RANKS};
pub use state::{LoadRequest, LoadTicket, NavigatorPhase, NavigatorState};
pub use subscriber::SelectionSubscriber;

/// The node a navigation session begins from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationStart {
    pub level: String,
    pub value: String,
    pub label: String,
}

impl NavigationStart {
    pub fn new(level: impl Into<String>, value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            value: value.into(),
            label: label.into(),
        }
    }

    /// Start node whose label is its value
    pub fn unlabelled(level: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            level: level.into(),
            label: value.clone(),
            value,
        }
    }
}

/// A child taxon returned by a loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildNode {
    /// Position in the loaded list; only meaningful within one load
    pub id: u32,
    /// Canonical taxon name, the identity used for selection
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl ChildNode {
    pub fn new(id: u32, value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
            label: label.into(),
            meta: serde_json::Value::Null,
        }
    }
}

/// Parent of one level of the level stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub level: String,
    pub value: String,
    pub label: String,
}

impl From<&NavigationStart> for ParentRef {
    fn from(start: &NavigationStart) -> Self {
        Self {
            level: start.level.clone(),
            value: start.value.clone(),
            label: start.label.clone(),
        }
    }
}

/// Request sent to a child loader
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRequest {
    pub parent_level: String,
    pub parent_value: String,
    pub child_level: String,
}

impl ChildRequest {
    pub fn new(
        parent_level: impl Into<String>,
        parent_value: impl Into<String>,
        child_level: impl Into<String>,
    ) -> Self {
        Self {
            parent_level: parent_level.into(),
            parent_value: parent_value.into(),
            child_level: child_level.into(),
        }
    }
}

/// Read-only view of the navigator passed to callers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorSnapshot {
    pub phase: NavigatorPhase,
    pub start: Option<ParentRef>,
    /// Rank of the nodes currently shown
    pub current_rank: Option<String>,
    pub depth: usize,
    pub current_nodes: Vec<ChildNode>,
    pub has_next_level: bool,
}
