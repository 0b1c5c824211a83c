//! Core of the taxon navigator
//!
//! This crate provides the navigation state machine, selection resolution
//! and the seams (channel, loader, subscribers) the rest of the system
//! plugs into.

pub mod channel;
pub mod error;
pub mod navigation;
pub mod selection;

// Re-export commonly used types
pub use channel::HierarchyChannel;
pub use error::NavError;
pub use loader::ChildLoader;
pub use navigation::{
    ChildNode, ChildRequest, NavigationStart, Navigator, NavigatorPhase, NavigatorSnapshot,
    NavigatorState, ParentRef, RankSequence, SelectionSubscriber,
};
pub use selection::{LevelSelection, LevelSummary, SelectionMap, SelectionResult};

pub mod loader {
    use crate::navigation::{ChildNode, ChildRequest};

    /// Trait for backends that know the children of a taxon
    #[async_trait::async_trait]
    pub trait ChildLoader: Send + Sync {
        /// Children of `request.parent_value` on `request.child_level`, in
        /// display order. An empty list means "no children".
        async fn children(&self, request: &ChildRequest) -> anyhow::Result<Vec<ChildNode>>;

        /// Get the source name
        fn source_name(&self) -> &str;
    }
}
