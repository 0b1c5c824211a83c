//! Selection subscriber trait

use crate::selection::SelectionResult;

/// Trait for components that need the resolved selection
pub trait SelectionSubscriber: Send + Sync {
    /// Called after every operation that may change the selection
    fn on_selection_change(&self, selection: &SelectionResult);
}
