//! Navigator engine implementation

use super::{
    LoadRequest, NavigationStart, NavigatorPhase, NavigatorSnapshot, NavigatorState, RankSequence,
    SelectionSubscriber,
};
use crate::error::NavError;
use crate::loader::ChildLoader;
use crate::selection::{LevelSummary, SelectionResult};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::{debug, error, warn};

/// Drives a [`NavigatorState`] against a child loader and reports the
/// resolved selection to subscribers.
///
/// The state lock is never held while a load is awaited; answers are matched
/// back to their request by ticket, so overlapping calls cannot corrupt the
/// stack.
pub struct Navigator {
    state: Arc<RwLock<NavigatorState>>,
    loader: Arc<dyn ChildLoader>,
    subscribers: Arc<RwLock<Vec<Weak<dyn SelectionSubscriber>>>>,
    phase: watch::Sender<NavigatorPhase>,
}

impl Navigator {
    /// Create a new navigator
    pub fn new(ranks: RankSequence, loader: Arc<dyn ChildLoader>) -> Self {
        Self {
            state: Arc::new(RwLock::new(NavigatorState::new(ranks))),
            loader,
            subscribers: Arc::new(RwLock::new(Vec::new())),
            phase: watch::channel(NavigatorPhase::Idle).0,
        }
    }

    /// Start a session from `start` and load its first level of children.
    ///
    /// The (empty) selection is reported before the load is awaited, also
    /// when the start rank is unknown.
    pub async fn start(&self, start: NavigationStart) -> Result<NavigatorPhase, NavError> {
        debug!("Starting navigation from {} '{}'", start.level, start.value);

        let begun = self.state.write().begin(&start);
        self.notify_subscribers();

        let load = match begun {
            Ok(load) => load,
            Err(e) => {
                error!("Cannot start navigation: {}", e);
                return Err(e);
            }
        };

        match load {
            Some(load) => {
                self.run_load(load).await?;
            }
            None => debug!("'{}' is on the last rank, nothing to load", start.value),
        }

        Ok(self.state.read().phase())
    }

    /// Descend into `value` on the current level.
    ///
    /// Returns false when the current level is the last rank.
    pub async fn forward(&self, value: &str) -> Result<bool, NavError> {
        let load = self.state.write().begin_forward(value)?;
        self.notify_subscribers();

        let Some(load) = load else {
            debug!("No rank below '{}', staying on the current level", value);
            return Ok(false);
        };

        self.run_load(load).await?;
        Ok(true)
    }

    /// Go up one level. No-op on the first level.
    pub fn back(&self) -> bool {
        let popped = self.state.write().back();
        if popped {
            self.notify_subscribers();
        }
        popped
    }

    /// Toggle `value` on the current level
    pub fn toggle(&self, value: &str) -> Result<bool, NavError> {
        let changed = self.state.write().toggle(value)?;
        if changed {
            self.notify_subscribers();
        }
        Ok(changed)
    }

    /// Remove an explicit selection, on any level
    pub fn remove_selected(&self, level: usize, value: &str) -> bool {
        let removed = self.state.write().remove_selected(level, value);
        self.notify_subscribers();
        removed
    }

    pub fn is_selected(&self, level: usize, value: &str) -> bool {
        self.state.read().is_selected(level, value)
    }

    pub fn selection(&self) -> SelectionResult {
        self.state.read().selection_result()
    }

    pub fn summary(&self) -> Vec<LevelSummary> {
        self.state.read().summary()
    }

    pub fn snapshot(&self) -> NavigatorSnapshot {
        self.state.read().snapshot()
    }

    /// Start a session for every announcement until the channel closes
    pub async fn listen(self: Arc<Self>, mut receiver: broadcast::Receiver<NavigationStart>) {
        loop {
            match receiver.recv().await {
                Ok(start) => {
                    if let Err(e) = self.start(start).await {
                        warn!("Navigation start failed: {}", e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Navigator lagged behind, {} announcements skipped", skipped);
                }
                Err(RecvError::Closed) => {
                    debug!("Hierarchy channel closed, navigator stops listening");
                    break;
                }
            }
        }
    }

    /// Follow the navigator's phase, e.g. to show a spinner while loading
    pub fn watch_phase(&self) -> watch::Receiver<NavigatorPhase> {
        self.phase.subscribe()
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn SelectionSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    async fn run_load(&self, load: LoadRequest) -> Result<usize, NavError> {
        let LoadRequest { ticket, request } = load;
        debug!(
            "Loading {} children of {} '{}' from {}",
            request.child_level,
            request.parent_level,
            request.parent_value,
            self.loader.source_name()
        );

        let loaded = self.loader.children(&request).await;
        let outcome = match loaded {
            Ok(nodes) => {
                let count = nodes.len();
                let applied = self.state.write().apply_children(ticket, nodes);
                match &applied {
                    Ok(depth) => debug!("Loaded {} nodes, depth is now {}", count, depth),
                    Err(e) => warn!("{} for '{}'", e, request.parent_value),
                }
                applied
            }
            Err(source) => {
                self.state.write().fail_load(ticket);
                error!("Child load for '{}' failed: {:#}", request.parent_value, source);
                Err(NavError::LoadFailed { request, source })
            }
        };

        self.publish_phase();
        outcome
    }

    fn publish_phase(&self) {
        let phase = self.state.read().phase();
        self.phase.send_replace(phase);
    }

    /// Notify all subscribers of the current selection
    fn notify_subscribers(&self) {
        self.publish_phase();
        let selection = self.selection();

        let live: Vec<Arc<dyn SelectionSubscriber>> = {
            let mut subscribers = self.subscribers.write();
            // Remove any dead weak references
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        for subscriber in live {
            subscriber.on_selection_change(&selection);
        }
    }
}
