//! Hierarchy channel: announces where a navigator should start

use tokio::sync::broadcast;
use tracing::trace;

use crate::navigation::NavigationStart;

/// Default number of announcements buffered per receiver
pub const DEFAULT_CAPACITY: usize = 16;

/// Broadcast point between a selector and its navigators.
///
/// Delivery is fire-and-forget: an announcement reaches the receivers that
/// exist when it is made, and is never replayed to later ones.
#[derive(Debug, Clone)]
pub struct HierarchyChannel {
    sender: broadcast::Sender<NavigationStart>,
}

impl HierarchyChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a start node. Returns how many receivers got it.
    pub fn announce(&self, start: NavigationStart) -> usize {
        trace!("Announcing start {} '{}'", start.level, start.value);
        match self.sender.send(start) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("No navigator is listening");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationStart> {
        self.sender.subscribe()
    }
}

impl Default for HierarchyChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_announce_without_listeners_is_dropped() {
        let channel = HierarchyChannel::default();
        assert_eq!(channel.announce(NavigationStart::unlabelled("kingdom", "Plantae")), 0);

        let mut late = channel.subscribe();
        assert!(matches!(late.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_every_receiver_gets_announcement() {
        let channel = HierarchyChannel::new(4);
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();

        let start = NavigationStart::new("phylum", "Chordata", "Chordates");
        assert_eq!(channel.announce(start.clone()), 2);

        assert_eq!(a.try_recv().unwrap(), start);
        assert_eq!(b.try_recv().unwrap(), start);
    }
}
