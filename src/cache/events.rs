//! Cross-view change signal.
//!
//! Every write to the content store, and every external "content changed"
//! notification, advances a monotonic epoch. Readers keep the last epoch they
//! saw and re-fetch when it moves.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Monotonic epoch for ordering change notifications.
pub type Epoch = u64;

/// Why the signal was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// This process wrote the durable content slot.
    ContentSaved,
    /// This process wrote the preview draft slot.
    DraftSaved,
    /// Another view reported that the source of truth may have changed.
    ExternalUpdate,
}

/// Broadcast "re-fetch" signal shared by every reader of one store.
#[derive(Debug, Default)]
pub struct ChangeSignal {
    epoch: AtomicU64,
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the epoch and return the new value.
    pub fn notify(&self, kind: ChangeKind) -> Epoch {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        info!(change_epoch = epoch, change_kind = ?kind, "Content change signalled");
        epoch
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Start watching from the current epoch.
    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription { seen: self.epoch() }
    }
}

/// A reader's view of the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSubscription {
    seen: Epoch,
}

impl ChangeSubscription {
    /// True once per advance of the signal since the last call.
    pub fn has_changed(&mut self, signal: &ChangeSignal) -> bool {
        let current = signal.epoch();
        if current == self.seen {
            return false;
        }
        self.seen = current;
        true
    }

    pub fn seen(&self) -> Epoch {
        self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_monotonicity() {
        let signal = ChangeSignal::new();
        let first = signal.notify(ChangeKind::ContentSaved);
        let second = signal.notify(ChangeKind::ExternalUpdate);
        assert!(second > first);
        assert_eq!(signal.epoch(), second);
    }

    #[test]
    fn subscription_reports_each_change_once() {
        let signal = ChangeSignal::new();
        let mut subscription = signal.subscribe();
        assert!(!subscription.has_changed(&signal));

        signal.notify(ChangeKind::ExternalUpdate);
        signal.notify(ChangeKind::DraftSaved);
        assert!(subscription.has_changed(&signal));
        assert!(!subscription.has_changed(&signal));
        assert_eq!(subscription.seen(), 2);
    }
}
