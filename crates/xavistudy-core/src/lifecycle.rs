//! App lifecycle event source.
//!
//! The host (mobile shell, desktop window, test) reports foreground and
//! background transitions; the core only subscribes. [`ChannelLifecycle`] is
//! a broadcast-backed source that hosts feed with [`ChannelLifecycle::emit`].

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Active,
    Background,
    Inactive,
}

impl AppState {
    pub fn is_foreground(self) -> bool {
        self == AppState::Active
    }
}

pub trait LifecycleSource: Send + Sync {
    fn subscribe(&self) -> LifecycleSubscription;
}

/// A live subscription. Dropping it (or calling `unsubscribe`) detaches it
/// from the source.
#[derive(Debug)]
pub struct LifecycleSubscription {
    rx: broadcast::Receiver<AppState>,
}

impl LifecycleSubscription {
    pub fn new(rx: broadcast::Receiver<AppState>) -> Self {
        Self { rx }
    }

    /// Next transition, or `None` once the source is gone.
    ///
    /// If the subscriber fell behind, the skipped transitions are dropped
    /// and the most recent buffered one is delivered next.
    pub async fn next(&mut self) -> Option<AppState> {
        loop {
            match self.rx.recv().await {
                Ok(state) => return Some(state),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "lifecycle subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

#[derive(Debug, Clone)]
pub struct ChannelLifecycle {
    tx: broadcast::Sender<AppState>,
}

impl ChannelLifecycle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Deliver a transition to every subscriber. Returns the number reached.
    pub fn emit(&self, state: AppState) -> usize {
        self.tx.send(state).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChannelLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleSource for ChannelLifecycle {
    fn subscribe(&self) -> LifecycleSubscription {
        LifecycleSubscription::new(self.tx.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_order() {
        let source = ChannelLifecycle::new();
        let mut sub = source.subscribe();
        source.emit(AppState::Background);
        source.emit(AppState::Active);
        assert_eq!(sub.next().await, Some(AppState::Background));
        assert_eq!(sub.next().await, Some(AppState::Active));
    }

    #[tokio::test]
    async fn unsubscribe_detaches() {
        let source = ChannelLifecycle::new();
        let sub = source.subscribe();
        assert_eq!(source.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(source.subscriber_count(), 0);
        assert_eq!(source.emit(AppState::Inactive), 0);
    }

    #[test]
    fn only_active_is_foreground() {
        assert!(AppState::Active.is_foreground());
        assert!(!AppState::Background.is_foreground());
        assert!(!AppState::Inactive.is_foreground());
    }
}
