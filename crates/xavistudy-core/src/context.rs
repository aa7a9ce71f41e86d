//! Owned study context: the explicit mount/unmount boundary.
//!
//! `init` subscribes to the lifecycle source and routes transitions:
//! leaving the foreground cancels the live session, returning to it shows
//! the inactivity prompt and re-triggers the daily streak update.
//! `teardown` undoes all of it and leaves the session screen.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::lifecycle::{AppState, LifecycleSource, LifecycleSubscription};
use crate::session::StudyController;
use crate::streak::StreakUpdateCoordinator;

pub struct StudyContext {
    controller: Arc<StudyController>,
    streak: Arc<StreakUpdateCoordinator>,
    lifecycle: Arc<dyn LifecycleSource>,
    listener: Option<JoinHandle<()>>,
}

impl StudyContext {
    pub fn new(
        controller: Arc<StudyController>,
        streak: Arc<StreakUpdateCoordinator>,
        lifecycle: Arc<dyn LifecycleSource>,
    ) -> Self {
        Self {
            controller,
            streak,
            lifecycle,
            listener: None,
        }
    }

    pub fn controller(&self) -> &Arc<StudyController> {
        &self.controller
    }

    pub fn streak(&self) -> &Arc<StreakUpdateCoordinator> {
        &self.streak
    }

    pub fn is_mounted(&self) -> bool {
        self.listener.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Mount: subscribe to lifecycle transitions and kick off the initial
    /// streak update. A second `init` while mounted does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(&mut self) {
        if self.is_mounted() {
            return;
        }
        let subscription = self.lifecycle.subscribe();
        self.listener = Some(tokio::spawn(route_lifecycle(
            subscription,
            Arc::clone(&self.controller),
            Arc::clone(&self.streak),
        )));
        spawn_streak_update(&self.streak);
        info!("study context mounted");
    }

    /// Unmount: unsubscribe and leave the session screen.
    pub fn teardown(&mut self) {
        if let Some(listener) = self.listener.take() {
            // Aborting drops the subscription, which detaches it.
            listener.abort();
        }
        self.controller.leave();
        info!("study context torn down");
    }
}

impl Drop for StudyContext {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

async fn route_lifecycle(
    mut subscription: LifecycleSubscription,
    controller: Arc<StudyController>,
    streak: Arc<StreakUpdateCoordinator>,
) {
    // The app is foregrounded whenever a screen mounts.
    let mut previous = AppState::Active;
    while let Some(state) = subscription.next().await {
        debug!(?previous, ?state, "app state transition");
        match (previous.is_foreground(), state.is_foreground()) {
            (true, false) => controller.on_app_backgrounded(),
            (false, true) => {
                controller.on_app_foregrounded();
                spawn_streak_update(&streak);
            }
            _ => {}
        }
        previous = state;
    }
    subscription.unsubscribe();
}

/// Detached: lifecycle routing never waits on the streak RPC.
fn spawn_streak_update(streak: &Arc<StreakUpdateCoordinator>) {
    let streak = Arc::clone(streak);
    tokio::spawn(async move {
        let outcome = streak.maybe_update().await;
        debug!(?outcome, "streak update trigger");
    });
}
