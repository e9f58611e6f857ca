// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex};

use strum::Display;
use tokio::sync::watch;
use tracing::debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum HostState {
    Created,
    Configured,
    Running,
    Draining,
    Stopped,
}

impl HostState {
    #[must_use]
    pub fn accepts_registration(self) -> bool {
        matches!(self, Self::Created | Self::Configured)
    }
}

/// State shared between host handle and its serving task
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: watch::Sender<HostState>,
    failure: Mutex<Option<Arc<tonic::transport::Error>>>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(HostState::Created);
        Self {
            state,
            failure: Mutex::new(None),
        }
    }

    pub(crate) fn current(&self) -> HostState {
        *self.state.borrow()
    }

    pub(crate) fn advance(&self, next: HostState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!("Host state {prev} -> {next}");
        }
    }

    /// Move from `from` to `to` in one step. Returns false, leaving state
    /// untouched, if host was not in `from`.
    pub(crate) fn transition(&self, from: HostState, to: HostState) -> bool {
        let moved = self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if moved {
            debug!("Host state {from} -> {to}");
        }
        moved
    }

    pub(crate) fn fail(&self, err: tonic::transport::Error) {
        *self.failure.lock().unwrap() = Some(Arc::new(err));
    }

    pub(crate) fn failure(&self) -> Option<Arc<tonic::transport::Error>> {
        self.failure.lock().unwrap().clone()
    }

    pub(crate) async fn stopped(&self) {
        let mut rx = self.state.subscribe();
        // Sender lives in `self`, so the channel can't be closed while we wait
        let _ = rx.wait_for(|state| *state == HostState::Stopped).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_transition_only_from_expected() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(HostState::Running);

        assert!(lifecycle.transition(HostState::Running, HostState::Draining));
        // Serving loop ending while draining must not claim Stopped
        assert!(!lifecycle.transition(HostState::Running, HostState::Stopped));
        assert_eq!(lifecycle.current(), HostState::Draining);
    }

    #[tokio::test]
    async fn test_stopped_wakes_waiter() {
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.advance(HostState::Running);

        let waiter = tokio::spawn({
            let lifecycle = Arc::clone(&lifecycle);
            async move { lifecycle.stopped().await }
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        assert!(lifecycle.transition(HostState::Running, HostState::Stopped));
        timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
