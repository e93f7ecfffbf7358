//! Per-caller admission control
//!
//! Sliding-window limiter keyed by caller identity. Each identity keeps the
//! timestamps of its admitted requests; entries older than the window are
//! pruned on every check.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::GovernorConfig;

/// Sliding-window request governor
pub struct RequestGovernor {
    limit: usize,
    window: Duration,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RequestGovernor {
    pub fn new(limit: usize, window: Duration) -> Self {
        debug!(%limit, ?window, "RequestGovernor::new: called");
        Self {
            limit,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &GovernorConfig) -> Self {
        Self::new(config.max_requests as usize, config.window())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit and record a request, or reject it without recording
    ///
    /// Prune, compare and append happen under one lock, so concurrent calls
    /// for the same identity cannot both pass the limit.
    pub async fn admit(&self, identity: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let timestamps = windows.entry(identity.to_string()).or_default();
        prune(timestamps, now, self.window);

        if timestamps.len() < self.limit {
            timestamps.push_back(now);
            debug!(%identity, count = timestamps.len(), "admit: admitted");
            true
        } else {
            debug!(%identity, count = timestamps.len(), "admit: rejected");
            false
        }
    }

    /// Time until the identity's oldest admission leaves the window
    pub async fn retry_after(&self, identity: &str) -> Duration {
        let now = Instant::now();
        let windows = self.windows.lock().await;
        windows
            .get(identity)
            .and_then(|timestamps| timestamps.front())
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(Duration::ZERO)
    }

    /// Drop expired timestamps everywhere and forget identities left empty
    ///
    /// Returns the number of identities removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, timestamps| {
            prune(timestamps, now, self.window);
            !timestamps.is_empty()
        });
        let removed = before - windows.len();
        debug!(%removed, remaining = windows.len(), "sweep: done");
        removed
    }

    /// Identities with at least one entry in the map
    pub async fn tracked_identities(&self) -> usize {
        self.windows.lock().await.len()
    }

    /// Run [`sweep`](Self::sweep) every `interval` until the task is aborted
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        info!(?interval, "Starting governor sweeper");
        let governor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = governor.sweep().await;
                if removed > 0 {
                    debug!(%removed, "spawn_sweeper: removed idle identities");
                }
            }
        })
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = timestamps.front() {
        if now.duration_since(oldest) >= window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}
