//! Auto-refresh of the active context

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use carelink_core::DomainContext;

use crate::coordinator::SyncCoordinator;

/// Shortest period the timer accepts
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic forced refresh of whichever context is active
///
/// At most one timer runs at a time. Stopping aborts the background task;
/// dropping the `AutoRefresh` stops it too.
pub struct AutoRefresh {
    coordinator: Arc<SyncCoordinator>,
    active: watch::Receiver<DomainContext>,
    interval: Mutex<Duration>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl AutoRefresh {
    /// A period below [`MIN_REFRESH_INTERVAL`] is raised to it
    pub fn new(
        coordinator: Arc<SyncCoordinator>,
        active: watch::Receiver<DomainContext>,
        interval: Duration,
    ) -> Self {
        let interval = if interval < MIN_REFRESH_INTERVAL {
            warn!(
                "Auto-refresh interval {:?} below minimum, using {:?}",
                interval, MIN_REFRESH_INTERVAL
            );
            MIN_REFRESH_INTERVAL
        } else {
            interval
        };
        Self {
            coordinator,
            active,
            interval: Mutex::new(interval),
            handle: Mutex::new(None),
        }
    }

    /// Start the timer, replacing a running one
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let period = *self.interval.lock();
        let coordinator = self.coordinator.clone();
        let active = self.active.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;

                let context = *active.borrow();
                match coordinator.ensure_fresh(context, true).await {
                    Ok(outcome) => debug!("Auto-refreshed {} ({:?})", context, outcome.origin),
                    Err(e) => warn!("Auto-refresh of {} failed: {}", context, e),
                }
            }
        });

        if let Some(previous) = self.handle.lock().replace(handle) {
            previous.abort();
        }
        info!("Auto-refresh started every {:?}", period);
    }

    /// Stop the timer; returns whether one was running
    pub fn stop(&self) -> bool {
        match self.handle.lock().take() {
            Some(handle) => {
                handle.abort();
                info!("Auto-refresh stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn interval(&self) -> Duration {
        *self.interval.lock()
    }

    /// Change the period; a running timer is restarted with it
    ///
    /// A period below [`MIN_REFRESH_INTERVAL`] is refused and `false`
    /// returned; the current period stays in effect.
    pub fn set_interval(&self, interval: Duration) -> bool {
        if interval < MIN_REFRESH_INTERVAL {
            warn!("Refusing auto-refresh interval {:?}", interval);
            return false;
        }

        *self.interval.lock() = interval;
        if self.is_running() {
            self.start();
        }
        true
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}
