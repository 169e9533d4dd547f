use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::constants::{COUNTDOWN_TICK_MS, NEW_THREAD_COOLDOWN_MS, REPLY_COOLDOWN_MS};
use crate::models::{CooldownKey, CooldownStatus, TargetKind};
use crate::storage::CooldownStore;

/// Millisecond wall-clock source. Injected so tests can drive time by hand.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// How long each target kind stays rate-limited after a submission.
#[derive(Debug, Clone, Copy)]
pub struct CooldownPolicy {
    pub new_thread_ms: u64,
    pub reply_ms: u64,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            new_thread_ms: NEW_THREAD_COOLDOWN_MS,
            reply_ms: REPLY_COOLDOWN_MS,
        }
    }
}

impl CooldownPolicy {
    pub fn window_for(&self, kind: TargetKind) -> u64 {
        match kind {
            TargetKind::NewThread => self.new_thread_ms,
            TargetKind::Thread => self.reply_ms,
        }
    }
}

/// Per-target rate limiter over a persisted "last submission" timestamp.
///
/// Pure read/compute/write over the injected store; no network access. All
/// persistence failures fail open: an unreadable or corrupt record reads as
/// "not limited" and never blocks a submission.
#[derive(Clone)]
pub struct CooldownTracker {
    store: Arc<dyn CooldownStore>,
    policy: CooldownPolicy,
}

impl CooldownTracker {
    pub fn new(store: Arc<dyn CooldownStore>, policy: CooldownPolicy) -> Self {
        Self { store, policy }
    }

    /// Is `key` rate-limited at `now_millis`, and for how much longer?
    pub async fn status(&self, key: &CooldownKey, now_millis: i64) -> CooldownStatus {
        let window = self.policy.window_for(key.kind()) as i64;

        let raw = match self.store.get(&key.storage_key()).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Cooldown store read failed, treating as not limited: {}", e);
                return CooldownStatus::clear();
            }
        };

        let Some(raw) = raw else {
            return CooldownStatus::clear();
        };

        let last = match raw.trim().parse::<i64>() {
            Ok(last) => last,
            Err(_) => {
                tracing::warn!("Corrupt cooldown record {:?}, treating as not limited", raw);
                return CooldownStatus::clear();
            }
        };

        let elapsed = now_millis - last;
        if elapsed < window {
            CooldownStatus {
                limited: true,
                remaining_millis: (window - elapsed) as u64,
            }
        } else {
            CooldownStatus::clear()
        }
    }

    /// Restart the cooldown window for `key` from `now_millis`.
    ///
    /// Must be called once per confirmed-successful submission, after the API
    /// has accepted it. Overwrites any previous record; re-arming simply
    /// restarts the window. Write failures are logged and swallowed so a
    /// broken store never turns a successful post into a user-facing error.
    pub async fn arm(&self, key: &CooldownKey, now_millis: i64) {
        if let Err(e) = self
            .store
            .set(&key.storage_key(), &now_millis.to_string())
            .await
        {
            tracing::warn!("Failed to persist cooldown for {}: {}", key.storage_key(), e);
        }
    }

    /// Spawn a one-second re-poll of `status` for `key`.
    ///
    /// Each tick re-reads the store rather than decrementing blindly, so the
    /// countdown stays correct if another process re-arms the same key. The
    /// task stops once the window clears and is aborted when the returned
    /// handle is dropped.
    pub async fn watch(&self, key: CooldownKey, clock: Arc<dyn Clock>) -> Countdown {
        let initial = self.status(&key, clock.now_millis()).await;
        let (tx, rx) = watch::channel(initial);

        let tracker = self.clone();
        let task = tokio::spawn(async move {
            if !initial.limited {
                return;
            }

            let mut tick = tokio::time::interval(Duration::from_millis(COUNTDOWN_TICK_MS));
            tick.tick().await; // the first tick fires immediately

            loop {
                tick.tick().await;
                let status = tracker.status(&key, clock.now_millis()).await;
                if tx.send(status).is_err() {
                    break; // receiver gone
                }
                if !status.limited {
                    break;
                }
            }
        });

        Countdown { rx, task }
    }
}

/// Handle to a running countdown. Dropping it cancels the underlying task,
/// which is what happens when a form is torn down or retargeted.
pub struct Countdown {
    rx: watch::Receiver<CooldownStatus>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Latest observed status.
    pub fn current(&self) -> CooldownStatus {
        *self.rx.borrow()
    }

    /// Wait for the next tick. Returns `false` once the countdown finished.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Run until the cooldown window has fully elapsed.
    pub async fn cleared(mut self) {
        while self.rx.borrow().limited {
            if self.rx.changed().await.is_err() {
                break;
            }
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Render a remaining-time span the way the form shows it: seconds rounded
/// up, minutes split out at the one-minute mark.
pub fn format_remaining(millis: u64) -> String {
    let seconds = millis.div_ceil(1000);
    if seconds >= 60 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}
