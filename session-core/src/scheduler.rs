use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::RefreshSettings;
use crate::controller::{AuthState, SessionController};
use crate::error::SessionError;
use crate::events::SessionEvent;

/// Outcome of the per-tick refresh predicate. Pure so the timing rules are
/// testable without a running clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// The token is inside the refresh window and the debounce gap has
    /// elapsed; fire a refresh now.
    Refresh,
    /// Plenty of lifetime left; check again next tick.
    NotExpiring,
    /// Inside the refresh window, but a refresh was attempted too recently.
    Debounced,
    /// Already expired; the proactive window was missed and the reactive 401
    /// path owns recovery.
    Expired,
}

impl RefreshDecision {
    pub fn evaluate(
        time_until_expiration: Duration,
        since_last_attempt: Option<Duration>,
        settings: &RefreshSettings,
    ) -> Self {
        if time_until_expiration.is_zero() {
            return RefreshDecision::Expired;
        }
        if time_until_expiration >= settings.refresh_threshold() {
            return RefreshDecision::NotExpiring;
        }
        if let Some(elapsed) = since_last_attempt {
            if elapsed < settings.min_refresh_gap() {
                return RefreshDecision::Debounced;
            }
        }
        RefreshDecision::Refresh
    }

    pub fn should_refresh(self) -> bool {
        matches!(self, RefreshDecision::Refresh)
    }
}

/// Timed control loop that proactively renews the credential before expiry.
///
/// State machine: Idle (unauthenticated or offline mode, no timer) and Armed
/// (authenticated and online, recurring timer). The debounce gap is the sole
/// overlap control: the attempt instant is recorded before the network call
/// is awaited, so it holds regardless of the refresh outcome.
pub struct RefreshScheduler {
    controller: Arc<SessionController>,
    settings: RefreshSettings,
    last_attempt: Mutex<Option<Instant>>,
    transport_failures: AtomicU32,
}

impl RefreshScheduler {
    pub fn new(controller: Arc<SessionController>, settings: RefreshSettings) -> Arc<Self> {
        Arc::new(Self {
            controller,
            settings,
            last_attempt: Mutex::new(None),
            transport_failures: AtomicU32::new(0),
        })
    }

    /// Spawn the control loop. The returned handle cancels it
    /// deterministically on `shutdown` or drop.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move { self.run(task_cancel).await });
        SchedulerHandle { cancel, task }
    }

    /// Caller-invoked refresh. Bypasses the expiry-threshold check but still
    /// honors the debounce gap (a second trigger inside the gap is a no-op)
    /// and routes through the controller so published state stays coherent.
    pub async fn force_refresh(&self) -> Result<AuthState, SessionError> {
        if let Some(elapsed) = self.since_last_attempt() {
            if elapsed < self.settings.min_refresh_gap() {
                tracing::debug!("Manual refresh debounced");
                return Ok(self.controller.state());
            }
        }
        self.record_attempt();
        self.controller.refresh_access_token().await
    }

    fn since_last_attempt(&self) -> Option<Duration> {
        self.last_attempt
            .lock()
            .expect("scheduler lock poisoned")
            .map(|at| at.elapsed())
    }

    fn record_attempt(&self) {
        *self.last_attempt.lock().expect("scheduler lock poisoned") = Some(Instant::now());
    }

    fn is_armed(state: &AuthState) -> bool {
        state.is_authenticated() && !state.is_offline_mode
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut events = self.controller.events().subscribe();
        let mut state_rx = self.controller.subscribe();

        'idle: loop {
            // Idle: wait for an authenticated, online session.
            loop {
                if Self::is_armed(&state_rx.borrow_and_update().clone()) {
                    break;
                }
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    changed = state_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            tracing::debug!("Refresh scheduler armed");
            self.transport_failures.store(0, Ordering::Relaxed);

            // Armed: recurring timer, torn down on disarm. The first tick
            // fires one full interval after arming.
            let start = tokio::time::Instant::now() + self.settings.check_interval();
            let mut ticker = tokio::time::interval_at(start, self.settings.check_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => {
                        if !Self::is_armed(&self.controller.state()) {
                            tracing::debug!("Refresh scheduler disarmed");
                            continue 'idle;
                        }
                        Self::on_tick(&self, &cancel);
                    }
                    event = events.recv() => match event {
                        Ok(SessionEvent::TokenRefreshed) => self.record_attempt(),
                        Ok(SessionEvent::AuthExpired) => {
                            tracing::debug!("Auth expired, refresh scheduler disarmed");
                            continue 'idle;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Refresh scheduler lagged on session events");
                        }
                        Err(RecvError::Closed) => return,
                    },
                    changed = state_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if !Self::is_armed(&state_rx.borrow_and_update().clone()) {
                            tracing::debug!("Refresh scheduler disarmed");
                            continue 'idle;
                        }
                    }
                }
            }
        }
    }

    /// Evaluate the tick predicate and, when due, fire the refresh on its own
    /// task so a hung call never blocks the next tick.
    fn on_tick(this: &Arc<Self>, cancel: &CancellationToken) {
        let remaining = this.controller.api().time_until_expiration();
        let decision =
            RefreshDecision::evaluate(remaining, this.since_last_attempt(), &this.settings);
        if !decision.should_refresh() {
            tracing::trace!(?decision, ?remaining, "Skipping proactive refresh");
            return;
        }

        // Recorded before the await point: the debounce holds even if the
        // refresh fails or hangs.
        this.record_attempt();

        let scheduler = Arc::clone(this);
        let cancel = cancel.child_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = scheduler.controller.proactive_refresh() => match result {
                    Ok(()) => scheduler.transport_failures.store(0, Ordering::Relaxed),
                    Err(e) if e.is_transport() => {
                        let consecutive =
                            scheduler.transport_failures.fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::warn!(
                            error = %e,
                            consecutive,
                            "Proactive refresh could not reach the backend"
                        );
                        if consecutive >= scheduler.settings.offline_after_failures {
                            scheduler.controller.set_offline_mode(true);
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Proactive refresh failed");
                    }
                }
            }
        });
    }
}

/// Owns the scheduler task; cancellation is deterministic on shutdown, drop,
/// logout-driven disarm, or offline-mode entry.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub async fn join(mut self) {
        self.cancel.cancel();
        let _ = std::pin::Pin::new(&mut self.task).await;
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
