// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session activity monitor.
//!
//! A periodic poller compares "now" with the last recorded activity. Once the
//! session has been idle for longer than the warning threshold it shows a
//! warning and starts an auto-logout countdown. Confirming the session cancels
//! the countdown; letting it run out, or logging out explicitly, clears the
//! credential store.
//!
//! ```text
//!            idle > warning_after            countdown elapsed / logout
//!   Active ─────────────────────▶ WarningShown ─────────────────────────▶ LoggedOut
//!     ▲   ◀─────────────────────                                            │
//!     │        continue_session                                             │
//!     └──────────────────────────────── reset() after login ───────────────┘
//! ```
//!
//! All state sits behind one mutex that is never held across an `.await`.
//! Transitions are announced on a broadcast channel so the shell can react.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use super::activity::ActivityTracker;
use super::credentials::CredentialStore;
use super::locks::resilient_lock;
use crate::config::SessionSettings;

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    WarningShown,
    LoggedOut,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Active => write!(f, "ACTIVE"),
            SessionPhase::WarningShown => write!(f, "WARNING"),
            SessionPhase::LoggedOut => write!(f, "LOGGED_OUT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The countdown ran out without confirmation.
    AutoLogout,
    /// The user asked to log out.
    Explicit,
    /// The credential store was emptied behind the monitor's back.
    CredentialsMissing,
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogoutReason::AutoLogout => write!(f, "inactivity"),
            LogoutReason::Explicit => write!(f, "user"),
            LogoutReason::CredentialsMissing => write!(f, "credentials_missing"),
        }
    }
}

/// Transitions published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    WarningShown { deadline: Instant, inactive: Duration },
    Continued,
    LoggedOut { reason: LogoutReason },
}

impl SessionEvent {
    fn to_audit_string(&self, user: &str) -> String {
        match self {
            SessionEvent::WarningShown { deadline, inactive } => format!(
                "SESSION_WARNING | user={} inactive={}s deadline_in={}s",
                user,
                inactive.as_secs(),
                deadline.saturating_duration_since(Instant::now()).as_secs()
            ),
            SessionEvent::Continued => format!("SESSION_CONTINUED | user={}", user),
            SessionEvent::LoggedOut { reason } => {
                format!("SESSION_LOGGED_OUT | user={} reason={}", user, reason)
            }
        }
    }
}

/// Whether the inactivity warning is on screen, and when it expires.
///
/// The deadline is set exactly when the warning is visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionWarningState {
    visible: bool,
    deadline: Option<Instant>,
}

impl SessionWarningState {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the forced logout, if the warning is up.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    fn show(&mut self, deadline: Instant) {
        self.visible = true;
        self.deadline = Some(deadline);
    }

    fn clear(&mut self) {
        self.visible = false;
        self.deadline = None;
    }
}

struct MonitorState {
    phase: SessionPhase,
    activity: ActivityTracker,
    warning: SessionWarningState,
    user: Option<String>,
    /// Bumped whenever a countdown is started or cancelled.
    countdown_generation: u64,
    countdown: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

impl MonitorState {
    fn user_label(&self) -> &str {
        self.user.as_deref().unwrap_or("anonymous")
    }

    fn cancel_countdown(&mut self) {
        self.countdown_generation = self.countdown_generation.wrapping_add(1);
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }
}

struct Shared {
    state: Mutex<MonitorState>,
    store: Arc<dyn CredentialStore>,
    settings: SessionSettings,
    events: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn publish(&self, state: &MonitorState, event: SessionEvent) {
        let line = event.to_audit_string(state.user_label());
        match event {
            SessionEvent::WarningShown { .. } => tracing::warn!("{}", line),
            _ => tracing::info!("{}", line),
        }
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Clear credentials and warning; emit an event only on an actual transition.
    fn logout_locked(&self, state: &mut MonitorState, reason: LogoutReason) {
        self.store.clear();
        state.cancel_countdown();
        state.warning.clear();
        if state.phase != SessionPhase::LoggedOut {
            state.phase = SessionPhase::LoggedOut;
            self.publish(state, SessionEvent::LoggedOut { reason });
        }
    }

    fn poll(self: &Arc<Self>) {
        let authenticated = self.store.is_authenticated();
        let mut state = resilient_lock(&self.state);

        if state.phase == SessionPhase::LoggedOut {
            return;
        }
        if !authenticated {
            self.logout_locked(&mut state, LogoutReason::CredentialsMissing);
            return;
        }

        let inactive = state.activity.inactive_duration();
        tracing::trace!("SESSION_POLL | phase={} inactive={}s", state.phase, inactive.as_secs());

        if state.phase == SessionPhase::Active && inactive > self.settings.warning_after() {
            let deadline = Instant::now() + self.settings.auto_logout_after();
            state.cancel_countdown();
            let generation = state.countdown_generation;
            state.countdown = Some(spawn_countdown(Arc::downgrade(self), deadline, generation));
            state.warning.show(deadline);
            state.phase = SessionPhase::WarningShown;
            self.publish(&state, SessionEvent::WarningShown { deadline, inactive });
        }
    }

    fn countdown_elapsed(&self, generation: u64) {
        let mut state = resilient_lock(&self.state);
        if state.countdown_generation != generation || state.phase != SessionPhase::WarningShown {
            tracing::debug!("Ignoring stale auto-logout countdown (generation {})", generation);
            return;
        }
        // This task is finishing; dropping its own handle is enough.
        state.countdown = None;
        self.logout_locked(&mut state, LogoutReason::AutoLogout);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = resilient_lock(&self.state);
        if let Some(handle) = &state.poller {
            handle.abort();
        }
        if let Some(handle) = &state.countdown {
            handle.abort();
        }
    }
}

fn spawn_countdown(shared: Weak<Shared>, deadline: Instant, generation: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        if let Some(shared) = shared.upgrade() {
            shared.countdown_elapsed(generation);
        }
    })
}

/// Owned inactivity monitor for one interactive session.
///
/// Cloning gives another handle to the same monitor.
#[derive(Clone)]
pub struct SessionMonitor {
    shared: Arc<Shared>,
}

impl fmt::Debug for SessionMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionMonitor")
            .field("phase", &self.phase())
            .field("warning", &self.warning())
            .finish()
    }
}

impl SessionMonitor {
    /// Starts `Active` when the store already holds credentials, `LoggedOut`
    /// otherwise. Timers do not run until [`start`](Self::start).
    pub fn new(store: Arc<dyn CredentialStore>, settings: SessionSettings) -> Self {
        let phase = if store.is_authenticated() {
            SessionPhase::Active
        } else {
            SessionPhase::LoggedOut
        };
        let user = store.user_name();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = MonitorState {
            phase,
            activity: ActivityTracker::new(),
            warning: SessionWarningState::default(),
            user,
            countdown_generation: 0,
            countdown: None,
            poller: None,
        };
        Self {
            shared: Arc::new(Shared { state: Mutex::new(state), store, settings, events }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.shared.settings
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.shared.store
    }

    /// Start the periodic poller. The first check runs one interval from now.
    /// Calling it again while running does nothing. Must be called from inside
    /// a tokio runtime.
    pub fn start(&self) {
        let mut state = resilient_lock(&self.shared.state);
        if state.poller.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let period = self.shared.settings.poll_interval();
        let weak = Arc::downgrade(&self.shared);

        // A warning survives stop(); re-arm its countdown. A past deadline fires at once.
        if state.phase == SessionPhase::WarningShown && state.countdown.is_none() {
            if let Some(deadline) = state.warning.deadline() {
                state.cancel_countdown();
                let generation = state.countdown_generation;
                state.countdown = Some(spawn_countdown(weak.clone(), deadline, generation));
            }
        }

        state.poller = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(shared) => shared.poll(),
                    None => break,
                }
            }
        }));
        tracing::debug!(
            "SESSION_MONITOR_STARTED | poll={}s warn_after={}s logout_after={}s",
            period.as_secs(),
            self.shared.settings.warning_after_secs,
            self.shared.settings.auto_logout_after_secs
        );
    }

    /// Stop the poller and any pending countdown. Phase and warning are kept;
    /// [`start`](Self::start) re-arms the countdown for a pending warning.
    pub fn stop(&self) {
        let mut state = resilient_lock(&self.shared.state);
        if let Some(handle) = state.poller.take() {
            handle.abort();
        }
        state.cancel_countdown();
        tracing::debug!("SESSION_MONITOR_STOPPED | phase={}", state.phase);
    }

    /// Begin a fresh `Active` session after a successful login.
    pub fn reset(&self) {
        let user = self.shared.store.user_name();
        let mut state = resilient_lock(&self.shared.state);
        state.cancel_countdown();
        state.warning.clear();
        state.activity.record_activity();
        state.user = user;
        state.phase = SessionPhase::Active;
        tracing::info!("SESSION_STARTED | user={}", state.user_label());
    }

    /// Note a user interaction. While the warning is shown this does not
    /// dismiss it; only [`continue_session`](Self::continue_session) does.
    pub fn record_activity(&self) {
        resilient_lock(&self.shared.state).activity.record_activity();
    }

    pub fn inactive_duration(&self) -> Duration {
        resilient_lock(&self.shared.state).activity.inactive_duration()
    }

    pub fn phase(&self) -> SessionPhase {
        resilient_lock(&self.shared.state).phase
    }

    pub fn warning(&self) -> SessionWarningState {
        resilient_lock(&self.shared.state).warning
    }

    pub fn is_authenticated(&self) -> bool {
        self.shared.store.is_authenticated()
    }

    /// Confirm the session from the warning. Returns whether a warning was
    /// dismissed; in any other phase this only records activity.
    pub fn continue_session(&self) -> bool {
        let mut state = resilient_lock(&self.shared.state);
        state.activity.record_activity();
        if state.phase != SessionPhase::WarningShown {
            return false;
        }
        state.cancel_countdown();
        state.warning.clear();
        state.phase = SessionPhase::Active;
        self.shared.publish(&state, SessionEvent::Continued);
        true
    }

    /// Log out from any phase. Credentials and warning are always cleared.
    pub fn logout(&self) {
        let mut state = resilient_lock(&self.shared.state);
        self.shared.logout_locked(&mut state, LogoutReason::Explicit);
    }

    /// Run one inactivity check immediately, outside the poller schedule.
    pub fn poll_now(&self) {
        self.shared.poll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::credentials::{Credentials, MemoryCredentialStore};

    fn settings() -> SessionSettings {
        SessionSettings { warning_after_secs: 60, auto_logout_after_secs: 30, poll_interval_secs: 10 }
    }

    fn logged_in() -> (Arc<MemoryCredentialStore>, SessionMonitor) {
        let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials::new(
            "tok",
            Some("ana".into()),
        )));
        let monitor = SessionMonitor::new(store.clone(), settings());
        (store, monitor)
    }

    #[tokio::test]
    async fn test_initial_phase_follows_store() {
        let (_, monitor) = logged_in();
        assert_eq!(monitor.phase(), SessionPhase::Active);

        let empty = SessionMonitor::new(Arc::new(MemoryCredentialStore::new()), settings());
        assert_eq!(empty.phase(), SessionPhase::LoggedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_warning_requires_strictly_more_than_threshold() {
        let (_, monitor) = logged_in();
        tokio::time::advance(Duration::from_secs(60)).await;
        monitor.poll_now();
        assert_eq!(monitor.phase(), SessionPhase::Active);

        tokio::time::advance(Duration::from_millis(1)).await;
        monitor.poll_now();
        assert_eq!(monitor.phase(), SessionPhase::WarningShown);
        let warning = monitor.warning();
        assert!(warning.is_visible());
        assert_eq!(warning.remaining(), Some(Duration::from_secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_poll_does_not_restart_countdown() {
        let (_, monitor) = logged_in();
        tokio::time::advance(Duration::from_secs(61)).await;
        monitor.poll_now();
        let first = monitor.warning().deadline();
        tokio::time::advance(Duration::from_secs(10)).await;
        monitor.poll_now();
        assert_eq!(monitor.warning().deadline(), first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_during_warning_does_not_dismiss() {
        let (_, monitor) = logged_in();
        tokio::time::advance(Duration::from_secs(61)).await;
        monitor.poll_now();
        monitor.record_activity();
        assert_eq!(monitor.phase(), SessionPhase::WarningShown);
        assert!(monitor.warning().is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_continue_session_returns_to_active() {
        let (store, monitor) = logged_in();
        let mut events = monitor.subscribe();
        tokio::time::advance(Duration::from_secs(61)).await;
        monitor.poll_now();
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::WarningShown { .. }));

        assert!(monitor.continue_session());
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Continued);
        assert_eq!(monitor.phase(), SessionPhase::Active);
        assert_eq!(monitor.warning(), SessionWarningState::default());
        assert_eq!(monitor.inactive_duration(), Duration::ZERO);

        // Past the old deadline nothing happens.
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(monitor.phase(), SessionPhase::Active);
        assert!(store.is_authenticated());
        assert!(!monitor.continue_session());
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_logs_out() {
        let (store, monitor) = logged_in();
        let mut events = monitor.subscribe();
        tokio::time::advance(Duration::from_secs(61)).await;
        monitor.poll_now();
        let _ = events.recv().await;

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(monitor.phase(), SessionPhase::LoggedOut);
        assert!(!store.is_authenticated());
        assert!(!monitor.warning().is_visible());
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::LoggedOut { reason: LogoutReason::AutoLogout }
        );
    }

    #[tokio::test]
    async fn test_logout_from_any_phase_clears_everything() {
        let (store, monitor) = logged_in();
        monitor.logout();
        assert_eq!(monitor.phase(), SessionPhase::LoggedOut);
        assert!(!store.is_authenticated());

        // Logging out again still clears a store that was refilled elsewhere.
        store.save(&Credentials::new("other", None)).unwrap();
        monitor.logout();
        assert!(!store.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_credentials_force_logged_out() {
        let (store, monitor) = logged_in();
        let mut events = monitor.subscribe();
        tokio::time::advance(Duration::from_secs(61)).await;
        monitor.poll_now();
        let _ = events.recv().await;

        store.clear();
        monitor.poll_now();
        assert_eq!(monitor.phase(), SessionPhase::LoggedOut);
        assert!(!monitor.warning().is_visible());
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::LoggedOut { reason: LogoutReason::CredentialsMissing }
        );
    }

    #[tokio::test]
    async fn test_reset_after_login() {
        let store = Arc::new(MemoryCredentialStore::new());
        let monitor = SessionMonitor::new(store.clone(), settings());
        assert_eq!(monitor.phase(), SessionPhase::LoggedOut);

        store.save(&Credentials::new("fresh", Some("luis".into()))).unwrap();
        monitor.reset();
        assert_eq!(monitor.phase(), SessionPhase::Active);
        assert!(!monitor.warning().is_visible());
    }

    #[tokio::test]
    async fn test_logged_out_poll_is_noop() {
        let monitor = SessionMonitor::new(Arc::new(MemoryCredentialStore::new()), settings());
        let mut events = monitor.subscribe();
        monitor.poll_now();
        assert!(matches!(events.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
    }
}
