//! Cancellable timeout tokens.
//!
//! A [`Timeout`] is cancelled either when its deadline passes or when
//! [`Timeout::cancel`] is called. Interested parties take a
//! [`CancelSubscription`], which is released when dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

/// Who requested the cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelAgent {
    /// Explicit cancellation through [`Timeout::cancel`]
    User,
    /// The deadline elapsed
    Timer,
}

impl std::fmt::Display for CancelAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelAgent::User => write!(f, "user"),
            CancelAgent::Timer => write!(f, "timer"),
        }
    }
}

/// Delivered to subscribers once the token is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelEvent {
    pub agent: CancelAgent,
}

#[derive(Debug)]
struct Inner {
    started: Instant,
    deadline: Option<Instant>,
    state: watch::Sender<Option<CancelEvent>>,
}

/// Shared cancellation handle. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct Timeout {
    inner: Arc<Inner>,
}

impl Timeout {
    /// Token that cancels itself with [`CancelAgent::Timer`] after `duration`.
    ///
    /// A duration too large to represent as a deadline behaves like [`Timeout::manual`].
    pub fn new(duration: Duration) -> Self {
        let started = Instant::now();
        Self::build(started, started.checked_add(duration))
    }

    /// Token without a deadline; only [`Timeout::cancel`] fires it.
    pub fn manual() -> Self {
        Self::build(Instant::now(), None)
    }

    fn build(started: Instant, deadline: Option<Instant>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                started,
                deadline,
                state,
            }),
        }
    }

    /// Request cancellation on behalf of the user. No-op if already cancelled.
    pub fn cancel(&self) {
        self.fire(CancelAgent::User);
    }

    /// The recorded cancellation, if any. A passed deadline counts as cancelled.
    pub fn cancel_event(&self) -> Option<CancelEvent> {
        if let Some(event) = *self.inner.state.borrow() {
            return Some(event);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(self.fire(CancelAgent::Timer)),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_event().is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started.elapsed()
    }

    /// Time left before the deadline, `None` for manual tokens.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Register a cancellation listener for as long as the returned guard lives.
    pub fn subscribe(&self) -> CancelSubscription {
        CancelSubscription {
            rx: self.inner.state.subscribe(),
            token: self.clone(),
        }
    }

    /// Number of live [`CancelSubscription`]s.
    pub fn listener_count(&self) -> usize {
        self.inner.state.receiver_count()
    }

    // First recorded reason wins.
    fn fire(&self, agent: CancelAgent) -> CancelEvent {
        let mut recorded = CancelEvent { agent };
        self.inner.state.send_if_modified(|state| match state {
            Some(existing) => {
                recorded = *existing;
                false
            }
            None => {
                *state = Some(recorded);
                true
            }
        });
        recorded
    }
}

/// Scoped listener on a [`Timeout`]. Dropping it unregisters the listener.
#[derive(Debug)]
pub struct CancelSubscription {
    rx: watch::Receiver<Option<CancelEvent>>,
    token: Timeout,
}

impl CancelSubscription {
    /// Resolves once the token is cancelled, by the user or by its deadline.
    pub async fn cancelled(&mut self) -> CancelEvent {
        loop {
            if let Some(event) = *self.rx.borrow_and_update() {
                return event;
            }

            let changed = match self.token.inner.deadline {
                Some(deadline) => {
                    tokio::select! {
                        changed = self.rx.changed() => changed,
                        _ = sleep_until(deadline) => return self.token.fire(CancelAgent::Timer),
                    }
                }
                None => self.rx.changed().await,
            };

            // The subscription keeps the sender alive, so this never closes.
            if changed.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_timer_event() {
        let timeout = Timeout::new(Duration::from_millis(500));
        let mut subscription = timeout.subscribe();

        assert!(!timeout.is_cancelled());
        let event = subscription.cancelled().await;

        assert_eq!(event.agent, CancelAgent::Timer);
        assert!(timeout.is_cancelled());
        assert_eq!(timeout.remaining(), Some(Duration::ZERO));
        assert!(timeout.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_user_cancel_wakes_subscribers() {
        let timeout = Timeout::manual();
        let mut subscription = timeout.subscribe();

        let canceller = timeout.clone();
        tokio::spawn(async move {
            canceller.cancel();
        });

        let event = subscription.cancelled().await;
        assert_eq!(event.agent, CancelAgent::User);
        assert_eq!(timeout.cancel_event(), Some(event));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_reason_wins() {
        let timeout = Timeout::new(Duration::from_millis(100));
        timeout.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(
            timeout.cancel_event(),
            Some(CancelEvent {
                agent: CancelAgent::User
            })
        );
    }

    #[tokio::test]
    async fn test_subscribe_after_cancel_resolves_immediately() {
        let timeout = Timeout::manual();
        timeout.cancel();

        let event = timeout.subscribe().cancelled().await;
        assert_eq!(event.agent, CancelAgent::User);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_token_never_times_out() {
        let timeout = Timeout::manual();
        let mut subscription = timeout.subscribe();

        let waited =
            tokio::time::timeout(Duration::from_secs(3600), subscription.cancelled()).await;

        assert!(waited.is_err());
        assert!(!timeout.is_cancelled());
        assert_eq!(timeout.remaining(), None);
    }

    #[test]
    fn test_unbounded_duration_is_manual() {
        let timeout = Timeout::new(Duration::MAX);

        assert_eq!(timeout.remaining(), None);
        assert!(!timeout.is_cancelled());

        timeout.cancel();
        assert_eq!(
            timeout.cancel_event(),
            Some(CancelEvent {
                agent: CancelAgent::User
            })
        );
    }

    #[test]
    fn test_dropping_subscription_releases_listener() {
        let timeout = Timeout::manual();
        assert_eq!(timeout.listener_count(), 0);

        let first = timeout.subscribe();
        let second = timeout.subscribe();
        assert_eq!(timeout.listener_count(), 2);

        drop(first);
        assert_eq!(timeout.listener_count(), 1);
        drop(second);
        assert_eq!(timeout.listener_count(), 0);
    }

    #[test]
    fn test_agent_display() {
        assert_eq!(CancelAgent::User.to_string(), "user");
        assert_eq!(CancelAgent::Timer.to_string(), "timer");
    }
}
