//! Guest chat: rate-limit guard and unauthenticated send flow.
//!
//! The backend rate-limits anonymous visitors and answers 429 with a wait
//! time. The guard mirrors that block locally: it persists the deadline as
//! epoch seconds so a reload resumes the countdown, suppresses outbound
//! sends while blocked, and reopens exactly once when the countdown hits
//! zero.

use lyra_core::clock::Clock;
use lyra_core::conversation::ChatMessage;
use lyra_core::error::{LyraError, Result};
use lyra_core::i18n::LanguageTag;
use lyra_core::services::ChatService;
use lyra_infrastructure::session_store::SessionStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upper bound on the client-side history sent with each guest request.
/// Oldest entries are dropped beyond this.
pub const GUEST_HISTORY_LIMIT: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    Open,
    Blocked { block_until: i64 },
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardTick {
    /// Still blocked; display the remaining seconds.
    Blocked { remaining: u64 },
    /// Open; messages are permitted again.
    Open,
}

/// Renders a remaining wait as `m:ss` with zero-padded seconds.
pub fn format_remaining(remaining: u64) -> String {
    format!("{}:{:02}", remaining / 60, remaining % 60)
}

/// Callback invoked on every countdown tick while blocked.
pub type CountdownHook = Arc<dyn Fn(u64) + Send + Sync>;

/// Tracks whether the anonymous visitor may send messages.
pub struct RateLimitGuard {
    store: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    state: Mutex<GuardState>,
}

impl RateLimitGuard {
    /// Initializes from the persisted deadline: a future deadline resumes
    /// Blocked, a past one is cleared and the guard starts Open.
    pub fn new(store: Arc<SessionStore>, clock: Arc<dyn Clock>) -> Self {
        let state = match store.guest_block_until() {
            Some(deadline) if deadline > clock.now_epoch() => GuardState::Blocked {
                block_until: deadline,
            },
            Some(_) => {
                store.clear_guest_block_until();
                GuardState::Open
            }
            None => GuardState::Open,
        };

        Self {
            store,
            clock,
            state: Mutex::new(state),
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(*self.state.lock().unwrap(), GuardState::Blocked { .. })
    }

    /// Remaining wait in seconds, without any state transition.
    pub fn remaining(&self) -> Option<u64> {
        match *self.state.lock().unwrap() {
            GuardState::Open => None,
            GuardState::Blocked { block_until } => {
                Some((block_until - self.clock.now_epoch()).max(0) as u64)
            }
        }
    }

    /// Enters the Blocked state for `retry_after_seconds`, persisting the
    /// deadline so a restart resumes the countdown.
    pub fn block_for(&self, retry_after_seconds: u64) {
        let block_until = self.clock.now_epoch() + retry_after_seconds as i64;
        self.store.set_guest_block_until(block_until);
        *self.state.lock().unwrap() = GuardState::Blocked { block_until };
        tracing::info!(
            target: "guest",
            retry_after_seconds,
            "Guest chat blocked by rate limit"
        );
    }

    /// One countdown step. While the deadline is in the future this reports
    /// the remaining seconds; once it is reached the guard transitions to
    /// Open (exactly once) and clears the persisted deadline.
    pub fn tick(&self) -> GuardTick {
        let mut state = self.state.lock().unwrap();
        match *state {
            GuardState::Open => GuardTick::Open,
            GuardState::Blocked { block_until } => {
                let remaining = block_until - self.clock.now_epoch();
                if remaining > 0 {
                    GuardTick::Blocked {
                        remaining: remaining as u64,
                    }
                } else {
                    *state = GuardState::Open;
                    self.store.clear_guest_block_until();
                    GuardTick::Open
                }
            }
        }
    }

    /// Fails fast with the remaining wait while blocked; no network call is
    /// made for a send attempted during an already-announced block.
    pub fn ensure_open(&self) -> Result<()> {
        match self.tick() {
            GuardTick::Open => Ok(()),
            GuardTick::Blocked { remaining } => Err(LyraError::RateLimited {
                retry_after_seconds: remaining,
            }),
        }
    }

    /// Clears the block unconditionally (used on successful authentication).
    pub fn clear(&self) {
        self.store.clear_guest_block_until();
        *self.state.lock().unwrap() = GuardState::Open;
    }

    /// Spawns the 1-second countdown task. The hook receives the remaining
    /// seconds on each tick; the task terminates itself when the guard
    /// reopens.
    pub fn spawn_countdown(self: &Arc<Self>, on_tick: CountdownHook) -> tokio::task::JoinHandle<()> {
        let guard = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            // Consume the immediate first tick so the loop runs on whole seconds
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match guard.tick() {
                    GuardTick::Blocked { remaining } => on_tick(remaining),
                    GuardTick::Open => break,
                }
            }
        })
    }
}

/// Guest chat flow: bounded client-side history plus the rate-limit guard.
pub struct GuestChatUsecase {
    chat: Arc<dyn ChatService>,
    guard: Arc<RateLimitGuard>,
    history: Mutex<Vec<ChatMessage>>,
}

impl GuestChatUsecase {
    pub fn new(chat: Arc<dyn ChatService>, guard: Arc<RateLimitGuard>) -> Self {
        Self {
            chat,
            guard,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn guard(&self) -> &Arc<RateLimitGuard> {
        &self.guard
    }

    /// The history that would accompany the next send.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().unwrap().clone()
    }

    /// Sends a guest chat turn.
    ///
    /// Fails fast while blocked. On a 429 the guard enters Blocked with the
    /// server-provided wait; on success both turns join the bounded history.
    pub async fn send(&self, text: &str, language: LanguageTag) -> Result<String> {
        let text = crate::validate_message_text(text)?.to_string();
        self.guard.ensure_open()?;

        let prior_history = self.history.lock().unwrap().clone();
        match self.chat.send_guest(&text, &prior_history, language).await {
            Ok(reply) => {
                let mut history = self.history.lock().unwrap();
                history.push(ChatMessage::user(text));
                history.push(ChatMessage::assistant(reply.clone()));
                let len = history.len();
                if len > GUEST_HISTORY_LIMIT {
                    history.drain(..len - GUEST_HISTORY_LIMIT);
                }
                Ok(reply)
            }
            Err(LyraError::RateLimited {
                retry_after_seconds,
            }) => {
                self.guard.block_for(retry_after_seconds);
                Err(LyraError::RateLimited {
                    retry_after_seconds,
                })
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lyra_core::services::ChatOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Clock double whose time the test advances by hand.
    struct MockClock {
        now: Mutex<i64>,
    }

    impl MockClock {
        fn at(start: i64) -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(start),
            })
        }

        fn advance(&self, seconds: i64) {
            *self.now.lock().unwrap() += seconds;
        }
    }

    impl Clock for MockClock {
        fn now_epoch(&self) -> i64 {
            *self.now.lock().unwrap()
        }
    }

    struct MockChat {
        calls: AtomicUsize,
        results: Mutex<Vec<Result<String>>>,
    }

    impl MockChat {
        fn scripted(results: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                results: Mutex::new(results),
            })
        }
    }

    #[async_trait]
    impl ChatService for MockChat {
        async fn send(
            &self,
            _text: &str,
            _conversation_id: Option<i64>,
            _language: LanguageTag,
        ) -> Result<ChatOutcome> {
            unreachable!("authenticated flow is not exercised here")
        }

        async fn send_guest(
            &self,
            _text: &str,
            _history: &[ChatMessage],
            _language: LanguageTag,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results.lock().unwrap().remove(0)
        }
    }

    fn store_in(dir: &TempDir) -> Arc<SessionStore> {
        Arc::new(SessionStore::open(dir.path().join("session.toml")))
    }

    #[test]
    fn countdown_decreases_by_one_per_tick_and_reopens_once() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let clock = MockClock::at(1_000);
        let guard = RateLimitGuard::new(store.clone(), clock.clone());

        guard.block_for(120);
        assert_eq!(guard.remaining(), Some(120));
        assert_eq!(format_remaining(guard.remaining().unwrap()), "2:00");

        clock.advance(1);
        assert_eq!(guard.tick(), GuardTick::Blocked { remaining: 119 });
        assert_eq!(format_remaining(119), "1:59");

        for expected in (1..119).rev() {
            clock.advance(1);
            assert_eq!(
                guard.tick(),
                GuardTick::Blocked {
                    remaining: expected
                }
            );
        }

        // The 120th tick reaches the deadline and reopens
        clock.advance(1);
        assert_eq!(guard.tick(), GuardTick::Open);
        assert!(store.guest_block_until().is_none());
        assert!(!guard.is_blocked());

        // Further ticks stay Open with no second transition
        assert_eq!(guard.tick(), GuardTick::Open);
    }

    #[test]
    fn past_persisted_deadline_starts_open_and_clears_the_key() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_guest_block_until(995);

        let clock = MockClock::at(1_000);
        let guard = RateLimitGuard::new(store.clone(), clock);

        assert!(!guard.is_blocked());
        assert!(store.guest_block_until().is_none());
    }

    #[test]
    fn future_persisted_deadline_resumes_blocked() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_guest_block_until(1_090);

        let clock = MockClock::at(1_000);
        let guard = RateLimitGuard::new(store.clone(), clock);

        assert!(guard.is_blocked());
        assert_eq!(guard.remaining(), Some(90));
        assert_eq!(format_remaining(90), "1:30");
    }

    #[test]
    fn zero_retry_after_reopens_on_the_next_tick() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let clock = MockClock::at(1_000);
        let guard = RateLimitGuard::new(store.clone(), clock);

        guard.block_for(0);
        assert!(guard.is_blocked());
        assert_eq!(guard.tick(), GuardTick::Open);
        assert!(store.guest_block_until().is_none());
    }

    #[tokio::test]
    async fn blocked_guard_suppresses_the_network_call() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let clock = MockClock::at(1_000);
        let guard = Arc::new(RateLimitGuard::new(store, clock));
        let chat = MockChat::scripted(vec![]);
        let usecase = GuestChatUsecase::new(chat.clone(), guard.clone());

        guard.block_for(60);
        let err = usecase.send("oi", LanguageTag::PtBr).await.unwrap_err();
        assert!(matches!(
            err,
            LyraError::RateLimited {
                retry_after_seconds: 60
            }
        ));
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rate_limited_send_enters_blocked_with_persisted_deadline() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let clock = MockClock::at(1_000);
        let guard = Arc::new(RateLimitGuard::new(store.clone(), clock));
        let chat = MockChat::scripted(vec![Err(LyraError::RateLimited {
            retry_after_seconds: 120,
        })]);
        let usecase = GuestChatUsecase::new(chat, guard.clone());

        let err = usecase.send("5th message", LanguageTag::PtBr).await;
        assert!(err.unwrap_err().is_rate_limited());
        assert!(guard.is_blocked());
        assert_eq!(store.guest_block_until(), Some(1_120));
        assert_eq!(format_remaining(guard.remaining().unwrap()), "2:00");
        // The rejected turn never joins the history
        assert!(usecase.history().is_empty());
    }

    #[tokio::test]
    async fn successful_sends_accumulate_bounded_history() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let clock = MockClock::at(1_000);
        let guard = Arc::new(RateLimitGuard::new(store, clock));
        let replies: Vec<Result<String>> = (0..30).map(|i| Ok(format!("reply {i}"))).collect();
        let chat = MockChat::scripted(replies);
        let usecase = GuestChatUsecase::new(chat, guard);

        for i in 0..30 {
            usecase
                .send(&format!("msg {i}"), LanguageTag::PtBr)
                .await
                .unwrap();
        }

        let history = usecase.history();
        assert_eq!(history.len(), GUEST_HISTORY_LIMIT);
        // Oldest entries were dropped; the tail is intact
        assert_eq!(history.last().unwrap().content, "reply 29");
        assert_eq!(history.first().unwrap().content, "msg 10");
    }

    #[tokio::test]
    async fn countdown_task_terminates_when_the_guard_reopens() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let clock = MockClock::at(1_000);
        let guard = Arc::new(RateLimitGuard::new(store, clock.clone()));

        guard.block_for(2);
        let ticks = Arc::new(AtomicUsize::new(0));
        let seen = ticks.clone();
        let advancing = clock.clone();
        let handle = guard.spawn_countdown(Arc::new(move |_remaining| {
            seen.fetch_add(1, Ordering::SeqCst);
            advancing.advance(1);
        }));

        // Pre-advance so the first scheduled tick observes 1s elapsed
        clock.advance(1);
        handle.await.unwrap();

        assert!(!guard.is_blocked());
        assert!(ticks.load(Ordering::SeqCst) >= 1);
    }
}
