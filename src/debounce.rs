//! Debounced search-as-you-type.
//!
//! Each call to [`SearchDebouncer::input`] replaces the single pending timer.
//! Only a timer that survives the full delay runs a search, and its results
//! are sent only if no newer input arrived in the meantime. Clearing the
//! input cancels the pending timer and emits [`SearchUpdate::Cleared`] at
//! once.
//!
//! A search that has already left its timer is never aborted. It runs to
//! completion and its result is dropped if the input moved on.
//!
//! Updates are delivered on an unbounded tokio channel so the renderer can
//! consume them at its own pace.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use book_assist_core::models::Language;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::SearchReply;
use crate::orchestrator::Orchestrator;
use crate::traits::{Backend, Probe};

#[derive(Debug, Clone, PartialEq)]
pub enum SearchUpdate {
    /// The input was emptied; any shown results should be removed.
    Cleared,
    Results {
        query: String,
        reply: SearchReply,
        degraded: bool,
    },
    /// The search failed on both paths.
    Failed { query: String, message: String },
}

/// The most recent spawned search.
struct PendingSearch {
    handle: JoinHandle<()>,
    /// Cleared by the task once its timer has elapsed.
    sleeping: Arc<AtomicBool>,
}

impl PendingSearch {
    /// Abort the task if it is still waiting on its timer; otherwise let it
    /// finish so the remote call is not cut off.
    fn supersede(self) {
        if self.sleeping.load(Ordering::SeqCst) {
            self.handle.abort();
        }
    }
}

struct DebounceState {
    pending: Option<PendingSearch>,
    language: Language,
}

pub struct SearchDebouncer<R, L> {
    orchestrator: Arc<Orchestrator<R, L>>,
    delay: Duration,
    generation: Arc<AtomicU64>,
    state: Mutex<DebounceState>,
    updates: mpsc::UnboundedSender<SearchUpdate>,
}

impl<R, L> SearchDebouncer<R, L>
where
    R: Backend + Probe + 'static,
    L: Backend + 'static,
{
    pub fn new(
        orchestrator: Arc<Orchestrator<R, L>>,
        delay: Duration,
        language: Language,
    ) -> (Self, mpsc::UnboundedReceiver<SearchUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            orchestrator,
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            state: Mutex::new(DebounceState {
                pending: None,
                language,
            }),
            updates,
        };
        (debouncer, rx)
    }

    fn state(&self) -> MutexGuard<'_, DebounceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator<R, L>> {
        &self.orchestrator
    }

    pub fn set_language(&self, language: Language) {
        self.state().language = language;
    }

    /// Record a keystroke: the current contents of the search box.
    pub fn input(&self, text: &str) {
        self.schedule(text, self.delay);
    }

    /// Search immediately, superseding any pending timer.
    pub fn search_now(&self, text: &str) {
        self.schedule(text, Duration::ZERO);
    }

    /// True while a timer or its search has not finished.
    pub fn is_pending(&self) -> bool {
        self.state()
            .pending
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
    }

    fn schedule(&self, text: &str, delay: Duration) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state();
        if let Some(previous) = state.pending.take() {
            previous.supersede();
        }

        let query = text.trim();
        if query.is_empty() {
            debug!("search input cleared");
            let _ = self.updates.send(SearchUpdate::Cleared);
            return;
        }

        let sleeping = Arc::new(AtomicBool::new(true));
        let task = DebouncedSearch {
            orchestrator: Arc::clone(&self.orchestrator),
            latest: Arc::clone(&self.generation),
            generation,
            sleeping: Arc::clone(&sleeping),
            query: query.to_string(),
            language: state.language,
            updates: self.updates.clone(),
        };
        state.pending = Some(PendingSearch {
            handle: tokio::spawn(task.run(delay)),
            sleeping,
        });
    }
}

impl<R, L> Drop for SearchDebouncer<R, L> {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = state.pending.take() {
            pending.supersede();
        }
    }
}

struct DebouncedSearch<R, L> {
    orchestrator: Arc<Orchestrator<R, L>>,
    latest: Arc<AtomicU64>,
    generation: u64,
    sleeping: Arc<AtomicBool>,
    query: String,
    language: Language,
    updates: mpsc::UnboundedSender<SearchUpdate>,
}

impl<R, L> DebouncedSearch<R, L>
where
    R: Backend + Probe,
    L: Backend,
{
    fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    async fn run(self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        // The generation is bumped before `sleeping` is read in `schedule`,
        // so a task that misses the abort still sees itself superseded here.
        self.sleeping.store(false, Ordering::SeqCst);
        if !self.is_current() {
            return;
        }

        let result = self.orchestrator.search(&self.query, self.language).await;
        if !self.is_current() {
            debug!(query = %self.query, "discarding superseded search");
            return;
        }

        let update = match result {
            Ok(routed) => SearchUpdate::Results {
                degraded: routed.is_degraded(),
                reply: routed.value,
                query: self.query,
            },
            Err(err) => SearchUpdate::Failed {
                message: err.user_message(),
                query: self.query,
            },
        };
        let _ = self.updates.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalAssistant;
    use crate::testing::ScriptedRemote;
    use book_assist_core::store::memory::MemoryStore;
    use tokio::sync::Semaphore;

    const DELAY: Duration = Duration::from_millis(500);

    fn debouncer(
        remote: ScriptedRemote,
    ) -> (
        SearchDebouncer<ScriptedRemote, LocalAssistant>,
        mpsc::UnboundedReceiver<SearchUpdate>,
    ) {
        let local = LocalAssistant::bundled(Arc::new(MemoryStore::new()), 3).unwrap();
        SearchDebouncer::new(
            Arc::new(Orchestrator::new(remote, local)),
            DELAY,
            Language::En,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_keystroke_searches() {
        let (debouncer, mut rx) = debouncer(ScriptedRemote::offline());

        for text in ["l", "lo", "loco", "locomotion"] {
            debouncer.input(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(debouncer.is_pending());

        match rx.recv().await.unwrap() {
            SearchUpdate::Results {
                query,
                reply,
                degraded,
            } => {
                assert_eq!(query, "locomotion");
                assert!(degraded);
                match reply {
                    SearchReply::Lexical(outcome) => assert_eq!(
                        outcome.best().unwrap().source_id,
                        "06-locomotion-and-manipulation.md"
                    ),
                    other => panic!("unexpected reply: {:?}", other),
                }
            }
            other => panic!("unexpected update: {:?}", other),
        }

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(debouncer.orchestrator().remote().probes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_waits_full_delay() {
        let (debouncer, mut rx) = debouncer(ScriptedRemote::offline());
        debouncer.input("sensors");

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(debouncer.orchestrator().remote().probes(), 0);

        assert!(matches!(
            rx.recv().await.unwrap(),
            SearchUpdate::Results { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_and_emits_immediately() {
        let (debouncer, mut rx) = debouncer(ScriptedRemote::offline());
        debouncer.input("loco");
        debouncer.input("   ");

        assert_eq!(rx.try_recv().unwrap(), SearchUpdate::Cleared);
        assert!(!debouncer.is_pending());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(debouncer.orchestrator().remote().probes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_search_superseded() {
        let gate = Arc::new(Semaphore::new(0));
        let (debouncer, mut rx) = debouncer(ScriptedRemote::online().with_gate(gate.clone()));

        debouncer.input("first");
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(debouncer.orchestrator().remote().calls(), 1);

        debouncer.input("second");
        gate.add_permits(2);

        match rx.recv().await.unwrap() {
            SearchUpdate::Results { query, .. } => assert_eq!(query, "second"),
            other => panic!("unexpected update: {:?}", other),
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_remote_search_runs_to_completion() {
        let (debouncer, mut rx) =
            debouncer(ScriptedRemote::online().with_delay(Duration::from_secs(1)));
        let orchestrator = Arc::clone(debouncer.orchestrator());
        let remote = orchestrator.remote();

        debouncer.input("first");
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(remote.calls(), 1);
        assert_eq!(remote.completed(), 0);

        debouncer.input("second");
        match rx.recv().await.unwrap() {
            SearchUpdate::Results { query, .. } => assert_eq!(query, "second"),
            other => panic!("unexpected update: {:?}", other),
        }
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(remote.completed(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_lets_running_search_finish() {
        let (debouncer, mut rx) =
            debouncer(ScriptedRemote::online().with_delay(Duration::from_secs(1)));
        let orchestrator = Arc::clone(debouncer.orchestrator());

        debouncer.input("first");
        tokio::time::sleep(Duration::from_millis(700)).await;
        drop(debouncer);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(orchestrator.remote().completed(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_now_skips_delay() {
        let (debouncer, mut rx) = debouncer(ScriptedRemote::online());
        debouncer.search_now("perception");

        match rx.recv().await.unwrap() {
            SearchUpdate::Results {
                query, degraded, ..
            } => {
                assert_eq!(query, "perception");
                assert!(!degraded);
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }
}
