//! Asynchronous interface for submitting and superseding searches.
//!
//! Every submitted search gets a new sequence number and runs on a worker,
//! so the interaction thread never blocks on a scan. Only the result of the
//! most recently issued search is ever delivered; older searches that finish
//! later are dropped on arrival. Workers cooperate by polling a cancellation
//! flag that is raised as soon as a newer search is issued.
//!
//! The coordinator holds no reference to its consumers. They subscribe and
//! receive [`SearchEvent`]s over a channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use roaring::RoaringTreemap;
use tracing::{debug, info, warn};

use crate::compile::CompiledExpr;
use crate::config::EngineConfig;
use crate::dataset::{Dataset, SnapshotId};
use crate::error::SearchError;
use crate::execute::{MatchIndex, ScanScope, execute_with};
use crate::parser::QueryParser;

pub type Seq = u64;

/// Cancellation token shared with the worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: Seq,
    pub text: String,
    pub scope: ScanScope,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub seq: Seq,
    pub query: String,
    /// The dataset the rows and match index refer to.
    pub snapshot: SnapshotId,
    pub matched_rows: RoaringTreemap,
    pub match_index: MatchIndex,
    pub total_found: u64,
    pub scanned: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Completed(SearchResult),
    Failed {
        seq: Seq,
        query: String,
        error: SearchError,
    },
}
impl SearchEvent {
    pub fn seq(&self) -> Seq {
        match self {
            SearchEvent::Completed(result) => result.seq,
            SearchEvent::Failed { seq, .. } => *seq,
        }
    }
}

/// `Completed` and `Failed` are terminal; the coordinator is idle in them
/// until the next submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running(Seq),
    Completed(Seq),
    Failed(Seq),
}
impl SessionState {
    pub fn is_idle(&self) -> bool {
        !matches!(self, SessionState::Running(_))
    }
}

// ------------- Dispatch -------------
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Decides where search jobs run.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Runs every search on its own thread.
#[derive(Debug, Default)]
pub struct ThreadDispatch;
impl Dispatch for ThreadDispatch {
    fn dispatch(&self, job: Job) {
        std::thread::spawn(job);
    }
}

// ------------- Coordinator -------------
struct Session {
    latest: Seq,
    cancelled_through: Seq,
    state: SessionState,
    in_flight: HashMap<Seq, CancelToken>,
    subscribers: Vec<Sender<SearchEvent>>,
}
impl Session {
    fn is_current(&self, seq: Seq) -> bool {
        seq == self.latest && seq > self.cancelled_through
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SearchCoordinator {
    config: Arc<EngineConfig>,
    session: Arc<Mutex<Session>>,
    dispatch: Arc<dyn Dispatch>,
}
impl SearchCoordinator {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_dispatch(config, Arc::new(ThreadDispatch))
    }
    pub fn with_dispatch(config: EngineConfig, dispatch: Arc<dyn Dispatch>) -> Self {
        Self {
            config: Arc::new(config),
            session: Arc::new(Mutex::new(Session {
                latest: 0,
                cancelled_through: 0,
                state: SessionState::Idle,
                in_flight: HashMap::new(),
                subscribers: Vec::new(),
            })),
            dispatch,
        }
    }
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registers a consumer. Results are delivered in increasing sequence order.
    pub fn subscribe(&self) -> Receiver<SearchEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.session).subscribers.push(tx);
        rx
    }

    /// Starts a search over a dataset snapshot and returns its sequence number
    /// without waiting for it. Any search still in flight is superseded.
    pub fn submit(&self, dataset: Arc<Dataset>, text: impl Into<String>, scope: ScanScope) -> Seq {
        let cancel = CancelToken::new();
        let request = {
            let mut session = lock(&self.session);
            session.latest += 1;
            let seq = session.latest;
            for (older, token) in session.in_flight.iter() {
                debug!(seq = older, superseded_by = seq, "search superseded");
                token.cancel();
            }
            session.in_flight.insert(seq, cancel.clone());
            session.state = SessionState::Running(seq);
            SearchRequest {
                seq,
                text: text.into(),
                scope,
            }
        };
        let seq = request.seq;
        info!(seq, query = %request.text, dataset = dataset.name(), "search submitted");
        let config = Arc::clone(&self.config);
        let session = Arc::clone(&self.session);
        self.dispatch.dispatch(Box::new(move || {
            let started = Instant::now();
            let outcome = run_search(&request, &dataset, &config, &cancel);
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            deliver(&session, request, outcome, elapsed_ms);
        }));
        seq
    }

    /// Marks the current search as superseded. The worker may keep running
    /// briefly, but its result will not be delivered.
    pub fn cancel(&self) {
        let mut session = lock(&self.session);
        session.cancelled_through = session.latest;
        for token in session.in_flight.values() {
            token.cancel();
        }
        session.state = SessionState::Idle;
        info!(seq = session.latest, "search cancelled");
    }

    pub fn state(&self) -> SessionState {
        lock(&self.session).state
    }

    /// The highest sequence number issued so far.
    pub fn latest(&self) -> Seq {
        lock(&self.session).latest
    }
}

/// Parses, compiles and executes one request on the current thread.
pub fn run_search(
    request: &SearchRequest,
    dataset: &Dataset,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> Result<SearchResult, SearchError> {
    let expression = QueryParser::new(&config.syntax).parse(&request.text)?;
    let compiled = CompiledExpr::compile(&expression, dataset)?;
    let outcome = execute_with(
        &compiled,
        dataset,
        request.scope,
        config.interrupt_interval,
        || cancel.is_cancelled(),
    )?;
    Ok(SearchResult {
        seq: request.seq,
        query: request.text.clone(),
        snapshot: dataset.snapshot(),
        matched_rows: outcome.matched_rows,
        match_index: outcome.match_index,
        total_found: outcome.total_found,
        scanned: outcome.scanned,
    })
}

fn deliver(
    session: &Mutex<Session>,
    request: SearchRequest,
    outcome: Result<SearchResult, SearchError>,
    elapsed_ms: f64,
) {
    let mut session = lock(session);
    session.in_flight.remove(&request.seq);
    if !session.is_current(request.seq) {
        debug!(seq = request.seq, latest = session.latest, "stale result dropped");
        return;
    }
    let event = match outcome {
        Ok(result) => {
            info!(
                seq = result.seq,
                ms = elapsed_ms,
                matched = result.matched_rows.len(),
                total_found = result.total_found,
                "search complete"
            );
            session.state = SessionState::Completed(request.seq);
            SearchEvent::Completed(result)
        }
        Err(error) => {
            warn!(seq = request.seq, %error, "search failed");
            session.state = SessionState::Failed(request.seq);
            SearchEvent::Failed {
                seq: request.seq,
                query: request.text,
                error,
            }
        }
    };
    // consumers that went away are forgotten
    session
        .subscribers
        .retain(|subscriber| subscriber.send(event.clone()).is_ok());
}
