use super::accumulator::{Batch, BatchAccumulator};
use super::dedup::DedupTracker;
use super::guard::{Admission, ConcurrencyGuard, Ticket, Trigger};
use super::layout::{Columns, LayoutDistributor};
use super::state::{FeedEvent, SessionState, Status};
use crate::error::{FeedError, SourceError};
use crate::model::{FeedItem, Layout};
use crate::moderation::ModerationPolicy;
use crate::source::ContentSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Result of one spawned accumulation, tagged with the ticket that admitted it.
#[derive(Debug)]
pub struct Outcome {
    ticket: Ticket,
    result: Result<(Batch, DedupTracker), SourceError>,
}

/// What the host renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub items: Vec<FeedItem>,
    pub columns: Option<Columns>,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub is_refreshing: bool,
    pub has_more: bool,
    pub error: Option<FeedError>,
}

/// One feed session: state, dedup tracker, guard and in-flight fetch.
pub struct Session<S, M> {
    state: SessionState,
    seen: DedupTracker,
    guard: ConcurrencyGuard,
    accumulator: Arc<BatchAccumulator<S, M>>,
    layout: Layout,
    distributor: LayoutDistributor,
    task: Option<JoinHandle<()>>,
}

impl<S, M> Session<S, M>
where
    S: ContentSource + 'static,
    M: ModerationPolicy + 'static,
{
    pub fn new(
        accumulator: Arc<BatchAccumulator<S, M>>,
        layout: Layout,
        distributor: LayoutDistributor,
        min_interval: Duration,
    ) -> Self {
        Self {
            state: SessionState::default(),
            seen: DedupTracker::new(),
            guard: ConcurrencyGuard::new(min_interval),
            accumulator,
            layout,
            distributor,
            task: None,
        }
    }
    pub fn state(&self) -> &SessionState {
        &self.state
    }
    pub fn start(&mut self, tx: &UnboundedSender<Outcome>) -> bool {
        self.begin(FeedEvent::Start, Trigger::Initial, tx)
    }
    /// Refreshes the feed. From a failed initial load this retries from scratch.
    pub fn refresh(&mut self, tx: &UnboundedSender<Outcome>) -> bool {
        if self.state.status() == Status::Failed
            && self.state.is_empty()
            && self.state.accepts(&FeedEvent::Retry)
        {
            return self.begin(FeedEvent::Retry, Trigger::Retry, tx);
        }
        self.begin(FeedEvent::Refresh, Trigger::Refresh, tx)
    }
    pub fn load_more(&mut self, tx: &UnboundedSender<Outcome>) -> bool {
        self.begin(FeedEvent::LoadMore, Trigger::LoadMore, tx)
    }
    fn begin(&mut self, event: FeedEvent, trigger: Trigger, tx: &UnboundedSender<Outcome>) -> bool {
        if !self.state.accepts(&event) {
            log::debug!("{trigger:?} not allowed in {:?}", self.state.status());
            return false;
        }
        let ticket = match self.guard.admit(trigger, Instant::now()) {
            Admission::Start(ticket) => ticket,
            Admission::Supersede { ticket, superseded } => {
                log::debug!("{superseded:?} superseded by {ticket:?}");
                self.abort();
                ticket
            }
            admission @ (Admission::Busy | Admission::Throttled) => {
                log::debug!("{trigger:?} dropped: {admission:?}");
                return false;
            }
        };
        self.state.handle(event);
        let (cursor, mut seen) = match trigger {
            Trigger::LoadMore => (self.state.cursor().cloned(), self.seen.clone()),
            Trigger::Initial | Trigger::Retry | Trigger::Refresh => (None, DedupTracker::new()),
        };
        let (accumulator, tx) = (self.accumulator.clone(), tx.clone());
        self.task = Some(tokio::spawn(async move {
            let result = accumulator
                .accumulate(cursor, &mut seen)
                .await
                .map(|batch| (batch, seen));
            if tx.send(Outcome { ticket, result }).is_err() {
                log::warn!("session closed before {ticket:?} completed");
            }
        }));
        true
    }
    /// Applies a finished fetch unless it has been superseded.
    pub fn complete(&mut self, outcome: Outcome) -> bool {
        if !self.guard.complete(outcome.ticket) {
            log::warn!("drop stale result of {:?}", outcome.ticket);
            return false;
        }
        self.task = None;
        match outcome.result {
            Ok((batch, seen)) => {
                log::info!(
                    "{:?} loaded {} items (has more: {})",
                    outcome.ticket.trigger,
                    batch.items.len(),
                    batch.has_more
                );
                self.seen = seen;
                self.state.handle(FeedEvent::Loaded(batch))
            }
            Err(e) => {
                log::warn!("{:?} failed: {e}", outcome.ticket.trigger);
                self.state.handle(FeedEvent::Failed(e))
            }
        }
    }
    /// Drops the in-flight fetch, if any. Its late result is ignored.
    pub fn cancel(&mut self) {
        if let Some(ticket) = self.guard.cancel() {
            log::debug!("cancel {ticket:?}");
        }
        self.abort();
    }
    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
    pub fn snapshot(&self) -> FeedSnapshot {
        let items = self.state.items().cloned().collect::<Vec<_>>();
        let columns = self
            .layout
            .is_grid()
            .then(|| self.distributor.distribute(&items));
        FeedSnapshot {
            items,
            columns,
            is_loading: self.state.is_loading(),
            is_loading_more: self.state.is_loading_more(),
            is_refreshing: self.state.is_refreshing(),
            has_more: self.state.has_more(),
            error: self.state.error().cloned(),
        }
    }
}

impl<S, M> Drop for Session<S, M> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
