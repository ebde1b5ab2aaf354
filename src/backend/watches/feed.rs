use super::super::accumulator::BatchAccumulator;
use super::super::config::Config;
use super::super::fetcher::PageFetcher;
use super::super::layout::LayoutDistributor;
use super::super::policy::ContentPolicy;
use super::super::session::{FeedSnapshot, Session};
use super::super::{Watch, Watcher};
use crate::model::Layout;
use crate::moderation::{ModerationFilter, ModerationPolicy};
use crate::query::FeedQuery;
use crate::source::{ContentSource, Identity};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};

impl<S, M> Watcher<S, M>
where
    S: ContentSource + 'static,
    M: ModerationPolicy + 'static,
{
    pub fn feed(&self, query: FeedQuery, layout: Layout) -> FeedWatcher<S, M> {
        FeedWatcher {
            query,
            layout,
            source: self.source.clone(),
            moderation: self.moderation.clone(),
            identity: self.identity.clone(),
            config: self.config.clone(),
            distributor: LayoutDistributor::new(self.metrics.clone()),
            tx: Mutex::new(None),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Refresh,
    LoadMore,
    Quit,
}

/// Feed consumer handle: snapshots out, refresh and load-more in.
///
/// A watcher drives at most one live session. Subscribing again ends the
/// previous session; independent views use one watcher each.
pub struct FeedWatcher<S, M> {
    query: FeedQuery,
    layout: Layout,
    source: Arc<S>,
    moderation: Arc<M>,
    identity: Option<Identity>,
    config: Config,
    distributor: LayoutDistributor,
    tx: Mutex<Option<broadcast::Sender<Command>>>,
}

impl<S, M> FeedWatcher<S, M>
where
    S: ContentSource + 'static,
    M: ModerationPolicy + 'static,
{
    pub fn query(&self) -> &FeedQuery {
        &self.query
    }
    pub fn layout(&self) -> Layout {
        self.layout
    }
    /// Requests the next batch, typically when the view scrolls near its end.
    pub fn load_more(&self) {
        self.send(Command::LoadMore);
    }
    fn accumulator(&self) -> BatchAccumulator<S, M> {
        let fetcher = PageFetcher::new(
            self.source.clone(),
            self.query.clone(),
            self.identity.clone(),
            self.config.batch.page_limit,
        );
        BatchAccumulator::new(
            fetcher,
            ContentPolicy::new(&self.query, self.layout),
            ModerationFilter::new(self.moderation.clone()),
            &self.config,
        )
    }
    fn replace_sender(
        &self,
        tx: Option<broadcast::Sender<Command>>,
    ) -> Option<broadcast::Sender<Command>> {
        let mut current = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, tx)
    }
    fn send(&self, command: Command) {
        let current = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = current.as_ref() else {
            log::warn!("no session for {command:?}");
            return;
        };
        if let Err(e) = tx.send(command) {
            log::warn!("failed to send {command:?}: {e}");
        }
    }
}

impl<S, M> Watch for FeedWatcher<S, M>
where
    S: ContentSource + 'static,
    M: ModerationPolicy + 'static,
{
    type Output = FeedSnapshot;

    fn subscribe(&self) -> watch::Receiver<Self::Output> {
        let mut session = Session::new(
            Arc::new(self.accumulator()),
            self.layout,
            self.distributor.clone(),
            self.config.intervals.load_more(),
        );
        let (command_tx, mut command) = broadcast::channel(16);
        if self.replace_sender(Some(command_tx)).is_some() {
            log::debug!("replace session for {}", self.query);
        }
        let (tx, rx) = watch::channel(FeedSnapshot::default());
        let query = self.query.clone();
        tokio::spawn(async move {
            let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
            session.start(&outcome_tx);
            tx.send_replace(session.snapshot());
            loop {
                let changed = tokio::select! {
                    received = command.recv() => match received {
                        Ok(Command::Refresh) => session.refresh(&outcome_tx),
                        Ok(Command::LoadMore) => session.load_more(&outcome_tx),
                        Ok(Command::Quit) => break,
                        Err(RecvError::Lagged(n)) => {
                            log::warn!("{n} commands skipped");
                            false
                        }
                        Err(RecvError::Closed) => break,
                    },
                    Some(outcome) = outcome_rx.recv() => session.complete(outcome),
                    _ = tx.closed() => break,
                };
                if changed {
                    tx.send_replace(session.snapshot());
                }
            }
            session.cancel();
            log::debug!("quit {query}");
        });
        rx
    }
    fn unsubscribe(&self) {
        if let Some(tx) = self.replace_sender(None) {
            tx.send(Command::Quit).ok();
        }
    }
    fn refresh(&self) {
        self.send(Command::Refresh);
    }
}
