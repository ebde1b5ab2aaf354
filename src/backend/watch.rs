use super::config::Config;
use super::layout::Metrics;
use crate::moderation::ModerationPolicy;
use crate::source::{ContentSource, Identity};
use std::sync::Arc;
use tokio::sync::watch;

pub trait Watch {
    type Output;

    fn subscribe(&self) -> watch::Receiver<Self::Output>;
    fn unsubscribe(&self);
    fn refresh(&self);
}

/// Creates feed sessions sharing one source and moderation policy.
pub struct Watcher<S, M> {
    pub source: Arc<S>,
    pub moderation: Arc<M>,
    pub(crate) identity: Option<Identity>,
    pub(crate) config: Config,
    pub(crate) metrics: Metrics,
}

impl<S, M> Watcher<S, M>
where
    S: ContentSource,
    M: ModerationPolicy,
{
    pub fn new(source: Arc<S>, moderation: Arc<M>, identity: Option<Identity>, config: Config) -> Self {
        Self {
            source,
            moderation,
            identity,
            config,
            metrics: Metrics::default(),
        }
    }
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }
}
