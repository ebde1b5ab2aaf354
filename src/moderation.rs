use crate::model::FeedItem;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationDecision {
    Show,
    Warn,
    Hide,
}

/// Capability deciding how an item is moderated for the current viewer.
pub trait ModerationPolicy: Send + Sync {
    fn decide(&self, item: &FeedItem) -> ModerationDecision;
}

impl<F> ModerationPolicy for F
where
    F: Fn(&FeedItem) -> ModerationDecision + Send + Sync,
{
    fn decide(&self, item: &FeedItem) -> ModerationDecision {
        self(item)
    }
}

/// Removes items the policy decides to hide. Warned items are kept.
pub struct ModerationFilter<M> {
    policy: Arc<M>,
}

impl<M> ModerationFilter<M>
where
    M: ModerationPolicy,
{
    pub fn new(policy: Arc<M>) -> Self {
        Self { policy }
    }
    pub fn permits(&self, item: &FeedItem) -> bool {
        self.policy.decide(item) != ModerationDecision::Hide
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub hide_labels: Vec<String>,
    pub warn_labels: Vec<String>,
    pub muted_actors: Vec<String>,
}

/// Label and mute list based moderation.
#[derive(Debug, Default)]
pub struct LabelModerator {
    hide_labels: HashSet<String>,
    warn_labels: HashSet<String>,
    muted_actors: HashSet<String>,
}

impl LabelModerator {
    pub fn new(config: &Config) -> Self {
        Self {
            hide_labels: config.hide_labels.iter().cloned().collect(),
            warn_labels: config.warn_labels.iter().cloned().collect(),
            muted_actors: config.muted_actors.iter().cloned().collect(),
        }
    }
    fn is_muted(&self, item: &FeedItem) -> bool {
        self.muted_actors.contains(&item.author.did)
            || self.muted_actors.contains(&item.author.handle)
    }
}

impl ModerationPolicy for LabelModerator {
    fn decide(&self, item: &FeedItem) -> ModerationDecision {
        if self.is_muted(item) || item.labels.iter().any(|l| self.hide_labels.contains(l)) {
            ModerationDecision::Hide
        } else if item.labels.iter().any(|l| self.warn_labels.contains(l)) {
            ModerationDecision::Warn
        } else {
            ModerationDecision::Show
        }
    }
}
