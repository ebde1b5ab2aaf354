use crate::backend::config::Config as EngineConfig;
use crate::backend::layout::Metrics;
use crate::moderation::Config as ModerationConfig;
use crate::source::Identity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub moderation: ModerationConfig,
    #[serde(default)]
    pub layout: Metrics,
    pub identity: Option<String>,
}

impl Config {
    pub fn identity(&self) -> Option<Identity> {
        self.identity
            .as_ref()
            .filter(|did| !did.is_empty())
            .map(|did| Identity { did: did.clone() })
    }
}
