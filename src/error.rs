use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified failure reported by a content source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("authentication required")]
    AuthRequired,
    #[error("blocked by actor")]
    BlockedByActor,
    #[error("rate limited")]
    RateLimited,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("{0}")]
    Unknown(String),
}

/// User-facing error taxonomy exposed by a feed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    AuthRequired,
    BlockedByActor,
    Transient,
    Unknown,
}

impl ErrorKind {
    /// Whether the host should offer a retry affordance.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient | Self::Unknown)
    }
    pub fn message(&self) -> &'static str {
        match self {
            Self::AuthRequired => "Sign in to view this feed.",
            Self::BlockedByActor => "You cannot view this feed.",
            Self::Transient => "The feed could not be loaded. Check your connection and try again.",
            Self::Unknown => "Something went wrong while loading the feed.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {source}")]
pub struct FeedError {
    pub kind: ErrorKind,
    pub source: SourceError,
}
