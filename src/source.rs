pub mod fixture;

use crate::error::SourceError;
use crate::model::{Cursor, FeedItem};
use crate::query::{AuthorFilter, CollectionKind, SearchSort};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use fixture::FixtureSource;

/// Authenticated account a session reads private collections for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub did: String,
}

/// Upstream call a feed query resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Timeline,
    Generator { uri: String },
    Author { actor: String, filter: AuthorFilter },
    Search { query: String, sort: SearchSort },
    Collection { kind: CollectionKind, owner: String },
}

impl Endpoint {
    /// Stable textual key, used by replay sources and logging.
    pub fn key(&self) -> String {
        match self {
            Self::Timeline => String::from("timeline"),
            Self::Generator { uri } => format!("feed:{uri}"),
            Self::Author { actor, filter } => format!("author:{actor}:{}", filter.as_str()),
            Self::Search { query, sort } => format!("search:{}:{query}", sort.as_str()),
            Self::Collection { kind, .. } => format!("collection:{}", kind.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub endpoint: Endpoint,
    pub cursor: Option<Cursor>,
    pub limit: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub items: Vec<FeedItem>,
    #[serde(default)]
    pub cursor: Option<Cursor>,
}

/// Capability performing one paginated request against the content protocol.
///
/// Implementations must report failures as a classified [`SourceError`] and
/// must be idempotent for the same request.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn get_page(&self, request: &PageRequest) -> Result<Page, SourceError>;
}
