use super::{ContentSource, Page, PageRequest};
use crate::error::SourceError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FailureKind {
    AuthRequired,
    BlockedByActor,
    RateLimited,
    NotFound,
    Transient,
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Entry {
    Failure { error: FailureKind },
    Page(Page),
}

#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    feeds: HashMap<String, Vec<Entry>>,
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Content source replaying recorded pages from a JSON document.
///
/// Page `i` of an endpoint is served for the cursor of page `i - 1`, and the
/// first page for a request without cursor.
#[derive(Debug, Default)]
pub struct FixtureSource {
    feeds: HashMap<String, Vec<Entry>>,
}

impl FixtureSource {
    pub fn from_json(s: &str) -> Result<Self, FixtureError> {
        let document = serde_json::from_str::<Document>(s)?;
        log::debug!("loaded fixture with {} feeds", document.feeds.len());
        Ok(Self {
            feeds: document.feeds,
        })
    }
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
    fn index_of(entries: &[Entry], request: &PageRequest) -> Option<usize> {
        let Some(cursor) = &request.cursor else {
            return Some(0);
        };
        entries
            .iter()
            .position(|entry| matches!(entry, Entry::Page(page) if page.cursor.as_ref() == Some(cursor)))
            .map(|i| i + 1)
    }
}

#[async_trait]
impl ContentSource for FixtureSource {
    async fn get_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        let key = request.endpoint.key();
        let Some(entries) = self.feeds.get(&key) else {
            return Err(SourceError::NotFound(key));
        };
        let Some(index) = Self::index_of(entries, request) else {
            return Err(SourceError::Unknown(format!("unknown cursor for {key}")));
        };
        match entries.get(index) {
            Some(Entry::Page(page)) => {
                let mut page = page.clone();
                let limit = usize::from(request.limit);
                if page.items.len() > limit {
                    log::warn!(
                        "{key} page {index} holds {} items, dropping all past {limit}",
                        page.items.len()
                    );
                    page.items.truncate(limit);
                }
                Ok(page)
            }
            Some(Entry::Failure { error }) => Err(match error {
                FailureKind::AuthRequired => SourceError::AuthRequired,
                FailureKind::BlockedByActor => SourceError::BlockedByActor,
                FailureKind::RateLimited => SourceError::RateLimited,
                FailureKind::NotFound => SourceError::NotFound(key),
                FailureKind::Transient => SourceError::Transient(format!("replayed failure for {key}")),
                FailureKind::Unknown => SourceError::Unknown(format!("replayed failure for {key}")),
            }),
            None => Ok(Page::default()),
        }
    }
}
