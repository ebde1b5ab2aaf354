use super::accumulator::Batch;
use crate::error::{ErrorKind, FeedError, SourceError};
use crate::model::{Cursor, FeedItem};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready,
    LoadingMore,
    Refreshing,
    Failed,
}

#[derive(Debug, Clone)]
pub enum FeedEvent {
    Start,
    Retry,
    Refresh,
    LoadMore,
    Loaded(Batch),
    Failed(SourceError),
}

/// Observable state of one feed session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    items: IndexMap<String, FeedItem>,
    cursor: Option<Cursor>,
    has_more: bool,
    status: Status,
    error: Option<FeedError>,
}

/// Maps an upstream failure to what the host shows.
fn classify(error: &SourceError) -> ErrorKind {
    match error {
        SourceError::AuthRequired => ErrorKind::AuthRequired,
        SourceError::BlockedByActor => ErrorKind::BlockedByActor,
        SourceError::RateLimited | SourceError::Transient(_) => ErrorKind::Transient,
        SourceError::NotFound(_) | SourceError::Unknown(_) => ErrorKind::Unknown,
    }
}

impl SessionState {
    pub fn status(&self) -> Status {
        self.status
    }
    pub fn items(&self) -> impl ExactSizeIterator<Item = &FeedItem> {
        self.items.values()
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn contains(&self, identifier: &str) -> bool {
        self.items.contains_key(identifier)
    }
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }
    pub fn has_more(&self) -> bool {
        self.has_more
    }
    pub fn error(&self) -> Option<&FeedError> {
        self.error.as_ref()
    }
    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }
    pub fn is_loading_more(&self) -> bool {
        self.status == Status::LoadingMore
    }
    pub fn is_refreshing(&self) -> bool {
        self.status == Status::Refreshing
    }
    fn retryable(&self) -> bool {
        self.error.as_ref().is_some_and(|e| e.kind.is_retryable())
    }
    pub fn accepts(&self, event: &FeedEvent) -> bool {
        use Status::*;
        match (self.status, event) {
            (Idle, FeedEvent::Start) => true,
            (Failed, FeedEvent::Retry) => self.retryable(),
            (Loading | Ready | LoadingMore | Refreshing | Failed, FeedEvent::Refresh) => true,
            (Ready, FeedEvent::LoadMore) => self.has_more,
            (Loading | LoadingMore | Refreshing, FeedEvent::Loaded(_) | FeedEvent::Failed(_)) => {
                true
            }
            _ => false,
        }
    }
    /// Applies the event if it is legal in the current status.
    pub fn handle(&mut self, event: FeedEvent) -> bool {
        if !self.accepts(&event) {
            log::debug!("ignore {event:?} in {:?}", self.status);
            return false;
        }
        let prev = self.status;
        match event {
            FeedEvent::Start | FeedEvent::Retry => {
                *self = Self {
                    status: Status::Loading,
                    ..Self::default()
                };
            }
            FeedEvent::Refresh => {
                // a refresh during the initial load simply restarts it
                self.status = if prev == Status::Loading {
                    Status::Loading
                } else {
                    Status::Refreshing
                };
            }
            FeedEvent::LoadMore => {
                self.status = Status::LoadingMore;
            }
            FeedEvent::Loaded(batch) => {
                if prev != Status::LoadingMore {
                    self.items.clear();
                }
                for item in batch.items {
                    if !self.items.contains_key(&item.identifier) {
                        self.items.insert(item.identifier.clone(), item);
                    }
                }
                self.cursor = batch.cursor;
                self.has_more = batch.has_more;
                self.error = None;
                self.status = Status::Ready;
            }
            FeedEvent::Failed(source) => {
                self.error = Some(FeedError {
                    kind: classify(&source),
                    source,
                });
                self.status = Status::Failed;
            }
        }
        log::debug!("{prev:?} -> {:?}", self.status);
        true
    }
}
