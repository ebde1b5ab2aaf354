use crate::error::SourceError;
use crate::model::Cursor;
use crate::query::{is_generator_uri, AuthorFilter, FeedQuery};
use crate::source::{ContentSource, Endpoint, Identity, Page, PageRequest};
use std::sync::{Arc, OnceLock};

/// Performs single page requests for one feed query.
pub struct PageFetcher<S> {
    source: Arc<S>,
    query: FeedQuery,
    identity: Option<Identity>,
    limit: u8,
    pinned: OnceLock<Endpoint>,
}

impl<S> PageFetcher<S>
where
    S: ContentSource,
{
    pub fn new(source: Arc<S>, query: FeedQuery, identity: Option<Identity>, limit: u8) -> Self {
        Self {
            source,
            query,
            identity,
            limit,
            pinned: OnceLock::new(),
        }
    }
    pub fn query(&self) -> &FeedQuery {
        &self.query
    }
    /// Primary endpoint for the query.
    pub fn resolve(&self) -> Result<Endpoint, SourceError> {
        Ok(match &self.query {
            FeedQuery::PrivateCollection(kind) => {
                let Some(identity) = &self.identity else {
                    return Err(SourceError::AuthRequired);
                };
                Endpoint::Collection {
                    kind: *kind,
                    owner: identity.did.clone(),
                }
            }
            FeedQuery::Search(query, sort) => Endpoint::Search {
                query: query.clone(),
                sort: *sort,
            },
            FeedQuery::GeneratorFeed(uri) => Endpoint::Generator { uri: uri.clone() },
            FeedQuery::AuthorFeed(actor, filter) => Endpoint::Author {
                actor: actor.clone(),
                filter: *filter,
            },
            FeedQuery::Following => Endpoint::Timeline,
        })
    }
    /// Alternative endpoint for descriptors that may name either a feed or an actor.
    pub fn fallback(&self) -> Option<Endpoint> {
        match &self.query {
            FeedQuery::GeneratorFeed(uri) if !is_generator_uri(uri) => Some(Endpoint::Author {
                actor: uri.clone(),
                filter: AuthorFilter::PostsAndAuthorThreads,
            }),
            FeedQuery::AuthorFeed(actor, _) if is_generator_uri(actor) => {
                Some(Endpoint::Generator { uri: actor.clone() })
            }
            _ => None,
        }
    }
    pub async fn fetch(&self, cursor: Option<&Cursor>) -> Result<Page, SourceError> {
        if let Some(endpoint) = self.pinned.get() {
            return self.request(endpoint.clone(), cursor).await;
        }
        let endpoint = self.resolve()?;
        let result = match self.request(endpoint.clone(), cursor).await {
            Err(SourceError::NotFound(reason)) if cursor.is_none() => {
                let Some(fallback) = self.fallback() else {
                    return Err(SourceError::NotFound(reason));
                };
                log::info!(
                    "{} not found ({reason}), falling back to {}",
                    endpoint.key(),
                    fallback.key()
                );
                self.request(fallback.clone(), cursor)
                    .await
                    .map(|page| (fallback, page))
            }
            result => result.map(|page| (endpoint, page)),
        };
        let (endpoint, page) = result?;
        if self.pinned.set(endpoint).is_err() {
            log::debug!("endpoint already pinned");
        }
        Ok(page)
    }
    async fn request(&self, endpoint: Endpoint, cursor: Option<&Cursor>) -> Result<Page, SourceError> {
        let request = PageRequest {
            endpoint,
            cursor: cursor.cloned(),
            limit: self.limit,
        };
        let page = self.source.get_page(&request).await?;
        log::debug!(
            "fetch {} items from {} (next cursor: {:?})",
            page.items.len(),
            request.endpoint.key(),
            page.cursor
        );
        Ok(page)
    }
}
