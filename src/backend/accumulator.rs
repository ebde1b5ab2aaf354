use super::config::{Batch as Limits, Config};
use super::dedup::DedupTracker;
use super::fetcher::PageFetcher;
use super::policy::ContentPolicy;
use crate::error::SourceError;
use crate::model::{Cursor, FeedItem};
use crate::moderation::{ModerationFilter, ModerationPolicy};
use crate::source::ContentSource;
use std::time::Duration;
use tokio::time;

/// Display-ready items gathered by one accumulation loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub items: Vec<FeedItem>,
    pub cursor: Option<Cursor>,
    pub has_more: bool,
}

#[derive(Debug)]
struct AccumulationState {
    items: Vec<FeedItem>,
    cursor: Option<Cursor>,
    has_more: bool,
    attempts: u32,
    consecutive_failures: u32,
    barren: u32,
}

/// Fetches and filters pages until enough new items are gathered.
pub struct BatchAccumulator<S, M> {
    fetcher: PageFetcher<S>,
    policy: ContentPolicy,
    moderation: ModerationFilter<M>,
    limits: Limits,
    retry_backoff: Duration,
}

impl<S, M> BatchAccumulator<S, M>
where
    S: ContentSource,
    M: ModerationPolicy,
{
    pub fn new(
        fetcher: PageFetcher<S>,
        policy: ContentPolicy,
        moderation: ModerationFilter<M>,
        config: &Config,
    ) -> Self {
        Self {
            fetcher,
            policy,
            moderation,
            limits: config.batch.clone(),
            retry_backoff: config.intervals.retry_backoff(),
        }
    }
    /// Best effort: the returned batch may hold fewer than `target_count` items.
    pub async fn accumulate(
        &self,
        cursor: Option<Cursor>,
        seen: &mut DedupTracker,
    ) -> Result<Batch, SourceError> {
        let mut state = AccumulationState {
            items: Vec::new(),
            cursor,
            has_more: true,
            attempts: 0,
            consecutive_failures: 0,
            barren: 0,
        };
        let mut last_error = None;
        while state.items.len() < self.limits.target_count
            && state.attempts < self.limits.max_attempts
            && state.has_more
        {
            state.attempts += 1;
            let page = match self.fetcher.fetch(state.cursor.as_ref()).await {
                Ok(page) => page,
                Err(e) => {
                    state.consecutive_failures += 1;
                    log::warn!(
                        "fetch failed ({}/{}): {e}",
                        state.consecutive_failures,
                        self.limits.max_consecutive_failures
                    );
                    if state.consecutive_failures >= self.limits.max_consecutive_failures
                        || !is_retryable(&e)
                    {
                        return Err(e);
                    }
                    last_error = Some(e);
                    if state.attempts < self.limits.max_attempts {
                        time::sleep(self.retry_backoff * state.consecutive_failures).await;
                    }
                    continue;
                }
            };
            state.consecutive_failures = 0;
            last_error = None;

            let raw = page.items.len();
            state.cursor = page.cursor;
            state.has_more = state.cursor.is_some();
            if raw == 0 && !state.has_more {
                log::debug!("source exhausted");
                break;
            }
            let before = state.items.len();
            state.items.extend(page.items.into_iter().filter(|item| {
                self.policy.keep(item)
                    && self.moderation.permits(item)
                    && seen.record(&item.identifier)
            }));
            let fresh = state.items.len() - before;
            log::debug!("page {}: {fresh}/{raw} items kept", state.attempts);
            if fresh == 0 {
                state.barren += 1;
                if state.barren >= self.limits.max_attempts {
                    log::info!("no new items in {} pages, treating feed as exhausted", state.barren);
                    state.has_more = false;
                }
            } else {
                state.barren = 0;
            }
        }
        if let Some(e) = last_error {
            if state.items.is_empty() {
                return Err(e);
            }
            log::warn!("returning {} items after failed attempt: {e}", state.items.len());
        }
        Ok(Batch {
            items: state.items,
            has_more: state.has_more && state.cursor.is_some(),
            cursor: state.cursor,
        })
    }
}

/// Failures that another attempt cannot fix abort the loop right away.
fn is_retryable(error: &SourceError) -> bool {
    matches!(
        error,
        SourceError::RateLimited | SourceError::Transient(_) | SourceError::Unknown(_)
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::tests::{image_item, item};
    use crate::model::Layout;
    use crate::moderation::ModerationDecision;
    use crate::query::FeedQuery;
    use crate::source::{Page, PageRequest};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Endless source: page `n` holds `per_page` fresh items and cursor `n + 1`.
    pub(crate) struct EndlessSource {
        pub(crate) per_page: usize,
        pub(crate) cursors: Mutex<Vec<Option<Cursor>>>,
    }

    impl EndlessSource {
        pub(crate) fn new(per_page: usize) -> Self {
            Self {
                per_page,
                cursors: Mutex::new(Vec::new()),
            }
        }
        pub(crate) fn cursors(&self) -> Vec<Option<Cursor>> {
            self.cursors.lock().expect("poisoned").clone()
        }
    }

    #[async_trait]
    impl ContentSource for EndlessSource {
        async fn get_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
            self.cursors
                .lock()
                .expect("poisoned")
                .push(request.cursor.clone());
            let n = request
                .cursor
                .as_ref()
                .and_then(|c| c.as_str().parse::<usize>().ok())
                .unwrap_or_default();
            Ok(Page {
                items: (0..self.per_page)
                    .map(|i| item(&format!("{n}-{i}")))
                    .collect(),
                cursor: Some(Cursor::new((n + 1).to_string())),
            })
        }
    }

    /// Replays a fixed script of results, one per request.
    pub(crate) struct ScriptedSource {
        pub(crate) script: Mutex<Vec<Result<Page, SourceError>>>,
        pub(crate) calls: Mutex<usize>,
    }

    impl ScriptedSource {
        pub(crate) fn new(script: Vec<Result<Page, SourceError>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().rev().collect()),
                calls: Mutex::new(0),
            }
        }
        pub(crate) fn calls(&self) -> usize {
            *self.calls.lock().expect("poisoned")
        }
    }

    #[async_trait]
    impl ContentSource for ScriptedSource {
        async fn get_page(&self, _: &PageRequest) -> Result<Page, SourceError> {
            *self.calls.lock().expect("poisoned") += 1;
            self.script
                .lock()
                .expect("poisoned")
                .pop()
                .unwrap_or_else(|| Ok(Page::default()))
        }
    }

    pub(crate) fn page(identifiers: &[&str], cursor: Option<&str>) -> Page {
        Page {
            items: identifiers.iter().map(|id| item(id)).collect(),
            cursor: cursor.map(Cursor::new),
        }
    }

    pub(crate) fn test_config() -> Config {
        let mut config = Config::default();
        config.intervals.retry_backoff = 0;
        config.intervals.load_more = 0;
        config
    }

    fn show(_: &FeedItem) -> ModerationDecision {
        ModerationDecision::Show
    }

    fn accumulator<S: ContentSource>(
        source: Arc<S>,
        config: &Config,
    ) -> BatchAccumulator<S, fn(&FeedItem) -> ModerationDecision> {
        accumulator_with(source, config, Layout::List, show)
    }

    fn accumulator_with<S: ContentSource>(
        source: Arc<S>,
        config: &Config,
        layout: Layout,
        moderation: fn(&FeedItem) -> ModerationDecision,
    ) -> BatchAccumulator<S, fn(&FeedItem) -> ModerationDecision> {
        let query = FeedQuery::Following;
        BatchAccumulator::new(
            PageFetcher::new(source, query.clone(), None, config.batch.page_limit),
            ContentPolicy::new(&query, layout),
            ModerationFilter::new(Arc::new(moderation)),
            config,
        )
    }

    #[tokio::test]
    async fn minimum_batch_is_best_effort() {
        let source = Arc::new(EndlessSource::new(3));
        let accumulator = accumulator(source.clone(), &test_config());
        let batch = accumulator
            .accumulate(None, &mut DedupTracker::new())
            .await
            .expect("failed to accumulate");
        assert_eq!(batch.items.len(), 12);
        assert!(batch.has_more);
        assert_eq!(batch.cursor, Some(Cursor::new("4")));
        assert_eq!(
            source.cursors(),
            vec![
                None,
                Some(Cursor::new("1")),
                Some(Cursor::new("2")),
                Some(Cursor::new("3")),
            ]
        );
    }

    #[tokio::test]
    async fn exhausted_source_stops_after_one_call() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(Page::default())]));
        let accumulator = accumulator(source.clone(), &test_config());
        let batch = accumulator
            .accumulate(None, &mut DedupTracker::new())
            .await
            .expect("failed to accumulate");
        assert_eq!(batch, Batch::default());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn sparse_pages_stop_at_attempt_ceiling() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(page(&["a"], Some("1"))),
            Ok(page(&["b"], Some("2"))),
            Ok(page(&[], Some("3"))),
            Ok(page(&["c"], Some("4"))),
            Ok(page(&["d"], Some("5"))),
            Ok(page(&["e"], Some("6"))),
        ]));
        let accumulator = accumulator(source.clone(), &test_config());
        let batch = accumulator
            .accumulate(None, &mut DedupTracker::new())
            .await
            .expect("failed to accumulate");
        assert_eq!(batch.items.len(), 4);
        assert!(batch.has_more);
        assert_eq!(batch.cursor, Some(Cursor::new("5")));
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test]
    async fn duplicates_are_dropped() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(page(&["a", "b", "a"], Some("1"))),
            Ok(page(&["b", "c"], None)),
        ]));
        let mut seen = ["c"].into_iter().collect::<DedupTracker>();
        let batch = accumulator(source, &test_config())
            .accumulate(None, &mut seen)
            .await
            .expect("failed to accumulate");
        let identifiers = batch
            .items
            .iter()
            .map(|item| item.identifier.as_str())
            .collect::<Vec<_>>();
        assert_eq!(identifiers, vec!["a", "b"]);
        assert!(!batch.has_more);
        assert!(seen.seen("a") && seen.seen("b"));
    }

    #[tokio::test]
    async fn fully_filtered_source_is_treated_as_exhausted() {
        let source = Arc::new(EndlessSource::new(3));
        let mut config = test_config();
        config.batch.max_attempts = 3;
        let accumulator = accumulator_with(
            source.clone(),
            &config,
            Layout::Grid { media: None },
            show,
        );
        let batch = accumulator
            .accumulate(None, &mut DedupTracker::new())
            .await
            .expect("failed to accumulate");
        assert!(batch.items.is_empty());
        assert!(!batch.has_more);
        assert_eq!(source.cursors().len(), 3);
    }

    #[tokio::test]
    async fn hidden_items_never_survive() {
        fn hide_images(item: &FeedItem) -> ModerationDecision {
            if item.embed.is_some() {
                ModerationDecision::Hide
            } else {
                ModerationDecision::Warn
            }
        }
        let source = Arc::new(ScriptedSource::new(vec![Ok(Page {
            items: vec![image_item("a"), item("b")],
            cursor: None,
        })]));
        let batch = accumulator_with(source, &test_config(), Layout::List, hide_images)
            .accumulate(None, &mut DedupTracker::new())
            .await
            .expect("failed to accumulate");
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].identifier, "b");
    }

    #[tokio::test]
    async fn failure_ceiling_propagates() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(page(&["a"], Some("1"))),
            Err(SourceError::Transient("reset".into())),
            Err(SourceError::Transient("reset".into())),
            Err(SourceError::Transient("reset".into())),
        ]));
        let result = accumulator(source.clone(), &test_config())
            .accumulate(None, &mut DedupTracker::new())
            .await;
        assert_eq!(result, Err(SourceError::Transient("reset".into())));
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn success_resets_failure_counter() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(SourceError::RateLimited),
            Err(SourceError::RateLimited),
            Ok(page(&["a"], Some("1"))),
            Err(SourceError::RateLimited),
            Ok(page(&["b"], None)),
        ]));
        let batch = accumulator(source.clone(), &test_config())
            .accumulate(None, &mut DedupTracker::new())
            .await
            .expect("failed to accumulate");
        assert_eq!(batch.items.len(), 2);
        assert!(!batch.has_more);
        assert_eq!(source.calls(), 5);
    }

    /// Endless pages, failing transiently on the listed (1-based) calls.
    struct FlakySource {
        inner: EndlessSource,
        failing: Vec<usize>,
        requested: Mutex<Vec<Option<Cursor>>>,
    }

    #[async_trait]
    impl ContentSource for FlakySource {
        async fn get_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
            let call = {
                let mut requested = self.requested.lock().expect("poisoned");
                requested.push(request.cursor.clone());
                requested.len()
            };
            if self.failing.contains(&call) {
                return Err(SourceError::Transient("reset".into()));
            }
            self.inner.get_page(request).await
        }
    }

    #[tokio::test]
    async fn failed_attempt_retries_the_same_cursor() {
        let source = Arc::new(FlakySource {
            inner: EndlessSource::new(3),
            failing: vec![2],
            requested: Mutex::new(Vec::new()),
        });
        let batch = accumulator(source.clone(), &test_config())
            .accumulate(None, &mut DedupTracker::new())
            .await
            .expect("failed to accumulate");
        assert_eq!(batch.items.len(), 12);
        assert_eq!(batch.cursor, Some(Cursor::new("4")));
        assert_eq!(
            *source.requested.lock().expect("poisoned"),
            vec![
                None,
                Some(Cursor::new("1")),
                Some(Cursor::new("1")),
                Some(Cursor::new("2")),
                Some(Cursor::new("3")),
            ]
        );
    }

    #[tokio::test]
    async fn zero_target_keeps_has_more_tied_to_cursor() {
        let source = Arc::new(EndlessSource::new(3));
        let mut config = test_config();
        config.batch.target_count = 0;
        let accumulator = accumulator(source.clone(), &config);
        let batch = accumulator
            .accumulate(None, &mut DedupTracker::new())
            .await
            .expect("failed to accumulate");
        assert_eq!(batch, Batch::default());
        assert!(!batch.has_more);
        let batch = accumulator
            .accumulate(Some(Cursor::new("7")), &mut DedupTracker::new())
            .await
            .expect("failed to accumulate");
        assert!(batch.has_more);
        assert_eq!(batch.cursor, Some(Cursor::new("7")));
        assert!(source.cursors().is_empty());
    }

    #[tokio::test]
    async fn non_retryable_failure_aborts_immediately() {
        let source = Arc::new(ScriptedSource::new(vec![Err(SourceError::BlockedByActor)]));
        let result = accumulator(source.clone(), &test_config())
            .accumulate(None, &mut DedupTracker::new())
            .await;
        assert_eq!(result, Err(SourceError::BlockedByActor));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_attempts_back_off() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(SourceError::Transient("reset".into())),
            Err(SourceError::Transient("reset".into())),
            Ok(page(&["a"], None)),
        ]));
        let mut config = test_config();
        config.intervals.retry_backoff = 100;
        let start = time::Instant::now();
        let batch = accumulator(source, &config)
            .accumulate(None, &mut DedupTracker::new())
            .await
            .expect("failed to accumulate");
        assert_eq!(batch.items.len(), 1);
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
