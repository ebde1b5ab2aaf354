use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorFilter {
    PostsWithReplies,
    PostsNoReplies,
    PostsWithMedia,
    PostsAndAuthorThreads,
    PostsWithVideo,
}

impl AuthorFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostsWithReplies => "posts_with_replies",
            Self::PostsNoReplies => "posts_no_replies",
            Self::PostsWithMedia => "posts_with_media",
            Self::PostsAndAuthorThreads => "posts_and_author_threads",
            Self::PostsWithVideo => "posts_with_video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSort {
    #[default]
    Top,
    Latest,
}

impl SearchSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Latest => "latest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Likes,
    Bookmarks,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Likes => "likes",
            Self::Bookmarks => "bookmarks",
        }
    }
}

/// Describes which source a feed session reads from.
///
/// A query is fixed for the lifetime of a session; reading from another
/// source means starting a new session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedQuery {
    Following,
    GeneratorFeed(String),
    AuthorFeed(String, AuthorFilter),
    Search(String, SearchSort),
    PrivateCollection(CollectionKind),
}

impl FeedQuery {
    /// Whether the query asks for replies to be shown.
    pub fn wants_replies(&self) -> bool {
        matches!(self, Self::AuthorFeed(_, AuthorFilter::PostsWithReplies))
    }
}

impl Display for FeedQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Following => write!(f, "Following"),
            Self::GeneratorFeed(uri) => write!(f, "Feed {uri}"),
            Self::AuthorFeed(actor, filter) => write!(f, "{actor} ({})", filter.as_str()),
            Self::Search(query, sort) => write!(f, "Search \"{query}\" ({})", sort.as_str()),
            Self::PrivateCollection(kind) => write!(f, "{}", kind.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryParseError {
    #[error("empty feed query")]
    Empty,
    #[error("empty search terms")]
    EmptySearch,
    #[error("unknown author feed filter: {0}")]
    UnknownFilter(String),
}

pub(crate) fn is_generator_uri(s: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^at://[^/\s]+/app\.bsky\.feed\.generator/[^/\s]+$").expect("invalid regex")
    })
    .is_match(s)
}

fn parse_author(s: &str) -> Result<FeedQuery, QueryParseError> {
    let (actor, filter) = match s.split_once('+') {
        Some((actor, suffix)) => (
            actor,
            match suffix {
                "replies" => AuthorFilter::PostsWithReplies,
                "media" => AuthorFilter::PostsWithMedia,
                "video" => AuthorFilter::PostsWithVideo,
                "threads" => AuthorFilter::PostsAndAuthorThreads,
                _ => return Err(QueryParseError::UnknownFilter(suffix.to_string())),
            },
        ),
        None => (s, AuthorFilter::PostsNoReplies),
    };
    Ok(FeedQuery::AuthorFeed(
        actor.trim_start_matches('@').to_string(),
        filter,
    ))
}

impl FromStr for FeedQuery {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(QueryParseError::Empty);
        }
        let search = |terms: &str, sort| {
            let terms = terms.trim();
            if terms.is_empty() {
                Err(QueryParseError::EmptySearch)
            } else {
                Ok(Self::Search(terms.to_string(), sort))
            }
        };
        if let Some(terms) = s.strip_prefix("search:") {
            return search(terms, SearchSort::Top);
        }
        if let Some(terms) = s.strip_prefix("search-latest:") {
            return search(terms, SearchSort::Latest);
        }
        match s {
            "following" => Ok(Self::Following),
            "likes" => Ok(Self::PrivateCollection(CollectionKind::Likes)),
            "bookmarks" => Ok(Self::PrivateCollection(CollectionKind::Bookmarks)),
            _ if s.starts_with('@') || s.starts_with("did:") => parse_author(s),
            // bare tokens may still turn out to be an actor, see PageFetcher fallback
            _ => Ok(Self::GeneratorFeed(s.to_string())),
        }
    }
}
