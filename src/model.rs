use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Opaque continuation token issued by a content source.
///
/// The engine never interprets or modifies a cursor, it only threads the
/// value it received into the next request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Cursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributionReason {
    Repost {
        by: ActorRef,
        #[serde(default)]
        indexed_at: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Width over height, `None` for degenerate ratios.
    pub fn value(&self) -> Option<f32> {
        (self.width > 0 && self.height > 0).then(|| self.width as f32 / self.height as f32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Embed {
    Images {
        images: Vec<Image>,
    },
    Video {
        #[serde(default)]
        aspect_ratio: Option<AspectRatio>,
    },
    External {
        uri: String,
        #[serde(default)]
        title: String,
    },
    Record {
        uri: String,
    },
    RecordWithMedia {
        uri: String,
        media: Box<Embed>,
    },
    #[serde(other)]
    Unknown,
}

impl Embed {
    pub fn media_kind(&self) -> MediaKind {
        match self {
            Self::Images { .. } => MediaKind::Image,
            Self::Video { .. } => MediaKind::Video,
            Self::External { .. } => MediaKind::ExternalLink,
            Self::RecordWithMedia { media, .. } => media.media_kind(),
            Self::Record { .. } | Self::Unknown => MediaKind::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    None,
    Image,
    Video,
    ExternalLink,
}

/// One entry of a feed as delivered by the content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Stable content id. Identity for deduplication.
    pub identifier: String,
    pub author: ActorRef,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub reply: bool,
    #[serde(default)]
    pub embed: Option<Embed>,
    #[serde(default)]
    pub reason: Option<AttributionReason>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub indexed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl FeedItem {
    pub fn media_kind(&self) -> MediaKind {
        self.embed
            .as_ref()
            .map_or(MediaKind::None, Embed::media_kind)
    }
    pub fn is_quote(&self) -> bool {
        matches!(
            self.embed,
            Some(Embed::Record { .. } | Embed::RecordWithMedia { .. })
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFilter {
    Photos,
    Videos,
}

impl MediaFilter {
    pub fn matches(&self, kind: MediaKind) -> bool {
        match self {
            Self::Photos => kind == MediaKind::Image,
            Self::Videos => kind == MediaKind::Video,
        }
    }
}

/// Presentation layout of a feed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    List,
    Grid {
        media: Option<MediaFilter>,
    },
}

impl Layout {
    pub fn is_grid(&self) -> bool {
        matches!(self, Self::Grid { .. })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn actor(handle: &str) -> ActorRef {
        ActorRef {
            did: format!("did:fake:{handle}"),
            handle: handle.to_string(),
            display_name: None,
        }
    }

    pub(crate) fn item(identifier: &str) -> FeedItem {
        FeedItem {
            identifier: identifier.to_string(),
            author: actor("post.test"),
            text: String::new(),
            reply: false,
            embed: None,
            reason: None,
            labels: Vec::new(),
            indexed_at: None,
            content: serde_json::Value::Null,
        }
    }

    pub(crate) fn image_item(identifier: &str) -> FeedItem {
        FeedItem {
            embed: Some(Embed::Images {
                images: vec![Image {
                    alt: String::new(),
                    aspect_ratio: None,
                }],
            }),
            ..item(identifier)
        }
    }

    #[test]
    fn media_kind_from_embed() {
        assert_eq!(item("a").media_kind(), MediaKind::None);
        assert_eq!(image_item("a").media_kind(), MediaKind::Image);
        let quote_with_video = FeedItem {
            embed: Some(Embed::RecordWithMedia {
                uri: "at://did:fake:x/app.bsky.feed.post/1".to_string(),
                media: Box::new(Embed::Video { aspect_ratio: None }),
            }),
            ..item("b")
        };
        assert_eq!(quote_with_video.media_kind(), MediaKind::Video);
        assert!(quote_with_video.is_quote());
        assert!(!image_item("c").is_quote());
    }

    #[test]
    fn deserialize_item() {
        let input = r#"{
            "identifier": "at://did:fake:a/app.bsky.feed.post/1",
            "author": { "did": "did:fake:a", "handle": "a.test" },
            "text": "hello",
            "embed": { "type": "external", "uri": "https://example.com" },
            "reason": { "kind": "repost", "by": { "did": "did:fake:b", "handle": "b.test" } }
        }"#;
        let item = serde_json::from_str::<FeedItem>(input).expect("failed to deserialize item");
        assert_eq!(item.media_kind(), MediaKind::ExternalLink);
        assert!(matches!(
            item.reason,
            Some(AttributionReason::Repost { ref by, .. }) if by.handle == "b.test"
        ));
        assert!(!item.reply);
    }

    #[test]
    fn deserialize_unknown_embed() {
        let input = r#"{
            "identifier": "x",
            "author": { "did": "did:fake:a", "handle": "a.test" },
            "embed": { "type": "starter_pack" }
        }"#;
        let item = serde_json::from_str::<FeedItem>(input).expect("failed to deserialize item");
        assert_eq!(item.embed, Some(Embed::Unknown));
        assert_eq!(item.media_kind(), MediaKind::None);
    }
}
