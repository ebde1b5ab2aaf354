use crate::model::{FeedItem, Layout, MediaKind};
use crate::query::FeedQuery;

/// Content rules derived from a session's query and layout.
///
/// Rules are checked in order and the first failing rule rejects the item:
/// replies unless requested, then quote posts, then (grid only) items
/// without media or not matching the media sub-filter.
///
/// The Following timeline is deliberately lenient in grid layout: link
/// previews and any other embed are kept there, while every other source
/// only keeps images and video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPolicy {
    replies: bool,
    following: bool,
    layout: Layout,
}

impl ContentPolicy {
    pub fn new(query: &FeedQuery, layout: Layout) -> Self {
        Self {
            replies: query.wants_replies(),
            following: matches!(query, FeedQuery::Following),
            layout,
        }
    }
    pub fn keep(&self, item: &FeedItem) -> bool {
        if item.reply && !self.replies {
            return false;
        }
        if item.is_quote() {
            return false;
        }
        let Layout::Grid { media } = self.layout else {
            return true;
        };
        let kind = item.media_kind();
        let has_media = if self.following {
            kind != MediaKind::None || item.embed.is_some()
        } else {
            matches!(kind, MediaKind::Image | MediaKind::Video)
        };
        has_media && media.map_or(true, |filter| filter.matches(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{actor, image_item, item};
    use crate::model::{AttributionReason, Embed, MediaFilter};
    use crate::query::AuthorFilter;

    fn grid() -> Layout {
        Layout::Grid { media: None }
    }

    fn link_item(identifier: &str) -> FeedItem {
        FeedItem {
            embed: Some(Embed::External {
                uri: "https://example.com".into(),
                title: String::new(),
            }),
            ..item(identifier)
        }
    }

    #[test]
    fn replies_rejected_unless_requested() {
        let reply = FeedItem {
            reply: true,
            ..item("a")
        };
        assert!(!ContentPolicy::new(&FeedQuery::Following, Layout::List).keep(&reply));
        let with_replies = FeedQuery::AuthorFeed("a.test".into(), AuthorFilter::PostsWithReplies);
        assert!(ContentPolicy::new(&with_replies, Layout::List).keep(&reply));
    }

    #[test]
    fn quotes_always_rejected() {
        let quote = FeedItem {
            embed: Some(Embed::RecordWithMedia {
                uri: "at://did:fake:a/app.bsky.feed.post/1".into(),
                media: Box::new(Embed::Images { images: Vec::new() }),
            }),
            ..item("a")
        };
        assert!(!ContentPolicy::new(&FeedQuery::Following, Layout::List).keep(&quote));
        assert!(!ContentPolicy::new(&FeedQuery::Following, grid()).keep(&quote));
    }

    #[test]
    fn list_layout_keeps_plain_items() {
        let policy = ContentPolicy::new(&FeedQuery::GeneratorFeed("x".into()), Layout::List);
        assert!(policy.keep(&item("a")));
        assert!(policy.keep(&link_item("b")));
    }

    #[test]
    fn following_grid_is_lenient() {
        let following = ContentPolicy::new(&FeedQuery::Following, grid());
        let generator = ContentPolicy::new(&FeedQuery::GeneratorFeed("x".into()), grid());
        let reposted = FeedItem {
            reason: Some(AttributionReason::Repost {
                by: actor("repost.test"),
                indexed_at: None,
            }),
            ..item("a")
        };
        assert!(!following.keep(&reposted));
        assert!(following.keep(&link_item("b")));
        assert!(!generator.keep(&link_item("b")));
        assert!(generator.keep(&image_item("c")));
        let unknown = FeedItem {
            embed: Some(Embed::Unknown),
            ..item("d")
        };
        assert!(following.keep(&unknown));
        assert!(!generator.keep(&unknown));
    }

    #[test]
    fn media_sub_filter() {
        let photos = ContentPolicy::new(
            &FeedQuery::Search("cats".into(), Default::default()),
            Layout::Grid {
                media: Some(MediaFilter::Photos),
            },
        );
        let video = FeedItem {
            embed: Some(Embed::Video { aspect_ratio: None }),
            ..item("v")
        };
        assert!(photos.keep(&image_item("i")));
        assert!(!photos.keep(&video));
        let videos = ContentPolicy::new(
            &FeedQuery::Following,
            Layout::Grid {
                media: Some(MediaFilter::Videos),
            },
        );
        assert!(videos.keep(&video));
        assert!(!videos.keep(&link_item("l")));
    }
}
