use crate::model::{Embed, FeedItem};
use serde::{Deserialize, Serialize};

const VIDEO_ASPECT: f32 = 16.0 / 9.0;

/// Units used to estimate rendered item heights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Metrics {
    pub column_width: f32,
    pub chars_per_line: usize,
    pub line_height: f32,
    pub chrome_height: f32,
    pub link_card_height: f32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            column_width: 180.0,
            chars_per_line: 28,
            line_height: 18.0,
            chrome_height: 40.0,
            link_card_height: 90.0,
        }
    }
}

/// Two column assignment; indices refer to the distributed sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub heights: [f32; 2],
}

#[derive(Debug, Clone, Default)]
pub struct LayoutDistributor {
    metrics: Metrics,
}

impl LayoutDistributor {
    pub fn new(metrics: Metrics) -> Self {
        Self { metrics }
    }
    pub fn estimate(&self, item: &FeedItem) -> f32 {
        let lines = if item.text.is_empty() {
            0
        } else {
            textwrap::wrap(&item.text, self.metrics.chars_per_line.max(1)).len()
        };
        self.metrics.chrome_height
            + lines as f32 * self.metrics.line_height
            + item.embed.as_ref().map_or(0.0, |embed| self.media_height(embed))
    }
    fn media_height(&self, embed: &Embed) -> f32 {
        let width = self.metrics.column_width;
        match embed {
            Embed::Images { images } => images
                .first()
                .and_then(|image| image.aspect_ratio)
                .and_then(|ratio| ratio.value())
                .map_or(width, |aspect| width / aspect),
            Embed::Video { aspect_ratio } => {
                width / aspect_ratio.and_then(|r| r.value()).unwrap_or(VIDEO_ASPECT)
            }
            Embed::External { .. } => self.metrics.link_card_height,
            Embed::RecordWithMedia { media, .. } => self.media_height(media),
            Embed::Record { .. } | Embed::Unknown => 0.0,
        }
    }
    /// Places every item into the currently shorter column, left on ties.
    pub fn distribute<'a>(&self, items: impl IntoIterator<Item = &'a FeedItem>) -> Columns {
        let mut columns = Columns::default();
        for (i, item) in items.into_iter().enumerate() {
            let height = self.estimate(item);
            if columns.heights[1] < columns.heights[0] {
                columns.right.push(i);
                columns.heights[1] += height;
            } else {
                columns.left.push(i);
                columns.heights[0] += height;
            }
        }
        columns
    }
}
