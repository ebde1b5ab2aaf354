use super::profile_name;
use crate::model::{AttributionReason, Embed, FeedItem};
use chrono::Local;

pub struct FeedItemWidget<'a> {
    item: &'a FeedItem,
}

impl<'a> FeedItemWidget<'a> {
    pub fn new(item: &'a FeedItem) -> Self {
        Self { item }
    }
    /// Renders the item into lines no wider than `width`.
    pub fn lines(&self, width: usize) -> Vec<String> {
        let width = width.max(8);
        let mut lines = Vec::new();
        if let Some(AttributionReason::Repost { by, .. }) = &self.item.reason {
            lines.push(format!("  Reposted by {}", profile_name(by)));
        }
        lines.push(profile_name(&self.item.author));
        if let Some(indexed_at) = &self.item.indexed_at {
            lines.push(
                indexed_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S %z")
                    .to_string(),
            );
        }
        if self.item.reply {
            lines.push("  (reply)".into());
        }
        lines.extend(
            textwrap::wrap(&self.item.text, width)
                .into_iter()
                .map(|line| line.into_owned()),
        );
        if let Some(embed) = &self.item.embed {
            Self::embed_lines(embed, &mut lines);
        }
        if !self.item.labels.is_empty() {
            lines.push(format!("  labels: {}", self.item.labels.join(", ")));
        }
        lines
            .into_iter()
            .flat_map(|line| {
                textwrap::wrap(&line, width)
                    .into_iter()
                    .map(|line| line.into_owned())
                    .collect::<Vec<_>>()
            })
            .collect()
    }
    fn embed_lines(embed: &Embed, lines: &mut Vec<String>) {
        match embed {
            Embed::Images { images } => {
                for image in images {
                    if image.alt.is_empty() {
                        lines.push("  [image]".into());
                    } else {
                        lines.push(format!("  [image] {}", image.alt));
                    }
                }
            }
            Embed::Video { .. } => lines.push("  [video]".into()),
            Embed::External { uri, title } => {
                lines.push(format!("  [link] {title}"));
                lines.push(format!("  {uri}"));
            }
            Embed::Record { uri } => lines.push(format!("  [quote] {uri}")),
            Embed::RecordWithMedia { uri, media } => {
                Self::embed_lines(media, lines);
                lines.push(format!("  [quote] {uri}"));
            }
            Embed::Unknown => {}
        }
    }
}
