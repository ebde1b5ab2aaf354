use super::feed_item::FeedItemWidget;
use crate::backend::layout::Columns;
use crate::backend::FeedSnapshot;
use crate::query::FeedQuery;
use textwrap::core::display_width;

const GUTTER: &str = " | ";

pub struct FeedWidget<'a> {
    query: &'a FeedQuery,
    snapshot: &'a FeedSnapshot,
}

impl<'a> FeedWidget<'a> {
    pub fn new(query: &'a FeedQuery, snapshot: &'a FeedSnapshot) -> Self {
        Self { query, snapshot }
    }
    pub fn render(&self, width: usize) -> String {
        let mut out = format!("== {} ({} items) ==\n", self.query, self.snapshot.items.len());
        let lines = match &self.snapshot.columns {
            Some(columns) => self.grid(columns, width),
            None => self.list(width),
        };
        for line in lines {
            out.push_str(line.trim_end());
            out.push('\n');
        }
        if let Some(status) = self.status() {
            out.push_str(&format!("-- {status} --\n"));
        }
        out
    }
    fn list(&self, width: usize) -> Vec<String> {
        self.item_lines(0..self.snapshot.items.len(), width)
    }
    fn grid(&self, columns: &Columns, width: usize) -> Vec<String> {
        let column_width = width.saturating_sub(GUTTER.len()) / 2;
        let left = self.item_lines(columns.left.iter().copied(), column_width);
        let right = self.item_lines(columns.right.iter().copied(), column_width);
        (0..left.len().max(right.len()))
            .map(|i| {
                let l = left.get(i).map_or("", String::as_str);
                let r = right.get(i).map_or("", String::as_str);
                let pad = column_width.saturating_sub(display_width(l));
                format!("{l}{}{GUTTER}{r}", " ".repeat(pad))
            })
            .collect()
    }
    fn item_lines(&self, indices: impl Iterator<Item = usize>, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for item in indices.filter_map(|i| self.snapshot.items.get(i)) {
            lines.extend(FeedItemWidget::new(item).lines(width));
            lines.push(String::new());
        }
        lines
    }
    fn status(&self) -> Option<String> {
        let snapshot = self.snapshot;
        if snapshot.is_loading {
            Some("loading".into())
        } else if snapshot.is_refreshing {
            Some("refreshing".into())
        } else if snapshot.is_loading_more {
            Some("loading more".into())
        } else if let Some(error) = &snapshot.error {
            let hint = if error.kind.is_retryable() {
                " (r to retry)"
            } else {
                ""
            };
            Some(format!("{}{hint}", error.kind.message()))
        } else if snapshot.items.is_empty() {
            Some("no items".into())
        } else if !snapshot.has_more {
            Some("end of feed".into())
        } else {
            None
        }
    }
}
