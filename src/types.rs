use crate::query::FeedQuery;

#[derive(Debug, Clone)]
pub enum Action {
    Error(String),
    Quit,
    Render,
    Refresh,
    LoadMore,
    Switch(FeedQuery),
}

#[derive(Debug, Clone)]
pub enum Event {
    Line(String),
    Eof,
    Error(String),
}
