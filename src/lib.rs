pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod model;
pub mod moderation;
pub mod query;
pub mod source;
pub mod types;
pub mod utils;
pub mod widgets;
