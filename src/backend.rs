pub mod accumulator;
pub mod config;
pub mod dedup;
pub mod fetcher;
pub mod guard;
pub mod layout;
pub mod policy;
pub mod session;
pub mod state;
mod watch;
mod watches;

pub use session::FeedSnapshot;
pub use watch::{Watch, Watcher};
pub use watches::feed::FeedWatcher;
