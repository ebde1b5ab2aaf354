pub mod feed;
pub mod feed_item;

use crate::model::ActorRef;

pub fn profile_name(author: &ActorRef) -> String {
    if let Some(display_name) = author.display_name.as_deref().filter(|s| !s.is_empty()) {
        format!("{display_name} @{}", author.handle)
    } else {
        format!("@{}", author.handle)
    }
}
