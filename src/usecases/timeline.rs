usecase! {
    feed : {
        pub requester: entities::UserId,
        pub mode: super::FeedMode,
        pub cursor: Option<entities::PostId>,
        pub limit: Option<usize>,
    } => {
        pub entries: Vec<super::FeedEntry>,
        pub has_more: bool,
        /// following-set members left out of the membership filter
        pub dropped_authors: usize,
    }
}

use crate::entities::{Post, Profile, TopicId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMode {
    Topic(TopicId),
    Following,
}

#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub post: Post,
    /// live author profile at read time
    pub author: Option<Profile>,
    pub liked: bool,
}
