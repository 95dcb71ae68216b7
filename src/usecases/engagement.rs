usecase! {
    toggle_like : {
        pub post_id: entities::PostId,
        pub user_id: entities::UserId,
    } => {
        pub action: super::LikeAction,
        pub likes_count: i64,
    }
}

usecase! {
    create_comment : {
        pub post_id: entities::PostId,
        pub user_id: entities::UserId,
        pub text: String,
    } => {
        pub comment: entities::Comment,
        pub comments_count: i64,
    }
}

usecase! {
    delete_comment : {
        pub comment_id: entities::CommentId,
        pub requester: entities::UserId,
    } => {
        pub comment: entities::Comment,
    }
}

usecase! {
    comments : {
        pub post_id: entities::PostId,
        pub cursor: Option<entities::CommentId>,
        pub limit: Option<usize>,
    } => {
        pub entries: Vec<super::CommentEntry>,
        pub has_more: bool,
    }
}

usecase! {
    create_post : {
        pub author_id: entities::UserId,
        pub content: entities::PostContent,
        pub topics: Vec<entities::TopicId>,
    } => {
        pub post: entities::Post,
    }
}

usecase! {
    delete_post : {
        pub post_id: entities::PostId,
        pub requester: entities::UserId,
    } => {
        pub post: entities::Post,
        pub removed_likes: u64,
    }
}

use crate::entities::{Comment, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ::serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Liked,
    Unliked,
}

#[derive(Debug, Clone)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author: Option<Profile>,
}
