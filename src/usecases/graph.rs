usecase! {
    follow : {
        pub follower_id: entities::UserId,
        pub target_id: entities::UserId,
    } => {
        pub follow: entities::Follow,
    }
}

usecase! {
    unfollow : {
        pub follower_id: entities::UserId,
        pub target_id: entities::UserId,
    } => {
        pub follower_id: entities::UserId,
        pub target_id: entities::UserId,
    }
}

usecase! {
    is_following : {
        pub follower_id: entities::UserId,
        pub target_id: entities::UserId,
    } => {
        pub following: bool,
    }
}

usecase! {
    following : {
        pub requester: entities::UserId,
        pub user_id: entities::UserId,
        pub cursor: Option<entities::FollowId>,
        pub limit: Option<usize>,
    } => {
        pub entries: Vec<super::GraphEntry>,
        pub has_more: bool,
    }
}

usecase! {
    followers : {
        pub user_id: entities::UserId,
        pub cursor: Option<entities::FollowId>,
        pub limit: Option<usize>,
    } => {
        pub entries: Vec<super::GraphEntry>,
        pub has_more: bool,
    }
}

usecase! {
    user_profile : {
        pub requester: entities::UserId,
        pub user_id: entities::UserId,
    } => {
        pub profile: entities::Profile,
        pub topics: Vec<entities::TopicId>,
        /// requester follows the user
        pub is_following: bool,
        /// the user follows the requester
        pub is_followed_by: bool,
        pub posts: Vec<entities::Post>,
    }
}

usecase! {
    following_activity : {
        pub requester: entities::UserId,
        pub limit: Option<usize>,
    } => {
        pub entries: Vec<super::ActivityEntry>,
    }
}

use crate::entities::{Date, Follow, Profile};

/// One row of a following/followers listing.
#[derive(Debug, Clone)]
pub struct GraphEntry {
    pub follow: Follow,
    /// counterpart profile, `None` when the user record is gone
    pub profile: Option<Profile>,
    /// only set on following listings: does the counterpart follow the requester
    pub followed_back: Option<bool>,
}

/// A followed user with the time of their newest post.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub profile: Profile,
    pub latest_post_at: Option<Date>,
    /// newest post is younger than a day
    pub has_new_post: bool,
}
