use alloc::sync::Arc;

use async_trait::async_trait;

use crate::entities::{
    Comment, CommentId, Follow, FollowId, Like, Notification, NotificationId, Post, PostId,
    TopicId, User, UserId,
};

pub mod mock;
pub mod mongo;

pub type Result<T> = ::std::result::Result<T, RepositoryError>;

/// Largest value set the query engine accepts in one membership (`$in`) filter.
pub const MEMBERSHIP_FILTER_CAP: usize = 10;

#[async_trait]
pub trait UserRepository {
    async fn insert(&self, item: User) -> Result<bool>;
    async fn is_exists(&self, id: &UserId) -> Result<bool>;

    async fn find(&self, id: &UserId) -> Result<User>;
    async fn finds(&self, query: UserQuery) -> Result<Vec<User>>;

    async fn update(&self, id: &UserId, mutation: UserMutation) -> Result<User>;

    async fn increment(&self, id: &UserId, counter: UserCounter, delta: i64) -> Result<()>;
    async fn set_counters(&self, id: &UserId, counters: UserCounters) -> Result<()>;
}

#[async_trait]
pub trait FollowRepository {
    /// Inserts only when the edge key is absent. `Ok(false)` means the key was taken.
    async fn insert(&self, item: Follow) -> Result<bool>;
    async fn is_exists(&self, id: &FollowId) -> Result<bool>;

    async fn finds(&self, query: FollowQuery) -> Result<Vec<Follow>>;
    async fn count(&self, query: FollowQuery) -> Result<u64>;

    async fn delete(&self, id: &FollowId) -> Result<bool>;
}

#[async_trait]
pub trait PostRepository {
    async fn insert(&self, item: Post) -> Result<bool>;

    async fn find(&self, id: &PostId) -> Result<Post>;
    async fn finds(&self, query: PostQuery) -> Result<Vec<Post>>;
    async fn count(&self, query: PostQuery) -> Result<u64>;

    async fn increment(&self, id: &PostId, counter: PostCounter, delta: i64) -> Result<()>;
    async fn set_counters(&self, id: &PostId, counters: PostCounters) -> Result<()>;

    async fn delete(&self, id: &PostId) -> Result<Post>;
}

#[async_trait]
pub trait LikeRepository {
    async fn insert(&self, item: Like) -> Result<bool>;
    async fn is_exists(&self, post_id: &PostId, user_id: &UserId) -> Result<bool>;
    async fn count(&self, post_id: &PostId) -> Result<u64>;

    async fn delete(&self, post_id: &PostId, user_id: &UserId) -> Result<bool>;
    async fn delete_by_post(&self, post_id: &PostId) -> Result<u64>;
}

#[async_trait]
pub trait CommentRepository {
    async fn insert(&self, item: Comment) -> Result<bool>;

    async fn find(&self, id: &CommentId) -> Result<Comment>;
    async fn finds(&self, query: CommentQuery) -> Result<Vec<Comment>>;
    async fn count(&self, query: CommentQuery) -> Result<u64>;

    async fn delete(&self, id: &CommentId) -> Result<Comment>;
}

#[async_trait]
pub trait NotificationRepository {
    async fn insert(&self, item: Notification) -> Result<bool>;

    async fn find(&self, id: &NotificationId) -> Result<Notification>;
    async fn finds(&self, query: NotificationQuery) -> Result<Vec<Notification>>;
    async fn count(&self, query: NotificationQuery) -> Result<u64>;

    async fn mark_read(&self, id: &NotificationId) -> Result<bool>;
    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64>;

    async fn delete_by_comment(&self, comment_id: &CommentId) -> Result<u64>;
}

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository + Sync + Send>,
    pub follows: Arc<dyn FollowRepository + Sync + Send>,
    pub posts: Arc<dyn PostRepository + Sync + Send>,
    pub likes: Arc<dyn LikeRepository + Sync + Send>,
    pub comments: Arc<dyn CommentRepository + Sync + Send>,
    pub notifications: Arc<dyn NotificationRepository + Sync + Send>,
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// users whose topic set contains this topic
    pub topic: Option<TopicId>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct UserMutation {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub topics: Option<Vec<TopicId>>,
    pub suspended: Option<bool>,
    pub admin: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCounter {
    Followers,
    Following,
    Posts,
}

impl UserCounter {
    pub fn field(self) -> &'static str {
        match self {
            UserCounter::Followers => "followers_count",
            UserCounter::Following => "following_count",
            UserCounter::Posts => "posts_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserCounters {
    pub followers: i64,
    pub following: i64,
    pub posts: i64,
}

#[derive(Debug, Clone, Default)]
pub struct FollowQuery {
    pub follower: Option<UserId>,
    pub following: Option<UserId>,
    pub after: Option<FollowId>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub topic: Option<TopicId>,
    /// membership filter, at most [`MEMBERSHIP_FILTER_CAP`] values
    pub authors: Option<Vec<UserId>>,
    pub author: Option<UserId>,
    pub after: Option<PostId>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCounter {
    Likes,
    Comments,
}

impl PostCounter {
    pub fn field(self) -> &'static str {
        match self {
            PostCounter::Likes => "likes_count",
            PostCounter::Comments => "comments_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostCounters {
    pub likes: i64,
    pub comments: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub post: Option<PostId>,
    pub after: Option<CommentId>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationQuery {
    pub recipient: Option<UserId>,
    pub unread_only: bool,
    pub comment: Option<CommentId>,
    pub after: Option<NotificationId>,
    pub limit: Option<usize>,
}

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    NoUnique { matched: u32 },
    QueryLimit { requested: usize, cap: usize },
    Internal(anyhow::Error),
}

impl ::std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "cannot find object."),
            RepositoryError::NoUnique { matched } => write!(
                f,
                "expected unique object, found non-unique objects (matched: {})",
                matched
            ),
            RepositoryError::QueryLimit { requested, cap } => write!(
                f,
                "membership filter accepts at most {} values (requested: {})",
                cap, requested
            ),
            RepositoryError::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl ::std::error::Error for RepositoryError {}

pub(crate) fn check_membership(values: &[UserId]) -> Result<()> {
    match values.len() {
        n if n > MEMBERSHIP_FILTER_CAP => Err(RepositoryError::QueryLimit {
            requested: n,
            cap: MEMBERSHIP_FILTER_CAP,
        }),
        _ => Ok(()),
    }
}
