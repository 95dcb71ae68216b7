use core::convert::TryFrom;

use crate::entities::{
    ActorSnapshot, Comment, CommentId, Follow, FollowId, Like, Notification, NotificationId,
    NotificationKind, Post, PostContent, PostId, TopicId, User, UserId,
};

use super::converters::{from_millis, to_millis};

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoUserModel {
    #[serde(rename = "_id")]
    pub id: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub topics: Vec<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub suspended: bool,
    pub admin: bool,
    pub created: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoFollowModel {
    #[serde(rename = "_id")]
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub created: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoPostModel {
    #[serde(rename = "_id")]
    pub id: String,
    pub author_id: String,
    pub content: PostContent,
    pub topics: Vec<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoLikeModel {
    #[serde(rename = "_id")]
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub created: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoCommentModel {
    #[serde(rename = "_id")]
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub text: String,
    pub created: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoNotificationModel {
    #[serde(rename = "_id")]
    pub id: String,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub actor: MongoActorModel,
    pub read: bool,
    pub related_post_id: Option<String>,
    pub comment_id: Option<String>,
    pub created: i64,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoActorModel {
    pub user_id: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Like records live under a composite key so that one user likes a post at most once.
pub fn like_key(post_id: &PostId, user_id: &UserId) -> String { format!("{}_{}", post_id, user_id) }

fn topics_of(raw: Vec<String>) -> Vec<TopicId> { raw.into_iter().map(TopicId).collect() }

fn raw_topics(topics: Vec<TopicId>) -> Vec<String> { topics.into_iter().map(|t| t.0).collect() }

impl From<User> for MongoUserModel {
    fn from(
        User {
            id,
            display_name,
            photo_url,
            topics,
            followers_count,
            following_count,
            posts_count,
            suspended,
            admin,
            created,
        }: User,
    ) -> Self {
        Self {
            id: id.0,
            display_name,
            photo_url,
            topics: raw_topics(topics),
            followers_count,
            following_count,
            posts_count,
            suspended,
            admin,
            created: to_millis(created),
        }
    }
}

impl TryFrom<MongoUserModel> for User {
    type Error = ::anyhow::Error;

    fn try_from(m: MongoUserModel) -> ::anyhow::Result<Self> {
        Ok(Self {
            id: UserId(m.id),
            display_name: m.display_name,
            photo_url: m.photo_url,
            topics: topics_of(m.topics),
            followers_count: m.followers_count,
            following_count: m.following_count,
            posts_count: m.posts_count,
            suspended: m.suspended,
            admin: m.admin,
            created: from_millis(m.created)?,
        })
    }
}

impl From<Follow> for MongoFollowModel {
    fn from(f: Follow) -> Self {
        Self {
            id: f.id.0,
            follower_id: f.follower_id.0,
            following_id: f.following_id.0,
            created: to_millis(f.created),
        }
    }
}

impl TryFrom<MongoFollowModel> for Follow {
    type Error = ::anyhow::Error;

    fn try_from(m: MongoFollowModel) -> ::anyhow::Result<Self> {
        Ok(Self {
            id: FollowId(m.id),
            follower_id: UserId(m.follower_id),
            following_id: UserId(m.following_id),
            created: from_millis(m.created)?,
        })
    }
}

impl From<Post> for MongoPostModel {
    fn from(p: Post) -> Self {
        Self {
            id: p.id.to_string(),
            author_id: p.author_id.0,
            content: p.content,
            topics: raw_topics(p.topics),
            likes_count: p.likes_count,
            comments_count: p.comments_count,
            created: to_millis(p.created),
            updated: to_millis(p.updated),
        }
    }
}

impl TryFrom<MongoPostModel> for Post {
    type Error = ::anyhow::Error;

    fn try_from(m: MongoPostModel) -> ::anyhow::Result<Self> {
        Ok(Self {
            id: m.id.parse::<PostId>()?,
            author_id: UserId(m.author_id),
            content: m.content,
            topics: topics_of(m.topics),
            likes_count: m.likes_count,
            comments_count: m.comments_count,
            created: from_millis(m.created)?,
            updated: from_millis(m.updated)?,
        })
    }
}

impl From<Like> for MongoLikeModel {
    fn from(l: Like) -> Self {
        Self {
            id: like_key(&l.post_id, &l.user_id),
            post_id: l.post_id.to_string(),
            user_id: l.user_id.0,
            created: to_millis(l.created),
        }
    }
}

impl From<Comment> for MongoCommentModel {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id.to_string(),
            post_id: c.post_id.to_string(),
            author_id: c.author_id.0,
            text: c.text,
            created: to_millis(c.created),
        }
    }
}

impl TryFrom<MongoCommentModel> for Comment {
    type Error = ::anyhow::Error;

    fn try_from(m: MongoCommentModel) -> ::anyhow::Result<Self> {
        Ok(Self {
            id: m.id.parse::<CommentId>()?,
            post_id: m.post_id.parse::<PostId>()?,
            author_id: UserId(m.author_id),
            text: m.text,
            created: from_millis(m.created)?,
        })
    }
}

impl From<Notification> for MongoNotificationModel {
    fn from(n: Notification) -> Self {
        let ActorSnapshot {
            user_id,
            display_name,
            photo_url,
        } = n.actor;

        Self {
            id: n.id.to_string(),
            recipient_id: n.recipient_id.0,
            kind: n.kind,
            title: n.title,
            body: n.body,
            actor: MongoActorModel {
                user_id: user_id.0,
                display_name,
                photo_url,
            },
            read: n.read,
            related_post_id: n.related_post_id.map(|p| p.to_string()),
            comment_id: n.comment_id.map(|c| c.to_string()),
            created: to_millis(n.created),
        }
    }
}

impl TryFrom<MongoNotificationModel> for Notification {
    type Error = ::anyhow::Error;

    fn try_from(m: MongoNotificationModel) -> ::anyhow::Result<Self> {
        Ok(Self {
            id: m.id.parse::<NotificationId>()?,
            recipient_id: UserId(m.recipient_id),
            kind: m.kind,
            title: m.title,
            body: m.body,
            actor: ActorSnapshot {
                user_id: UserId(m.actor.user_id),
                display_name: m.actor.display_name,
                photo_url: m.actor.photo_url,
            },
            read: m.read,
            related_post_id: m.related_post_id.map(|p| p.parse::<PostId>()).transpose()?,
            comment_id: m.comment_id.map(|c| c.parse::<CommentId>()).transpose()?,
            created: from_millis(m.created)?,
        })
    }
}
