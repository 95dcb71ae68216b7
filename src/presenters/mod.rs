//! JSON view models of use-case outputs. Field names are camelCase on the wire.

use serde::Serialize;
use smallvec::SmallVec;

use crate::entities::{
    Candidate, Comment, Date, Follow, Notification, NotificationKind, Post, PostContent, Profile,
    TopicId, UserId,
};
use crate::usecases::engagement::{
    comments, create_comment, create_post, delete_comment, delete_post, toggle_like,
    CommentEntry, LikeAction,
};
use crate::usecases::graph::{
    follow, followers, following, following_activity, is_following, unfollow, user_profile,
    GraphEntry,
};
use crate::usecases::notification::{mark_read, notifications};
use crate::usecases::recommendation::recommend;
use crate::usecases::timeline::{feed, FeedEntry};

fn last_id<T, F>(items: &[T], f: F) -> Option<String>
where F: Fn(&T) -> String {
    items.last().map(f)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
}

impl From<Profile> for ProfileView {
    fn from(p: Profile) -> Self {
        Self {
            user_id: p.id,
            display_name: p.display_name,
            photo_url: p.photo_url,
            followers_count: p.followers_count,
            following_count: p.following_count,
            posts_count: p.posts_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowView {
    pub follow_id: String,
    pub follower_id: UserId,
    pub following_id: UserId,
    pub created_at: Date,
}

impl From<Follow> for FollowView {
    fn from(f: Follow) -> Self {
        Self {
            follow_id: f.id.0,
            follower_id: f.follower_id,
            following_id: f.following_id,
            created_at: f.created,
        }
    }
}

impl From<follow::Output> for FollowView {
    fn from(o: follow::Output) -> Self { o.follow.into() }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfollowView {
    pub follower_id: UserId,
    pub following_id: UserId,
}

impl From<unfollow::Output> for UnfollowView {
    fn from(o: unfollow::Output) -> Self {
        Self {
            follower_id: o.follower_id,
            following_id: o.target_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsFollowingView {
    pub is_following: bool,
}

impl From<is_following::Output> for IsFollowingView {
    fn from(o: is_following::Output) -> Self {
        Self {
            is_following: o.following,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileView {
    #[serde(flatten)]
    pub profile: ProfileView,
    pub topic_ids: Vec<TopicId>,
    pub is_following: bool,
    pub is_followed_by: bool,
    pub posts: Vec<PostView>,
}

impl From<user_profile::Output> for UserProfileView {
    fn from(o: user_profile::Output) -> Self {
        Self {
            profile: o.profile.into(),
            topic_ids: o.topics,
            is_following: o.is_following,
            is_followed_by: o.is_followed_by,
            posts: o.posts.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    #[serde(flatten)]
    pub profile: ProfileView,
    pub latest_post_at: Option<Date>,
    pub has_new_post: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingActivityView {
    pub users: Vec<ActivityView>,
    pub total: usize,
}

impl From<following_activity::Output> for FollowingActivityView {
    fn from(o: following_activity::Output) -> Self {
        let users = o
            .entries
            .into_iter()
            .map(|e| ActivityView {
                profile: e.profile.into(),
                latest_post_at: e.latest_post_at,
                has_new_post: e.has_new_post,
            })
            .collect::<Vec<_>>();

        Self {
            total: users.len(),
            users,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEntryView {
    pub follow_id: String,
    pub user_id: UserId,
    pub profile: Option<ProfileView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_followed_back: Option<bool>,
    pub created_at: Date,
}

fn graph_entry(e: GraphEntry, counterpart: fn(&Follow) -> &UserId) -> GraphEntryView {
    GraphEntryView {
        follow_id: e.follow.id.0.clone(),
        user_id: counterpart(&e.follow).clone(),
        profile: e.profile.map(Into::into),
        is_followed_back: e.followed_back,
        created_at: e.follow.created,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl From<following::Output> for PageView<GraphEntryView> {
    fn from(o: following::Output) -> Self {
        let next_cursor = last_id(&o.entries, |e| e.follow.id.0.clone());

        Self {
            items: o
                .entries
                .into_iter()
                .map(|e| graph_entry(e, |f| &f.following_id))
                .collect(),
            has_more: o.has_more,
            next_cursor,
        }
    }
}

impl From<followers::Output> for PageView<GraphEntryView> {
    fn from(o: followers::Output) -> Self {
        let next_cursor = last_id(&o.entries, |e| e.follow.id.0.clone());

        Self {
            items: o
                .entries
                .into_iter()
                .map(|e| graph_entry(e, |f| &f.follower_id))
                .collect(),
            has_more: o.has_more,
            next_cursor,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeView {
    pub action: LikeAction,
    pub likes_count: i64,
}

impl From<toggle_like::Output> for LikeView {
    fn from(o: toggle_like::Output) -> Self {
        Self {
            action: o.action,
            likes_count: o.likes_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreatedView {
    pub comment_id: String,
    pub comments_count: i64,
}

impl From<create_comment::Output> for CommentCreatedView {
    fn from(o: create_comment::Output) -> Self {
        Self {
            comment_id: o.comment.id.to_string(),
            comments_count: o.comments_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub comment_id: String,
    pub post_id: String,
    pub author_id: UserId,
    pub text: String,
    pub created_at: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<ProfileView>,
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        Self {
            comment_id: c.id.to_string(),
            post_id: c.post_id.to_string(),
            author_id: c.author_id,
            text: c.text,
            created_at: c.created,
            author: None,
        }
    }
}

impl From<CommentEntry> for CommentView {
    fn from(e: CommentEntry) -> Self {
        Self {
            author: e.author.map(Into::into),
            ..CommentView::from(e.comment)
        }
    }
}

impl From<delete_comment::Output> for CommentView {
    fn from(o: delete_comment::Output) -> Self { o.comment.into() }
}

impl From<comments::Output> for PageView<CommentView> {
    fn from(o: comments::Output) -> Self {
        let next_cursor = last_id(&o.entries, |e| e.comment.id.to_string());

        Self {
            items: o.entries.into_iter().map(Into::into).collect(),
            has_more: o.has_more,
            next_cursor,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub post_id: String,
    pub author_id: UserId,
    #[serde(flatten)]
    pub content: PostContent,
    pub summary: String,
    pub topic_ids: Vec<TopicId>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: Date,
    pub updated_at: Date,
}

impl From<Post> for PostView {
    fn from(p: Post) -> Self {
        Self {
            post_id: p.id.to_string(),
            author_id: p.author_id,
            summary: p.content.summary(),
            content: p.content,
            topic_ids: p.topics,
            likes_count: p.likes_count,
            comments_count: p.comments_count,
            created_at: p.created,
            updated_at: p.updated,
        }
    }
}

impl From<create_post::Output> for PostView {
    fn from(o: create_post::Output) -> Self { o.post.into() }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDeletedView {
    pub post_id: String,
    pub removed_likes: u64,
}

impl From<delete_post::Output> for PostDeletedView {
    fn from(o: delete_post::Output) -> Self {
        Self {
            post_id: o.post.id.to_string(),
            removed_likes: o.removed_likes,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPostView {
    #[serde(flatten)]
    pub post: PostView,
    pub author: Option<ProfileView>,
    pub is_liked: bool,
}

impl From<FeedEntry> for FeedPostView {
    fn from(e: FeedEntry) -> Self {
        Self {
            post: e.post.into(),
            author: e.author.map(Into::into),
            is_liked: e.liked,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    pub posts: Vec<FeedPostView>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl From<feed::Output> for FeedView {
    fn from(o: feed::Output) -> Self {
        let next_cursor = last_id(&o.entries, |e| e.post.id.to_string());

        Self {
            posts: o.entries.into_iter().map(Into::into).collect(),
            has_more: o.has_more,
            next_cursor,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub actor_user_id: UserId,
    pub actor_display_name: Option<String>,
    pub actor_photo_url: Option<String>,
    pub related_post_id: Option<String>,
    pub comment_id: Option<String>,
    pub created_at: Date,
}

impl From<Notification> for NotificationView {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.to_string(),
            kind: n.kind,
            title: n.title,
            body: n.body,
            is_read: n.read,
            actor_user_id: n.actor.user_id,
            actor_display_name: n.actor.display_name,
            actor_photo_url: n.actor.photo_url,
            related_post_id: n.related_post_id.map(|p| p.to_string()),
            comment_id: n.comment_id.map(|c| c.to_string()),
            created_at: n.created,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsView {
    pub notifications: Vec<NotificationView>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
    pub unread_count: u64,
}

impl From<notifications::Output> for NotificationsView {
    fn from(o: notifications::Output) -> Self {
        let next_cursor = last_id(&o.entries, |n| n.id.to_string());

        Self {
            notifications: o.entries.into_iter().map(Into::into).collect(),
            has_more: o.has_more,
            next_cursor,
            unread_count: o.unread_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadView {
    pub updated: u64,
}

impl From<mark_read::Output> for MarkReadView {
    fn from(o: mark_read::Output) -> Self { Self { updated: o.updated } }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateView {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub shared_topic_count: usize,
    pub shared_topics: SmallVec<[TopicId; 4]>,
    pub followers_count: i64,
}

impl From<Candidate> for CandidateView {
    fn from(c: Candidate) -> Self {
        Self {
            user_id: c.user_id,
            display_name: c.display_name,
            photo_url: c.photo_url,
            shared_topic_count: c.shared_topic_count,
            shared_topics: c.shared_topics,
            followers_count: c.followers_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsView {
    pub users: Vec<CandidateView>,
}

impl From<recommend::Output> for RecommendationsView {
    fn from(o: recommend::Output) -> Self {
        Self {
            users: o.candidates.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::entities::PostId;

    #[test]
    fn post_view_flattens_tagged_content() {
        let now = Utc::now();
        let post = Post {
            id: PostId::new(),
            author_id: "alice".into(),
            content: PostContent::Image {
                text: Some("hi".to_string()),
                images: vec!["a.png".to_string()],
            },
            topics: vec!["BTS".into()],
            likes_count: 2,
            comments_count: 0,
            created: now,
            updated: now,
        };

        let v = serde_json::to_value(PostView::from(post)).unwrap();

        assert_eq!(v["type"], "image");
        assert_eq!(v["content"]["images"][0], "a.png");
        assert_eq!(v["topicIds"][0], "BTS");
        assert_eq!(v["likesCount"], 2);
        assert_eq!(v["summary"], "hi [1 image(s)]");
    }
}
