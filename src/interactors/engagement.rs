use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;

use super::counters::EngagementCounters;
use super::notification::{NotificationFanout, NotifyPayload};
use super::{comment_err_fmt, post_err_fmt, profile_of, user_err_fmt, Saga};
use crate::config::Limits;
use crate::entities::{
    Comment, CommentId, FollowId, Like, NotificationKind, Post, PostId, MAX_COMMENT_CHARS,
};
use crate::repositories::{CommentQuery, PostCounter, Repositories, RepositoryError};
use crate::usecases::engagement::{
    comments, create_comment, create_post, delete_comment, delete_post, toggle_like,
    CommentEntry, LikeAction,
};
use crate::usecases::UsecaseError;
use crate::utils::{split_page, AlsoChain, LetChain};

pub struct ToggleLikeInteractor {
    pub repos: Repositories,
    pub counters: EngagementCounters,
    pub fanout: NotificationFanout,
}
#[async_trait]
impl toggle_like::Usecase for ToggleLikeInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: toggle_like::Input) -> Result<toggle_like::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let toggle_like::Input { post_id, user_id } = data;

        let post = self
            .repos
            .posts
            .find(&post_id)
            .await
            .map_err(post_err_fmt)?;
        let liked = self.repos.likes.is_exists(&post_id, &user_id).await?;

        let mut saga = Saga::new("toggle_like");

        let (action, likes_count) = match liked {
            false => {
                let like = Like {
                    post_id,
                    user_id: user_id.clone(),
                    created: Utc::now(),
                };
                let inserted = self
                    .repos
                    .likes
                    .insert(like)
                    .await
                    .map_err(|e| saga.fail("like", e))?;

                // a concurrent toggle already recorded this like and its increment
                if !inserted {
                    return Ok(toggle_like::Output {
                        action: LikeAction::Liked,
                        likes_count: post.likes_count,
                    });
                }
                saga.done("like");

                self.counters
                    .adjust_post(&post_id, PostCounter::Likes, 1)
                    .await
                    .map_err(|e| saga.fail("likes_count", e))?;
                saga.done("likes_count");

                self.fanout
                    .notify(
                        &post.author_id,
                        NotificationKind::Like,
                        &user_id,
                        NotifyPayload {
                            related_post_id: Some(post_id),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(|e| saga.fail("notification", e))?;

                (LikeAction::Liked, post.likes_count + 1)
            },
            true => {
                let deleted = self
                    .repos
                    .likes
                    .delete(&post_id, &user_id)
                    .await
                    .map_err(|e| saga.fail("like", e))?;

                if !deleted {
                    return Ok(toggle_like::Output {
                        action: LikeAction::Unliked,
                        likes_count: post.likes_count,
                    });
                }
                saga.done("like");

                self.counters
                    .adjust_post(&post_id, PostCounter::Likes, -1)
                    .await
                    .map_err(|e| saga.fail("likes_count", e))?;

                (LikeAction::Unliked, (post.likes_count - 1).max(0))
            },
        };

        toggle_like::Output {
            action,
            likes_count,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct CreateCommentInteractor {
    pub repos: Repositories,
    pub counters: EngagementCounters,
    pub fanout: NotificationFanout,
}
#[async_trait]
impl create_comment::Usecase for CreateCommentInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(
        &self,
        data: create_comment::Input,
    ) -> Result<create_comment::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let create_comment::Input {
            post_id,
            user_id,
            text,
        } = data;

        if text.trim().is_empty() {
            return Err(UsecaseError::Validation(
                "comment text is required".to_string(),
            ));
        }
        // the bound applies to the text as sent, surrounding whitespace included
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(UsecaseError::Validation(format!(
                "comment text must be {} characters or less",
                MAX_COMMENT_CHARS
            )));
        }
        let text = text.trim();

        let post = self
            .repos
            .posts
            .find(&post_id)
            .await
            .map_err(post_err_fmt)?;

        if user_id != post.author_id
            && !self
                .repos
                .follows
                .is_exists(&FollowId::new(&user_id, &post.author_id))
                .await?
        {
            return Err(UsecaseError::Forbidden(
                "you must follow the post author to comment".to_string(),
            ));
        }

        let comment = Comment {
            id: CommentId::new(),
            post_id,
            author_id: user_id.clone(),
            text: text.to_string(),
            created: Utc::now(),
        };

        let mut saga = Saga::new("create_comment");

        self.repos
            .comments
            .insert(comment.clone())
            .await
            .map_err(|e| saga.fail("comment", e))?;
        saga.done("comment");

        self.counters
            .adjust_post(&post_id, PostCounter::Comments, 1)
            .await
            .map_err(|e| saga.fail("comments_count", e))?;
        saga.done("comments_count");

        self.fanout
            .notify(
                &post.author_id,
                NotificationKind::Comment,
                &user_id,
                NotifyPayload {
                    related_post_id: Some(post_id),
                    comment_id: Some(comment.id),
                },
            )
            .await
            .map_err(|e| saga.fail("notification", e))?;
        saga.done("notification");

        let comments_count = self
            .repos
            .posts
            .find(&post_id)
            .await
            .map_err(|e| saga.fail("read_back", e))?
            .comments_count;

        create_comment::Output {
            comment,
            comments_count,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct DeleteCommentInteractor {
    pub repos: Repositories,
    pub counters: EngagementCounters,
}
#[async_trait]
impl delete_comment::Usecase for DeleteCommentInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(
        &self,
        data: delete_comment::Input,
    ) -> Result<delete_comment::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let delete_comment::Input {
            comment_id,
            requester,
        } = data;

        let comment = self
            .repos
            .comments
            .find(&comment_id)
            .await
            .map_err(comment_err_fmt)?;

        let post = match self.repos.posts.find(&comment.post_id).await {
            Ok(p) => Some(p),
            Err(RepositoryError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let allowed = comment.author_id == requester
            || post
                .as_ref()
                .map(|p| p.author_id == requester)
                .unwrap_or(false);
        if !allowed {
            return Err(UsecaseError::Forbidden(
                "only the comment author or the post author can delete this comment".to_string(),
            ));
        }

        let mut saga = Saga::new("delete_comment");

        self.repos
            .comments
            .delete(&comment_id)
            .await
            .map_err(|e| saga.fail("comment", e))?;
        saga.done("comment");

        if post.is_some() {
            self.counters
                .adjust_post(&comment.post_id, PostCounter::Comments, -1)
                .await
                .map_err(|e| saga.fail("comments_count", e))?;
        }

        // best effort
        match self
            .repos
            .notifications
            .delete_by_comment(&comment_id)
            .await
        {
            Ok(n) => tracing::debug!("removed {} notification(s) of comment {}", n, comment_id),
            Err(e) => tracing::warn!(
                "cannot remove notifications of comment {}: {}",
                comment_id,
                e
            ),
        }

        delete_comment::Output { comment }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct CommentsInteractor {
    pub repos: Repositories,
    pub limits: Limits,
}
#[async_trait]
impl comments::Usecase for CommentsInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: comments::Input) -> Result<comments::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let comments::Input {
            post_id,
            cursor,
            limit,
        } = data;
        let limit = self.limits.page(limit);

        self.repos
            .posts
            .find(&post_id)
            .await
            .map_err(post_err_fmt)?;

        let rows = self
            .repos
            .comments
            .finds(CommentQuery {
                post: Some(post_id),
                after: cursor,
                limit: Some(limit + 1),
            })
            .await?;
        let (rows, has_more) = split_page(rows, limit);

        let mut entries = Vec::with_capacity(rows.len());
        for comment in rows {
            let author = profile_of(&*self.repos.users, &comment.author_id).await?;
            entries.push(CommentEntry { comment, author });
        }

        comments::Output { entries, has_more }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct CreatePostInteractor {
    pub repos: Repositories,
    pub counters: EngagementCounters,
}
#[async_trait]
impl create_post::Usecase for CreatePostInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: create_post::Input) -> Result<create_post::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let create_post::Input {
            author_id,
            content,
            mut topics,
        } = data;

        content.validate().map_err(UsecaseError::Validation)?;

        let mut seen = HashSet::new();
        topics.retain(|t| !t.0.trim().is_empty() && seen.insert(t.clone()));
        if topics.is_empty() {
            return Err(UsecaseError::Validation(
                "at least one topic is required".to_string(),
            ));
        }

        let now = Utc::now();
        let post = Post {
            id: PostId::new(),
            author_id: author_id.clone(),
            content,
            topics,
            likes_count: 0,
            comments_count: 0,
            created: now,
            updated: now,
        };

        let mut saga = Saga::new("create_post");

        self.repos
            .posts
            .insert(post.clone())
            .await
            .map_err(|e| saga.fail("post", e))?;
        saga.done("post");

        self.counters
            .increment_post_count(&author_id, 1)
            .await
            .map_err(|e| saga.fail("posts_count", e))?;

        create_post::Output { post }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct DeletePostInteractor {
    pub repos: Repositories,
    pub counters: EngagementCounters,
}
#[async_trait]
impl delete_post::Usecase for DeletePostInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: delete_post::Input) -> Result<delete_post::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let delete_post::Input { post_id, requester } = data;

        let post = self
            .repos
            .posts
            .find(&post_id)
            .await
            .map_err(post_err_fmt)?;

        if post.author_id != requester {
            let user = self
                .repos
                .users
                .find(&requester)
                .await
                .map_err(user_err_fmt)?;

            if !user.admin {
                return Err(UsecaseError::Forbidden(
                    "only the author or an admin can delete this post".to_string(),
                ));
            }
        }

        let mut saga = Saga::new("delete_post");

        let post = self
            .repos
            .posts
            .delete(&post_id)
            .await
            .map_err(|e| saga.fail("post", e))?;
        saga.done("post");

        let removed_likes = self
            .repos
            .likes
            .delete_by_post(&post_id)
            .await
            .map_err(|e| saga.fail("likes", e))?;
        saga.done("likes");

        self.counters
            .increment_post_count(&post.author_id, -1)
            .await
            .map_err(|e| saga.fail("posts_count", e))?;

        delete_post::Output {
            post,
            removed_likes,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}
