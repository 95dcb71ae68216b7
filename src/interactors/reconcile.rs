use async_trait::async_trait;

use super::{post_err_fmt, user_err_fmt};
use crate::entities::{PostId, UserId};
use crate::repositories::{
    CommentQuery, FollowQuery, PostCounters, PostQuery, Repositories, UserCounters, UserQuery,
};
use crate::usecases::reconcile::{reconcile, PostDrift, UserDrift};
use crate::usecases::UsecaseError;
use crate::utils::{AlsoChain, LetChain};

/// Recomputes denormalized counters from the source collections. Only ever run on demand.
pub struct ReconcileInteractor {
    pub repos: Repositories,
}

impl ReconcileInteractor {
    async fn user(&self, id: UserId) -> Result<UserDrift, UsecaseError> {
        let user = self.repos.users.find(&id).await.map_err(user_err_fmt)?;

        let stored = UserCounters {
            followers: user.followers_count,
            following: user.following_count,
            posts: user.posts_count,
        };
        let actual = UserCounters {
            followers: self
                .repos
                .follows
                .count(FollowQuery {
                    following: Some(id.clone()),
                    ..Default::default()
                })
                .await? as i64,
            following: self
                .repos
                .follows
                .count(FollowQuery {
                    follower: Some(id.clone()),
                    ..Default::default()
                })
                .await? as i64,
            posts: self
                .repos
                .posts
                .count(PostQuery {
                    author: Some(id.clone()),
                    ..Default::default()
                })
                .await? as i64,
        };

        if stored != actual {
            tracing::info!("user {} drifted: {:?} -> {:?}", id, stored, actual);
            self.repos.users.set_counters(&id, actual).await?;
        }

        Ok(UserDrift {
            user_id: id,
            stored,
            actual,
        })
    }

    async fn post(&self, id: PostId) -> Result<PostDrift, UsecaseError> {
        let post = self.repos.posts.find(&id).await.map_err(post_err_fmt)?;

        let stored = PostCounters {
            likes: post.likes_count,
            comments: post.comments_count,
        };
        let actual = PostCounters {
            likes: self.repos.likes.count(&id).await? as i64,
            comments: self
                .repos
                .comments
                .count(CommentQuery {
                    post: Some(id),
                    ..Default::default()
                })
                .await? as i64,
        };

        if stored != actual {
            tracing::info!("post {} drifted: {:?} -> {:?}", id, stored, actual);
            self.repos.posts.set_counters(&id, actual).await?;
        }

        Ok(PostDrift {
            post_id: id,
            stored,
            actual,
        })
    }
}

#[async_trait]
impl reconcile::Usecase for ReconcileInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: reconcile::Input) -> Result<reconcile::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let reconcile::Input {
            mut users,
            mut posts,
        } = data;

        if users.is_empty() && posts.is_empty() {
            users = self
                .repos
                .users
                .finds(UserQuery::default())
                .await?
                .into_iter()
                .map(|u| u.id)
                .collect();
            posts = self
                .repos
                .posts
                .finds(PostQuery::default())
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect();
        }

        let mut user_drifts = Vec::with_capacity(users.len());
        for id in users {
            user_drifts.push(self.user(id).await?);
        }

        let mut post_drifts = Vec::with_capacity(posts.len());
        for id in posts {
            post_drifts.push(self.post(id).await?);
        }

        reconcile::Output {
            users: user_drifts,
            posts: post_drifts,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}
