use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::counters::EngagementCounters;
use super::notification::NotificationFanout;
use super::{profile_of, user_err_fmt, Saga};
use crate::config::Limits;
use crate::entities::{Follow, FollowId, NotificationKind};
use crate::repositories::{FollowQuery, PostQuery, Repositories, UserCounter};
use crate::usecases::graph::{
    follow, followers, following, following_activity, is_following, unfollow, user_profile,
    ActivityEntry, GraphEntry,
};
use crate::usecases::UsecaseError;
use crate::utils::{split_page, AlsoChain, LetChain};

pub struct FollowInteractor {
    pub repos: Repositories,
    pub counters: EngagementCounters,
    pub fanout: NotificationFanout,
}
#[async_trait]
impl follow::Usecase for FollowInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: follow::Input) -> Result<follow::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let follow::Input {
            follower_id,
            target_id,
        } = data;

        if follower_id == target_id {
            return Err(UsecaseError::SelfFollow);
        }

        if !self.repos.users.is_exists(&target_id).await? {
            return Err(UsecaseError::NotFound("cannot find user.".to_string()));
        }

        let mut saga = Saga::new("follow");
        let edge = Follow::new(follower_id.clone(), target_id.clone());

        // insert-if-absent on the edge key: the losing side of a race sees `false`
        let inserted = self
            .repos
            .follows
            .insert(edge.clone())
            .await
            .map_err(|e| saga.fail("edge", e))?;
        if !inserted {
            return Err(UsecaseError::AlreadyFollowing);
        }
        saga.done("edge");

        self.counters
            .adjust_user(&follower_id, UserCounter::Following, 1)
            .await
            .map_err(|e| saga.fail("following_count", e))?;
        saga.done("following_count");

        self.counters
            .adjust_user(&target_id, UserCounter::Followers, 1)
            .await
            .map_err(|e| saga.fail("followers_count", e))?;
        saga.done("followers_count");

        self.fanout
            .notify(
                &target_id,
                NotificationKind::Follow,
                &follower_id,
                Default::default(),
            )
            .await
            .map_err(|e| saga.fail("notification", e))?;

        follow::Output { follow: edge }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UnfollowInteractor {
    pub repos: Repositories,
    pub counters: EngagementCounters,
}
#[async_trait]
impl unfollow::Usecase for UnfollowInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: unfollow::Input) -> Result<unfollow::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let unfollow::Input {
            follower_id,
            target_id,
        } = data;

        let mut saga = Saga::new("unfollow");

        let deleted = self
            .repos
            .follows
            .delete(&FollowId::new(&follower_id, &target_id))
            .await
            .map_err(|e| saga.fail("edge", e))?;
        if !deleted {
            return Err(UsecaseError::NotFollowing);
        }
        saga.done("edge");

        self.counters
            .adjust_user(&follower_id, UserCounter::Following, -1)
            .await
            .map_err(|e| saga.fail("following_count", e))?;
        saga.done("following_count");

        self.counters
            .adjust_user(&target_id, UserCounter::Followers, -1)
            .await
            .map_err(|e| saga.fail("followers_count", e))?;

        unfollow::Output {
            follower_id,
            target_id,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

pub struct IsFollowingInteractor {
    pub repos: Repositories,
}
#[async_trait]
impl is_following::Usecase for IsFollowingInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(
        &self,
        data: is_following::Input,
    ) -> Result<is_following::Output, UsecaseError> {
        let is_following::Input {
            follower_id,
            target_id,
        } = data;

        self.repos
            .follows
            .is_exists(&FollowId::new(&follower_id, &target_id))
            .await?
            .let_(|following| is_following::Output { following })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct FollowingInteractor {
    pub repos: Repositories,
    pub limits: Limits,
}
#[async_trait]
impl following::Usecase for FollowingInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: following::Input) -> Result<following::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let following::Input {
            requester,
            user_id,
            cursor,
            limit,
        } = data;
        let limit = self.limits.page(limit);

        let rows = self
            .repos
            .follows
            .finds(FollowQuery {
                follower: Some(user_id),
                after: cursor,
                limit: Some(limit + 1),
                ..Default::default()
            })
            .await?;
        let (rows, has_more) = split_page(rows, limit);

        let mut entries = Vec::with_capacity(rows.len());
        for follow in rows {
            let profile = profile_of(&*self.repos.users, &follow.following_id).await?;
            let followed_back = self
                .repos
                .follows
                .is_exists(&FollowId::new(&follow.following_id, &requester))
                .await?;

            entries.push(GraphEntry {
                follow,
                profile,
                followed_back: Some(followed_back),
            });
        }

        following::Output { entries, has_more }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct FollowersInteractor {
    pub repos: Repositories,
    pub limits: Limits,
}
#[async_trait]
impl followers::Usecase for FollowersInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: followers::Input) -> Result<followers::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let followers::Input {
            user_id,
            cursor,
            limit,
        } = data;
        let limit = self.limits.page(limit);

        let rows = self
            .repos
            .follows
            .finds(FollowQuery {
                following: Some(user_id),
                after: cursor,
                limit: Some(limit + 1),
                ..Default::default()
            })
            .await?;
        let (rows, has_more) = split_page(rows, limit);

        let mut entries = Vec::with_capacity(rows.len());
        for follow in rows {
            let profile = profile_of(&*self.repos.users, &follow.follower_id).await?;

            entries.push(GraphEntry {
                follow,
                profile,
                followed_back: None,
            });
        }

        followers::Output { entries, has_more }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

/// Newest posts shown on a profile page.
pub const PROFILE_POSTS: usize = 20;

pub struct UserProfileInteractor {
    pub repos: Repositories,
}
#[async_trait]
impl user_profile::Usecase for UserProfileInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(
        &self,
        data: user_profile::Input,
    ) -> Result<user_profile::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let user_profile::Input { requester, user_id } = data;

        let user = self
            .repos
            .users
            .find(&user_id)
            .await
            .map_err(user_err_fmt)?;

        let is_following = self
            .repos
            .follows
            .is_exists(&FollowId::new(&requester, &user_id))
            .await?;
        let is_followed_by = self
            .repos
            .follows
            .is_exists(&FollowId::new(&user_id, &requester))
            .await?;

        let posts = self
            .repos
            .posts
            .finds(PostQuery {
                author: Some(user_id),
                limit: Some(PROFILE_POSTS),
                ..Default::default()
            })
            .await?;

        user_profile::Output {
            topics: user.topics.clone(),
            profile: user.into(),
            is_following,
            is_followed_by,
            posts,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(Ok)
    }
}

/// Most recently active first; users without posts go last in following order.
pub fn sort_by_activity(entries: &mut Vec<ActivityEntry>, limit: usize) {
    entries.sort_by(|a, b| match (a.latest_post_at, b.latest_post_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => ::core::cmp::Ordering::Less,
        (None, Some(_)) => ::core::cmp::Ordering::Greater,
        (None, None) => ::core::cmp::Ordering::Equal,
    });
    entries.truncate(limit);
}

pub struct FollowingActivityInteractor {
    pub repos: Repositories,
    pub limits: Limits,
}
#[async_trait]
impl following_activity::Usecase for FollowingActivityInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(
        &self,
        data: following_activity::Input,
    ) -> Result<following_activity::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let following_activity::Input { requester, limit } = data;
        let limit = self.limits.page(limit);

        let follows = self
            .repos
            .follows
            .finds(FollowQuery {
                follower: Some(requester),
                ..Default::default()
            })
            .await?;

        let new_since = Utc::now() - Duration::hours(24);
        let mut entries = Vec::with_capacity(follows.len());
        for follow in follows {
            let profile = match profile_of(&*self.repos.users, &follow.following_id).await? {
                Some(p) => p,
                None => continue,
            };

            let latest_post_at = self
                .repos
                .posts
                .finds(PostQuery {
                    author: Some(follow.following_id),
                    limit: Some(1),
                    ..Default::default()
                })
                .await?
                .into_iter()
                .next()
                .map(|p| p.created);

            entries.push(ActivityEntry {
                profile,
                latest_post_at,
                has_new_post: latest_post_at.map(|t| t >= new_since).unwrap_or(false),
            });
        }

        sort_by_activity(&mut entries, limit);

        following_activity::Output { entries }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}
