use alloc::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::{failed, invalid, ApiError, Caller, LimitParams, Reply};
use crate::constructors::App;
use crate::entities::{FollowId, UserId};
use crate::presenters::{
    FollowView, FollowingActivityView, GraphEntryView, IsFollowingView, PageView, UnfollowView,
    UserProfileView,
};
use crate::usecases::graph::{
    follow, followers, following, following_activity, is_following, unfollow, user_profile,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetBody {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetParams {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub user_id: Option<UserId>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

fn follow_cursor(raw: Option<String>) -> Option<FollowId> {
    raw.filter(|s| !s.is_empty()).map(FollowId)
}

pub async fn follow(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    body: Result<Json<TargetBody>, JsonRejection>,
) -> Result<Reply<FollowView>, ApiError> {
    let Json(TargetBody { user_id }) = body.map_err(invalid)?;

    let out = app
        .follow
        .handle(follow::Input {
            follower_id: caller.clone(),
            target_id: user_id,
        })
        .await
        .map_err(failed("follow", &caller))?;

    Ok(Reply::created(out.into()))
}

pub async fn unfollow(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    body: Result<Json<TargetBody>, JsonRejection>,
) -> Result<Reply<UnfollowView>, ApiError> {
    let Json(TargetBody { user_id }) = body.map_err(invalid)?;

    let out = app
        .unfollow
        .handle(unfollow::Input {
            follower_id: caller.clone(),
            target_id: user_id,
        })
        .await
        .map_err(failed("unfollow", &caller))?;

    Ok(Reply::ok(out.into()))
}

pub async fn is_following(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    params: Result<Query<TargetParams>, QueryRejection>,
) -> Result<Reply<IsFollowingView>, ApiError> {
    let Query(TargetParams { user_id }) = params.map_err(invalid)?;

    let out = app
        .is_following
        .handle(is_following::Input {
            follower_id: caller.clone(),
            target_id: user_id,
        })
        .await
        .map_err(failed("is_following", &caller))?;

    Ok(Reply::ok(out.into()))
}

pub async fn following(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Reply<PageView<GraphEntryView>>, ApiError> {
    let Query(ListParams {
        user_id,
        limit,
        cursor,
    }) = params.map_err(invalid)?;

    let out = app
        .following
        .handle(following::Input {
            requester: caller.clone(),
            user_id: user_id.unwrap_or_else(|| caller.clone()),
            cursor: follow_cursor(cursor),
            limit,
        })
        .await
        .map_err(failed("following", &caller))?;

    Ok(Reply::ok(out.into()))
}

pub async fn followers(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Reply<PageView<GraphEntryView>>, ApiError> {
    let Query(ListParams {
        user_id,
        limit,
        cursor,
    }) = params.map_err(invalid)?;

    let out = app
        .followers
        .handle(followers::Input {
            user_id: user_id.unwrap_or_else(|| caller.clone()),
            cursor: follow_cursor(cursor),
            limit,
        })
        .await
        .map_err(failed("followers", &caller))?;

    Ok(Reply::ok(out.into()))
}

pub async fn user_profile(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    params: Result<Query<TargetParams>, QueryRejection>,
) -> Result<Reply<UserProfileView>, ApiError> {
    let Query(TargetParams { user_id }) = params.map_err(invalid)?;

    let out = app
        .user_profile
        .handle(user_profile::Input {
            requester: caller.clone(),
            user_id,
        })
        .await
        .map_err(failed("user_profile", &caller))?;

    Ok(Reply::ok(out.into()))
}

pub async fn following_activity(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Reply<FollowingActivityView>, ApiError> {
    let Query(LimitParams { limit }) = params.map_err(invalid)?;

    let out = app
        .following_activity
        .handle(following_activity::Input {
            requester: caller.clone(),
            limit,
        })
        .await
        .map_err(failed("following_activity", &caller))?;

    Ok(Reply::ok(out.into()))
}
