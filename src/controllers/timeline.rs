use alloc::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;

use super::{failed, invalid, parse_cursor, ApiError, Caller, LimitParams, Reply};
use crate::constructors::App;
use crate::entities::{PostId, TopicId};
use crate::presenters::{FeedView, RecommendationsView};
use crate::usecases::recommendation::recommend;
use crate::usecases::timeline::{feed, FeedMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeParam {
    #[serde(alias = "bias")]
    Topic,
    Following,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    pub mode: Option<ModeParam>,
    pub topic_id: Option<TopicId>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// Without an explicit mode, a topic id selects topic mode.
fn feed_mode(mode: Option<ModeParam>, topic: Option<TopicId>) -> Result<FeedMode, ApiError> {
    let topic = topic.filter(|t| !t.0.is_empty());

    match (mode, topic) {
        (Some(ModeParam::Following), _) | (None, None) => Ok(FeedMode::Following),
        (Some(ModeParam::Topic), Some(t)) | (None, Some(t)) => Ok(FeedMode::Topic(t)),
        (Some(ModeParam::Topic), None) => Err(invalid("topicId is required for topic mode")),
    }
}

pub async fn feed(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    params: Result<Query<FeedParams>, QueryRejection>,
) -> Result<Reply<FeedView>, ApiError> {
    let Query(FeedParams {
        mode,
        topic_id,
        limit,
        cursor,
    }) = params.map_err(invalid)?;

    let out = app
        .feed
        .handle(feed::Input {
            requester: caller.clone(),
            mode: feed_mode(mode, topic_id)?,
            cursor: parse_cursor::<PostId>(cursor)?,
            limit,
        })
        .await
        .map_err(failed("feed", &caller))?;

    Ok(Reply::ok(out.into()))
}

pub async fn recommendations(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Reply<RecommendationsView>, ApiError> {
    let Query(LimitParams { limit }) = params.map_err(invalid)?;

    let out = app
        .recommend
        .handle(recommend::Input {
            requester: caller.clone(),
            limit,
        })
        .await
        .map_err(failed("recommend", &caller))?;

    Ok(Reply::ok(out.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_resolution() {
        assert_eq!(feed_mode(None, None).unwrap(), FeedMode::Following);
        assert_eq!(
            feed_mode(None, Some("BTS".into())).unwrap(),
            FeedMode::Topic("BTS".into())
        );
        assert_eq!(
            feed_mode(Some(ModeParam::Following), Some("BTS".into())).unwrap(),
            FeedMode::Following
        );
        assert!(feed_mode(Some(ModeParam::Topic), None).is_err());
    }
}
