use alloc::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::{failed, invalid, parse_cursor, parse_id, ApiError, Caller, Reply};
use crate::constructors::App;
use crate::entities::{CommentId, PostContent, PostId, TopicId};
use crate::presenters::{
    CommentCreatedView, CommentView, LikeView, PageView, PostDeletedView, PostView,
};
use crate::usecases::engagement::{
    comments, create_comment, create_post, delete_comment, delete_post, toggle_like,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    pub post_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub post_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentParams {
    pub comment_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListParams {
    pub post_id: String,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: ::serde_json::Value,
    #[serde(default)]
    pub topic_ids: Vec<TopicId>,
}

/// Reassembles the tagged content from the flat `type`/`content` body fields.
fn post_content(kind: String, content: ::serde_json::Value) -> Result<PostContent, ApiError> {
    ::serde_json::from_value(::serde_json::json!({
        "type": kind,
        "content": content,
    }))
    .map_err(|e| invalid(format!("invalid post content: {}", e)))
}

pub async fn toggle_like(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    body: Result<Json<PostBody>, JsonRejection>,
) -> Result<Reply<LikeView>, ApiError> {
    let Json(PostBody { post_id }) = body.map_err(invalid)?;

    let out = app
        .toggle_like
        .handle(toggle_like::Input {
            post_id: parse_id::<PostId>("postId", &post_id)?,
            user_id: caller.clone(),
        })
        .await
        .map_err(failed("toggle_like", &caller))?;

    Ok(Reply::ok(out.into()))
}

pub async fn create_comment(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    body: Result<Json<CommentBody>, JsonRejection>,
) -> Result<Reply<CommentCreatedView>, ApiError> {
    let Json(CommentBody { post_id, text }) = body.map_err(invalid)?;

    let out = app
        .create_comment
        .handle(create_comment::Input {
            post_id: parse_id::<PostId>("postId", &post_id)?,
            user_id: caller.clone(),
            text,
        })
        .await
        .map_err(failed("create_comment", &caller))?;

    Ok(Reply::created(out.into()))
}

pub async fn delete_comment(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    params: Result<Query<CommentParams>, QueryRejection>,
) -> Result<Reply<CommentView>, ApiError> {
    let Query(CommentParams { comment_id }) = params.map_err(invalid)?;

    let out = app
        .delete_comment
        .handle(delete_comment::Input {
            comment_id: parse_id::<CommentId>("commentId", &comment_id)?,
            requester: caller.clone(),
        })
        .await
        .map_err(failed("delete_comment", &caller))?;

    Ok(Reply::ok(out.into()))
}

pub async fn comments(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    params: Result<Query<CommentListParams>, QueryRejection>,
) -> Result<Reply<PageView<CommentView>>, ApiError> {
    let Query(CommentListParams {
        post_id,
        limit,
        cursor,
    }) = params.map_err(invalid)?;

    let out = app
        .comments
        .handle(comments::Input {
            post_id: parse_id::<PostId>("postId", &post_id)?,
            cursor: parse_cursor::<CommentId>(cursor)?,
            limit,
        })
        .await
        .map_err(failed("comments", &caller))?;

    Ok(Reply::ok(out.into()))
}

pub async fn create_post(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    body: Result<Json<CreatePostBody>, JsonRejection>,
) -> Result<Reply<PostView>, ApiError> {
    let Json(CreatePostBody {
        kind,
        content,
        topic_ids,
    }) = body.map_err(invalid)?;

    let out = app
        .create_post
        .handle(create_post::Input {
            author_id: caller.clone(),
            content: post_content(kind, content)?,
            topics: topic_ids,
        })
        .await
        .map_err(failed("create_post", &caller))?;

    Ok(Reply::created(out.into()))
}

pub async fn delete_post(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    body: Result<Json<PostBody>, JsonRejection>,
) -> Result<Reply<PostDeletedView>, ApiError> {
    let Json(PostBody { post_id }) = body.map_err(invalid)?;

    let out = app
        .delete_post
        .handle(delete_post::Input {
            post_id: parse_id::<PostId>("postId", &post_id)?,
            requester: caller.clone(),
        })
        .await
        .map_err(failed("delete_post", &caller))?;

    Ok(Reply::ok(out.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_content_from_flat_body() {
        let content = post_content(
            "goods_trade".to_string(),
            ::serde_json::json!({
                "goodsTrade": {
                    "idolId": "bts",
                    "goodsImageUrl": "g.png",
                    "goodsName": "photocard",
                    "goodsTags": ["rm"],
                    "tradeType": "offer",
                }
            }),
        )
        .unwrap();

        assert_eq!(content.kind(), "goods_trade");
        assert!(content.validate().is_ok());
    }

    #[test]
    fn unknown_post_type_is_invalid() {
        assert!(post_content("poll".to_string(), ::serde_json::json!({})).is_err());
    }
}
