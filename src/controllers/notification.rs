use alloc::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::{failed, invalid, parse_cursor, parse_id, ApiError, Caller, Reply};
use crate::constructors::App;
use crate::entities::NotificationId;
use crate::presenters::{MarkReadView, NotificationsView};
use crate::usecases::notification::{mark_read, notifications, ReadTarget};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationParams {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadBody {
    pub notification_id: Option<String>,
    #[serde(default)]
    pub mark_all: bool,
}

pub async fn notifications(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    params: Result<Query<NotificationParams>, QueryRejection>,
) -> Result<Reply<NotificationsView>, ApiError> {
    let Query(NotificationParams {
        unread_only,
        limit,
        cursor,
    }) = params.map_err(invalid)?;

    let out = app
        .notifications
        .handle(notifications::Input {
            user_id: caller.clone(),
            unread_only,
            cursor: parse_cursor::<NotificationId>(cursor)?,
            limit,
        })
        .await
        .map_err(failed("notifications", &caller))?;

    Ok(Reply::ok(out.into()))
}

pub async fn mark_read(
    State(app): State<Arc<App>>,
    Caller(caller): Caller,
    body: Result<Json<MarkReadBody>, JsonRejection>,
) -> Result<Reply<MarkReadView>, ApiError> {
    let Json(MarkReadBody {
        notification_id,
        mark_all,
    }) = body.map_err(invalid)?;

    let target = match (mark_all, notification_id) {
        (true, _) => ReadTarget::All,
        (false, Some(id)) => ReadTarget::One(parse_id::<NotificationId>("notificationId", &id)?),
        (false, None) => return Err(invalid("notificationId or markAll is required")),
    };

    let out = app
        .mark_read
        .handle(mark_read::Input {
            user_id: caller.clone(),
            target,
        })
        .await
        .map_err(failed("mark_read", &caller))?;

    Ok(Reply::ok(out.into()))
}
