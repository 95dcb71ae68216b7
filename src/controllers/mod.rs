use alloc::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{self, HeaderValue};
use axum::http::request::Parts;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::constructors::App;
use crate::entities::UserId;
use crate::usecases::UsecaseError;

pub mod auth;
pub mod engagement;
pub mod graph;
pub mod notification;
pub mod timeline;

/// Response body of every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Reply<T>(pub StatusCode, pub T);

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

impl<T> Reply<T> {
    pub fn ok(data: T) -> Self { Self(StatusCode::OK, data) }

    pub fn created(data: T) -> Self { Self(StatusCode::CREATED, data) }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let Reply(status, data) = self;

        (
            status,
            Json(Envelope {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

#[derive(Debug, ::thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Usecase(#[from] UsecaseError),
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("route not found")]
    RouteNotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Usecase(e) => match e {
                UsecaseError::Validation(_) | UsecaseError::SelfFollow => StatusCode::BAD_REQUEST,
                UsecaseError::NotFound(_) | UsecaseError::NotFollowing => StatusCode::NOT_FOUND,
                UsecaseError::Forbidden(_) => StatusCode::FORBIDDEN,
                UsecaseError::AlreadyFollowing => StatusCode::CONFLICT,
                UsecaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RouteNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::Usecase(UsecaseError::Internal(_)) => "Internal server error".to_string(),
            e => e.to_string(),
        };

        (
            status,
            Json(Envelope::<()> {
                success: false,
                data: None,
                error: Some(error),
            }),
        )
            .into_response()
    }
}

pub(crate) fn invalid(message: impl ToString) -> ApiError {
    ApiError::Usecase(UsecaseError::Validation(message.to_string()))
}

/// Logs a failed use case with the calling identity, before the cause is hidden from the caller.
pub(crate) fn failed<'a>(
    op: &'static str,
    caller: &'a UserId,
) -> impl FnOnce(UsecaseError) -> ApiError + 'a {
    move |e| {
        match e {
            UsecaseError::Internal(ref cause) => {
                tracing::error!(op, caller = %caller, "{:#}", cause)
            },
            ref e => tracing::warn!(op, caller = %caller, "{}", e),
        }

        ApiError::Usecase(e)
    }
}

pub(crate) fn parse_id<T>(name: &str, raw: &str) -> Result<T, ApiError>
where T: ::core::str::FromStr {
    raw.parse::<T>()
        .map_err(|_| invalid(format!("invalid {}: {}", name, raw)))
}

/// Empty strings count as absent.
pub(crate) fn parse_cursor<T>(raw: Option<String>) -> Result<Option<T>, ApiError>
where T: ::core::str::FromStr {
    match raw {
        Some(s) if !s.is_empty() => parse_id("cursor", &s).map(Some),
        _ => Ok(None),
    }
}

/// Identity of the caller, resolved from the `Authorization: Bearer` header.
pub struct Caller(pub UserId);

#[::async_trait::async_trait]
impl FromRequestParts<Arc<App>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, app: &Arc<App>) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        match app.auth.authenticate(token).await {
            Ok(Some(id)) => Ok(Caller(id)),
            Ok(None) => Err(ApiError::Unauthorized),
            Err(e) => {
                tracing::error!("authenticator failed: {:#}", e);
                Err(ApiError::Usecase(UsecaseError::Internal(e)))
            },
        }
    }
}

async fn preflight() -> StatusCode { StatusCode::NO_CONTENT }

async fn method_not_allowed() -> ApiError { ApiError::MethodNotAllowed }

async fn fallback(method: Method) -> Response {
    match method {
        Method::OPTIONS => StatusCode::NO_CONTENT.into_response(),
        _ => ApiError::RouteNotFound.into_response(),
    }
}

fn route(m: MethodRouter<Arc<App>>) -> MethodRouter<Arc<App>> {
    m.options(preflight).fallback(method_not_allowed)
}

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route(
            "/follow",
            route(post(graph::follow).get(graph::is_following)),
        )
        .route("/unfollow", route(post(graph::unfollow)))
        .route("/following", route(get(graph::following)))
        .route("/followers", route(get(graph::followers)))
        .route(
            "/following/activity",
            route(get(graph::following_activity)),
        )
        .route("/profile", route(get(graph::user_profile)))
        .route("/likes", route(post(engagement::toggle_like)))
        .route(
            "/comments",
            route(
                post(engagement::create_comment)
                    .delete(engagement::delete_comment)
                    .get(engagement::comments),
            ),
        )
        .route("/posts", route(post(engagement::create_post)))
        .route("/posts/delete", route(post(engagement::delete_post)))
        .route("/feed", route(get(timeline::feed)))
        .route("/recommendations", route(get(timeline::recommendations)))
        .route("/notifications", route(get(notification::notifications)))
        .route("/notifications/read", route(post(notification::mark_read)))
        .fallback(fallback)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("authorization, content-type"),
        ))
        .with_state(app)
}
