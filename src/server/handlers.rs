//! HTTP endpoint handlers
//!
//! Function endpoints answer with flat `{..., success}` objects; store
//! endpoints wrap their record in `{data, success}`. Every failure is
//! reported as `{error, success: false}`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::board::{default_file_name, BoardService};
use crate::error::CoboardError;
use crate::storage::{Analysis, ChatMessage};

/// Shared state handed to every handler
pub type AppState = Arc<BoardService>;

/// Message returned for bodies that are not the expected JSON
pub const INVALID_JSON: &str = "Invalid JSON in request body";

/// Error response carrying the underlying failure
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<CoboardError>() {
            Some(CoboardError::Validation(_)) => StatusCode::BAD_REQUEST,
            Some(CoboardError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(CoboardError::MethodNotAllowed(_)) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    success: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.0);
        } else {
            tracing::debug!("Rejected request: {}", self.0);
        }

        let body = ErrorBody {
            error: self.0.to_string(),
            success: false,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|_| CoboardError::Validation(INVALID_JSON.to_string()).into())
}

/// `Path` extractor whose rejection uses the error envelope
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> ApiResult<Self> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(CoboardError::Validation(rejection.body_text()).into()),
        }
    }
}

/// `Query` extractor whose rejection uses the error envelope
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> ApiResult<Self> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(CoboardError::Validation(rejection.body_text()).into()),
        }
    }
}

/// Store endpoint envelope
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
    pub success: bool,
}

fn data<T: Serialize>(data: T) -> Json<DataEnvelope<T>> {
    Json(DataEnvelope {
        data,
        success: true,
    })
}

// ── Function endpoints ───────────────────────────────────────────────

/// Request body for POST /functions/v1/chat
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Response body for POST /functions/v1/chat
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub exchange: ChatMessage,
    pub success: bool,
}

/// POST /functions/v1/chat: answer one user message
pub async fn chat(State(service): State<AppState>, body: Bytes) -> ApiResult<Json<ChatResponse>> {
    let request: ChatRequest = parse_body(&body)?;
    let conversation_id = request.conversation_id.unwrap_or_default();
    let message = request.message.unwrap_or_default();

    let reply = service.send_message(&conversation_id, &message).await?;
    Ok(Json(ChatResponse {
        message: reply.message,
        exchange: reply.exchange,
        success: true,
    }))
}

/// Request body for POST /functions/v1/meta
#[derive(Debug, Default, Deserialize)]
pub struct MetaRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// Response body for POST /functions/v1/meta
#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub analysis: Analysis,
    pub message_count: usize,
    pub success: bool,
}

/// POST /functions/v1/meta: refresh some or all analysis categories
pub async fn meta(State(service): State<AppState>, body: Bytes) -> ApiResult<Json<MetaResponse>> {
    let request: MetaRequest = parse_body(&body)?;
    let conversation_id = request.conversation_id.unwrap_or_default();

    let outcome = service
        .analyze(&conversation_id, request.categories.as_deref())
        .await?;
    Ok(Json(MetaResponse {
        analysis: outcome.analysis,
        message_count: outcome.message_count,
        success: true,
    }))
}

// ── Store endpoints ──────────────────────────────────────────────────

/// Body for creating or renaming a conversation
#[derive(Debug, Default, Deserialize)]
pub struct TitleRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// GET /api/conversations
pub async fn list_conversations(State(service): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(data(service.list_conversations()?))
}

/// POST /api/conversations: an empty body creates an untitled conversation
pub async fn create_conversation(
    State(service): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let request: TitleRequest = if body.is_empty() {
        TitleRequest::default()
    } else {
        parse_body(&body)?
    };
    let conversation = service.create_conversation(request.title.as_deref())?;
    Ok((StatusCode::CREATED, data(conversation)))
}

/// PATCH /api/conversations/:id
pub async fn rename_conversation(
    State(service): State<AppState>,
    ApiPath(id): ApiPath<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let request: TitleRequest = parse_body(&body)?;
    let title = request.title.unwrap_or_default();
    Ok(data(service.rename_conversation(&id, &title)?))
}

/// DELETE /api/conversations/:id
pub async fn delete_conversation(
    State(service): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(service.delete_conversation(&id)?))
}

/// GET /api/conversations/:id/messages
pub async fn list_messages(
    State(service): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(service.messages(&id)?))
}

/// Query string for GET /api/conversations/:id/points
#[derive(Debug, Default, Deserialize)]
pub struct PointsQuery {
    #[serde(default)]
    pub hidden: bool,
}

/// GET /api/conversations/:id/points?hidden=true|false
pub async fn list_points(
    State(service): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(query): ApiQuery<PointsQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(service.points(&id, query.hidden)?))
}

/// GET /api/conversations/:id/export: the export document as a download
pub async fn export_analysis(
    State(service): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let export = service.export(&id)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        default_file_name(export.exported_at.date_naive())
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(export)))
}

/// POST /api/points/:id/hide
pub async fn hide_point(
    State(service): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(service.hide_point(&id)?))
}

/// POST /api/points/:id/restore
pub async fn restore_point(
    State(service): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(service.restore_point(&id)?))
}

/// DELETE /api/points/:id
pub async fn delete_point(
    State(service): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(service.delete_point(&id)?))
}

/// Fallback for a known path called with an unsupported method
pub async fn method_not_allowed(method: Method) -> ApiError {
    CoboardError::MethodNotAllowed(method.to_string()).into()
}

/// Fallback for paths no route matches
pub async fn route_not_found(uri: Uri) -> ApiError {
    CoboardError::NotFound(format!("Route {}", uri.path())).into()
}

/// Response body for GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
}

/// GET /health
pub async fn health(State(service): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: service.config().provider.model.clone(),
    })
}
