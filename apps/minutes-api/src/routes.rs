use axum::{
	Json, Router,
	body::{Body, Bytes},
	extract::State,
	http::{StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use futures_util::StreamExt;
use serde_json::{Value, json};
use tracing::Instrument;
use uuid::Uuid;

use crate::state::AppState;
use minutes_domain::Message;
use minutes_service::{AnswerStream, Error as ServiceError, SingleTurnReply};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/chat", post(chat).fallback(method_not_allowed))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
	ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
	let request_id = Uuid::new_v4();

	handle_chat(&state, &body).instrument(tracing::info_span!("chat", %request_id)).await
}

/// `messages` selects the streamed multi-turn reply; otherwise `message` gets a JSON answer.
async fn handle_chat(state: &AppState, body: &[u8]) -> Result<Response, ApiError> {
	let payload: Value = serde_json::from_slice(body).map_err(|err| {
		ApiError::bad_request(format!("Request body must be a JSON object: {err}."))
	})?;

	if let Some(raw) = payload.get("messages").filter(|raw| raw.is_array()) {
		let messages: Vec<Message> = serde_json::from_value(raw.clone()).map_err(|err| {
			ApiError::bad_request(format!("messages must be role/content pairs: {err}."))
		})?;

		tracing::info!(turns = messages.len(), "Multi-turn chat.");

		let answer = state.service.chat_stream(&messages).await?;

		return Ok(octet_stream(answer));
	}

	let Some(message) =
		payload.get("message").and_then(Value::as_str).filter(|message| !message.is_empty())
	else {
		return Err(ApiError::bad_request("message must be a non-empty string."));
	};

	tracing::info!("Single-turn chat.");

	match state.service.answer(message).await? {
		SingleTurnReply::Choices(choices) => Ok(Json(json!({ "results": choices })).into_response()),
		SingleTurnReply::Rejected { status, body } =>
			Ok(ApiError::new(upstream_status(Some(status)), body).into_response()),
	}
}

/// Fragments are written as they arrive. A failure after the first byte can only be signalled
/// by cutting the body short.
fn octet_stream(answer: AnswerStream) -> Response {
	let body = answer.map(|item| {
		item.map(Bytes::from)
			.inspect_err(|err| tracing::error!(error = %err, "Answer stream terminated early."))
	});

	([(header::CONTENT_TYPE, "application/octet-stream")], Body::from_stream(body)).into_response()
}

fn upstream_status(status: Option<u16>) -> StatusCode {
	status
		.and_then(|status| StatusCode::from_u16(status).ok())
		.filter(|status| status.is_client_error() || status.is_server_error())
		.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Renders as `{"error": ...}` with `status`.
#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error: Value,
}
impl ApiError {
	pub fn new(status: StatusCode, error: impl Into<Value>) -> Self {
		Self { status, error: error.into() }
	}

	fn bad_request(message: impl Into<String>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, message.into())
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let status = match &err {
			ServiceError::Validation { .. } => StatusCode::BAD_REQUEST,
			ServiceError::Upstream { status, .. } => upstream_status(*status),
			ServiceError::Protocol { .. } | ServiceError::Internal { .. } =>
				StatusCode::INTERNAL_SERVER_ERROR,
		};

		if status.is_server_error() {
			tracing::error!(error = %err, %status, "Chat request failed.");
		} else {
			tracing::warn!(error = %err, %status, "Chat request rejected.");
		}

		Self::new(status, err.to_string())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(json!({ "error": self.error }))).into_response()
	}
}
