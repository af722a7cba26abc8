mod error;

pub use error::{Error, Result};

use std::{
	collections::HashMap,
	convert::Infallible,
	future::IntoFuture,
	sync::{Arc, Mutex},
	time::Duration,
};

use axum::{
	Router,
	body::{Body, Bytes},
	extract::State,
	http::{HeaderMap, Method, StatusCode, Uri, header},
	response::{IntoResponse, Response},
};
use futures_util::stream;
use serde_json::Value;
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

/// Canned answer for one stubbed path.
#[derive(Clone, Debug)]
pub enum StubResponse {
	Json { status: StatusCode, body: Value },
	Text { status: StatusCode, body: String },
	/// Each entry is written as its own body chunk with `delay` between chunks.
	EventStream { chunks: Vec<Vec<u8>>, delay: Duration },
}
impl StubResponse {
	pub fn json(body: Value) -> Self {
		Self::Json { status: StatusCode::OK, body }
	}

	pub fn json_status(status: u16, body: Value) -> Self {
		Self::Json { status: status_code(status), body }
	}

	pub fn text(status: u16, body: impl Into<String>) -> Self {
		Self::Text { status: status_code(status), body: body.into() }
	}

	pub fn event_stream<I, C>(chunks: I) -> Self
	where
		I: IntoIterator<Item = C>,
		C: Into<Vec<u8>>,
	{
		Self::EventStream {
			chunks: chunks.into_iter().map(Into::into).collect(),
			delay: Duration::from_millis(5),
		}
	}

	/// `data: {"choices":[{"delta":{"content":...}}]}` frames followed by `data: [DONE]`.
	pub fn completion_stream(fragments: &[&str]) -> Self {
		let mut chunks: Vec<String> = fragments
			.iter()
			.map(|fragment| {
				let frame = serde_json::json!({ "choices": [{ "delta": { "content": fragment } }] });

				format!("data: {frame}\n\n")
			})
			.collect();

		chunks.push("data: [DONE]\n\n".to_string());

		Self::event_stream(chunks)
	}
}

/// One request received by a [`StubServer`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: Method,
	pub path: String,
	pub headers: HeaderMap,
	/// Parsed JSON body, or `Value::Null` when the body is not JSON.
	pub body: Value,
}

struct StubState {
	routes: HashMap<String, StubResponse>,
	requests: Mutex<Vec<RecordedRequest>>,
}

/// A loopback HTTP server standing in for an upstream provider. Shuts down on drop.
pub struct StubServer {
	base_url: String,
	state: Arc<StubState>,
	shutdown: Option<Sender<()>>,
}
impl StubServer {
	pub async fn start<I, P>(routes: I) -> Result<Self>
	where
		I: IntoIterator<Item = (P, StubResponse)>,
		P: Into<String>,
	{
		let state = Arc::new(StubState {
			routes: routes.into_iter().map(|(path, response)| (path.into(), response)).collect(),
			requests: Mutex::new(Vec::new()),
		});
		let app = Router::new().fallback(handle).with_state(state.clone());
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, app).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			if let Err(err) = server.into_future().await {
				tracing::error!(error = %err, "Stub server stopped.");
			}
		});

		Ok(Self { base_url: format!("http://{addr}"), state, shutdown: Some(tx) })
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.state.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
		self.requests().into_iter().filter(|request| request.path == path).collect()
	}
}
impl Drop for StubServer {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

async fn handle(
	State(state): State<Arc<StubState>>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	let path = uri.path().to_string();
	let recorded = RecordedRequest {
		method,
		path: path.clone(),
		headers,
		body: serde_json::from_slice(&body).unwrap_or(Value::Null),
	};

	state.requests.lock().unwrap_or_else(|err| err.into_inner()).push(recorded);

	let Some(response) = state.routes.get(&path).cloned() else {
		return (StatusCode::NOT_FOUND, format!("No stub for {path}.")).into_response();
	};

	match response {
		StubResponse::Json { status, body } => (status, axum::Json(body)).into_response(),
		StubResponse::Text { status, body } => (status, body).into_response(),
		StubResponse::EventStream { chunks, delay } => {
			let body = stream::unfold(chunks.into_iter(), move |mut chunks| async move {
				let chunk = chunks.next()?;

				tokio::time::sleep(delay).await;

				Some((Ok::<_, Infallible>(chunk), chunks))
			});

			([(header::CONTENT_TYPE, "text/event-stream")], Body::from_stream(body)).into_response()
		},
	}
}

fn status_code(status: u16) -> StatusCode {
	StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
