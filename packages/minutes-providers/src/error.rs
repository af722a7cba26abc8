use serde_json::Value;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	/// The provider answered with a non-success status, or reported an error in-band.
	#[error("{message}")]
	Upstream { status: Option<u16>, message: String, body: Option<Value> },
	/// A streaming frame violated the event-stream contract.
	#[error("{message}")]
	Protocol { message: String },
}
impl Error {
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Upstream { status, .. } => *status,
			Self::Reqwest(err) => err.status().map(|status| status.as_u16()),
			_ => None,
		}
	}
}
