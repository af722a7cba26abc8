pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	Validation { message: String },
	/// A provider call failed. `status` is the provider's HTTP status when one was received.
	#[error("{message}")]
	Upstream { status: Option<u16>, message: String },
	#[error("Protocol error: {message}")]
	Protocol { message: String },
	#[error("Internal error: {message}")]
	Internal { message: String },
}
impl From<minutes_providers::Error> for Error {
	fn from(err: minutes_providers::Error) -> Self {
		use minutes_providers::Error as ProviderError;

		match err {
			ProviderError::Upstream { status, message, .. } => Self::Upstream { status, message },
			ProviderError::Protocol { message } => Self::Protocol { message },
			ProviderError::Reqwest(inner) => Self::Upstream {
				status: inner.status().map(|status| status.as_u16()),
				message: inner.to_string(),
			},
			ProviderError::InvalidResponse { message } => Self::Upstream { status: None, message },
			other => Self::Internal { message: other.to_string() },
		}
	}
}
