#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Search index request timed out.")]
	Timeout { source: reqwest::Error },
	#[error("Search index transport failure: {source}")]
	Transport { source: reqwest::Error },
	#[error("Search index returned status {status}: {body}")]
	Status { status: u16, body: String },
	#[error("Invalid search index response: {message}")]
	InvalidResponse { message: String },
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error(transparent)]
	Redis(#[from] redis::RedisError),
	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
impl Error {
	/// Timeouts and connectivity failures, as opposed to a backend that answered badly.
	pub fn is_unavailable(&self) -> bool {
		match self {
			Self::Timeout { .. } | Self::Transport { .. } => true,
			Self::Redis(err) => err.is_timeout() || err.is_connection_dropped() || err.is_io_error(),
			_ => false,
		}
	}
}
impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			return Self::Timeout { source: err };
		}
		if err.is_decode() {
			return Self::InvalidResponse { message: err.to_string() };
		}
		if let Some(status) = err.status() {
			return Self::Status { status: status.as_u16(), body: String::new() };
		}

		Self::Transport { source: err }
	}
}
