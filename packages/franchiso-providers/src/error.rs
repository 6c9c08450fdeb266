pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Request to {target} timed out.")]
	Timeout { target: &'static str, source: reqwest::Error },
	#[error("Request to {target} failed in transport.")]
	Transport { target: &'static str, source: reqwest::Error },
	#[error("{target} returned status {status}: {body}")]
	Status { target: &'static str, status: u16, body: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("{message}")]
	InvalidArgument { message: String },
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
}
impl Error {
	pub fn from_reqwest(target: &'static str, err: reqwest::Error) -> Self {
		if err.is_timeout() {
			return Self::Timeout { target, source: err };
		}
		if err.is_decode() {
			return Self::InvalidResponse { message: format!("{target} returned a malformed body: {err}") };
		}
		if let Some(status) = err.status() {
			return Self::Status { target, status: status.as_u16(), body: String::new() };
		}

		Self::Transport { target, source: err }
	}

	/// Timeouts and connectivity failures, as opposed to a collaborator that answered badly.
	pub fn is_unavailable(&self) -> bool {
		matches!(self, Self::Timeout { .. } | Self::Transport { .. })
	}
}
