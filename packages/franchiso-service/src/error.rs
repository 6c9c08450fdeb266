pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Unavailable: {message}")]
	Unavailable { message: String },
	#[error("Backend failure: {message}")]
	BackendFailure { message: String },
}
impl From<franchiso_storage::Error> for Error {
	fn from(err: franchiso_storage::Error) -> Self {
		if err.is_unavailable() {
			return Self::Unavailable { message: err.to_string() };
		}

		Self::BackendFailure { message: err.to_string() }
	}
}

impl From<franchiso_providers::Error> for Error {
	fn from(err: franchiso_providers::Error) -> Self {
		if err.is_unavailable() {
			return Self::Unavailable { message: err.to_string() };
		}

		Self::BackendFailure { message: err.to_string() }
	}
}
