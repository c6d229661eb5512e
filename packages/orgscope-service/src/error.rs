pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<orgscope_storage::Error> for Error {
	fn from(err: orgscope_storage::Error) -> Self {
		match err {
			orgscope_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			orgscope_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
