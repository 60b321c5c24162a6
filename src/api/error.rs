use thiserror::Error;

/// Errors crossing the gateway boundary.
///
/// Non-2xx responses are all `Api` regardless of status code granularity;
/// the message comes from the response body when it carries one.
#[derive(Error, Debug)]
pub enum ApiError {
  #[error("not signed in")]
  AuthRequired,

  #[error("{message}")]
  Api { status: u16, message: String },

  #[error("network error: {0}")]
  Http(Box<reqwest::Error>),

  #[error("malformed response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("{0}")]
  Validation(String),

  #[error("not found: {0}")]
  NotFound(String),
}

impl From<reqwest::Error> for ApiError {
  fn from(error: reqwest::Error) -> Self {
    ApiError::Http(Box::new(error))
  }
}

impl ApiError {
  /// Whether the failure happened before any network call was made.
  pub fn is_auth(&self) -> bool {
    matches!(self, ApiError::AuthRequired)
  }
}
