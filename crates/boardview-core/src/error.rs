//! Service error taxonomy.

use boardview_remote::RemoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// No API key, or the remote platform rejected it.
    #[error("{0}")]
    Authentication(String),

    /// A required input field is missing or blank.
    #[error("{0}")]
    Validation(String),

    /// Transport failure or upstream error; the upstream message is kept.
    #[error("{0}")]
    Remote(RemoteError),
}

impl ServiceError {
    pub fn missing_field(field: &str) -> Self {
        Self::Validation(format!("{field} is required"))
    }
}

impl From<RemoteError> for ServiceError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unauthorized { message, .. } => Self::Authentication(message),
            other => Self::Remote(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Reject a missing or blank required string, returning it trimmed.
pub(crate) fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ServiceError::missing_field(field))
}
