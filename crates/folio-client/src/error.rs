//! Error types for backend requests.

use folio_core::error::FolioError;

/// Errors from the backend HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend answered with a non-2xx status.
    ///
    /// `detail` carries the JSON error body's `detail` field when present,
    /// else the canonical status reason.
    #[error("request failed with status {status}: {detail}")]
    RequestFailed { status: u16, detail: String },

    /// The request never produced a response (DNS, connect, abort).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be read or parsed.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<ClientError> for FolioError {
    fn from(err: ClientError) -> Self {
        FolioError::Client(err.to_string())
    }
}
