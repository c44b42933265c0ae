//! The network seam between the provider and the session backend.

use crate::api::{AuthResponse, LoginRequest, SessionResponse, SignupRequest};
use futures::future::BoxFuture;

pub mod http;

pub use http::HttpTransport;

/// Boxed future returned by [`AuthTransport`] methods.
pub type TransportFuture<'a, T> = BoxFuture<'a, Result<T, TransportError>>;

/// Errors produced by an [`AuthTransport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or its response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("Request failed with status {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },
    /// The backend answered with a body that does not match the expected payload.
    #[error("JSON deserialization error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    /// Returns the human readable message the backend attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            TransportError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Returns the HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Http(err) => err.status().map(|s| s.as_u16()),
            TransportError::Decode(_) => None,
        }
    }

    /// Returns `true` if the backend refused the request for lack of a valid session.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Calls against the session backend.
///
/// Implementations must send every request with the session cookie attached.
pub trait AuthTransport: Send + Sync {
    /// `GET /api/users/me`
    fn current_user(&self) -> TransportFuture<'_, SessionResponse>;

    /// `POST /api/users/signup`
    fn signup<'a>(&'a self, request: &'a SignupRequest) -> TransportFuture<'a, AuthResponse>;

    /// `POST /api/users/login`
    fn login<'a>(&'a self, request: &'a LoginRequest) -> TransportFuture<'a, AuthResponse>;

    /// `POST /api/users/logout`
    fn logout(&self) -> TransportFuture<'_, ()>;
}
