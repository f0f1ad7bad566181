//! Routing and dispatch errors.

use axum::http::StatusCode;
use axum::BoxError;
use http_body_util::LengthLimitError;
use std::error::Error as _;
use std::path::PathBuf;
use thiserror::Error;

use crate::http::HttpMethod;

/// Route table misconfiguration, raised while binding.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The processor does not expose the named action.
    #[error("cannot map to undefined action `{0}`")]
    UndefinedAction(String),

    /// The (method, pattern) pair is already bound.
    #[error("{method} {pattern} is already bound to `{action}`")]
    DuplicateRoute {
        method: HttpMethod,
        pattern: String,
        action: String,
    },

    /// Path patterns and mount prefixes must be absolute.
    #[error("invalid path pattern `{0}`: must start with '/'")]
    InvalidPattern(String),

    /// Static mount directory does not exist.
    #[error("static directory {0} does not exist")]
    MissingDirectory(PathBuf),
}

/// Failure while turning a request into a response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The action failed; the error is passed through as raised.
    #[error("action `{action}` failed: {source}")]
    Action {
        action: String,
        #[source]
        source: BoxError,
    },

    /// The request body could not be buffered.
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    /// No action registered under this name.
    #[error("no action named `{0}`")]
    UnknownAction(String),
}

impl DispatchError {
    /// Status the transport should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::Action { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Body(e) if exceeds_length_limit(e) => StatusCode::PAYLOAD_TOO_LARGE,
            DispatchError::Body(_) => StatusCode::BAD_REQUEST,
            DispatchError::UnknownAction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The action's own error, if this failure came from an action.
    pub fn action_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            DispatchError::Action { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Whether a body error was caused by a length limit, here or upstream.
fn exceeds_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = err.source();
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
