use http::StatusCode;
use std::fmt;
use std::io;

/// Errors raised by the request dispatch and form-data layer.
///
/// Route lookup errors (`NotFound`, `MethodNotAllowed`) are answered with a
/// standard HTTP status by the dispatcher. Everything else is reported to the
/// handler or the lifecycle caller.
#[derive(Debug)]
pub enum HttpdError {
    /// No route is registered for the request path
    NotFound,
    /// The route exists but has no handler for the request method
    MethodNotAllowed,
    /// The requested form field is absent from the body
    FieldNotFound {
        /// Name of the missing field
        field: String,
    },
    /// Decoded data does not fit its destination buffer
    BufferTooSmall {
        /// Bytes required to hold the data
        needed: usize,
        /// Capacity of the destination buffer
        capacity: usize,
    },
    /// Writing the header block or body to the connection failed
    TransportWriteError(io::Error),
    /// A route with the same path was registered earlier
    DuplicatePath {
        /// The rejected path
        path: String,
    },
    /// A route was rejected before registration (no handler, bad path)
    InvalidRoute {
        /// The rejected path
        path: String,
        /// Why it was rejected
        reason: &'static str,
    },
    /// No request-scoped buffer could be obtained
    AllocationFailure,
    /// Header/body writes were issued out of order, repeated after a failure,
    /// or exceeded the declared content length
    ProtocolViolation(&'static str),
    /// Reading the request body from the transport failed
    BodyRead(io::Error),
    /// The server runtime could not be started
    Startup(io::Error),
}

impl HttpdError {
    /// HTTP status reported at the boundary for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            HttpdError::NotFound => StatusCode::NOT_FOUND,
            HttpdError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            HttpdError::FieldNotFound { .. } | HttpdError::BodyRead(_) => StatusCode::BAD_REQUEST,
            HttpdError::BufferTooSmall { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HttpdError::AllocationFailure => StatusCode::SERVICE_UNAVAILABLE,
            HttpdError::TransportWriteError(_)
            | HttpdError::DuplicatePath { .. }
            | HttpdError::InvalidRoute { .. }
            | HttpdError::ProtocolViolation(_)
            | HttpdError::Startup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for HttpdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpdError::NotFound => write!(f, "no route matches the request path"),
            HttpdError::MethodNotAllowed => {
                write!(f, "route exists but does not serve the request method")
            }
            HttpdError::FieldNotFound { field } => {
                write!(f, "form field '{field}' not present in request body")
            }
            HttpdError::BufferTooSmall { needed, capacity } => write!(
                f,
                "value of {needed} bytes does not fit a buffer of {capacity} bytes"
            ),
            HttpdError::TransportWriteError(e) => write!(f, "failed to write response: {e}"),
            HttpdError::DuplicatePath { path } => {
                write!(f, "route '{path}' is already registered")
            }
            HttpdError::InvalidRoute { path, reason } => {
                write!(f, "route '{path}' rejected: {reason}")
            }
            HttpdError::AllocationFailure => write!(f, "no request buffer available"),
            HttpdError::ProtocolViolation(what) => write!(f, "response protocol violation: {what}"),
            HttpdError::BodyRead(e) => write!(f, "failed to read request body: {e}"),
            HttpdError::Startup(e) => write!(f, "failed to start http server: {e}"),
        }
    }
}

impl std::error::Error for HttpdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpdError::TransportWriteError(e) | HttpdError::BodyRead(e) | HttpdError::Startup(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_status_mapping() {
        assert_eq!(HttpdError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            HttpdError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            HttpdError::BufferTooSmall {
                needed: 40,
                capacity: 32
            }
            .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            HttpdError::AllocationFailure.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_display_names_field() {
        let err = HttpdError::FieldNotFound {
            field: "ssid".into(),
        };
        assert_eq!(
            err.to_string(),
            "form field 'ssid' not present in request body"
        );
    }
}
