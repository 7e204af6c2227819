use std::error;
use std::fmt;

/// Classification of a failed request.
///
/// Every failure surfaces through the `error` event; nothing is raised
/// out of `send()` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The transport could not complete the exchange at all.
    Network,

    /// The transport exceeded its configured timeout.
    Timeout,

    /// A valid HTTP exchange whose status is outside 200-399.
    HttpStatus,

    /// Status was in 200-399 but the body failed to decode under the
    /// configured decode mode.
    Parse,
}

/// Payload of an `error` event.
///
/// `status` and `status_text` follow the transport for network and HTTP
/// failures. A timeout forces `status_text` to `"Timeout"`. A decode
/// failure forces `status` to `0` and `status_text` to `"parsererror"`
/// and attaches the decode error as [`source`][error::Error::source].
#[derive(Debug)]
pub struct ErrorEvent {
    /// What went wrong.
    pub kind: ErrorKind,
    /// HTTP status, `0` when no meaningful status exists.
    pub status: u16,
    /// Status text per the contract above.
    pub status_text: String,
    /// The decode failure for [`ErrorKind::Parse`], `None` otherwise.
    pub cause: Option<serde_json::Error>,
}

impl ErrorEvent {
    pub(crate) fn network(status: u16, status_text: String) -> ErrorEvent {
        ErrorEvent {
            kind: ErrorKind::Network,
            status,
            status_text,
            cause: None,
        }
    }

    pub(crate) fn timeout(status: u16) -> ErrorEvent {
        ErrorEvent {
            kind: ErrorKind::Timeout,
            status,
            status_text: "Timeout".to_string(),
            cause: None,
        }
    }

    pub(crate) fn http_status(status: u16, status_text: String) -> ErrorEvent {
        ErrorEvent {
            kind: ErrorKind::HttpStatus,
            status,
            status_text,
            cause: None,
        }
    }

    pub(crate) fn parse(cause: serde_json::Error) -> ErrorEvent {
        ErrorEvent {
            kind: ErrorKind::Parse,
            status: 0,
            status_text: "parsererror".to_string(),
            cause: Some(cause),
        }
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Network => {
                if self.status_text.is_empty() {
                    write!(f, "network error (status {})", self.status)
                } else {
                    write!(f, "network error: {}", self.status_text)
                }
            }
            ErrorKind::Timeout => write!(f, "request timed out"),
            ErrorKind::HttpStatus => {
                write!(f, "http status {} {}", self.status, self.status_text)
            }
            ErrorKind::Parse => match &self.cause {
                Some(e) => write!(f, "body decode failed: {}", e),
                None => write!(f, "body decode failed"),
            },
        }
    }
}

impl error::Error for ErrorEvent {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e as &(dyn error::Error + 'static))
    }
}
