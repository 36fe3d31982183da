use super::auth::AuthenticationError;

/// Maximum number of body characters rendered by `Display`.
///
/// The full body stays available through [`ConjurError::body`].
pub(in crate::client) const BODY_MAX_LENGTH: usize = 1024;

/// Classification of a failed call.
///
/// Every [`ConjurError`] maps to exactly one kind. The HTTP kinds are derived
/// from the response status (see [`ErrorKind::from_status`]); the remaining
/// kinds describe failures that happen without a usable response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorKind {
    /// HTTP 400.
    #[display("bad request")]
    BadRequest,
    /// HTTP 401, the token was missing, expired or rejected.
    #[display("unauthorized")]
    Unauthorized,
    /// HTTP 403.
    #[display("forbidden")]
    Forbidden,
    /// HTTP 404.
    #[display("not found")]
    NotFound,
    /// HTTP 409, the resource already exists.
    #[display("conflict")]
    Conflict,
    /// Any other 4xx status.
    #[display("client error")]
    ClientError,
    /// Any 5xx status, or a status outside of the HTTP ranges.
    #[display("server error")]
    ServerError,
    /// No response was received (connection failure, timeout, ...).
    #[display("transport error")]
    TransportError,
    /// The response body could not be decoded into the expected record.
    #[display("decode error")]
    DecodeError,
    /// A caller-supplied argument was rejected before sending anything.
    #[display("invalid argument")]
    InvalidArgument,
    /// The client itself is misconfigured (endpoint, credentials encoding, ...).
    #[display("configuration error")]
    Configuration,
}

impl ErrorKind {
    /// Returns the kind for a failed HTTP status, or `None` when the status
    /// is a success (`200..=399`).
    ///
    /// ```rust
    /// use conjur_core::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::from_status(200), None);
    /// assert_eq!(ErrorKind::from_status(304), None);
    /// assert_eq!(ErrorKind::from_status(404), Some(ErrorKind::NotFound));
    /// assert_eq!(ErrorKind::from_status(418), Some(ErrorKind::ClientError));
    /// assert_eq!(ErrorKind::from_status(503), Some(ErrorKind::ServerError));
    /// ```
    pub fn from_status(status: u16) -> Option<Self> {
        let kind = match status {
            200..=399 => return None,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            402 | 405..=408 | 410..=499 => Self::ClientError,
            // 5xx, plus informational or out-of-range codes that should never
            // reach a client
            _ => Self::ServerError,
        };
        Some(kind)
    }
}

/// Errors returned by the Conjur clients.
///
/// Use [`ConjurError::kind`] to branch on the failure, and
/// [`ConjurError::status`] / [`ConjurError::body`] for diagnostics.
///
/// ```rust
/// use conjur_core::{ConjurError, ErrorKind};
///
/// let error = ConjurError::from_status(403, "no read privilege");
/// assert_eq!(error.kind(), ErrorKind::Forbidden);
/// assert_eq!(error.status(), Some(403));
/// assert_eq!(error.body(), Some("no read privilege"));
/// ```
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ConjurError {
    /// The server answered with a failure status.
    #[display("{kind} (HTTP {status}): {}", excerpt(body))]
    #[from(skip)]
    Http {
        /// Classification of the status.
        kind: ErrorKind,
        /// The HTTP status code.
        status: u16,
        /// The response body text, possibly empty.
        body: String,
    },

    /// No response was received.
    ///
    /// This is the only kind a caller should consider retrying.
    #[display("Transport error: {message}")]
    #[from(skip)]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The response body was not the expected JSON record.
    #[display("Failed to decode {target} at '{}': {}\n{}", error.path(), error.inner(), excerpt(body))]
    #[from(skip)]
    Decode {
        /// Name of the record that was expected.
        target: &'static str,
        /// The underlying JSON error, with the path where it occurred.
        #[error(source)]
        error: serde_path_to_error::Error<serde_json::Error>,
        /// The response body that failed to decode.
        body: String,
    },

    /// An argument was rejected before any request was sent.
    #[display("Invalid {name}: {message}")]
    #[from(skip)]
    InvalidArgument {
        /// Name of the argument.
        name: &'static str,
        /// Why it was rejected.
        message: String,
    },

    /// An endpoint could not be resolved to an absolute HTTP(S) URI.
    #[display("Invalid endpoint '{endpoint}': {message}")]
    #[from(skip)]
    InvalidEndpoint {
        /// The endpoint as provided.
        endpoint: String,
        /// Why it was rejected.
        message: String,
    },

    /// URL parsing error when joining a resource path to an endpoint.
    UrlError(url::ParseError),

    /// Parameters could not be form-encoded.
    FormEncodingError(serde_urlencoded::ser::Error),

    /// The authentication header could not be built.
    AuthenticationError(AuthenticationError),

    /// A required client setting was not provided.
    #[display("Missing configuration: {name}")]
    #[from(skip)]
    MissingConfiguration {
        /// Name of the missing setting.
        name: &'static str,
    },

    /// The HTTP transport could not be built.
    #[display("Cannot build HTTP transport: {message}")]
    #[from(skip)]
    TransportSetup {
        /// Description of the failure.
        message: String,
    },
}

impl ConjurError {
    /// Builds the error for a failed HTTP status.
    ///
    /// Success statuses are classified as [`ErrorKind::ServerError`]: reaching
    /// this constructor with one is a protocol violation.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let kind = ErrorKind::from_status(status).unwrap_or(ErrorKind::ServerError);
        Self::Http {
            kind,
            status,
            body: body.into(),
        }
    }

    /// Builds a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Builds an invalid argument error.
    pub fn invalid_argument(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http { kind, .. } => *kind,
            Self::Transport { .. } => ErrorKind::TransportError,
            Self::Decode { .. } => ErrorKind::DecodeError,
            Self::InvalidArgument { .. } | Self::FormEncodingError(_) => ErrorKind::InvalidArgument,
            Self::InvalidEndpoint { .. }
            | Self::UrlError(_)
            | Self::AuthenticationError(_)
            | Self::MissingConfiguration { .. }
            | Self::TransportSetup { .. } => ErrorKind::Configuration,
        }
    }

    /// Returns the HTTP status when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the response body text when the server answered.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. } | Self::Decode { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns `true` if no response was received, the only case where
    /// retrying the same call can succeed without changing anything.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransportError
    }

    /// Shorthand for `self.kind() == ErrorKind::NotFound`.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Shorthand for `self.kind() == ErrorKind::Forbidden`.
    pub fn is_forbidden(&self) -> bool {
        self.kind() == ErrorKind::Forbidden
    }
}

/// Rejects an empty or whitespace-only argument.
pub(crate) fn ensure_not_blank(name: &'static str, value: &str) -> Result<(), ConjurError> {
    if value.trim().is_empty() {
        return Err(ConjurError::invalid_argument(name, "must not be blank"));
    }
    Ok(())
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_MAX_LENGTH) {
        Some((index, _)) => format!("{}... (truncated)", &body[..index]),
        None => body.to_string(),
    }
}
