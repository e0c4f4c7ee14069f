/// ApiError
///
/// Every failure a backend call can end in. None of these escape the panel or form
/// boundary as a fault: they are turned into a `Notice` and the triggering action is
/// rolled back to its pre-action state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, refused connection, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// Non-2xx response. `message` is the verbatim `{ "message": ... }` body when the
    /// backend sent one.
    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Server { status: u16, message: Option<String> },

    /// Caught client-side; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// A 2xx response whose body did not match the expected envelope.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The owning panel was torn down while the request was in flight.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// user_message
    ///
    /// The text shown to the user: the server's own message when it sent one,
    /// the validation text for client-side failures, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ApiError::Validation(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// ConfigError
///
/// Raised by `AppConfig::load` so the binary refuses to start with an incomplete
/// production configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
