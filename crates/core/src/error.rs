use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not a valid event: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("event line is empty")]
    EmptyPayload,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("request to {endpoint} failed with {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("ingestion stream ended without completion after {events} event(s)")]
    IncompleteSession { events: usize },

    #[error("ingestion session was cancelled")]
    Cancelled,
}

impl ClientError {
    /// Message suitable for a single dismissible error line.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
