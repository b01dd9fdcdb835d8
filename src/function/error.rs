use http::StatusCode;

/// Every way a synthesis invocation can end without audio.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("Text is required")]
    Validation,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("ElevenLabs API error: {body}")]
    Upstream { status: u16, body: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Payload(#[from] serde_json::Error),

    /// The host could not buffer the request body.
    #[error("{0}")]
    Body(String),

    #[error("{0}")]
    Config(String),
}

impl TtsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TtsError::Validation => StatusCode::BAD_REQUEST,
            TtsError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            TtsError::Upstream { .. }
            | TtsError::Transport(_)
            | TtsError::Payload(_)
            | TtsError::Body(_)
            | TtsError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller mistakes are answered directly; everything else is a failed generation.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}
