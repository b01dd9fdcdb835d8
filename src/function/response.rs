use super::TtsError;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use http::StatusCode;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_MPEG: &str = "audio/mpeg";

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
];

/// Response record of one function invocation, shaped for a text-only transport.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl FunctionResponse {
    fn new(status: StatusCode, content_type: &str, body: String) -> Self {
        let mut headers: Vec<(String, String)> = CORS_HEADERS
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        headers.push(("Content-Type".to_string(), content_type.to_string()));
        Self {
            status_code: status.as_u16(),
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    pub fn preflight() -> Self {
        Self::new(StatusCode::OK, CONTENT_TYPE_JSON, String::new())
    }

    pub fn audio(audio: &[u8]) -> Self {
        let mut response = Self::new(
            StatusCode::OK,
            CONTENT_TYPE_MPEG,
            BASE64_STANDARD.encode(audio),
        );
        response.is_base64_encoded = true;
        response
    }

    pub fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self::new(status, CONTENT_TYPE_JSON, body.to_string())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Raw bytes of the body, undoing the base64 transport encoding when set.
    pub fn decoded_body(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if self.is_base64_encoded {
            BASE64_STANDARD.decode(&self.body)
        } else {
            Ok(self.body.clone().into_bytes())
        }
    }
}

impl From<&TtsError> for FunctionResponse {
    fn from(err: &TtsError) -> Self {
        let status = err.status_code();
        match err {
            TtsError::Validation | TtsError::MethodNotAllowed => {
                Self::json(status, serde_json::json!({ "error": err.to_string() }))
            }
            _ => Self::json(
                status,
                serde_json::json!({
                    "error": "TTS generation failed",
                    "message": err.to_string(),
                }),
            ),
        }
    }
}
