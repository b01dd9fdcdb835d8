use crate::synthesis::{SynthesisClient, SynthesisRequest};
use bytes::Bytes;
use serde::Deserialize;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

mod error;
mod response;
pub use error::TtsError;
pub use response::{FunctionResponse, CONTENT_TYPE_JSON, CONTENT_TYPE_MPEG};


/// Body posted by the browser: `{"text": "...", "voice_id": "..."}`.
#[derive(Debug, Deserialize)]
struct SynthesisPayload {
    text: Option<String>,
    voice_id: Option<String>,
}

/// Stateless text-to-speech proxy. One call to [`ProxyFunction::handle`] is one
/// invocation: validate, call the provider, translate the outcome to a response.
pub struct ProxyFunction {
    client: Box<dyn SynthesisClient>,
    default_voice_id: String,
}

impl ProxyFunction {
    pub fn new(client: Box<dyn SynthesisClient>, default_voice_id: impl Into<String>) -> Self {
        Self {
            client,
            default_voice_id: default_voice_id.into(),
        }
    }

    pub async fn handle(&self, http_method: &str, raw_body: Option<&[u8]>) -> FunctionResponse {
        if http_method == "OPTIONS" {
            return FunctionResponse::preflight();
        }
        let start_time = Instant::now();
        let result = self.invoke(http_method, raw_body).await;
        Self::respond(http_method, start_time, result)
    }

    /// Answers an invocation whose body the host could not read (too large,
    /// broken stream). Preflight and the method guard still apply first.
    pub fn handle_unreadable(&self, http_method: &str, err: TtsError) -> FunctionResponse {
        if http_method == "OPTIONS" {
            return FunctionResponse::preflight();
        }
        let result = match http_method {
            "POST" => Err(err),
            _ => Err(TtsError::MethodNotAllowed),
        };
        Self::respond(http_method, Instant::now(), result)
    }

    fn respond(
        http_method: &str,
        start_time: Instant,
        result: Result<Bytes, TtsError>,
    ) -> FunctionResponse {
        let request_id = Uuid::new_v4().to_string();
        match result {
            Ok(audio) => {
                info!(
                    request_id = %request_id,
                    "tts generated {} bytes in {:?}",
                    audio.len(),
                    start_time.elapsed()
                );
                FunctionResponse::audio(&audio)
            }
            Err(e) => {
                if e.is_client_error() {
                    warn!(request_id = %request_id, method = http_method, "tts rejected: {}", e);
                } else {
                    error!(request_id = %request_id, "TTS Error: {}", e);
                }
                FunctionResponse::from(&e)
            }
        }
    }

    async fn invoke(&self, http_method: &str, raw_body: Option<&[u8]>) -> Result<Bytes, TtsError> {
        if http_method != "POST" {
            return Err(TtsError::MethodNotAllowed);
        }
        let request = self.parse_request(raw_body)?;
        self.client.synthesize(&request).await
    }

    /// Builds the provider request from the raw body. A missing body is parsed
    /// like an empty one and fails as malformed JSON; so do bytes that are not UTF-8.
    pub fn parse_request(&self, raw_body: Option<&[u8]>) -> Result<SynthesisRequest, TtsError> {
        let payload: SynthesisPayload = serde_json::from_slice(raw_body.unwrap_or_default())?;

        let text = payload
            .text
            .filter(|text| !text.trim().is_empty())
            .ok_or(TtsError::Validation)?;
        let voice_id = payload
            .voice_id
            .filter(|voice_id| !voice_id.trim().is_empty())
            .unwrap_or_else(|| self.default_voice_id.clone());

        Ok(SynthesisRequest { text, voice_id })
    }
}
