//! Caller side of the synthesis function: what the browser front-end does,
//! for use from Rust.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const GENERIC_FAILURE: &str = "Speech generation failed";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Enter some text to generate speech")]
    EmptyText,

    #[error("{0}")]
    Generation(String),

    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    text: &'a str,
    voice_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct SpeechClient {
    http_client: reqwest::Client,
    url: String,
}

impl SpeechClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Text is trimmed and must not be blank; blank text never reaches the network.
    pub async fn generate(&self, text: &str, voice_id: &str) -> Result<Bytes, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyText);
        }

        let response = self
            .http_client
            .post(&self.url)
            .json(&GenerateBody { text, voice_id })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("generation failed with {}: {}", status, body);
            return Err(ClientError::Generation(failure_message(&body)));
        }
        Ok(response.bytes().await?)
    }
}

/// The `message` of a JSON error body, or a generic text when there is none.
pub fn failure_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

/// File name offered when saving generated audio, `voicecraft-<unix millis>.mp3`.
pub fn download_file_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("voicecraft-{}.mp3", millis)
}
