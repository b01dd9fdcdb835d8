use crate::function::TtsError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::env;

mod elevenlabs;
pub use elevenlabs::ElevenLabsClient;


pub const DEFAULT_ENDPOINT: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";
/// Voice used when the caller does not pick one ("Rachel").
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SynthesisOption {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model_id: String,
    pub default_voice_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    /// Outbound request timeout. Unset keeps the transport default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for SynthesisOption {
    fn default() -> Self {
        let voice_settings = VoiceSettings::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            default_voice_id: DEFAULT_VOICE_ID.to_string(),
            stability: voice_settings.stability,
            similarity_boost: voice_settings.similarity_boost,
            timeout_secs: None,
        }
    }
}

impl SynthesisOption {
    pub fn voice_settings(&self) -> VoiceSettings {
        VoiceSettings {
            stability: self.stability,
            similarity_boost: self.similarity_boost,
        }
    }

    /// Fills `api_key` from the environment when the config file left it out.
    /// Blank keys count as missing.
    pub fn check_default(&mut self) -> &Self {
        let configured = self
            .api_key
            .take()
            .filter(|key| !key.trim().is_empty());
        self.api_key = configured.or_else(|| {
            env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
        });
        self
    }
}

#[async_trait]
pub trait SynthesisClient: Send + Sync {
    /// Synthesizes `request.text` and returns the complete MPEG payload.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, TtsError>;
}
