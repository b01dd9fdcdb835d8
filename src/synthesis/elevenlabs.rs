use super::{SynthesisClient, SynthesisOption, SynthesisRequest, VoiceSettings};
use crate::function::TtsError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client as HttpClient};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// Text-to-speech against the ElevenLabs REST API.
#[derive(Debug)]
pub struct ElevenLabsClient {
    http_client: HttpClient,
    endpoint: Url,
    api_key: Option<String>,
    model_id: String,
    voice_settings: VoiceSettings,
}

impl ElevenLabsClient {
    pub fn create(option: &SynthesisOption) -> Result<Box<dyn SynthesisClient>, TtsError> {
        let client = Self::new(option)?;
        Ok(Box::new(client))
    }

    pub fn new(option: &SynthesisOption) -> Result<Self, TtsError> {
        let endpoint = Url::parse(&option.endpoint)
            .map_err(|e| TtsError::Config(format!("invalid endpoint {}: {}", option.endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(TtsError::Config(format!(
                "endpoint {} cannot carry a path",
                option.endpoint
            )));
        }

        let mut builder = HttpClient::builder().user_agent(crate::version::get_useragent());
        if let Some(secs) = option.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http_client: builder.build()?,
            endpoint,
            api_key: option.api_key.clone(),
            model_id: option.model_id.clone(),
            voice_settings: option.voice_settings(),
        })
    }

    /// `{endpoint}/text-to-speech/{voice_id}`, the voice id escaped as a single segment.
    pub fn synthesis_url(&self, voice_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("text-to-speech").push(voice_id);
        }
        url
    }
}

#[async_trait]
impl SynthesisClient for ElevenLabsClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes, TtsError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TtsError::Config(format!("{} is not configured", super::API_KEY_ENV)))?;

        let url = self.synthesis_url(&request.voice_id);
        let body = TtsRequest {
            text: &request.text,
            model_id: &self.model_id,
            voice_settings: self.voice_settings,
        };
        debug!(%url, model_id = %self.model_id, "sending synthesis request");

        let start_time = Instant::now();
        let response = self
            .http_client
            .post(url)
            .header(header::ACCEPT, "audio/mpeg")
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(TtsError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response.bytes().await?;
        info!(
            "elevenlabs: ttfb+download time: {:?} bytes: {}",
            start_time.elapsed(),
            audio.len()
        );
        Ok(audio)
    }
}
