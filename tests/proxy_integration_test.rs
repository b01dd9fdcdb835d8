use anyhow::Result;
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use voicecraft::app::{self, AppStateBuilder};
use voicecraft::client::{ClientError, SpeechClient};
use voicecraft::config::Config;
use voicecraft::synthesis::SynthesisOption;

/// Echoes the voice id back as the "audio" so the test can see which voice was used.
async fn fake_elevenlabs(Path(voice_id): Path<String>, headers: HeaderMap) -> Response {
    let authorized = headers
        .get("xi-api-key")
        .map(|key| key == "integration-key")
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    let mut audio = b"ID3".to_vec();
    audio.extend_from_slice(voice_id.as_bytes());
    ([("content-type", "audio/mpeg")], audio).into_response()
}

async fn spawn(router: Router) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    Ok(addr)
}

async fn start_voicecraft(api_key: &str, token: CancellationToken) -> Result<String> {
    let provider = spawn(
        Router::new().route("/v1/text-to-speech/{voice_id}", post(fake_elevenlabs)),
    )
    .await?;

    let config = Config {
        http_addr: "127.0.0.1:0".to_string(),
        synthesis: SynthesisOption {
            endpoint: format!("http://{}/v1", provider),
            api_key: Some(api_key.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let state = AppStateBuilder::new().config(config).token(token).build()?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(app::serve(state, listener));
    Ok(format!("http://{}/.netlify/functions/tts", addr))
}

#[tokio::test]
async fn test_generate_through_proxy() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let token = CancellationToken::new();
    let url = start_voicecraft("integration-key", token.clone()).await?;
    let client = SpeechClient::new(url);

    let audio = client.generate("  Hello there  ", "21m00Tcm4TlvDq8ikWAM").await?;
    assert_eq!(audio.as_ref(), b"ID321m00Tcm4TlvDq8ikWAM");

    let audio = client.generate("Bonjour", "EXAVITQu4vr4xnSDxMaL").await?;
    assert_eq!(audio.as_ref(), b"ID3EXAVITQu4vr4xnSDxMaL");

    token.cancel();
    Ok(())
}

#[tokio::test]
async fn test_upstream_rejection_reaches_client() -> Result<()> {
    let token = CancellationToken::new();
    let url = start_voicecraft("wrong-key", token.clone()).await?;
    let client = SpeechClient::new(url);

    match client.generate("Hello", "21m00Tcm4TlvDq8ikWAM").await {
        Err(ClientError::Generation(message)) => {
            assert_eq!(message, "ElevenLabs API error: invalid api key");
        }
        other => panic!("expected generation error, got {:?}", other.map(|b| b.len())),
    }

    token.cancel();
    Ok(())
}

#[tokio::test]
async fn test_default_voice_when_client_omits_it() -> Result<()> {
    let token = CancellationToken::new();
    let url = start_voicecraft("integration-key", token.clone()).await?;

    let response = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "text": "Hello" }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    assert_eq!(response.bytes().await?.as_ref(), b"ID321m00Tcm4TlvDq8ikWAM");

    token.cancel();
    Ok(())
}
