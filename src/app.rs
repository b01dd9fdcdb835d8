use crate::config::Config;
use crate::function::ProxyFunction;
use crate::handler::middleware::request_log::log_requests;
use crate::synthesis::{ElevenLabsClient, SynthesisClient};
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

pub struct AppStateInner {
    pub config: Arc<Config>,
    pub function: ProxyFunction,
    pub token: CancellationToken,
}

pub type AppState = Arc<AppStateInner>;

#[derive(Default)]
pub struct AppStateBuilder {
    pub config: Option<Config>,
    pub synthesis_client: Option<Box<dyn SynthesisClient>>,
    pub token: Option<CancellationToken>,
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the ElevenLabs client, e.g. with a stub in tests.
    pub fn synthesis_client(mut self, client: Box<dyn SynthesisClient>) -> Self {
        self.synthesis_client = Some(client);
        self
    }

    pub fn token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn build(self) -> Result<AppState> {
        let mut config = self.config.unwrap_or_default();
        config.synthesis.check_default();

        let client = match self.synthesis_client {
            Some(client) => client,
            None => {
                if config.synthesis.api_key.is_none() {
                    warn!(
                        "{} is not set, every synthesis request will fail",
                        crate::synthesis::API_KEY_ENV
                    );
                }
                ElevenLabsClient::create(&config.synthesis)?
            }
        };
        let function = ProxyFunction::new(client, config.synthesis.default_voice_id.clone());

        Ok(Arc::new(AppStateInner {
            config: Arc::new(config),
            function,
            token: self.token.unwrap_or_default(),
        }))
    }
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    let static_dir = Path::new(&config.static_dir);
    if !static_dir.join("index.html").exists() {
        warn!("{}/index.html does not exist", static_dir.display());
    }
    let static_files =
        ServeDir::new(static_dir).not_found_service(ServeFile::new(static_dir.join("index.html")));

    let skip_paths = Arc::new(config.access_log_skip.clone());
    crate::handler::router(&config.function_path, config.max_body_bytes)
        .with_state(state)
        .fallback_service(static_files)
        .layer(axum::middleware::from_fn_with_state(skip_paths, log_requests))
}

pub async fn run(state: AppState) -> Result<()> {
    let addr: SocketAddr = state.config.http_addr.parse()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    serve(state, listener).await
}

pub async fn serve(state: AppState, listener: TcpListener) -> Result<()> {
    let token = state.token.clone();
    let app = create_router(state.clone());
    info!(
        "serving {} on {}",
        state.config.function_path,
        listener.local_addr()?
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(token.cancelled_owned())
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
    info!("Server shut down gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_reports_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();
        let config = Config {
            http_addr: addr.to_string(),
            ..Default::default()
        };
        let state = AppStateBuilder::new()
            .config(config)
            .synthesis_client(Box::new(NoopClient))
            .build()
            .unwrap();

        let err = run(state).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Failed to bind to {}", addr));
    }

    struct NoopClient;

    #[async_trait::async_trait]
    impl SynthesisClient for NoopClient {
        async fn synthesize(
            &self,
            _request: &crate::synthesis::SynthesisRequest,
        ) -> Result<bytes::Bytes, crate::function::TtsError> {
            Ok(bytes::Bytes::new())
        }
    }
}
