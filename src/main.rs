use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicecraft::app::{self, AppStateBuilder};
use voicecraft::config::{Cli, Config};
use voicecraft::handler::middleware::request_log::AccessLogEventFormat;

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();
    dotenv().ok();
    let cli = Cli::parse();

    let config = match cli.conf {
        Some(ref conf) if std::path::Path::new(conf).exists() => Config::load(conf)?,
        _ => Config::default(),
    };

    let level = config
        .log_level
        .as_deref()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);
    let registry = tracing_subscriber::registry().with(level);

    let mut _guard = None;
    if let Some(ref log_file) = config.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| anyhow::anyhow!("{}: {}", e, log_file))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        _guard = Some(guard);
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(AccessLogEventFormat::new(SystemTime))
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .try_init()
            .ok();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer().event_format(AccessLogEventFormat::new(SystemTime)),
            )
            .try_init()
            .ok();
    }

    let state = AppStateBuilder::new().config(config).build()?;
    let token = state.token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received CTRL+C, shutting down");
            token.cancel();
        }
    });

    info!("Starting voicecraft on {}", state.config.http_addr);
    app::run(state).await
}
