use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::CONTENT_LENGTH, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tracing::field::{Field, Visit};
use tracing::{info, Subscriber};
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

pub const ACCESS_LOG_TARGET: &str = "http.access";

/// Renders `http.access` events as one pipe-separated line and everything else
/// with the default formatter.
#[derive(Clone)]
pub struct AccessLogEventFormat<T = SystemTime> {
    timer: T,
}

impl<T: FormatTime> AccessLogEventFormat<T> {
    pub fn new(timer: T) -> Self {
        Self { timer }
    }
}

#[derive(Default)]
struct AccessLogFields {
    client_ip: Option<String>,
    method: Option<String>,
    status: Option<u64>,
    body_len: Option<String>,
    cost_ms: Option<f64>,
    uri: Option<String>,
}

impl AccessLogFields {
    fn text(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("-")
    }
}

impl Visit for AccessLogFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            "client_ip" => &mut self.client_ip,
            "method" => &mut self.method,
            "body_len" => &mut self.body_len,
            "uri" => &mut self.uri,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        self.record_str(field, rendered.trim_matches('"'));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "status" {
            self.status = Some(value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if field.name() == "cost_ms" {
            self.cost_ms = Some(value);
        }
    }
}

impl<S, N, T> FormatEvent<S, N> for AccessLogEventFormat<T>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
    T: FormatTime + Clone,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        if metadata.target() != ACCESS_LOG_TARGET {
            return format::Format::default()
                .with_timer(self.timer.clone())
                .with_target(true)
                .format_event(ctx, writer, event);
        }

        let mut fields = AccessLogFields::default();
        event.record(&mut fields);
        self.timer.format_time(&mut writer)?;
        writeln!(
            writer,
            " {} {} | {} | {} | {} | {} | {} | {}",
            metadata.level(),
            metadata.target(),
            AccessLogFields::text(&fields.client_ip),
            AccessLogFields::text(&fields.method),
            fields
                .status
                .map(|status| status.to_string())
                .unwrap_or_else(|| "-".to_string()),
            AccessLogFields::text(&fields.body_len),
            fields
                .cost_ms
                .map(|cost| format!("{cost:.3}ms"))
                .unwrap_or_else(|| "-".to_string()),
            AccessLogFields::text(&fields.uri),
        )
    }
}

pub fn should_skip_logging(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => path.starts_with(prefix),
        None => path == pattern,
    })
}

/// First forwarded address if a proxy sits in front, otherwise the peer address.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    for name in ["x-forwarded-for", "x-real-ip", "client-ip"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            let first = value.split(',').next().unwrap_or(value).trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub async fn log_requests(
    State(skip_paths): State<Arc<Vec<String>>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let started_at = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().to_string();
    let skip = should_skip_logging(req.uri().path(), skip_paths.as_slice());
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client_ip = client_ip(req.headers(), peer);

    let response = next.run(req).await;
    if skip {
        return response;
    }

    let body_len = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();
    info!(
        target: "http.access",
        client_ip = client_ip.as_str(),
        method = method.as_str(),
        status = response.status().as_u16() as u64,
        body_len = body_len.as_str(),
        cost_ms = started_at.elapsed().as_secs_f64() * 1_000.0,
        uri = uri.as_str(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_skip_logging() {
        let patterns = vec!["/static/*".to_string(), "/favicon.ico".to_string()];
        assert!(should_skip_logging("/static/app.js", &patterns));
        assert!(should_skip_logging("/favicon.ico", &patterns));
        assert!(!should_skip_logging("/favicon.ico.bak", &patterns));
        assert!(!should_skip_logging("/.netlify/functions/tts", &patterns));
        assert!(!should_skip_logging("/", &[]));
    }

    #[test]
    fn test_client_ip() {
        let peer: SocketAddr = "10.0.0.7:53211".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "10.0.0.7");
        assert_eq!(client_ip(&HeaderMap::new(), None), "-");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.9");
    }
}
