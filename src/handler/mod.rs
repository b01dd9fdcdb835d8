use crate::app::AppState;
use crate::function::{FunctionResponse, TtsError};
use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tracing::error;

pub mod middleware;

/// Mounts the synthesis function at `function_path` for every method; the
/// function itself decides what each method means. Bodies above
/// `max_body_bytes` are answered by the function as failed generations.
pub fn router(function_path: &str, max_body_bytes: usize) -> Router<AppState> {
    Router::new().route(
        function_path,
        any(function_handler).layer(DefaultBodyLimit::max(max_body_bytes)),
    )
}

async fn function_handler(
    State(state): State<AppState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let response = match body {
        Ok(body) => {
            let raw_body = (!body.is_empty()).then_some(body.as_ref());
            state.function.handle(method.as_str(), raw_body).await
        }
        Err(rejection) => state
            .function
            .handle_unreadable(method.as_str(), TtsError::Body(rejection.body_text())),
    };
    into_http_response(response)
}

/// Turns a function response into a plain HTTP response, decoding base64
/// bodies back into bytes the way a serverless gateway does.
pub fn into_http_response(response: FunctionResponse) -> Response {
    let body = match response.decoded_body() {
        Ok(body) => body,
        Err(e) => {
            error!("function returned an undecodable body: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Invalid function response").into_response();
        }
    };
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut builder = Response::builder().status(status);
    for (name, value) in response.headers.iter() {
        builder = builder.header(name, value);
    }
    match builder.body(Body::from(body)) {
        Ok(response) => response,
        Err(e) => {
            error!("failed to build function response: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Invalid function response").into_response()
        }
    }
}
