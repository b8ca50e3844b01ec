use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use voyage_shared::pii::{is_sensitive_header, redact_query};
use voyage_shared::REDACTED;

/// Header list safe to attach to an error event
pub fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if is_sensitive_header(name.as_str()) {
                REDACTED.to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}

/// Records every 5xx response as an error event, with credentials and secrets scrubbed.
pub async fn error_reporting_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(redact_query).unwrap_or_default();
    let headers = redacted_headers(req.headers());

    let response = next.run(req).await;

    if response.status().is_server_error() {
        tracing::error!(
            status = response.status().as_u16(),
            %method,
            %path,
            %query,
            headers = ?headers,
            "Request failed"
        );
    }

    response
}
