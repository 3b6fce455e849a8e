use std::time::Duration;

use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, Response};
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;

use crate::error::AscError;

/// Bootstrap key header, required on every call once fetched.
pub const HEADER_WIDGET_KEY: &str = "X-Apple-Widget-Key";
/// Two-factor challenge token headers, scoped to one challenge attempt.
pub const HEADER_SESSION_ID: &str = "X-Apple-Id-Session-Id";
pub const HEADER_SCNT: &str = "scnt";

/// Headers every outbound request carries. The remote console rejects
/// requests without this exact Accept value.
pub fn default_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Accept",
        HeaderValue::from_static("application/json, text/javascript"),
    );
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));
    if let Ok(value) = user_agent.parse() {
        headers.insert("User-Agent", value);
    }
    headers
}

/// Error-signal substrings the console embeds in otherwise-successful
/// reply bodies. Presence of any of them means the call failed.
pub(crate) const ERROR_MARKERS: [&str; 5] = [
    "sectionErrorKeys",
    "validationErrors",
    "serviceErrors",
    "sectionInfoKeys",
    "sectionWarningKeys",
];

pub(crate) fn contains_error_markers(body: &str) -> bool {
    ERROR_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Builds and sends one request: widget key when present, JSON
/// content type on POST/PUT, transient headers merged last so a
/// challenge attempt can override nothing by accident.
pub(crate) async fn execute_request(
    client: &ClientWithMiddleware,
    method: Method,
    url: &str,
    widget_key: Option<&str>,
    extra_headers: &[(&str, &str)],
    json_body: Option<&Value>,
    timeout: Option<Duration>,
) -> Result<Response, AscError> {
    let mut request_builder = client.request(method.clone(), url);

    if method == Method::POST || method == Method::PUT {
        request_builder = request_builder.header("Content-Type", "application/json");
    }

    if let Some(key) = widget_key {
        if !key.is_empty() {
            request_builder = request_builder.header(HEADER_WIDGET_KEY, key);
        }
    }

    for (name, value) in extra_headers {
        request_builder = request_builder.header(*name, *value);
    }

    if let Some(body) = json_body {
        request_builder = request_builder.json(body);
    }

    if let Some(timeout) = timeout {
        request_builder = request_builder.timeout(timeout);
    }

    debug!("Sending {method} request to {url}");
    let response = request_builder.send().await?;
    info!("{method} {url} -> {}", response.status());
    Ok(response)
}
