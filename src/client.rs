//! HTTP client for the assistant service.
//!
//! One request shape: `POST {server}/chat` with the user's message and the
//! configured model backend URL. The response is decoded as a loose JSON
//! value so a missing or wrong-typed field reads as absent instead of
//! failing the whole turn.

use anyhow::{Result, anyhow};
use serde::Serialize;
use serde_json::Value;

/// Rendered when a 2xx response carries neither `reply` nor `error`.
pub const NO_RESPONSE_TEXT: &str = "No response received";

/// Diagnostic prefix for transport failures surfaced in the transcript.
pub const ERROR_PREFIX: &str = "Error contacting assistant: ";

/// Wire body for `POST /chat`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    api_url: &'a str,
}

/// Resolved result of one chat round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    /// Display text: `reply` if present, else `error`, else the fixed
    /// placeholder.
    pub text: String,
    /// True only when the response carried `memory_saved: true`.
    pub memory_saved: bool,
}

/// Client for the assistant service.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    server_url: String,
    http: reqwest::Client,
}

impl AssistantClient {
    /// Creates a new client for the given service origin.
    ///
    /// # Panics
    /// In test builds, panics if the origin is not local. Unit tests must
    /// point at a mock server instead of a real deployment.
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into();

        #[cfg(test)]
        if !is_local_url(&server_url) {
            panic!(
                "Tests must not call a non-local assistant service!\n\
                 Point the client at a mock server (e.g., wiremock).\n\
                 Found server_url: {server_url}"
            );
        }

        Self {
            server_url,
            http: reqwest::Client::new(),
        }
    }

    /// Performs one chat round trip.
    ///
    /// Exactly one attempt, no retry, no client-side timeout. Transport
    /// failures (unreachable host, error status, non-JSON body) come back as
    /// errors with a readable description; a well-formed response always
    /// resolves to a [`ChatOutcome`], even when empty.
    pub async fn send_chat(&self, message: &str, api_url: &str) -> Result<ChatOutcome> {
        let url = format!("{}/chat", self.server_url.trim_end_matches('/'));
        let request = ChatRequest { message, api_url };

        tracing::info!(
            message_chars = message.chars().count(),
            api_url,
            url,
            "chat request started"
        );

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            tracing::warn!(status = status.as_u16(), "chat request failed");
            if body.is_empty() {
                return Err(anyhow!("assistant service returned HTTP {}", status.as_u16()));
            }
            return Err(anyhow!(
                "assistant service returned HTTP {}: {}",
                status.as_u16(),
                body
            ));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| self.classify_transport_error(&e))?;
        let outcome = resolve_outcome(&value);

        tracing::info!(
            reply_chars = outcome.text.chars().count(),
            memory_saved = outcome.memory_saved,
            "chat request finished"
        );

        Ok(outcome)
    }

    /// Maps low-level reqwest failures to stable, human-readable errors.
    fn classify_transport_error(&self, e: &reqwest::Error) -> anyhow::Error {
        if e.is_timeout() {
            anyhow!("request timed out")
        } else if e.is_connect() {
            anyhow!("could not connect to {}", self.server_url)
        } else if e.is_decode() {
            anyhow!("response was not valid JSON")
        } else {
            anyhow!("network error: {e}")
        }
    }
}

/// Resolves a response body into display text and the memory flag.
///
/// `reply` wins over `error` even when both are present. Empty strings count
/// as absent, and `memory_saved` is honored only when it is exactly `true`;
/// a string `"true"` or a number reads as false.
fn resolve_outcome(value: &Value) -> ChatOutcome {
    let text = value
        .get("reply")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            value
                .get("error")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or(NO_RESPONSE_TEXT)
        .to_string();

    let memory_saved = value
        .get("memory_saved")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    ChatOutcome { text, memory_saved }
}

#[cfg(test)]
fn is_local_url(url: &str) -> bool {
    url.starts_with("http://127.0.0.1") || url.starts_with("http://localhost")
}
