use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::Duration;

use crate::config::Config;
use crate::events::Company;

/// Pattern the backend embeds in rate-limit error messages,
/// e.g. "Rate limit exceeded, try again in 2.5s".
static RETRY_DELAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)try again in ([\d.]+)s").expect("retry delay regex"));

/// Request body for the ask endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest<'a> {
    pub company_name: &'a str,
    pub question: &'a str,
}

/// Success body from the ask endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AskAnswer {
    pub answer: String,
}

/// Failures the ask endpoint can produce.
///
/// Rate limiting is the only transient case; everything else is
/// terminal and surfaced to the user as a single error message.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: f64 },

    #[error("backend error: {0}")]
    Api(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl BackendError {
    /// Message shown in the conversation when the failure is terminal.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::RateLimited { retry_after } => format!(
                "Rate limit reached. Please try again after {:.2} seconds.",
                retry_after
            ),
            _ => "Error getting response from server.".to_string(),
        }
    }
}

/// HTTP client for the financial-analysis backend
#[derive(Clone)]
pub struct BackendClient {
    endpoint: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: config.endpoint.clone(),
            client,
        }
    }

    /// Ask one question about one company. A single HTTP round trip;
    /// retry policy lives in the exchange layer.
    pub async fn ask(&self, company: Company, question: &str) -> Result<String, BackendError> {
        let body = AskRequest {
            company_name: company.wire_name(),
            question,
        };

        tracing::debug!(company = company.wire_name(), "sending ask request");

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let description = extract_error_message(&error_text)
                .unwrap_or_else(|| format!("status {}", status));

            if let Some(retry_after) = parse_retry_delay(&description) {
                tracing::warn!(retry_after, "backend rate limited the request");
                return Err(BackendError::RateLimited { retry_after });
            }

            tracing::warn!(%status, "backend returned an error");
            return Err(BackendError::Api(description));
        }

        let answer: AskAnswer = response.json().await?;
        Ok(answer.answer)
    }
}

/// Pull a human-readable description out of an error body.
///
/// The backend is inconsistent: sometimes `{"error": "..."}`,
/// sometimes `{"error": {"message": "..."}}`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;

    if let Some(text) = error.as_str() {
        return Some(text.to_string());
    }
    error
        .get("message")
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
}

/// Extract the retry delay in seconds from a rate-limit message.
pub fn parse_retry_delay(message: &str) -> Option<f64> {
    RETRY_DELAY_RE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(uri: &str) -> BackendClient {
        let mut config = Config::default();
        config.endpoint = format!("{}/ask", uri);
        config.request_timeout_secs = 5;
        BackendClient::new(&config)
    }

    #[test]
    fn parses_delay_from_rate_limit_message() {
        assert_eq!(
            parse_retry_delay("Rate limit exceeded, try again in 2.5s"),
            Some(2.5)
        );
        assert_eq!(parse_retry_delay("TRY AGAIN IN 10s please"), Some(10.0));
        assert_eq!(parse_retry_delay("quota exhausted"), None);
        assert_eq!(parse_retry_delay(""), None);
    }

    #[test]
    fn extracts_error_from_both_body_shapes() {
        assert_eq!(
            extract_error_message(r#"{"error": "try again in 1s"}"#).as_deref(),
            Some("try again in 1s")
        );
        assert_eq!(
            extract_error_message(r#"{"error": {"message": "boom"}}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(extract_error_message(r#"{"detail": "nope"}"#), None);
        assert_eq!(extract_error_message("not json"), None);
    }

    #[tokio::test]
    async fn ask_returns_answer_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .and(body_json(serde_json::json!({
                "companyName": "tcs",
                "question": "How was Q4?"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"answer": "Revenue grew 8%."})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let answer = client.ask(Company::Tcs, "How was Q4?").await.unwrap();
        assert_eq!(answer, "Revenue grew 8%.");
    }

    #[tokio::test]
    async fn ask_classifies_rate_limit_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": "Rate limit exceeded, try again in 0.25s"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.ask(Company::Axis, "anything").await.unwrap_err();
        match err {
            BackendError::RateLimited { retry_after } => assert_eq!(retry_after, 0.25),
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ask_surfaces_plain_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": {"message": "model unavailable"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.ask(Company::Bajaj, "anything").await.unwrap_err();
        match &err {
            BackendError::Api(message) => assert_eq!(message, "model unavailable"),
            other => panic!("expected api error, got {other:?}"),
        }
        assert_eq!(err.user_message(), "Error getting response from server.");
    }

    #[test]
    fn rate_limit_user_message_includes_delay() {
        let message = BackendError::RateLimited { retry_after: 2.5 }.user_message();
        assert_eq!(
            message,
            "Rate limit reached. Please try again after 2.50 seconds."
        );
    }
}
