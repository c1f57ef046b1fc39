//! Generative-language API client used by the chatbot.
//!
//! The upstream is consumed as a plain HTTP endpoint. Failures are
//! surfaced to the caller on the first attempt; there is no retry.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use crate::errors::ServiceError;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Client for the generative-language HTTP API
#[derive(Clone)]
pub struct AssistantClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl AssistantClient {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .expect("reqwest client construction cannot fail with static options"),
            api_url,
            api_key,
        }
    }

    /// Sends the prompt and returns the first candidate's text.
    #[instrument(skip(self, prompt))]
    pub async fn generate_reply(&self, prompt: &str) -> Result<String, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ServiceError::ConfigurationError("assistant API key is not configured".to_string())
        })?;

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("assistant request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::ExternalServiceError(format!(
                "assistant returned {}: {}",
                status, text
            )));
        }

        let parsed = response.json::<GenerateResponse>().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("assistant response: {}", e))
        })?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| {
                ServiceError::ExternalServiceError("assistant returned no candidates".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    {"content": {"parts": [{"text": "Hello from the assistant"}]}}
                ]
            })))
            .mount(&server)
            .await;

        let client = AssistantClient::new(server.uri(), Some("test-key".into()));
        let reply = client.generate_reply("hi").await.unwrap();
        assert_eq!(reply, "Hello from the assistant");
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let client = AssistantClient::new("http://localhost:1".into(), None);
        assert!(matches!(
            client.generate_reply("hi").await,
            Err(ServiceError::ConfigurationError(_))
        ));
    }

    #[tokio::test]
    async fn upstream_error_is_propagated_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = AssistantClient::new(server.uri(), Some("test-key".into()));
        assert!(matches!(
            client.generate_reply("hi").await,
            Err(ServiceError::ExternalServiceError(_))
        ));
    }
}
