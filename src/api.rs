use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "http://localhost:5000";
const GENERATE_PATH: &str = "/api/generate-response";

/// Failures of a single generation call. Cloneable so it can ride in UI messages.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[source] Arc<reqwest::Error>),
    #[error("generation service returned {status}: {detail}")]
    Status {
        status: reqwest::StatusCode,
        detail: String,
    },
    #[error("malformed response body: {0}")]
    Decode(#[source] Arc<serde_json::Error>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub message: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelatedExchange {
    pub context_label: String,
    pub similarity: f64,
    pub inbound_text: String,
    pub outbound_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub reply: String,
    pub related: Vec<RelatedExchange>,
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    message: &'a str,
    company: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    similar_tweets: Vec<SimilarTweet>,
}

#[derive(Debug, Deserialize)]
struct SimilarTweet {
    company: String,
    similarity: f64,
    customer_tweet: String,
    company_tweet: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl From<SimilarTweet> for RelatedExchange {
    fn from(tweet: SimilarTweet) -> Self {
        RelatedExchange {
            context_label: tweet.company,
            similarity: tweet.similarity,
            inbound_text: tweet.customer_tweet,
            outbound_text: tweet.company_tweet,
        }
    }
}

/// Client for the reply generation service. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    base_url: String,
    client: reqwest::Client,
}

impl GenerationClient {
    /// Builds a client from `REPLY_DESK_HOST`, falling back to the configured host.
    pub fn from_env_or(configured_host: &str) -> Self {
        let base_url = env::var("REPLY_DESK_HOST").unwrap_or_else(|_| configured_host.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        GenerationClient {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, ClientError> {
        let url = format!("{}{}", self.base_url, GENERATE_PATH);
        let body = GenerateBody {
            message: &request.message,
            company: &request.context,
        };

        tracing::debug!(url = %url, company = %request.context, "sending generation request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Request(Arc::new(e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Request(Arc::new(e)))?;

        if !status.is_success() {
            let detail = match serde_json::from_slice::<ErrorBody>(&bytes) {
                Ok(body) => body.error,
                Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
            };
            tracing::warn!(status = %status, "generation service rejected request");
            return Err(ClientError::Status { status, detail });
        }

        let parsed: GenerateResponse =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(Arc::new(e)))?;

        Ok(GenerationResult {
            reply: parsed.response,
            related: parsed.similar_tweets.into_iter().map(RelatedExchange::from).collect(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::mock;
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn request(message: &str, context: &str) -> GenerationRequest {
        GenerationRequest {
            message: message.to_string(),
            context: context.to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_sends_message_and_company() {
        let (url, seen) = mock::serve(StatusCode::OK, mock::order_reply()).await;
        let client = GenerationClient::with_base_url(url);

        let result = client.generate(&request("Where is my order?", "AcmeCorp")).await.unwrap();

        assert_eq!(result.reply, "Let me check that for you.");
        assert_eq!(result.related.len(), 1);
        assert_eq!(result.related[0].context_label, "AcmeCorp");
        assert_eq!(result.related[0].inbound_text, "Where's my package?");
        assert_eq!(result.related[0].outbound_text, "Checking now!");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], json!({"message": "Where is my order?", "company": "AcmeCorp"}));
    }

    #[tokio::test]
    async fn test_related_order_is_preserved() {
        let body = json!({
            "response": "ok",
            "similar_tweets": [
                {"company": "A", "similarity": 0.5, "customer_tweet": "a", "company_tweet": "a2"},
                {"company": "B", "similarity": 0.9, "customer_tweet": "b", "company_tweet": "b2"},
                {"company": "C", "similarity": 0.7, "customer_tweet": "c", "company_tweet": "c2"}
            ]
        });
        let (url, _) = mock::serve(StatusCode::OK, body).await;
        let client = GenerationClient::with_base_url(url);

        let result = client.generate(&request("hi", "A")).await.unwrap();
        let labels: Vec<_> = result.related.iter().map(|r| r.context_label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_error_status_is_failure_even_with_valid_body() {
        let (url, _) = mock::serve(StatusCode::INTERNAL_SERVER_ERROR, mock::order_reply()).await;
        let client = GenerationClient::with_base_url(url);

        let err = client.generate(&request("hi", "A")).await.unwrap_err();
        match err {
            ClientError::Status { status, .. } => assert_eq!(status.as_u16(), 500),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_body_detail_is_kept() {
        let body = json!({"error": "model offline"});
        let (url, _) = mock::serve(StatusCode::INTERNAL_SERVER_ERROR, body).await;
        let client = GenerationClient::with_base_url(url);

        let err = client.generate(&request("hi", "A")).await.unwrap_err();
        assert!(err.to_string().contains("model offline"));
    }

    #[tokio::test]
    async fn test_missing_fields_is_decode_error() {
        let (url, _) = mock::serve(StatusCode::OK, json!({"response": "only half"})).await;
        let client = GenerationClient::with_base_url(url);

        let err = client.generate(&request("hi", "A")).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GenerationClient::with_base_url(format!("http://{}", addr));
        let err = client.generate(&request("hi", "A")).await.unwrap_err();
        assert!(matches!(err, ClientError::Request(_)));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = GenerationClient::with_base_url("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
