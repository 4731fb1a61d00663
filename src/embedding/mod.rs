//! 임베딩 모듈 - OpenAI API를 통한 텍스트 벡터화
//!
//! 텍스트를 벡터로 변환하는 OpenAI 임베딩 프로바이더입니다.
//! 유사도 검색을 위한 핵심 모듈입니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OpenAiEmbedding::new(&config)?;
//! let embedding = embedder.embed("연차 휴가는 며칠인가요?").await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{QaError, Result};

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 고정 차원 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    ///
    /// 빈 텍스트는 에러를 반환합니다.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// OpenAI Embedding
// ============================================================================

/// 기본 임베딩 모델
/// source: https://platform.openai.com/docs/api-reference/embeddings
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// 기본 임베딩 차원 (text-embedding-ada-002)
pub const DEFAULT_DIMENSION: usize = 1536;

/// 요청 타임아웃 (초)
const REQUEST_TIMEOUT_SECS: u64 = 30;
/// 일시 에러 시 최대 재시도 횟수
const MAX_RETRIES: u32 = 3;
/// 재시도 시 초기 백오프 (ms)
const INITIAL_BACKOFF_MS: u64 = 500;

/// OpenAI 임베딩 구현체
#[derive(Debug)]
pub struct OpenAiEmbedding {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedding {
    /// 설정으로 생성
    pub fn new(config: &AppConfig) -> Result<Self> {
        if config.openai_api_key.trim().is_empty() {
            return Err(QaError::embedding("OpenAI API key is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| QaError::embedding(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/embeddings",
            config.openai_base_url.trim_end_matches('/')
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.openai_api_key.clone(),
            model: config.embedding_model.clone(),
            dimension: config.embedding_dimension,
        })
    }

    /// 일시 에러 상태 코드 여부 (429 또는 5xx)
    fn should_retry(&self, status: reqwest::StatusCode) -> bool {
        status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    /// 재시도 가능한 전송 에러 여부
    fn is_retryable_error(&self, err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    /// 재시도 백오프 시간 (지수 증가)
    fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt))
    }
}

/// OpenAI 임베딩 요청 본문
/// source: https://platform.openai.com/docs/api-reference/embeddings
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// OpenAI 임베딩 응답
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI API 에러 응답
#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

/// API 에러 본문에서 메시지 추출
fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<OpenAiErrorBody>(body) {
        format!("OpenAI API error ({}): {}", status, parsed.error.message)
    } else {
        format!("OpenAI API error ({}): {}", status, body)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // 빈 입력은 임베딩할 수 없음
        if text.trim().is_empty() {
            return Err(QaError::embedding("Cannot embed empty text"));
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: vec![text],
        };

        let mut last_error: Option<QaError> = None;

        // 재시도 루프 (일시 에러 시 지수 백오프)
        for attempt in 0..=MAX_RETRIES {
            let response = match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    let message = format!("Failed to send embedding request: {}", e);
                    if self.is_retryable_error(&e) && attempt < MAX_RETRIES {
                        let backoff = self.retry_backoff(attempt);
                        tracing::warn!(
                            "Embedding request failed, retrying in {:?} (attempt {}/{}): {}",
                            backoff,
                            attempt + 1,
                            MAX_RETRIES,
                            e
                        );
                        last_error = Some(QaError::embedding(message));
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(QaError::embedding(message));
                }
            };

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                QaError::embedding(format!("Failed to read embedding response body: {}", e))
            })?;

            // 성공
            if status.is_success() {
                let parsed: EmbeddingResponse = serde_json::from_str(&body).map_err(|e| {
                    QaError::embedding(format!("Failed to parse embedding response: {}", e))
                })?;

                let embedding = parsed
                    .data
                    .into_iter()
                    .next()
                    .map(|entry| entry.embedding)
                    .ok_or_else(|| QaError::embedding("Embedding response contained no data"))?;

                if embedding.len() != self.dimension {
                    return Err(QaError::embedding(format!(
                        "Unexpected embedding dimension: got {}, expected {}",
                        embedding.len(),
                        self.dimension
                    )));
                }

                return Ok(embedding);
            }

            // 429 / 5xx는 재시도 대상
            if self.should_retry(status) {
                let backoff = self.retry_backoff(attempt);
                tracing::warn!(
                    "Embedding API returned {}, backing off {:?} (attempt {}/{})",
                    status,
                    backoff,
                    attempt + 1,
                    MAX_RETRIES
                );
                last_error = Some(QaError::embedding(api_error_message(status, &body)));

                if attempt < MAX_RETRIES {
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            } else {
                // 다른 에러는 즉시 실패
                return Err(QaError::embedding(api_error_message(status, &body)));
            }
        }

        // 모든 재시도 실패
        Err(last_error.unwrap_or_else(|| {
            QaError::embedding(format!("Embedding failed after {} retries", MAX_RETRIES))
        }))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            openai_api_key: "fake_key".to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_new_without_key_fails() {
        let config = AppConfig::default();
        let result = OpenAiEmbedding::new(&config);
        assert!(matches!(result, Err(QaError::Embedding(_))));
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let mut config = test_config();
        config.openai_base_url = "https://api.openai.com/v1/".to_string();

        let embedder = OpenAiEmbedding::new(&config).unwrap();
        assert_eq!(embedder.endpoint, "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn test_dimension_and_name() {
        let embedder = OpenAiEmbedding::new(&test_config()).unwrap();
        assert_eq!(embedder.dimension(), 1536);
        assert_eq!(embedder.name(), "text-embedding-ada-002");
    }

    #[tokio::test]
    async fn test_embed_empty_text_fails_without_request() {
        let embedder = OpenAiEmbedding::new(&test_config()).unwrap();

        let result = embedder.embed("").await;
        assert!(matches!(result, Err(QaError::Embedding(_))));

        let result = embedder.embed("   \n\t").await;
        assert!(matches!(result, Err(QaError::Embedding(_))));
    }

    #[test]
    fn test_api_error_message_parses_body() {
        let body = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
        let message = api_error_message(reqwest::StatusCode::TOO_MANY_REQUESTS, body);
        assert!(message.contains("Rate limit reached"));

        let message = api_error_message(reqwest::StatusCode::BAD_GATEWAY, "not json");
        assert!(message.contains("not json"));
    }

    #[test]
    fn test_retry_backoff_grows() {
        let embedder = OpenAiEmbedding::new(&test_config()).unwrap();
        assert!(embedder.retry_backoff(0) < embedder.retry_backoff(1));
        assert!(embedder.retry_backoff(1) < embedder.retry_backoff(2));
    }

    #[test]
    fn test_should_retry_statuses() {
        let embedder = OpenAiEmbedding::new(&test_config()).unwrap();
        assert!(embedder.should_retry(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(embedder.should_retry(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!embedder.should_retry(reqwest::StatusCode::UNAUTHORIZED));
        assert!(!embedder.should_retry(reqwest::StatusCode::BAD_REQUEST));
    }
}
