//! 컴플리션 모듈 - OpenAI Chat API를 통한 답변 생성
//!
//! 시스템 지시문과 사용자 질문으로 챗 컴플리션을 호출하는
//! 프로바이더입니다. 답변 합성 단계에서 사용됩니다.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{QaError, Result};

// ============================================================================
// CompletionProvider Trait
// ============================================================================

/// 컴플리션 프로바이더 트레이트
///
/// 시스템 지시문과 사용자 메시지를 받아 모델 응답 텍스트를 반환합니다.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// 응답 생성
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// OpenAI Chat Completion
// ============================================================================

/// 기본 답변 생성 모델
/// source: https://platform.openai.com/docs/api-reference/chat
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// 기본 답변 최대 토큰 수
pub const DEFAULT_MAX_TOKENS: u32 = 200;

/// 기본 샘플링 온도
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// 요청 타임아웃 (초)
const REQUEST_TIMEOUT_SECS: u64 = 30;
/// 일시 에러 시 최대 재시도 횟수
const MAX_RETRIES: u32 = 3;
/// 재시도 시 초기 백오프 (ms)
const INITIAL_BACKOFF_MS: u64 = 500;

/// OpenAI 챗 컴플리션 구현체
#[derive(Debug)]
pub struct OpenAiCompletion {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiCompletion {
    /// 설정으로 생성
    pub fn new(config: &AppConfig) -> Result<Self> {
        if config.openai_api_key.trim().is_empty() {
            return Err(QaError::generation("OpenAI API key is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| QaError::generation(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/chat/completions",
            config.openai_base_url.trim_end_matches('/')
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.openai_api_key.clone(),
            model: config.chat_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
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

/// OpenAI 챗 컴플리션 요청 본문
/// source: https://platform.openai.com/docs/api-reference/chat
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// OpenAI 챗 컴플리션 응답
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
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
impl CompletionProvider for OpenAiCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
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
                    let message = format!("Failed to send completion request: {}", e);
                    if self.is_retryable_error(&e) && attempt < MAX_RETRIES {
                        let backoff = self.retry_backoff(attempt);
                        tracing::warn!(
                            "Completion request failed, retrying in {:?} (attempt {}/{}): {}",
                            backoff,
                            attempt + 1,
                            MAX_RETRIES,
                            e
                        );
                        last_error = Some(QaError::generation(message));
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(QaError::generation(message));
                }
            };

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                QaError::generation(format!("Failed to read completion response body: {}", e))
            })?;

            // 성공
            if status.is_success() {
                let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
                    QaError::generation(format!("Failed to parse completion response: {}", e))
                })?;

                let answer = parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message.content)
                    .ok_or_else(|| QaError::generation("Completion response contained no choices"))?;

                let answer = answer.trim().to_string();

                // 빈 답변은 반환하지 않음
                if answer.is_empty() {
                    return Err(QaError::generation("Completion response was empty"));
                }

                return Ok(answer);
            }

            // 429 / 5xx는 재시도 대상
            if self.should_retry(status) {
                let backoff = self.retry_backoff(attempt);
                tracing::warn!(
                    "Completion API returned {}, backing off {:?} (attempt {}/{})",
                    status,
                    backoff,
                    attempt + 1,
                    MAX_RETRIES
                );
                last_error = Some(QaError::generation(api_error_message(status, &body)));

                if attempt < MAX_RETRIES {
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            } else {
                // 다른 에러는 즉시 실패
                return Err(QaError::generation(api_error_message(status, &body)));
            }
        }

        // 모든 재시도 실패
        Err(last_error.unwrap_or_else(|| {
            QaError::generation(format!("Completion failed after {} retries", MAX_RETRIES))
        }))
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
        let result = OpenAiCompletion::new(&config);
        assert!(matches!(result, Err(QaError::Generation(_))));
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let completer = OpenAiCompletion::new(&test_config()).unwrap();
        assert_eq!(
            completer.endpoint,
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_chat_request_wire_format() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "instructions",
                },
                ChatMessage {
                    role: "user",
                    content: "question",
                },
            ],
            max_tokens: 200,
            temperature: 0.7,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["max_tokens"], 200);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "question");
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  15 days.  "}}
            ]
        }"#;

        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].message.content.trim(), "15 days.");
    }

    #[test]
    fn test_name() {
        let completer = OpenAiCompletion::new(&test_config()).unwrap();
        assert_eq!(completer.name(), "gpt-3.5-turbo");
    }
}
