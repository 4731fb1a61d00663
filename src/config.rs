//! 설정 모듈
//!
//! 파이프라인 전역 설정을 하나의 구조체로 모읍니다.
//! 환경변수는 로드 시점에만 읽으며, 초기화 과정에서 환경을 변경하지 않습니다.

use anyhow::Result;

use crate::completion::{DEFAULT_CHAT_MODEL, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::embedding::{DEFAULT_DIMENSION, DEFAULT_EMBEDDING_MODEL};

/// OpenAI API 기본 베이스 URL
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Elasticsearch 기본 URL
const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";

/// 기본 색인 이름
const DEFAULT_INDEX_NAME: &str = "policy_docs";

// ============================================================================
// AppConfig
// ============================================================================

/// 파이프라인 전역 설정
///
/// 각 컴포넌트의 생성자에 참조로 전달됩니다.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OpenAI API 키
    pub openai_api_key: String,
    /// OpenAI API 베이스 URL
    pub openai_base_url: String,
    /// 임베딩 모델 이름
    pub embedding_model: String,
    /// 임베딩 차원 수
    pub embedding_dimension: usize,
    /// 답변 생성 모델 이름
    pub chat_model: String,
    /// Elasticsearch URL
    pub elasticsearch_url: String,
    /// 색인 이름
    pub index_name: String,
    /// 청크 윈도우 크기 (줄 수)
    pub chunk_window_lines: usize,
    /// 청크 최소 길이 (문자 수)
    pub chunk_min_characters: usize,
    /// 검색 결과 개수
    pub top_n: usize,
    /// 답변 최대 토큰 수
    pub max_tokens: u32,
    /// 샘플링 온도
    pub temperature: f32,
    /// 폴백 메시지에 안내하는 연락처
    pub fallback_contact: String,
    /// HTTP 서버 바인드 주소 (host:port)
    pub bind_address: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimension: DEFAULT_DIMENSION,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            elasticsearch_url: DEFAULT_ELASTICSEARCH_URL.to_string(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            chunk_window_lines: 4,
            chunk_min_characters: 20,
            top_n: 5,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            fallback_contact: "hr@example.com".to_string(),
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

impl AppConfig {
    /// 환경변수를 반영한 설정 (API 키가 없어도 실패하지 않음)
    ///
    /// 반영하는 환경변수:
    /// - `OPENAI_KEY` / `OPENAI_API_KEY`
    /// - `ELASTICSEARCH_URL`
    /// - `POLICY_INDEX_NAME`
    pub fn from_env_unchecked() -> Self {
        let mut config = Self::default();

        if let Ok(key) = get_api_key() {
            config.openai_api_key = key;
        }

        if let Ok(url) = std::env::var("ELASTICSEARCH_URL") {
            if !url.is_empty() {
                config.elasticsearch_url = url;
            }
        }

        if let Ok(name) = std::env::var("POLICY_INDEX_NAME") {
            if !name.is_empty() {
                config.index_name = name;
            }
        }

        config
    }

    /// 환경변수에서 설정 로드
    ///
    /// API 키가 설정되어 있지 않으면 에러를 반환합니다.
    pub fn from_env() -> Result<Self> {
        let config = Self::from_env_unchecked();

        if config.openai_api_key.is_empty() {
            anyhow::bail!(
                "API key not found. Set OPENAI_KEY or OPENAI_API_KEY environment variable."
            );
        }

        Ok(config)
    }
}

// ============================================================================
// API Key Management
// ============================================================================

/// API 키 로드 (환경변수에서)
///
/// 우선순위:
/// 1. `OPENAI_KEY` 환경변수
/// 2. `OPENAI_API_KEY` 환경변수
pub fn get_api_key() -> Result<String> {
    if let Ok(key) = std::env::var("OPENAI_KEY") {
        if !key.is_empty() {
            tracing::debug!("Using API key from OPENAI_KEY");
            return Ok(key);
        }
    }

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            tracing::debug!("Using API key from OPENAI_API_KEY");
            return Ok(key);
        }
    }

    anyhow::bail!("API key not found. Set OPENAI_KEY or OPENAI_API_KEY environment variable.")
}

/// API 키 존재 여부 확인
pub fn has_api_key() -> bool {
    if let Ok(key) = std::env::var("OPENAI_KEY") {
        if !key.is_empty() {
            return true;
        }
    }

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            return true;
        }
    }

    false
}

// ============================================================================
// Tests
// ============================================================================
