//! QA 모듈 - 질의 응답 파이프라인
//!
//! 질문 검증 → 유사 청크 검색 → 근거 기반 답변 합성의
//! 전체 흐름을 묶는 서비스입니다.

use std::sync::Arc;

use serde::Serialize;

use crate::completion::{CompletionProvider, OpenAiCompletion};
use crate::config::AppConfig;
use crate::embedding::{EmbeddingProvider, OpenAiEmbedding};
use crate::error::Result;
use crate::knowledge::{ElasticIndexStore, IndexStore};

mod retriever;
mod synthesizer;

// Re-exports
pub use retriever::Retriever;
pub use synthesizer::{build_system_prompt, fallback_text, AnswerSynthesizer};

// ============================================================================
// Answer Response
// ============================================================================

/// 질의 응답 결과
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    /// 생성된 답변
    pub response: String,
    /// 근거로 사용한 청크 (유사도 내림차순)
    pub sources: Vec<String>,
}

// ============================================================================
// QA Service
// ============================================================================

/// 질의 응답 서비스
pub struct QaService {
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
}

impl QaService {
    /// 의존성으로 생성
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn IndexStore>,
        completer: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedder, store, config.top_n),
            synthesizer: AnswerSynthesizer::new(completer, config.fallback_contact.clone()),
        }
    }

    /// 설정만으로 실제 프로바이더를 조립해 생성
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbedding::new(config)?);
        let store: Arc<dyn IndexStore> = Arc::new(ElasticIndexStore::new(config)?);
        let completer: Arc<dyn CompletionProvider> = Arc::new(OpenAiCompletion::new(config)?);

        Ok(Self::new(config, embedder, store, completer))
    }

    /// 질문 하나에 답변
    pub async fn answer_query(&self, query: &str) -> Result<AnswerResponse> {
        let sources = self.retriever.retrieve(query).await?;
        let response = self.synthesizer.synthesize(query, &sources).await?;

        Ok(AnswerResponse { response, sources })
    }
}

// ============================================================================
// Tests
// ============================================================================
