//! 검색 모듈
//!
//! 질문을 임베딩해 인덱스에서 유사 청크를 가져옵니다.

use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::knowledge::IndexStore;

// ============================================================================
// Retriever
// ============================================================================

/// 유사 청크 검색기
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn IndexStore>,
    top_n: usize,
}

impl Retriever {
    /// 의존성으로 생성
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn IndexStore>,
        top_n: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            top_n,
        }
    }

    /// 질문과 유사한 청크 본문을 유사도 내림차순으로 반환
    ///
    /// 중복 제거나 재정렬은 하지 않습니다. 빈 질문은 검증 에러입니다.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<String>> {
        if query.trim().is_empty() {
            return Err(QaError::validation("Query must not be empty"));
        }

        let query_vector = self.embedder.embed(query).await?;
        let hits = self.store.search(&query_vector, self.top_n).await?;

        if let Some(top) = hits.first() {
            tracing::debug!("Retrieved {} chunks (top score {:.3})", hits.len(), top.score);
        } else {
            tracing::debug!("Retrieved 0 chunks");
        }

        Ok(hits.into_iter().map(|hit| hit.content).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
