//! 테스트 전용 페이크 구현체
//!
//! 외부 API 없이 파이프라인을 검증하기 위한 결정적 임베더,
//! 인메모리 인덱스, 고정 응답 컴플리터를 제공합니다.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::completion::CompletionProvider;
use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::knowledge::{shifted_cosine, IndexStore, ScoredHit};

// ============================================================================
// Deterministic Embedding
// ============================================================================

/// 텍스트 바이트를 접어 만든 결정적 단위 벡터
///
/// 같은 텍스트는 항상 같은 벡터가 되므로 검색 순위를 예측할 수 있습니다.
pub(crate) fn embed_deterministic(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dim];
    for (i, byte) in text.bytes().enumerate() {
        vector[i % dim] += byte as f32;
    }

    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }

    vector
}

/// 결정적 임베더
pub(crate) struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub(crate) fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(QaError::embedding("Cannot embed empty text"));
        }
        Ok(embed_deterministic(text, self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// 항상 실패하는 임베더
pub(crate) struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(QaError::embedding("stub embedder failure"))
    }

    fn dimension(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "failing-stub"
    }
}

// ============================================================================
// In-Memory Index Store
// ============================================================================

#[derive(Default)]
struct MemoryInner {
    records: BTreeMap<usize, (String, Vec<f32>)>,
    schema_exists: bool,
    schema_creations: usize,
}

/// 인메모리 인덱스 저장소
pub(crate) struct MemoryIndexStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryIndexStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
        }
    }

    /// 저장된 id 목록 (오름차순)
    pub(crate) fn ids(&self) -> Vec<usize> {
        self.inner.lock().unwrap().records.keys().copied().collect()
    }

    /// 스키마 생성이 실제로 일어난 횟수
    pub(crate) fn schema_creations(&self) -> usize {
        self.inner.lock().unwrap().schema_creations
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn ensure_schema(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.schema_exists {
            inner.schema_exists = true;
            inner.schema_creations += 1;
        }
        Ok(())
    }

    async fn upsert(&self, id: usize, content: &str, embedding: &[f32]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .records
            .insert(id, (content.to_string(), embedding.to_vec()));
        Ok(())
    }

    async fn search(&self, query_vector: &[f32], top_n: usize) -> Result<Vec<ScoredHit>> {
        let inner = self.inner.lock().unwrap();

        let mut hits: Vec<ScoredHit> = inner
            .records
            .values()
            .map(|(content, embedding)| ScoredHit {
                content: content.clone(),
                score: shifted_cosine(query_vector, embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(top_n);

        Ok(hits)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.inner.lock().unwrap().records.len() as u64)
    }
}

// ============================================================================
// Completers
// ============================================================================

/// 고정 응답 컴플리터
pub(crate) struct StaticCompleter {
    reply: String,
}

impl StaticCompleter {
    pub(crate) fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for StaticCompleter {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "static-stub"
    }
}

/// 마지막 호출 인자를 기록하는 컴플리터
pub(crate) struct RecordingCompleter {
    reply: String,
    last: Mutex<Option<(String, String)>>,
}

impl RecordingCompleter {
    pub(crate) fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            last: Mutex::new(None),
        }
    }

    /// 마지막 (system, user) 호출 인자
    pub(crate) fn last_call(&self) -> Option<(String, String)> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for RecordingCompleter {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        *self.last.lock().unwrap() = Some((system.to_string(), user.to_string()));
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "recording-stub"
    }
}

/// 항상 실패하는 컴플리터
pub(crate) struct FailingCompleter;

#[async_trait]
impl CompletionProvider for FailingCompleter {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        Err(QaError::generation("stub completion failure"))
    }

    fn name(&self) -> &str {
        "failing-stub"
    }
}
