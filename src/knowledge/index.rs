//! 인덱스 저장소 추상화
//!
//! 청크 색인과 벡터 유사도 검색의 공통 인터페이스입니다.
//! 실제 저장은 Elasticsearch 구현체가 담당합니다.

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Scored Hit
// ============================================================================

/// 검색 결과 항목
#[derive(Debug, Clone)]
pub struct ScoredHit {
    /// 청크 본문
    pub content: String,
    /// 유사도 점수 (코사인 + 1.0, 범위 0.0 ~ 2.0)
    pub score: f32,
}

// ============================================================================
// IndexStore Trait
// ============================================================================

/// 인덱스 저장소 트레이트
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// 스키마 보장 (없으면 생성, 있으면 그대로 둠)
    async fn ensure_schema(&self) -> Result<()>;

    /// 청크 저장 (같은 id는 덮어씀)
    async fn upsert(&self, id: usize, content: &str, embedding: &[f32]) -> Result<()>;

    /// 유사도 내림차순으로 상위 top_n 청크 검색
    async fn search(&self, query_vector: &[f32], top_n: usize) -> Result<Vec<ScoredHit>>;

    /// 색인된 청크 수
    async fn count(&self) -> Result<u64>;
}

// ============================================================================
// Similarity
// ============================================================================

/// 코사인 유사도 계산
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// 검색 스코어 함수 (항상 양수가 되도록 +1.0 시프트)
pub fn shifted_cosine(a: &[f32], b: &[f32]) -> f32 {
    cosine_similarity(a, b) + 1.0
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{embed_deterministic, MemoryIndexStore};

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&a, &a);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_shifted_cosine_is_non_negative() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        let score = shifted_cosine(&a, &b);
        assert!(score >= 0.0);
        assert!(score < 1e-6);
    }

    #[tokio::test]
    async fn test_store_round_trip_finds_exact_match() {
        let store = MemoryIndexStore::new();
        store.ensure_schema().await.unwrap();

        let vacation = embed_deterministic("vacation policy", 8);
        let sick = embed_deterministic("sick leave rules", 8);

        store.upsert(0, "Vacation accrues monthly.", &vacation).await.unwrap();
        store.upsert(1, "Sick leave needs a note.", &sick).await.unwrap();

        let hits = store.search(&vacation, 1).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "Vacation accrues monthly.");
        // 동일 벡터는 코사인 1.0, 시프트 후 2.0
        assert!((hits[0].score - 2.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_store_results_sorted_by_score() {
        let store = MemoryIndexStore::new();
        store.ensure_schema().await.unwrap();

        for (i, text) in ["annual leave", "parental leave", "office dress code"]
            .iter()
            .enumerate()
        {
            let vector = embed_deterministic(text, 8);
            store.upsert(i, text, &vector).await.unwrap();
        }

        let query = embed_deterministic("annual leave", 8);
        let hits = store.search(&query, 3).await.unwrap();

        assert_eq!(hits.len(), 3);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(hits[0].content, "annual leave");
    }

    #[tokio::test]
    async fn test_store_upsert_overwrites_same_id() {
        let store = MemoryIndexStore::new();
        store.ensure_schema().await.unwrap();

        let vector = embed_deterministic("policy", 8);
        store.upsert(0, "old text", &vector).await.unwrap();
        store.upsert(0, "new text", &vector).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let hits = store.search(&vector, 5).await.unwrap();
        assert_eq!(hits[0].content, "new text");
    }
}
