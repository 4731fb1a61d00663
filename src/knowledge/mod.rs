//! Knowledge 모듈 - 정책 문서 지식 저장소
//!
//! - Chunker: 라인 윈도우 텍스트 분할
//! - IndexStore: 색인/검색 공통 인터페이스
//! - Elastic: Elasticsearch 벡터 검색 구현체
//! - Ingest: 수집 → 추출 → 청킹 → 임베딩 → 색인 파이프라인

mod chunker;
mod elastic;
mod index;
mod ingest;

// Re-exports
pub use chunker::{ChunkConfig, Chunker, LineWindowChunker};
pub use elastic::ElasticIndexStore;
pub use index::{cosine_similarity, shifted_cosine, IndexStore, ScoredHit};
pub use ingest::{IngestPipeline, IngestReport};
