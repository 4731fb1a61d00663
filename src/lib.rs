//! polidoc-rag - 정책 문서 QA RAG 파이프라인
//!
//! 사내 정책 문서(txt/md/PDF)를 Elasticsearch에 벡터 색인하고,
//! OpenAI 임베딩 + 챗 모델로 근거 기반 답변을 생성하는
//! RAG 시스템입니다.

pub mod cli;
pub mod collector;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod knowledge;
pub mod qa;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use completion::{CompletionProvider, OpenAiCompletion};
pub use config::{get_api_key, has_api_key, AppConfig};
pub use embedding::{EmbeddingProvider, OpenAiEmbedding};
pub use error::{QaError, Result};
pub use knowledge::{
    cosine_similarity, shifted_cosine, ChunkConfig, Chunker, ElasticIndexStore, IndexStore,
    IngestPipeline, IngestReport, LineWindowChunker, ScoredHit,
};
pub use qa::{AnswerResponse, AnswerSynthesizer, QaService, Retriever};
