//! 수집 파이프라인
//!
//! 폴더 수집 → 텍스트 추출 → 청킹 → 임베딩 → 색인의 전체 흐름을
//! 담당합니다. 추출은 전부 끝낸 뒤에 색인을 시작하므로 추출 단계
//! 실패 시 저장소는 건드리지 않습니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collector::FileCollector;
use crate::config::AppConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::extractor::ContentExtractor;
use crate::knowledge::chunker::{ChunkConfig, Chunker, LineWindowChunker};
use crate::knowledge::index::IndexStore;

// ============================================================================
// Ingest Report
// ============================================================================

/// 수집 결과 요약
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// 처리한 파일 수
    pub files_processed: usize,
    /// 추출한 페이지 수
    pub pages_extracted: usize,
    /// 색인한 청크 수
    pub chunks_indexed: usize,
}

// ============================================================================
// Ingest Pipeline
// ============================================================================

/// 색인 대기 중인 청크
struct PendingChunk {
    source: PathBuf,
    content: String,
}

/// 수집 파이프라인
pub struct IngestPipeline {
    collector: FileCollector,
    extractor: ContentExtractor,
    chunker: Box<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn IndexStore>,
}

impl IngestPipeline {
    /// 설정과 의존성으로 생성
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn IndexStore>,
    ) -> Self {
        let chunker = LineWindowChunker::new(ChunkConfig {
            window_lines: config.chunk_window_lines,
            min_characters: config.chunk_min_characters,
        });

        Self {
            collector: FileCollector::with_defaults(),
            extractor: ContentExtractor::new(),
            chunker: Box::new(chunker),
            embedder,
            store,
        }
    }

    /// 폴더 하나를 통째로 색인
    ///
    /// 청크 id는 전체 수집 순서상의 0부터 시작하는 위치입니다.
    /// 같은 폴더를 다시 수집하면 같은 id가 덮어써집니다.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestReport> {
        tracing::info!("Ingesting directory {:?}", dir);

        // 스키마는 파일 유무와 무관하게 보장
        self.store.ensure_schema().await?;

        let files = self.collector.collect_directory(dir)?;

        let mut report = IngestReport::default();
        let mut pending: Vec<PendingChunk> = Vec::new();

        // 1단계: 추출 + 청킹 (파일 하나라도 실패하면 전체 중단)
        for file in &files {
            let pages = self.extractor.extract(&file.path, file.file_type).await?;
            report.pages_extracted += pages.len();

            let mut file_chunks = 0;
            for page in &pages {
                let chunks = self.chunker.chunk(&page.text)?;
                file_chunks += chunks.len();

                for content in chunks {
                    pending.push(PendingChunk {
                        source: file.path.clone(),
                        content,
                    });
                }
            }

            tracing::debug!(
                "Extracted {} pages, {} chunks from {:?} ({})",
                pages.len(),
                file_chunks,
                file.path,
                self.chunker.name()
            );

            report.files_processed += 1;
        }

        // 2단계: 임베딩 + 색인 (id는 전체 순서상의 위치)
        for (position, chunk) in pending.iter().enumerate() {
            let embedding = match self.embedder.embed(&chunk.content).await {
                Ok(vector) => vector,
                Err(e) => {
                    tracing::error!(
                        "Embedding failed for chunk from {:?}, aborting ingestion",
                        chunk.source
                    );
                    return Err(e);
                }
            };

            self.store
                .upsert(position, &chunk.content, &embedding)
                .await?;
            report.chunks_indexed += 1;
        }

        tracing::info!(
            "Ingestion complete: {} files, {} pages, {} chunks",
            report.files_processed,
            report.pages_extracted,
            report.chunks_indexed
        );

        Ok(report)
    }
}

// ============================================================================
// Tests
// ============================================================================
