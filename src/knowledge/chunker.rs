//! 텍스트 청킹 모듈
//!
//! 추출된 문서 텍스트를 고정 크기 라인 윈도우로 분할합니다.
//! 너무 짧은 조각은 색인하지 않고 버립니다.

use crate::error::Result;

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// 청크 하나에 담을 라인 수
    pub window_lines: usize,
    /// 유지할 최소 글자 수 (trim 후)
    pub min_characters: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            window_lines: 4,
            min_characters: 20,
        }
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Result<Vec<String>>;

    /// 전략 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// Line Window Chunker
// ============================================================================

/// 라인 윈도우 청커
///
/// 텍스트를 줄 단위로 나눈 뒤 연속된 N줄씩 겹침 없이 묶습니다.
/// 묶은 결과가 최소 글자 수 미만이면 버립니다.
#[derive(Debug, Clone)]
pub struct LineWindowChunker {
    config: ChunkConfig,
}

impl LineWindowChunker {
    /// 설정으로 생성
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 생성
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }
}

impl Default for LineWindowChunker {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Chunker for LineWindowChunker {
    fn chunk(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let lines: Vec<&str> = text.lines().collect();
        let window = self.config.window_lines.max(1);

        let chunks = lines
            .chunks(window)
            .map(|group| group.join("\n"))
            // 길이는 바이트가 아니라 글자 수 기준
            .filter(|chunk| chunk.trim().chars().count() >= self.config.min_characters)
            .collect();

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "line_window"
    }
}

// ============================================================================
// Tests
// ============================================================================
