//! 콘텐츠 추출 모듈
//!
//! 문서 파일에서 페이지 단위 텍스트를 추출합니다.
//! - 텍스트/Markdown 파일: 전체를 한 페이지로 읽기
//! - PDF 파일: pdf-extract로 페이지별 추출

pub mod pdf;

use std::path::Path;

use crate::collector::FileType;
use crate::error::{QaError, Result};

// ============================================================================
// Extracted Page
// ============================================================================

/// 추출된 페이지 텍스트
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// 추출된 텍스트
    pub text: String,
    /// 페이지 번호 (1부터 시작, PDF만 해당)
    pub page_number: Option<usize>,
    /// 총 페이지 수 (PDF만 해당)
    pub total_pages: Option<usize>,
}

// ============================================================================
// Content Extractor
// ============================================================================

/// 콘텐츠 추출기
#[derive(Debug, Default)]
pub struct ContentExtractor;

impl ContentExtractor {
    /// 새 추출기 생성
    pub fn new() -> Self {
        Self
    }

    /// 파일에서 페이지 텍스트 추출
    pub async fn extract(&self, path: &Path, file_type: FileType) -> Result<Vec<ExtractedPage>> {
        match file_type {
            FileType::Text | FileType::Markdown => self.extract_text(path).await,
            FileType::Pdf => self.extract_pdf(path).await,
        }
    }

    /// 텍스트 파일에서 추출 (전체를 한 페이지로)
    async fn extract_text(&self, path: &Path) -> Result<Vec<ExtractedPage>> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            QaError::extraction(path, format!("Failed to read text file: {}", e))
        })?;

        Ok(vec![ExtractedPage {
            text,
            page_number: None,
            total_pages: None,
        }])
    }

    /// PDF 파일에서 추출
    async fn extract_pdf(&self, path: &Path) -> Result<Vec<ExtractedPage>> {
        // PDF 파싱은 CPU 바운드 작업이라 블로킹 풀에서 수행
        let owned = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || pdf::extract_text_from_pdf(&owned))
            .await
            .map_err(|e| QaError::extraction(path, format!("PDF extraction task failed: {}", e)))??;

        let total_pages = pages.len();

        Ok(pages
            .into_iter()
            .map(|(page_num, text)| ExtractedPage {
                text,
                page_number: Some(page_num),
                total_pages: Some(total_pages),
            })
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
