//! 문서 수집 모듈
//!
//! 폴더에서 정책 문서 파일을 수집합니다.
//! .gitignore 패턴을 존중하고, 지원하는 확장자만 수집합니다.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{QaError, Result};

// ============================================================================
// File Types
// ============================================================================

/// 지원하는 문서 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// 일반 텍스트 파일
    Text,
    /// Markdown 파일
    Markdown,
    /// PDF 파일
    Pdf,
}

impl FileType {
    /// 확장자로 파일 타입 결정
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "txt" => Some(FileType::Text),
            "md" => Some(FileType::Markdown),
            "pdf" => Some(FileType::Pdf),
            _ => None,
        }
    }

    /// 파일 경로에서 타입 결정
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

// ============================================================================
// Collected File
// ============================================================================

/// 수집된 파일 정보
#[derive(Debug, Clone)]
pub struct CollectedFile {
    /// 파일 절대 경로
    pub path: PathBuf,
    /// 파일 타입
    pub file_type: FileType,
    /// 파일 크기 (바이트)
    pub size: u64,
}

impl CollectedFile {
    /// 파일에서 CollectedFile 생성
    ///
    /// 지원하지 않는 확장자는 `None`을 반환합니다.
    pub fn from_path(path: PathBuf) -> Result<Option<Self>> {
        let file_type = match FileType::from_path(&path) {
            Some(ft) => ft,
            None => return Ok(None),
        };

        let metadata = std::fs::metadata(&path).map_err(|e| {
            QaError::extraction(path.clone(), format!("Failed to read metadata: {}", e))
        })?;

        if !metadata.is_file() {
            return Ok(None);
        }

        Ok(Some(Self {
            path,
            file_type,
            size: metadata.len(),
        }))
    }
}

// ============================================================================
// File Collector
// ============================================================================

/// 파일 수집기 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// .gitignore 패턴 존중 여부
    pub respect_gitignore: bool,
    /// 숨김 파일 포함 여부
    pub include_hidden: bool,
    /// 최대 파일 크기 (바이트, 0이면 제한 없음)
    pub max_file_size: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
            max_file_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// 파일 수집기
pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    /// 새 수집기 생성
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 수집기 생성
    pub fn with_defaults() -> Self {
        Self::new(CollectorConfig::default())
    }

    /// 폴더 재귀 수집
    ///
    /// 결과는 경로 순으로 정렬됩니다. 수집 순서가 시퀀스 ID 부여
    /// 순서를 결정하므로 순서는 항상 고정되어야 합니다.
    pub fn collect_directory(&self, path: &Path) -> Result<Vec<CollectedFile>> {
        let abs_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| QaError::validation(format!("Failed to resolve current dir: {}", e)))?
                .join(path)
        };

        if !abs_path.exists() {
            return Err(QaError::validation(format!(
                "Directory not found: {:?}",
                abs_path
            )));
        }

        if !abs_path.is_dir() {
            return Err(QaError::validation(format!(
                "Not a directory: {:?}",
                abs_path
            )));
        }

        let mut files = Vec::new();

        let walker = WalkBuilder::new(&abs_path)
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {}", e);
                    continue;
                }
            };

            // 파일만 처리
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            if let Some(file) = CollectedFile::from_path(entry.path().to_path_buf())? {
                if self.should_include(&file) {
                    files.push(file);
                }
            }
        }

        // 수집 순서 고정
        files.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!("Collected {} files from {:?}", files.len(), abs_path);
        Ok(files)
    }

    /// 파일이 필터 조건을 만족하는지 확인
    fn should_include(&self, file: &CollectedFile) -> bool {
        if self.config.max_file_size > 0 && file.size > self.config.max_file_size {
            tracing::debug!("Skipping large file: {:?} ({} bytes)", file.path, file.size);
            return false;
        }

        true
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// 수집 통계
#[derive(Debug, Default)]
pub struct CollectionStats {
    pub total_files: usize,
    pub text_files: usize,
    pub markdown_files: usize,
    pub pdf_files: usize,
    pub total_size: u64,
}

impl CollectionStats {
    /// 수집된 파일 목록에서 통계 계산
    pub fn from_files(files: &[CollectedFile]) -> Self {
        let mut stats = Self::default();

        for file in files {
            stats.total_files += 1;
            stats.total_size += file.size;

            match file.file_type {
                FileType::Text => stats.text_files += 1,
                FileType::Markdown => stats.markdown_files += 1,
                FileType::Pdf => stats.pdf_files += 1,
            }
        }

        stats
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("txt"), Some(FileType::Text));
        assert_eq!(FileType::from_extension("md"), Some(FileType::Markdown));
        assert_eq!(FileType::from_extension("PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("docx"), None);
        assert_eq!(FileType::from_extension("exe"), None);
    }

    #[test]
    fn test_collector_config_default() {
        let config = CollectorConfig::default();
        assert!(config.respect_gitignore);
        assert!(!config.include_hidden);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_collect_directory_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b_policy.txt"), "second").unwrap();
        fs::write(dir.path().join("a_policy.txt"), "first").unwrap();
        fs::write(dir.path().join("skipped.docx"), "ignored").unwrap();

        let collector = FileCollector::with_defaults();
        let files = collector.collect_directory(dir.path()).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].path.ends_with("a_policy.txt"));
        assert!(files[1].path.ends_with("b_policy.txt"));
    }

    #[test]
    fn test_collect_missing_directory() {
        let collector = FileCollector::with_defaults();
        let result = collector.collect_directory(Path::new("/nonexistent/policies"));
        assert!(matches!(result, Err(QaError::Validation(_))));
    }

    #[test]
    fn test_collection_stats() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.txt"), "text file").unwrap();
        fs::write(dir.path().join("two.md"), "markdown file").unwrap();

        let collector = FileCollector::with_defaults();
        let files = collector.collect_directory(dir.path()).unwrap();
        let stats = CollectionStats::from_files(&files);

        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.text_files, 1);
        assert_eq!(stats.markdown_files, 1);
        assert_eq!(stats.pdf_files, 0);
        assert!(stats.total_size > 0);
    }
}
