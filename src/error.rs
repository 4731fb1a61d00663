//! 에러 타입 모듈
//!
//! 파이프라인 각 단계의 실패를 구분하는 에러 타입을 정의합니다.
//! HTTP 레이어는 이 구분으로 응답 상태 코드를 결정합니다.

use std::path::PathBuf;

use thiserror::Error;

/// 파이프라인 공통 Result 타입
pub type Result<T> = std::result::Result<T, QaError>;

/// 질의응답 파이프라인 에러
#[derive(Debug, Error)]
pub enum QaError {
    /// 잘못된 입력 (빈 질의 등)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// 문서 텍스트 추출 실패
    #[error("Failed to extract text from {path:?}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// 임베딩 생성 실패 (빈 입력 포함)
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// 색인 저장소 실패
    #[error("Index store error: {0}")]
    Index(String),

    /// 답변 생성 실패
    #[error("Answer generation failed: {0}")]
    Generation(String),
}

impl QaError {
    /// Validation 에러 생성
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Extraction 에러 생성
    pub fn extraction(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Embedding 에러 생성
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Index 에러 생성
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Generation 에러 생성
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }
}

// ============================================================================
// Tests
// ============================================================================
