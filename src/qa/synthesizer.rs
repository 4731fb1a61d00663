//! 답변 합성 모듈
//!
//! 검색된 청크를 컨텍스트로 묶어 시스템 지시문을 만들고,
//! 챗 모델에 질문을 넘겨 답변을 생성합니다. 컨텍스트에 근거가
//! 없으면 안내 문구로 답하도록 지시합니다.

use std::sync::Arc;

use crate::completion::CompletionProvider;
use crate::error::Result;

// ============================================================================
// Prompt Building
// ============================================================================

/// 근거가 없을 때 사용할 안내 문구
pub fn fallback_text(contact: &str) -> String {
    format!(
        "I'm sorry, I couldn't find this information in the policy documents. \
         Please contact {} for further assistance.",
        contact
    )
}

/// 시스템 지시문 생성
///
/// 검색된 컨텍스트와 근거 부재 시의 안내 문구를 함께 담습니다.
/// 사용자 턴에는 질문만 실립니다.
pub fn build_system_prompt(context: &str, fallback_contact: &str) -> String {
    format!(
        "You are a helpful assistant that answers questions about company policy documents. \
         Answer using only the context below.\n\n\
         Context:\n{}\n\n\
         If the context does not contain the information needed to answer, reply exactly with: \"{}\"",
        context,
        fallback_text(fallback_contact)
    )
}

// ============================================================================
// Answer Synthesizer
// ============================================================================

/// 답변 합성기
pub struct AnswerSynthesizer {
    completer: Arc<dyn CompletionProvider>,
    fallback_contact: String,
}

impl AnswerSynthesizer {
    /// 의존성으로 생성
    pub fn new(completer: Arc<dyn CompletionProvider>, fallback_contact: impl Into<String>) -> Self {
        Self {
            completer,
            fallback_contact: fallback_contact.into(),
        }
    }

    /// 청크를 근거로 답변 생성
    ///
    /// 청크가 하나도 없어도 합성은 수행합니다. 모델이 지시문에 따라
    /// 안내 문구로 답하게 됩니다.
    pub async fn synthesize(&self, query: &str, chunks: &[String]) -> Result<String> {
        let context = chunks.join("\n\n");
        let system = build_system_prompt(&context, &self.fallback_contact);

        tracing::debug!(
            "Synthesizing answer from {} chunks ({} context chars)",
            chunks.len(),
            context.chars().count()
        );

        self.completer.complete(&system, query).await
    }
}

// ============================================================================
// Tests
// ============================================================================
