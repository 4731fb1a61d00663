//! HTTP 서버 모듈
//!
//! 질의 응답 엔드포인트를 노출하는 axum 서버입니다.
//!
//! - `POST /ask_policy/` : 질문을 받아 답변과 근거를 반환
//! - `GET /healthz` : 프로세스 생존 확인

use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::QaError;
use crate::qa::{AnswerResponse, QaService};

// ============================================================================
// Wire Types
// ============================================================================

/// 질의 요청 본문
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub user_query: String,
}

/// 에러 응답 본문
#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

// ============================================================================
// Router
// ============================================================================

#[derive(Clone)]
struct AppState {
    service: Arc<QaService>,
}

/// 라우터 구성
pub fn build_router(service: Arc<QaService>) -> Router {
    Router::new()
        .route("/ask_policy/", post(ask_policy))
        .route("/healthz", get(healthz))
        .with_state(AppState { service })
}

/// 서버 실행 (종료까지 블로킹)
pub async fn serve(service: Arc<QaService>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("{} 바인딩 실패", bind))?;

    tracing::info!("Listening on {}", bind);

    axum::serve(listener, build_router(service))
        .await
        .context("HTTP 서버 실행 실패")
}

// ============================================================================
// Handlers
// ============================================================================

async fn healthz() -> &'static str {
    "ok"
}

async fn ask_policy(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<AnswerResponse>, (StatusCode, Json<ErrorBody>)> {
    state
        .service
        .answer_query(&request.user_query)
        .await
        .map(Json)
        .map_err(error_response)
}

/// 도메인 에러를 HTTP 상태와 본문으로 변환
fn error_response(err: QaError) -> (StatusCode, Json<ErrorBody>) {
    let status = match err {
        QaError::Validation(_) => StatusCode::BAD_REQUEST,
        QaError::Embedding(_) | QaError::Index(_) | QaError::Generation(_) => {
            StatusCode::BAD_GATEWAY
        }
        QaError::Extraction { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else {
        tracing::warn!("Request rejected: {}", err);
    }

    (
        status,
        Json(ErrorBody {
            detail: err.to_string(),
        }),
    )
}

// ============================================================================
// Tests
// ============================================================================
