//! CLI 모듈
//!
//! polidoc-rag CLI 명령어 정의 및 구현

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::collector::{CollectionStats, FileCollector};
use crate::config::{has_api_key, AppConfig};
use crate::embedding::{EmbeddingProvider, OpenAiEmbedding};
use crate::knowledge::{ElasticIndexStore, IndexStore, IngestPipeline};
use crate::qa::QaService;
use crate::server;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "polidoc-rag")]
#[command(version, about = "정책 문서 QA RAG 파이프라인", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 폴더의 정책 문서를 색인
    Ingest {
        /// 수집할 폴더 경로 (재귀)
        #[arg(short, long)]
        dir: PathBuf,
    },

    /// 질문 하나에 답변
    Ask {
        /// 질문
        query: String,

        /// 검색할 청크 수
        #[arg(short, long)]
        top_n: Option<usize>,
    },

    /// HTTP 서버 실행
    Serve {
        /// 바인드 주소 (예: 0.0.0.0:8080)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ingest { dir } => cmd_ingest(dir).await,
        Commands::Ask { query, top_n } => cmd_ask(&query, top_n).await,
        Commands::Serve { bind } => cmd_serve(bind).await,
        Commands::Status => cmd_status().await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 문서 수집 명령어 (ingest)
///
/// 폴더를 재귀 순회하며 정책 문서를 추출, 임베딩, 색인합니다.
async fn cmd_ingest(dir: PathBuf) -> Result<()> {
    // API 키 확인
    if !has_api_key() {
        bail!(
            "API 키가 설정되지 않았습니다.\n\n\
             설정 방법:\n  \
             export OPENAI_KEY=your-api-key\n  \
             또는\n  \
             export OPENAI_API_KEY=your-api-key\n\n\
             API 키 발급: https://platform.openai.com/api-keys"
        );
    }

    let config = AppConfig::from_env()?;

    // 수집 대상 미리 확인
    let files = FileCollector::with_defaults()
        .collect_directory(&dir)
        .context("폴더 수집 실패")?;

    if files.is_empty() {
        println!("[!] 수집할 파일이 없습니다.");
        return Ok(());
    }

    let stats = CollectionStats::from_files(&files);
    println!("[*] 수집 대상: {} 파일", stats.total_files);
    println!(
        "    텍스트: {}, 마크다운: {}, PDF: {}",
        stats.text_files, stats.markdown_files, stats.pdf_files
    );
    println!("    총 크기: {}", format_bytes(stats.total_size as usize));
    println!();

    println!("[*] 추출 및 임베딩 생성 중...");

    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(OpenAiEmbedding::new(&config).context("임베딩 프로바이더 초기화 실패")?);
    let store: Arc<dyn IndexStore> =
        Arc::new(ElasticIndexStore::new(&config).context("인덱스 저장소 초기화 실패")?);

    let pipeline = IngestPipeline::new(&config, embedder, store);
    let report = pipeline
        .ingest_directory(&dir)
        .await
        .context("수집 실패")?;

    println!(
        "[OK] 완료: 파일 {}, 페이지 {}, 청크 {}",
        report.files_processed, report.pages_extracted, report.chunks_indexed
    );

    Ok(())
}

/// 질문 명령어 (ask)
///
/// 질문 하나를 검색하고 답변을 출력합니다.
async fn cmd_ask(query: &str, top_n: Option<usize>) -> Result<()> {
    if !has_api_key() {
        bail!(
            "API 키가 설정되지 않았습니다.\n\
             설정: export OPENAI_KEY=your-key"
        );
    }

    let mut config = AppConfig::from_env()?;
    if let Some(n) = top_n {
        config.top_n = n;
    }

    println!("[*] 질문: \"{}\"", query);

    let service = QaService::from_config(&config).context("QA 서비스 초기화 실패")?;
    let answer = service.answer_query(query).await.context("답변 생성 실패")?;

    println!("\n[OK] 답변:\n{}", answer.response);

    if answer.sources.is_empty() {
        println!("\n[!] 근거 청크가 없습니다.");
    } else {
        println!("\n근거 ({} 건):", answer.sources.len());
        for (i, source) in answer.sources.iter().enumerate() {
            println!("  {}. {}", i + 1, truncate_text(source, 200));
        }
    }

    Ok(())
}

/// 서버 명령어 (serve)
///
/// 질의 응답 HTTP 서버를 실행합니다.
async fn cmd_serve(bind: Option<String>) -> Result<()> {
    if !has_api_key() {
        bail!(
            "API 키가 설정되지 않았습니다.\n\
             설정: export OPENAI_KEY=your-key"
        );
    }

    let mut config = AppConfig::from_env()?;
    if let Some(b) = bind {
        config.bind_address = b;
    }

    let service = Arc::new(QaService::from_config(&config).context("QA 서비스 초기화 실패")?);

    println!("[*] 서버 시작: http://{}", config.bind_address);

    server::serve(service, &config.bind_address).await
}

/// 상태 명령어 (status)
///
/// 시스템 상태를 확인합니다.
async fn cmd_status() -> Result<()> {
    println!("polidoc-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config = AppConfig::from_env_unchecked();

    println!("[*] Elasticsearch: {}", config.elasticsearch_url);
    println!("[*] 인덱스: {}", config.index_name);

    // API 키 상태
    if has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export OPENAI_KEY=your-key");
    }

    // 색인된 청크 수 (저장소가 내려가 있어도 상태 출력은 계속)
    match ElasticIndexStore::new(&config) {
        Ok(store) => match store.count().await {
            Ok(count) => {
                println!("[OK] 색인된 청크: {} 건", count);
            }
            Err(e) => {
                println!("[!] 청크 수 조회 실패: {}", e);
            }
        },
        Err(e) => {
            println!("[!] 인덱스 저장소 초기화 실패: {}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
