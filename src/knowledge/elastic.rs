//! Elasticsearch 인덱스 저장소
//!
//! 청크 본문과 임베딩 벡터를 단일 인덱스에 저장하고,
//! script_score 쿼리로 코사인 유사도 검색을 수행합니다.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::AppConfig;
use crate::error::{QaError, Result};
use crate::knowledge::index::{IndexStore, ScoredHit};

/// 요청 타임아웃 (초)
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Elastic Index Store
// ============================================================================

/// Elasticsearch 기반 저장소
#[derive(Debug)]
pub struct ElasticIndexStore {
    client: reqwest::Client,
    base_url: String,
    index_name: String,
    dimension: usize,
}

impl ElasticIndexStore {
    /// 설정으로 생성
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| QaError::index(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.elasticsearch_url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            dimension: config.embedding_dimension,
        })
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index_name)
    }

    /// 인덱스 매핑 정의
    ///
    /// content는 텍스트 + keyword 서브필드, embedding은 dense_vector입니다.
    fn mapping_body(&self) -> serde_json::Value {
        json!({
            "mappings": {
                "properties": {
                    "content": {
                        "type": "text",
                        "fields": {
                            "keyword": {
                                "type": "keyword",
                                "ignore_above": 256
                            }
                        }
                    },
                    "embedding": {
                        "type": "dense_vector",
                        "dims": self.dimension
                    }
                }
            }
        })
    }

    /// script_score 검색 쿼리
    /// source: https://www.elastic.co/guide/en/elasticsearch/reference/current/query-dsl-script-score-query.html
    fn search_body(&self, query_vector: &[f32], top_n: usize) -> serde_json::Value {
        json!({
            "size": top_n,
            "query": {
                "script_score": {
                    "query": { "match_all": {} },
                    "script": {
                        "source": "cosineSimilarity(params.query_vector, 'embedding') + 1.0",
                        "params": { "query_vector": query_vector }
                    }
                }
            }
        })
    }
}

/// 검색 응답 파싱용 구조체
#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_score")]
    score: f32,
    #[serde(rename = "_source")]
    source: SearchSource,
}

#[derive(Debug, Deserialize)]
struct SearchSource {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[async_trait]
impl IndexStore for ElasticIndexStore {
    async fn ensure_schema(&self) -> Result<()> {
        // 존재 확인 후 없을 때만 생성
        let response = self
            .client
            .head(self.index_url())
            .send()
            .await
            .map_err(|e| QaError::index(format!("Failed to check index existence: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            tracing::debug!("Index '{}' already exists", self.index_name);
            return Ok(());
        }

        if status != reqwest::StatusCode::NOT_FOUND {
            return Err(QaError::index(format!(
                "Unexpected status {} while checking index '{}'",
                status, self.index_name
            )));
        }

        tracing::info!("Creating index '{}'", self.index_name);

        let response = self
            .client
            .put(self.index_url())
            .json(&self.mapping_body())
            .send()
            .await
            .map_err(|e| QaError::index(format!("Failed to create index: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(QaError::index(format!(
                "Index creation returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn upsert(&self, id: usize, content: &str, embedding: &[f32]) -> Result<()> {
        let url = format!("{}/_doc/{}", self.index_url(), id);
        let body = json!({
            "content": content,
            "embedding": embedding,
        });

        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| QaError::index(format!("Failed to index chunk {}: {}", id, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(QaError::index(format!(
                "Indexing chunk {} returned {}: {}",
                id, status, body
            )));
        }

        Ok(())
    }

    async fn search(&self, query_vector: &[f32], top_n: usize) -> Result<Vec<ScoredHit>> {
        let url = format!("{}/_search", self.index_url());

        let response = self
            .client
            .post(&url)
            .json(&self.search_body(query_vector, top_n))
            .send()
            .await
            .map_err(|e| QaError::index(format!("Search request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());

        if !status.is_success() {
            return Err(QaError::index(format!(
                "Search returned {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| QaError::index(format!("Failed to parse search response: {}", e)))?;

        let hits = parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| ScoredHit {
                content: hit.source.content,
                score: hit.score,
            })
            .collect();

        Ok(hits)
    }

    async fn count(&self) -> Result<u64> {
        let url = format!("{}/_count", self.index_url());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| QaError::index(format!("Count request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());

        if !status.is_success() {
            return Err(QaError::index(format!(
                "Count returned {}: {}",
                status, body
            )));
        }

        let parsed: CountResponse = serde_json::from_str(&body)
            .map_err(|e| QaError::index(format!("Failed to parse count response: {}", e)))?;

        Ok(parsed.count)
    }
}

// ============================================================================
// Tests
// ============================================================================
