
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{BlockMetadata, BlockRecord, IndexStats, ScoredMatch, VectorIndex};
use crate::config::Config;
use crate::NoteError;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// HTTP client for a Pinecone-compatible vector index
#[derive(Debug, Clone)]
pub struct PineconeClient {
    base_url: Url,
    api_key: String,
    index_name: String,
    dimension: u32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorData {
    id: String,
    values: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<BlockMetadata>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    vectors: Vec<VectorData>,
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount")]
    upserted_count: u64,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    vectors: HashMap<String, VectorData>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest {
    ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    vector: Vec<f32>,
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
    #[serde(rename = "includeValues")]
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    metadata: Option<BlockMetadata>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(rename = "totalVectorCount")]
    total_vector_count: u64,
    dimension: u32,
}

impl PineconeClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self, NoteError> {
        let base_url = config
            .index
            .endpoint_url()
            .map_err(|e| NoteError::Config(format!("Failed to generate index URL: {e}")))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        debug!(
            "Initialized index client for {} at {}",
            config.index.index_name, base_url
        );

        Ok(Self {
            base_url,
            api_key: config.index.api_key.clone(),
            index_name: config.index.index_name.clone(),
            dimension: config.ollama.embedding_dimension,
            agent,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// Name of the index this client writes to
    #[inline]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn endpoint(&self, path: &str) -> Result<Url, NoteError> {
        self.base_url
            .join(path)
            .map_err(|e| NoteError::Index(format!("Failed to build index URL for {path}: {e}")))
    }

    fn post_json<T: Serialize>(&self, path: &str, request: &T) -> Result<String, NoteError> {
        let url = self.endpoint(path)?;

        let request_json = serde_json::to_string(request)
            .map_err(|e| NoteError::Index(format!("Failed to serialize request: {e}")))?;

        self.agent
            .post(url.as_str())
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| NoteError::Index(format!("Index request to {path} failed: {e}")))
    }
}

impl VectorIndex for PineconeClient {
    #[inline]
    fn upsert(&self, records: &[BlockRecord]) -> crate::Result<u64> {
        if records.is_empty() {
            debug!("No records to upsert");
            return Ok(0);
        }

        for record in records {
            if record.vector.len() != self.dimension as usize {
                return Err(NoteError::Index(format!(
                    "Vector dimension mismatch for block {}: expected {}, got {}",
                    record.id,
                    self.dimension,
                    record.vector.len()
                )));
            }
        }

        debug!("Upserting {} records into {}", records.len(), self.index_name);

        let request = UpsertRequest {
            vectors: records
                .iter()
                .map(|record| VectorData {
                    id: record.id.clone(),
                    values: record.vector.clone(),
                    metadata: Some(record.metadata.clone()),
                })
                .collect(),
        };

        let response_text = self.post_json("/vectors/upsert", &request)?;

        let response: UpsertResponse = serde_json::from_str(&response_text)
            .map_err(|e| NoteError::Index(format!("Failed to parse upsert response: {e}")))?;

        info!(
            "Upserted {} records into {}",
            response.upserted_count, self.index_name
        );
        Ok(response.upserted_count)
    }

    #[inline]
    fn fetch(&self, ids: &[String]) -> crate::Result<Vec<BlockRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Fetching {} records from {}", ids.len(), self.index_name);

        let mut url = self.endpoint("/vectors/fetch")?;
        {
            let mut pairs = url.query_pairs_mut();
            for id in ids {
                pairs.append_pair("ids", id);
            }
        }

        let response_text = self
            .agent
            .get(url.as_str())
            .header("Api-Key", &self.api_key)
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| NoteError::Index(format!("Index fetch request failed: {e}")))?;

        let response: FetchResponse = serde_json::from_str(&response_text)
            .map_err(|e| NoteError::Index(format!("Failed to parse fetch response: {e}")))?;

        let mut records = Vec::with_capacity(response.vectors.len());
        for (id, vector) in response.vectors {
            let metadata = vector
                .metadata
                .ok_or_else(|| NoteError::Index(format!("Fetched vector {id} has no metadata")))?;

            records.push(BlockRecord {
                id: vector.id,
                vector: vector.values,
                metadata,
            });
        }

        debug!("Fetched {} records", records.len());
        Ok(records)
    }

    #[inline]
    fn delete(&self, ids: &[String]) -> crate::Result<()> {
        if ids.is_empty() {
            debug!("No records to delete");
            return Ok(());
        }

        debug!("Deleting {} records from {}", ids.len(), self.index_name);

        let request = DeleteRequest { ids: ids.to_vec() };
        self.post_json("/vectors/delete", &request)?;

        info!("Deleted {} records from {}", ids.len(), self.index_name);
        Ok(())
    }

    #[inline]
    fn query(&self, vector: &[f32], top_k: usize) -> crate::Result<Vec<ScoredMatch>> {
        if vector.len() != self.dimension as usize {
            return Err(NoteError::Index(format!(
                "Query vector dimension mismatch: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }

        debug!("Querying {} for top {} matches", self.index_name, top_k);

        let request = QueryRequest {
            vector: vector.to_vec(),
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response_text = self.post_json("/query", &request)?;

        let response: QueryResponse = serde_json::from_str(&response_text)
            .map_err(|e| NoteError::Index(format!("Failed to parse query response: {e}")))?;

        let matches = response
            .matches
            .into_iter()
            .map(|m| ScoredMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata,
            })
            .collect::<Vec<_>>();

        debug!("Query returned {} matches", matches.len());
        Ok(matches)
    }

    #[inline]
    fn stats(&self) -> crate::Result<IndexStats> {
        debug!("Fetching index stats for {}", self.index_name);

        let response_text = self.post_json("/describe_index_stats", &serde_json::json!({}))?;

        let response: StatsResponse = serde_json::from_str(&response_text)
            .map_err(|e| NoteError::Index(format!("Failed to parse stats response: {e}")))?;

        Ok(IndexStats {
            total_vector_count: response.total_vector_count,
            dimension: response.dimension,
        })
    }
}
