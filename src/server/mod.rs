//! Stdio Server Implementation
//!
//! This module runs the newline-delimited JSON loop over stdin/stdout and
//! routes each request to the synchronization, search, or status surface.

pub mod protocol;


use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::embeddings::ollama::OllamaClient;
use crate::embeddings::Embedder;
use crate::index::VectorIndex;
use crate::registry::Registry;
use crate::search::{SearchService, DEFAULT_TOP_K};
use crate::server::protocol::*;
use crate::sync::{Synchronizer, UpdateOutcome};
use crate::NoteError;

/// Request router over the backing services
pub struct Server {
    sync: Synchronizer,
    search: SearchService,
    ollama: Arc<OllamaClient>,
    index: Arc<dyn VectorIndex>,
    registry: Registry,
}

impl Server {
    /// Create a new server over already constructed services
    #[inline]
    pub fn new(
        sync: Synchronizer,
        search: SearchService,
        ollama: Arc<OllamaClient>,
        index: Arc<dyn VectorIndex>,
        registry: Registry,
    ) -> Self {
        Self {
            sync,
            search,
            ollama,
            index,
            registry,
        }
    }

    /// Serve requests from stdin until EOF
    #[inline]
    pub async fn serve_stdio(self: Arc<Self>) -> Result<()> {
        info!("Starting server with stdio transport");

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut reader = BufReader::new(stdin);

        // Read and process one request per line
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("EOF reached, closing connection");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let message = self.handle_line(line).await;
                    self.send_message(&mut stdout, &message).await?;
                }
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    break;
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Parse one request line and produce its response message
    #[inline]
    pub async fn handle_line(&self, line: &str) -> Message {
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorBody::invalid_request(format!("Unparseable request: {e}"));
                return Message::ErrorResponse(ErrorResponse::new(error, None));
            }
        };

        let id = request.id.clone();
        debug!("Handling request op: {}", request.op);
        match self.dispatch(request).await {
            Ok(result) => Message::Response(Response::new(result, id)),
            Err(e) => {
                error!("Error handling request: {}", e);
                Message::ErrorResponse(ErrorResponse::new(ErrorBody::from_error(&e), Some(id)))
            }
        }
    }

    async fn dispatch(&self, request: Request) -> crate::Result<Value> {
        let params = request.params.unwrap_or(Value::Null);
        match request.op.as_str() {
            "save" => self.handle_save(&params).await,
            "query_similar" => self.handle_query_similar(&params),
            "upsert_document" => self.handle_upsert_document(&params).await,
            "delete_document" => self.handle_delete_document(&params).await,
            "status" => {
                let report = self.handle_status().await;
                Ok(serde_json::to_value(report).map_err(anyhow::Error::from)?)
            }
            op => Err(NoteError::InvalidRequest(format!("Unknown operation: {op}"))),
        }
    }

    async fn handle_save(&self, params: &Value) -> crate::Result<Value> {
        let titles = string_array(params, "titles")?;
        let texts = string_array(params, "texts")?;

        let outcome = self.sync.save(titles, texts).await?;
        Ok(json!({
            "documents": outcome.documents,
            "records": outcome.records,
        }))
    }

    fn handle_query_similar(&self, params: &Value) -> crate::Result<Value> {
        let text = params.get("text").and_then(|v| v.as_str()).ok_or_else(|| {
            NoteError::InvalidRequest("Missing required parameter: text".to_string())
        })?;
        if text.trim().is_empty() {
            return Err(NoteError::InvalidRequest(
                "Query text must not be empty".to_string(),
            ));
        }

        let top_k = params
            .get("top_k")
            .and_then(|v| v.as_u64())
            .map_or(DEFAULT_TOP_K, |v| v.max(1) as usize);

        let hits = self.search.query(text, top_k)?;
        Ok(json!({ "matches": hits }))
    }

    async fn handle_upsert_document(&self, params: &Value) -> crate::Result<Value> {
        let old_title = params.get("old_title").and_then(|v| v.as_str());
        let new_title = params.get("new_title").and_then(|v| v.as_str());
        let new_blocks = match params.get("new_blocks") {
            None | Some(Value::Null) => None,
            Some(_) => Some(string_array(params, "new_blocks")?),
        };

        let outcome = self.sync.update(old_title, new_title, new_blocks).await?;
        Ok(match outcome {
            UpdateOutcome::NoOp => json!({ "outcome": "no_op" }),
            UpdateOutcome::Renamed { records } => json!({
                "outcome": "renamed",
                "records": records,
            }),
            UpdateOutcome::Replaced { removed, added } => json!({
                "outcome": "replaced",
                "removed": removed,
                "added": added,
            }),
        })
    }

    async fn handle_delete_document(&self, params: &Value) -> crate::Result<Value> {
        let title = params.get("title").and_then(|v| v.as_str());
        let removed = self.sync.delete(title).await?;
        Ok(json!({ "removed": removed }))
    }

    async fn handle_status(&self) -> StatusReport {
        collect_status(&self.ollama, self.index.as_ref(), &self.registry).await
    }

    /// Send a response line to the client
    async fn send_message<W>(&self, writer: &mut W, message: &Message) -> Result<()>
    where
        W: AsyncWriteExt + Unpin,
    {
        let json = serde_json::to_string(message)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Probe the embedder, the index, and the registry without failing the call
#[inline]
pub async fn collect_status(
    ollama: &OllamaClient,
    index: &dyn VectorIndex,
    registry: &Registry,
) -> StatusReport {
    let embedder = match ollama.health_check() {
        Ok(()) => ComponentStatus::healthy(format!(
            "Model {} producing {} dimension vectors",
            ollama.model(),
            ollama.dimension()
        )),
        Err(e) => ComponentStatus::failed(format!("{e:#}")),
    };

    let index = match index.stats() {
        Ok(stats) => ComponentStatus::healthy(format!(
            "{} vectors at {} dimensions",
            stats.total_vector_count, stats.dimension
        )),
        Err(e) => ComponentStatus::failed(e.to_string()),
    };

    let registry = match registry.titles_with_counts().await {
        Ok(titles) => {
            let blocks: i64 = titles.iter().map(|title| title.block_count).sum();
            ComponentStatus::healthy(format!(
                "{} blocks across {} documents",
                blocks,
                titles.len()
            ))
        }
        Err(e) => ComponentStatus::failed(e.to_string()),
    };

    StatusReport {
        embedder,
        index,
        registry,
    }
}

fn string_array(params: &Value, key: &str) -> crate::Result<Vec<String>> {
    let items = params.get(key).and_then(|v| v.as_array()).ok_or_else(|| {
        NoteError::InvalidRequest(format!("Missing required parameter: {key}"))
    })?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(ToString::to_string).ok_or_else(|| {
                NoteError::InvalidRequest(format!("Parameter {key} must be an array of strings"))
            })
        })
        .collect()
}
