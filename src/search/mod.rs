// Similarity search module
// Embeds query text and resolves nearest block records back into
// document titles and block texts

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::embeddings::Embedder;
use crate::index::VectorIndex;
use crate::sync::codec;
use crate::NoteError;

/// Matches returned when the caller does not ask for a count
pub const DEFAULT_TOP_K: usize = 5;

/// One similarity match, decoded from index metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Title of the document the matched block belongs to
    pub title: String,
    /// Text of the matched block
    pub text: String,
    /// Similarity score reported by the index, higher is more similar
    pub score: f32,
}

/// Read-only similarity search over the vector index.
///
/// Results keep the index's ranking and are not deduplicated by title,
/// so several blocks of one document may appear in a single result set.
pub struct SearchService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl SearchService {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Embed `text` and return up to `top_k` nearest blocks, most similar
    /// first.
    #[inline]
    pub fn query(&self, text: &str, top_k: usize) -> crate::Result<Vec<SearchHit>> {
        let vectors = self.embedder.embed(&[text.to_string()])?;
        let vector = vectors.into_iter().next().ok_or_else(|| {
            NoteError::Embedding("Embedding service returned no vector for the query".to_string())
        })?;

        let matches = self.index.query(&vector, top_k)?;
        debug!(
            "Query matched {} of up to {} requested blocks",
            matches.len(),
            top_k
        );

        Ok(matches
            .into_iter()
            .map(|m| {
                let (title, text) = codec::decode(m.metadata.as_ref());
                SearchHit {
                    title,
                    text,
                    score: m.score,
                }
            })
            .collect())
    }
}
