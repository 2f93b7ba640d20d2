// Embeddings module
// This module turns block text into fixed-dimension vectors via Ollama

pub mod ollama;

pub use ollama::{DEFAULT_EMBEDDING_DIMENSION, OllamaClient};

use crate::Result;

/// A service that turns each input text into one fixed-width vector.
///
/// Implementations are blocking clients; any failure is surfaced to the
/// caller unmodified rather than retried.
pub trait Embedder: Send + Sync {
    /// Embed each text, returning one vector per input in input order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Width of every vector produced by `embed`.
    fn dimension(&self) -> u32;
}
