// Vector index module
// Handles remote storage and similarity search for block vectors

pub mod pinecone;

pub use pinecone::PineconeClient;

use serde::{Deserialize, Serialize};

use crate::Result;

/// A block record stored in the vector index
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRecord {
    /// Unique identifier for this block
    pub id: String,
    /// The vector embedding of the block text
    pub vector: Vec<f32>,
    /// Metadata stored alongside the vector
    pub metadata: BlockMetadata,
}

/// Metadata stored alongside each block vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockMetadata {
    /// The full text content of the block
    pub text: String,
    /// Title of the document this block belongs to
    pub title: String,
}

/// A single hit from a similarity query, best matches first
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<BlockMetadata>,
}

/// Aggregate counts reported by the index
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    pub total_vector_count: u64,
    pub dimension: u32,
}

/// The remote vector index that block records live in.
///
/// Absent ids are not errors: `fetch` omits them from the result and
/// `delete` ignores them. Service failures are returned unmodified.
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite records by id, returning the upserted count.
    fn upsert(&self, records: &[BlockRecord]) -> Result<u64>;

    /// Fetch full records by id. Ids not present in the index are
    /// omitted from the result.
    fn fetch(&self, ids: &[String]) -> Result<Vec<BlockRecord>>;

    /// Delete records by id.
    fn delete(&self, ids: &[String]) -> Result<()>;

    /// Return the `top_k` nearest records to `vector`, best first.
    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>>;

    /// Aggregate statistics for the index.
    fn stats(&self) -> Result<IndexStats>;
}
