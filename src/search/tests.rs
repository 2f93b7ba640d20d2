use super::*;
use crate::index::{BlockMetadata, BlockRecord, IndexStats, ScoredMatch};
use std::sync::Mutex;

struct FixedEmbedder {
    vectors: Vec<Vec<f32>>,
}

impl Embedder for FixedEmbedder {
    fn embed(&self, texts: &[String]) -> crate::Result<Vec<Vec<f32>>> {
        assert_eq!(texts.len(), 1, "queries embed a batch of one");
        Ok(self.vectors.clone())
    }

    fn dimension(&self) -> u32 {
        2
    }
}

/// Index stub that records the requested top_k and returns canned matches
struct CannedIndex {
    matches: Vec<ScoredMatch>,
    requested_top_k: Mutex<Option<usize>>,
}

impl CannedIndex {
    fn new(matches: Vec<ScoredMatch>) -> Self {
        Self {
            matches,
            requested_top_k: Mutex::new(None),
        }
    }
}

impl VectorIndex for CannedIndex {
    fn upsert(&self, _records: &[BlockRecord]) -> crate::Result<u64> {
        unreachable!("search never writes")
    }

    fn fetch(&self, _ids: &[String]) -> crate::Result<Vec<BlockRecord>> {
        unreachable!("search never fetches by id")
    }

    fn delete(&self, _ids: &[String]) -> crate::Result<()> {
        unreachable!("search never deletes")
    }

    fn query(&self, _vector: &[f32], top_k: usize) -> crate::Result<Vec<ScoredMatch>> {
        *self.requested_top_k.lock().expect("lock poisoned") = Some(top_k);
        Ok(self.matches.clone())
    }

    fn stats(&self) -> crate::Result<IndexStats> {
        Ok(IndexStats {
            total_vector_count: self.matches.len() as u64,
            dimension: 2,
        })
    }
}

fn scored(id: &str, score: f32, title: &str, text: &str) -> ScoredMatch {
    ScoredMatch {
        id: id.to_string(),
        score,
        metadata: Some(BlockMetadata {
            text: text.to_string(),
            title: title.to_string(),
        }),
    }
}

#[test]
fn query_decodes_matches_in_index_order() {
    let embedder = Arc::new(FixedEmbedder {
        vectors: vec![vec![1.0, 0.0]],
    });
    let index = Arc::new(CannedIndex::new(vec![
        scored("a", 0.95, "Groceries", "buy milk"),
        scored("b", 0.90, "Groceries", "buy eggs"),
        scored("c", 0.40, "Errands", "post office"),
    ]));
    let search = SearchService::new(embedder, Arc::clone(&index) as Arc<dyn VectorIndex>);

    let hits = search.query("milk", 3).expect("query should succeed");

    assert_eq!(
        hits,
        vec![
            SearchHit {
                title: "Groceries".to_string(),
                text: "buy milk".to_string(),
                score: 0.95,
            },
            SearchHit {
                title: "Groceries".to_string(),
                text: "buy eggs".to_string(),
                score: 0.90,
            },
            SearchHit {
                title: "Errands".to_string(),
                text: "post office".to_string(),
                score: 0.40,
            },
        ]
    );
    assert_eq!(
        *index.requested_top_k.lock().expect("lock poisoned"),
        Some(3)
    );
}

#[test]
fn query_tolerates_matches_without_metadata() {
    let embedder = Arc::new(FixedEmbedder {
        vectors: vec![vec![1.0, 0.0]],
    });
    let index = Arc::new(CannedIndex::new(vec![ScoredMatch {
        id: "bare".to_string(),
        score: 0.5,
        metadata: None,
    }]));
    let search = SearchService::new(embedder, index);

    let hits = search.query("anything", DEFAULT_TOP_K).expect("query should succeed");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "");
    assert_eq!(hits[0].text, "");
}

#[test]
fn query_surfaces_missing_embedding() {
    let embedder = Arc::new(FixedEmbedder { vectors: vec![] });
    let index = Arc::new(CannedIndex::new(vec![]));
    let search = SearchService::new(embedder, index);

    let result = search.query("milk", DEFAULT_TOP_K);
    assert!(matches!(result, Err(NoteError::Embedding(_))));
}

#[test]
fn default_top_k_is_five() {
    assert_eq!(DEFAULT_TOP_K, 5);
}
