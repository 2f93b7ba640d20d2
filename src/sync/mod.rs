// Document synchronization module
// Applies save/update/delete operations to the vector index and block
// registry as a unit, keyed by document title

pub mod codec;


use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::embeddings::Embedder;
use crate::index::{BlockRecord, VectorIndex};
use crate::registry::{NewBlock, Registry};
use crate::NoteError;

/// Outcome of a `save` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Distinct titles the pairs were grouped into
    pub documents: usize,
    /// Block records created
    pub records: usize,
}

/// Outcome of an `update` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Nothing to change, or nothing registered under the source title
    NoOp,
    /// Title-only rename: records rewritten in place, ids and vectors kept
    Renamed { records: usize },
    /// Content replacement: old records removed, fresh records inserted
    Replaced { removed: usize, added: usize },
}

/// One async mutex per document title, created on first use.
///
/// The outer map lock is held only long enough to clone the entry, so
/// waiting on one title never blocks mutations of another.
#[derive(Default)]
struct TitleLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TitleLocks {
    async fn lock_for(&self, title: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(title.to_string()).or_default())
    }
}

/// Applies document mutations to the vector index and the block registry.
///
/// Every mutation holds its title's lock for the full operation, so two
/// mutations of one document never interleave. Writes are ordered so the
/// registry never under-counts what is live in the index: ids are
/// registered before records are upserted, and index deletes happen before
/// registry rows are purged. External failures propagate unmodified, with
/// no retries and no compensating writes.
pub struct Synchronizer {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    registry: Registry,
    locks: TitleLocks,
}

impl Synchronizer {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        registry: Registry,
    ) -> Self {
        Self {
            embedder,
            index,
            registry,
            locks: TitleLocks::default(),
        }
    }

    /// Save parallel `titles`/`texts` arrays, one new block record per pair.
    ///
    /// Pairs are grouped by title and each group is created under that
    /// title's lock. Saving a title that already has blocks accumulates
    /// more; `update` is the replace-if-present entry point.
    #[inline]
    pub async fn save(&self, titles: Vec<String>, texts: Vec<String>) -> crate::Result<SaveOutcome> {
        if texts.is_empty() {
            return Err(NoteError::InvalidRequest("No text provided".to_string()));
        }
        if titles.len() != texts.len() {
            return Err(NoteError::InvalidRequest(format!(
                "Mismatched titles and texts: {} vs {}",
                titles.len(),
                texts.len()
            )));
        }

        // Group pairs by title, keeping first-seen title order and each
        // group's block order
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for (title, text) in titles.into_iter().zip(texts) {
            match groups.iter_mut().find(|(t, _)| *t == title) {
                Some((_, blocks)) => blocks.push(text),
                None => groups.push((title, vec![text])),
            }
        }

        let mut documents = 0;
        let mut records = 0;

        for (title, blocks) in groups {
            let lock = self.locks.lock_for(&title).await;
            let _guard = lock.lock().await;

            records += self.create_locked(&title, &blocks).await?;
            documents += 1;
        }

        info!("Saved {} records across {} documents", records, documents);
        Ok(SaveOutcome { documents, records })
    }

    /// Apply a rename and/or content replacement to the document at
    /// `old_title`.
    ///
    /// With a new title and no new blocks, records are rewritten in place
    /// (ids and vectors kept). With non-empty new blocks, the old block set
    /// is deleted before the replacement is embedded and inserted, so a
    /// failure between the steps leaves the document with missing blocks
    /// rather than duplicated ones. A call naming a title with nothing
    /// registered, or carrying no changes at all, is a no-op.
    #[inline]
    pub async fn update(
        &self,
        old_title: Option<&str>,
        new_title: Option<&str>,
        new_blocks: Option<Vec<String>>,
    ) -> crate::Result<UpdateOutcome> {
        let Some(old_title) = old_title else {
            debug!("Update without a source title; nothing to do");
            return Ok(UpdateOutcome::NoOp);
        };

        let has_new_blocks = new_blocks.as_ref().is_some_and(|blocks| !blocks.is_empty());

        if new_title.is_none() && !has_new_blocks {
            debug!("Update for '{}' carries no changes", old_title);
            return Ok(UpdateOutcome::NoOp);
        }

        let lock = self.locks.lock_for(old_title).await;
        let _guard = lock.lock().await;

        let ids = self.registry.ids_for_title(old_title).await?;
        if ids.is_empty() {
            debug!("No blocks registered for '{}'; nothing to update", old_title);
            return Ok(UpdateOutcome::NoOp);
        }

        if has_new_blocks {
            let target_title = new_title.unwrap_or(old_title);
            let blocks = new_blocks.unwrap_or_default();
            return self
                .replace_locked(old_title, target_title, &ids, &blocks)
                .await;
        }

        // Remaining case is a title-only rename; the guard above ensures a
        // rename target exists here
        let Some(new_title) = new_title else {
            return Ok(UpdateOutcome::NoOp);
        };
        self.rename_locked(old_title, new_title, &ids).await
    }

    /// Delete every block registered under `title`.
    ///
    /// Returns the number of blocks removed; a missing title or a title
    /// with nothing registered yields zero, not an error.
    #[inline]
    pub async fn delete(&self, title: Option<&str>) -> crate::Result<usize> {
        let Some(title) = title else {
            debug!("Delete without a title; nothing to do");
            return Ok(0);
        };

        let lock = self.locks.lock_for(title).await;
        let _guard = lock.lock().await;

        let ids = self.registry.ids_for_title(title).await?;
        if ids.is_empty() {
            debug!("No blocks registered for '{}'; nothing to delete", title);
            return Ok(0);
        }

        self.index.delete(&ids)?;
        let removed = self.registry.delete_by_title(title).await?;

        info!("Deleted {} blocks for '{}'", removed, title);
        Ok(removed)
    }

    /// Embed, register, and upsert a block set for one title. Caller must
    /// hold the title's lock.
    async fn create_locked(&self, title: &str, blocks: &[String]) -> crate::Result<usize> {
        if blocks.is_empty() {
            return Ok(0);
        }

        debug!("Embedding {} blocks for '{}'", blocks.len(), title);
        let vectors = self.embedder.embed(blocks)?;

        let records: Vec<BlockRecord> = blocks
            .iter()
            .zip(vectors)
            .map(|(text, vector)| codec::encode(title, text, vector))
            .collect();

        let rows: Vec<NewBlock> = records
            .iter()
            .map(|record| NewBlock {
                id: record.id.clone(),
                title: title.to_string(),
            })
            .collect();

        // Ids land in the registry before the index write; a failure past
        // this point leaves stale rows, never untracked records
        self.registry.register_blocks(rows).await?;
        self.index.upsert(&records)?;

        Ok(records.len())
    }

    async fn rename_locked(
        &self,
        old_title: &str,
        new_title: &str,
        ids: &[String],
    ) -> crate::Result<UpdateOutcome> {
        let mut records = self.index.fetch(ids)?;

        for record in &mut records {
            record.metadata.title = new_title.to_string();
        }

        self.index.upsert(&records)?;
        self.registry.move_title(old_title, new_title).await?;

        info!(
            "Renamed '{}' to '{}' ({} records rewritten)",
            old_title,
            new_title,
            records.len()
        );
        Ok(UpdateOutcome::Renamed {
            records: records.len(),
        })
    }

    async fn replace_locked(
        &self,
        old_title: &str,
        target_title: &str,
        ids: &[String],
        blocks: &[String],
    ) -> crate::Result<UpdateOutcome> {
        self.index.delete(ids)?;
        self.registry.delete_by_title(old_title).await?;

        let added = self.create_locked(target_title, blocks).await?;

        info!(
            "Replaced {} blocks of '{}' with {} blocks under '{}'",
            ids.len(),
            old_title,
            added,
            target_title
        );
        Ok(UpdateOutcome::Replaced {
            removed: ids.len(),
            added,
        })
    }
}
