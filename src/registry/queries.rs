use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

pub struct BlockQueries;

impl BlockQueries {
    /// Register a batch of blocks in a single transaction
    #[inline]
    pub async fn register_batch(pool: &SqlitePool, blocks: Vec<NewBlock>) -> Result<usize> {
        if blocks.is_empty() {
            return Ok(0);
        }

        let mut transaction = pool
            .begin()
            .await
            .context("Failed to begin transaction for block registration")?;

        let now = Utc::now();

        for block in &blocks {
            sqlx::query("INSERT INTO blocks (id, title, created_date) VALUES (?, ?, ?)")
                .bind(&block.id)
                .bind(&block.title)
                .bind(now)
                .execute(&mut *transaction)
                .await
                .with_context(|| format!("Failed to register block {}", block.id))?;
        }

        transaction
            .commit()
            .await
            .context("Failed to commit block registration transaction")?;

        debug!("Registered {} blocks", blocks.len());
        Ok(blocks.len())
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<RegisteredBlock>> {
        let row = sqlx::query("SELECT id, title, created_date FROM blocks WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get block by id")?;

        Ok(row.map(|row| RegisteredBlock {
            id: row.get("id"),
            title: row.get("title"),
            created_date: row.get("created_date"),
        }))
    }

    /// List the ids of every block registered under a title
    #[inline]
    pub async fn ids_for_title(pool: &SqlitePool, title: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT id FROM blocks WHERE title = ? ORDER BY id")
            .bind(title)
            .fetch_all(pool)
            .await
            .context("Failed to list block ids for title")?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// Re-key every block under `old_title` to `new_title`, returning the
    /// number of rows moved
    #[inline]
    pub async fn move_title(
        pool: &SqlitePool,
        old_title: &str,
        new_title: &str,
    ) -> Result<usize> {
        let result = sqlx::query("UPDATE blocks SET title = ? WHERE title = ?")
            .bind(new_title)
            .bind(old_title)
            .execute(pool)
            .await
            .context("Failed to move blocks to new title")?;

        debug!(
            "Moved {} blocks from '{}' to '{}'",
            result.rows_affected(),
            old_title,
            new_title
        );
        Ok(result.rows_affected() as usize)
    }

    /// Remove every block registered under a title, returning the number
    /// of rows removed
    #[inline]
    pub async fn delete_by_title(pool: &SqlitePool, title: &str) -> Result<usize> {
        let result = sqlx::query("DELETE FROM blocks WHERE title = ?")
            .bind(title)
            .execute(pool)
            .await
            .context("Failed to delete blocks by title")?;

        debug!("Deleted {} blocks for '{}'", result.rows_affected(), title);
        Ok(result.rows_affected() as usize)
    }

    /// List every known title with its block count, ordered by title
    #[inline]
    pub async fn titles_with_counts(pool: &SqlitePool) -> Result<Vec<TitleSummary>> {
        let rows = sqlx::query(
            "SELECT title, COUNT(*) as block_count FROM blocks GROUP BY title ORDER BY title",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list titles with counts")?;

        Ok(rows
            .iter()
            .map(|row| TitleSummary {
                title: row.get("title"),
                block_count: row.get("block_count"),
            })
            .collect())
    }

    #[inline]
    pub async fn count_all(pool: &SqlitePool) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM blocks")
            .fetch_one(pool)
            .await
            .context("Failed to count blocks")?;
        let count: i64 = row.get("count");

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    async fn create_test_pool() -> (TempDir, SqlitePool) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(&db_path)
                    .create_if_missing(true)
                    .foreign_keys(true),
            )
            .await
            .expect("Failed to create test pool");

        sqlx::query(include_str!("migrations/001_initial_schema.sql"))
            .execute(&pool)
            .await
            .expect("Failed to run migrations");

        (temp_dir, pool)
    }

    fn new_block(id: &str, title: &str) -> NewBlock {
        NewBlock {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn block_registration_and_lookup() {
        let (_temp_dir, pool) = create_test_pool().await;

        let registered = BlockQueries::register_batch(
            &pool,
            vec![new_block("a1", "Groceries"), new_block("a2", "Groceries")],
        )
        .await
        .expect("Failed to register blocks");

        assert_eq!(registered, 2);

        let block = BlockQueries::get_by_id(&pool, "a1")
            .await
            .expect("Failed to get block")
            .expect("Block should exist");

        assert_eq!(block.id, "a1");
        assert_eq!(block.title, "Groceries");

        let ids = BlockQueries::ids_for_title(&pool, "Groceries")
            .await
            .expect("Failed to list ids");

        assert_eq!(ids, vec!["a1".to_string(), "a2".to_string()]);

        let missing = BlockQueries::ids_for_title(&pool, "No Such Title")
            .await
            .expect("Failed to list ids for missing title");

        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn empty_registration_is_a_no_op() {
        let (_temp_dir, pool) = create_test_pool().await;

        let registered = BlockQueries::register_batch(&pool, vec![])
            .await
            .expect("Empty registration should succeed");

        assert_eq!(registered, 0);
        assert_eq!(
            BlockQueries::count_all(&pool)
                .await
                .expect("Failed to count blocks"),
            0
        );
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let (_temp_dir, pool) = create_test_pool().await;

        BlockQueries::register_batch(&pool, vec![new_block("a1", "Groceries")])
            .await
            .expect("Failed to register block");

        let result =
            BlockQueries::register_batch(&pool, vec![new_block("a1", "Errands")]).await;

        assert!(result.is_err());

        // The failed transaction must not have altered the original row
        let block = BlockQueries::get_by_id(&pool, "a1")
            .await
            .expect("Failed to get block")
            .expect("Block should exist");
        assert_eq!(block.title, "Groceries");
    }

    #[tokio::test]
    async fn move_title_rekeys_all_blocks() {
        let (_temp_dir, pool) = create_test_pool().await;

        BlockQueries::register_batch(
            &pool,
            vec![
                new_block("a1", "Groceries"),
                new_block("a2", "Groceries"),
                new_block("b1", "Errands"),
            ],
        )
        .await
        .expect("Failed to register blocks");

        let moved = BlockQueries::move_title(&pool, "Groceries", "Shopping List")
            .await
            .expect("Failed to move title");

        assert_eq!(moved, 2);
        assert!(
            BlockQueries::ids_for_title(&pool, "Groceries")
                .await
                .expect("Failed to list ids")
                .is_empty()
        );
        assert_eq!(
            BlockQueries::ids_for_title(&pool, "Shopping List")
                .await
                .expect("Failed to list ids")
                .len(),
            2
        );

        // Unrelated titles are untouched
        assert_eq!(
            BlockQueries::ids_for_title(&pool, "Errands")
                .await
                .expect("Failed to list ids"),
            vec!["b1".to_string()]
        );

        let moved_missing = BlockQueries::move_title(&pool, "No Such Title", "Anywhere")
            .await
            .expect("Moving a missing title should succeed");
        assert_eq!(moved_missing, 0);
    }

    #[tokio::test]
    async fn delete_by_title_removes_only_that_title() {
        let (_temp_dir, pool) = create_test_pool().await;

        BlockQueries::register_batch(
            &pool,
            vec![
                new_block("a1", "Groceries"),
                new_block("a2", "Groceries"),
                new_block("b1", "Errands"),
            ],
        )
        .await
        .expect("Failed to register blocks");

        let deleted = BlockQueries::delete_by_title(&pool, "Groceries")
            .await
            .expect("Failed to delete by title");

        assert_eq!(deleted, 2);
        assert_eq!(
            BlockQueries::count_all(&pool)
                .await
                .expect("Failed to count blocks"),
            1
        );

        let deleted_missing = BlockQueries::delete_by_title(&pool, "No Such Title")
            .await
            .expect("Deleting a missing title should succeed");
        assert_eq!(deleted_missing, 0);
    }

    #[tokio::test]
    async fn titles_with_counts_groups_by_title() {
        let (_temp_dir, pool) = create_test_pool().await;

        BlockQueries::register_batch(
            &pool,
            vec![
                new_block("a1", "Groceries"),
                new_block("a2", "Groceries"),
                new_block("b1", "Errands"),
            ],
        )
        .await
        .expect("Failed to register blocks");

        let summaries = BlockQueries::titles_with_counts(&pool)
            .await
            .expect("Failed to list titles");

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].title, "Errands");
        assert_eq!(summaries[0].block_count, 1);
        assert_eq!(summaries[1].title, "Groceries");
        assert_eq!(summaries[1].block_count, 2);
    }
}
