use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::NoteError;


pub mod models;
pub mod queries;

pub use models::{NewBlock, RegisteredBlock, TitleSummary};
pub use queries::BlockQueries;

pub type DbPool = Pool<Sqlite>;

/// SQLite-backed registry mapping block ids to document titles.
///
/// The registry is the source of truth for which block ids belong to a
/// title; the remote index is only ever addressed through ids found here.
#[derive(Debug, Clone)]
pub struct Registry {
    pool: DbPool,
}

impl Registry {
    pub async fn new<P: AsRef<Path>>(database_url: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let registry = Self { pool };
        registry.run_migrations().await?;

        Ok(registry)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running registry migrations");

        sqlx::migrate!("src/registry/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Registry migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("registry.db");
        let db_url = db_path.to_string_lossy();

        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(db_url.as_ref()).await
    }

    // Block operations

    pub async fn register_blocks(&self, blocks: Vec<NewBlock>) -> crate::Result<usize> {
        BlockQueries::register_batch(&self.pool, blocks)
            .await
            .map_err(|e| NoteError::Registry(format!("{e:#}")))
    }

    pub async fn ids_for_title(&self, title: &str) -> crate::Result<Vec<String>> {
        BlockQueries::ids_for_title(&self.pool, title)
            .await
            .map_err(|e| NoteError::Registry(format!("{e:#}")))
    }

    pub async fn get_block(&self, id: &str) -> crate::Result<Option<RegisteredBlock>> {
        BlockQueries::get_by_id(&self.pool, id)
            .await
            .map_err(|e| NoteError::Registry(format!("{e:#}")))
    }

    pub async fn move_title(&self, old_title: &str, new_title: &str) -> crate::Result<usize> {
        BlockQueries::move_title(&self.pool, old_title, new_title)
            .await
            .map_err(|e| NoteError::Registry(format!("{e:#}")))
    }

    pub async fn delete_by_title(&self, title: &str) -> crate::Result<usize> {
        BlockQueries::delete_by_title(&self.pool, title)
            .await
            .map_err(|e| NoteError::Registry(format!("{e:#}")))
    }

    pub async fn titles_with_counts(&self) -> crate::Result<Vec<TitleSummary>> {
        BlockQueries::titles_with_counts(&self.pool)
            .await
            .map_err(|e| NoteError::Registry(format!("{e:#}")))
    }

    pub async fn block_count(&self) -> crate::Result<i64> {
        BlockQueries::count_all(&self.pool)
            .await
            .map_err(|e| NoteError::Registry(format!("{e:#}")))
    }
}
