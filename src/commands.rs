use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{get_config_dir, Config};
use crate::embeddings::ollama::OllamaClient;
use crate::embeddings::Embedder;
use crate::index::pinecone::PineconeClient;
use crate::index::VectorIndex;
use crate::registry::Registry;
use crate::search::SearchService;
use crate::server::protocol::ComponentStatus;
use crate::server::{collect_status, Server};
use crate::sync::{Synchronizer, UpdateOutcome};

/// Connected clients shared by the command surface
struct Services {
    config: Config,
    ollama: Arc<OllamaClient>,
    index: Arc<PineconeClient>,
    registry: Registry,
}

async fn connect() -> Result<Services> {
    let config_dir = get_config_dir()?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    let ollama =
        Arc::new(OllamaClient::new(&config).context("Failed to create Ollama client")?);
    let index =
        Arc::new(PineconeClient::new(&config).context("Failed to create index client")?);
    let registry = Registry::initialize_from_config_dir(&config_dir)
        .await
        .context("Failed to initialize block registry")?;

    Ok(Services {
        config,
        ollama,
        index,
        registry,
    })
}

impl Services {
    fn synchronizer(&self) -> Synchronizer {
        Synchronizer::new(
            Arc::clone(&self.ollama) as Arc<dyn Embedder>,
            Arc::clone(&self.index) as Arc<dyn VectorIndex>,
            self.registry.clone(),
        )
    }

    fn search(&self) -> SearchService {
        SearchService::new(
            Arc::clone(&self.ollama) as Arc<dyn Embedder>,
            Arc::clone(&self.index) as Arc<dyn VectorIndex>,
        )
    }
}

/// Save text blocks under one document title
#[inline]
pub async fn save_blocks(title: String, texts: Vec<String>) -> Result<()> {
    info!("Saving {} blocks under '{}'", texts.len(), title);

    let services = connect().await?;
    let titles = vec![title.clone(); texts.len()];
    let outcome = services.synchronizer().save(titles, texts).await?;

    println!("✅ Saved {} blocks under '{}'", outcome.records, title);
    Ok(())
}

/// Search stored blocks by similarity
#[inline]
pub async fn query_similar(text: String, top_k: usize) -> Result<()> {
    let services = connect().await?;
    let hits = services.search().query(&text, top_k)?;

    if hits.is_empty() {
        println!("No matching blocks found.");
        return Ok(());
    }

    println!("Found {} matching blocks:", hits.len());
    println!();
    for (rank, hit) in hits.iter().enumerate() {
        println!("{}. [{:.4}] {}", rank + 1, hit.score, hit.title);
        println!("   {}", hit.text);
        println!();
    }

    Ok(())
}

/// Rename a document, keeping its blocks and their embeddings
#[inline]
pub async fn rename_document(old_title: String, new_title: String) -> Result<()> {
    let services = connect().await?;
    let outcome = services
        .synchronizer()
        .update(Some(&old_title), Some(&new_title), None)
        .await?;

    match outcome {
        UpdateOutcome::NoOp => {
            println!("No document found under '{}', nothing renamed.", old_title);
        }
        UpdateOutcome::Renamed { records } => {
            println!(
                "✅ Renamed '{}' to '{}' ({} blocks)",
                old_title, new_title, records
            );
        }
        UpdateOutcome::Replaced { removed, added } => {
            println!(
                "✅ Replaced {} blocks with {} under '{}'",
                removed, added, new_title
            );
        }
    }

    Ok(())
}

/// Replace a document's blocks with freshly embedded content
#[inline]
pub async fn replace_document(title: String, texts: Vec<String>) -> Result<()> {
    let services = connect().await?;
    let outcome = services
        .synchronizer()
        .update(Some(&title), None, Some(texts))
        .await?;

    match outcome {
        UpdateOutcome::NoOp => {
            println!(
                "No document found under '{}'. Use 'semnote save' to create it.",
                title
            );
        }
        UpdateOutcome::Renamed { records } => {
            println!("✅ Updated '{}' ({} blocks)", title, records);
        }
        UpdateOutcome::Replaced { removed, added } => {
            println!(
                "✅ Replaced {} blocks with {} under '{}'",
                removed, added, title
            );
        }
    }

    Ok(())
}

/// Delete a document and all its stored blocks
#[inline]
pub async fn delete_document(title: String) -> Result<()> {
    let services = connect().await?;
    let removed = services.synchronizer().delete(Some(&title)).await?;

    if removed == 0 {
        println!("No document found under '{}', nothing deleted.", title);
    } else {
        println!("✅ Deleted '{}' ({} blocks)", title, removed);
    }

    Ok(())
}

/// List saved documents with their block counts
#[inline]
pub async fn list_documents() -> Result<()> {
    let services = connect().await?;
    let titles = services
        .registry
        .titles_with_counts()
        .await
        .context("Failed to list documents")?;

    if titles.is_empty() {
        println!("No documents have been saved yet.");
        println!("Use 'semnote save <title> <text>...' to create one.");
        return Ok(());
    }

    println!("Documents ({} total):", titles.len());
    println!();

    let mut total_blocks = 0;
    for summary in &titles {
        println!("📄 {} ({} blocks)", summary.title, summary.block_count);
        total_blocks += summary.block_count;
    }

    println!();
    println!("Summary:");
    println!("  Total Documents: {}", titles.len());
    println!("  Total Blocks: {}", total_blocks);

    Ok(())
}

/// Show health of the embedder, the vector index, and the block registry
#[inline]
pub async fn show_status() -> Result<()> {
    let services = connect().await?;

    println!("📊 Semnote Status Report");
    println!("{}", "=".repeat(50));
    println!();

    let report = collect_status(
        &services.ollama,
        services.index.as_ref(),
        &services.registry,
    )
    .await;

    print_component("🤖 Embedder", &report.embedder);
    print_component("🔍 Vector Index", &report.index);
    print_component("🗄️  Block Registry", &report.registry);

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'semnote save <title> <text>...' to store a document");
    println!("   • Use 'semnote query <text>' to search stored blocks");
    println!("   • Use 'semnote serve' to run the stdio server");

    Ok(())
}

fn print_component(label: &str, status: &ComponentStatus) {
    if status.healthy {
        println!("{}: ✅ {}", label, status.detail);
    } else {
        println!("{}: ❌ {}", label, status.detail);
    }
}

/// Run the stdio server until EOF or interrupt
#[inline]
pub async fn serve() -> Result<()> {
    info!("Starting stdio server");

    let services = connect().await?;

    // Verify Ollama connectivity before accepting requests
    match services.ollama.health_check() {
        Ok(()) => {
            info!(
                "✅ Ollama connected at {}:{} with model {}",
                services.config.ollama.host,
                services.config.ollama.port,
                services.config.ollama.model
            );
        }
        Err(e) => {
            warn!("⚠️  Ollama health check failed: {}", e);
            println!("Warning: Ollama may not be ready. Save and query requests may fail.");
        }
    }

    let server = Arc::new(Server::new(
        services.synchronizer(),
        services.search(),
        Arc::clone(&services.ollama),
        Arc::clone(&services.index) as Arc<dyn VectorIndex>,
        services.registry.clone(),
    ));

    println!("🌐 Starting server on stdio transport...");
    println!("Press Ctrl+C to stop the server");

    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\n📴 Received interrupt signal, shutting down...");
        }
    }

    println!("✅ Shutdown complete");
    Ok(())
}

/// Print the active configuration
#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir()?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    println!("📋 Semnote Configuration");
    println!("{}", "=".repeat(50));
    println!("Config file: {}", config.config_file_path()?.display());
    println!();
    println!("[ollama]");
    println!("  protocol: {}", config.ollama.protocol);
    println!("  host: {}", config.ollama.host);
    println!("  port: {}", config.ollama.port);
    println!("  model: {}", config.ollama.model);
    println!("  batch_size: {}", config.ollama.batch_size);
    println!("  embedding_dimension: {}", config.ollama.embedding_dimension);
    println!();
    println!("[index]");
    println!("  base_url: {}", config.index.base_url);
    println!("  index_name: {}", config.index.index_name);
    let api_key = if config.index.api_key.is_empty() {
        "(not set)"
    } else {
        "(set)"
    };
    println!("  api_key: {}", api_key);

    Ok(())
}

/// Apply one "section.key" override and persist it
#[inline]
pub fn set_config(key: &str, value: &str) -> Result<()> {
    let config_dir = get_config_dir()?;
    let mut config = Config::load(&config_dir).context("Failed to load configuration")?;

    config.apply_setting(key, value)?;
    config.save().context("Failed to save configuration")?;

    println!("✅ Set {} = {}", key, value);
    println!("Saved to {}", config.config_file_path()?.display());

    Ok(())
}
