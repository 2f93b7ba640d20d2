use clap::{Parser, Subcommand};
use semnote::commands::{
    delete_document, list_documents, query_similar, rename_document, replace_document,
    save_blocks, serve, set_config, show_config, show_status,
};
use semnote::search::DEFAULT_TOP_K;
use semnote::Result;

#[derive(Parser)]
#[command(name = "semnote")]
#[command(about = "A document synchronization and similarity search backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save text blocks under a document title
    Save {
        /// Title of the document
        title: String,
        /// One or more text blocks to embed and store
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Search stored blocks by similarity
    Query {
        /// Query text
        text: String,
        /// Maximum number of matches to return
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Rename a document, keeping its blocks and embeddings
    Rename {
        /// Current document title
        old_title: String,
        /// New document title
        new_title: String,
    },
    /// Replace a document's blocks with new content
    Replace {
        /// Title of the document
        title: String,
        /// Replacement text blocks
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Delete a document and all its blocks
    Delete {
        /// Title of the document
        title: String,
    },
    /// List saved documents with block counts
    List,
    /// Show health of the embedder, index, and registry
    Status,
    /// Start the stdio server
    Serve,
    /// Inspect or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set a configuration value, e.g. ollama.model
    Set {
        /// Setting key in "section.key" form
        key: String,
        /// New value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Save { title, texts } => {
            save_blocks(title, texts).await?;
        }
        Commands::Query { text, top_k } => {
            query_similar(text, top_k).await?;
        }
        Commands::Rename {
            old_title,
            new_title,
        } => {
            rename_document(old_title, new_title).await?;
        }
        Commands::Replace { title, texts } => {
            replace_document(title, texts).await?;
        }
        Commands::Delete { title } => {
            delete_document(title).await?;
        }
        Commands::List => {
            list_documents().await?;
        }
        Commands::Status => {
            show_status().await?;
        }
        Commands::Serve => {
            serve().await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => show_config()?,
            ConfigAction::Set { key, value } => set_config(&key, &value)?,
        },
    }

    Ok(())
}
