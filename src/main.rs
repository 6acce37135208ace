use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use documind::commands::{ask_question, list_documents, show_stats, upload_document};
use documind::config::{Config, get_base_dir, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "documind")]
#[command(about = "Ask questions about your documents, answered from their contents")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml, the vector store and the catalog
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding and answer models
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Extract, chunk and index a document (pdf, docx, xlsx, pptx, txt)
    Upload {
        /// Path of the document to upload
        path: PathBuf,
        /// Name shown in answers; defaults to the file name
        #[arg(long)]
        name: Option<String>,
    },
    /// Ask a question about the uploaded documents
    Query {
        question: String,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// List uploaded documents
    List,
    /// Show vector store statistics and model status
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => get_base_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&base_dir)?;
            } else {
                run_interactive_config(&base_dir)?;
            }
        }
        Commands::Upload { path, name } => {
            upload_document(&Config::load(&base_dir)?, &path, name).await?;
        }
        Commands::Query { question, json } => {
            ask_question(&Config::load(&base_dir)?, &question, json).await?;
        }
        Commands::List => {
            list_documents(&Config::load(&base_dir)?).await?;
        }
        Commands::Stats => {
            show_stats(&Config::load(&base_dir)?).await?;
        }
    }

    Ok(())
}
