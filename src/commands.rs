use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::embeddings::OllamaClient;
use crate::pipeline::{Pipeline, QueryResponse, QueryStatus};

const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Open and start the pipeline described by `config`
#[inline]
pub async fn open_pipeline(config: &Config) -> Result<Pipeline> {
    let pipeline = Pipeline::from_config(config)
        .await
        .context("Failed to open document pipeline")?;
    pipeline.start().await?;
    Ok(pipeline)
}

/// Upload a document: extract, chunk, embed and store it
#[inline]
pub async fn upload_document(config: &Config, path: &Path, name: Option<String>) -> Result<()> {
    let filename = match name {
        Some(name) => name,
        None => path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .with_context(|| format!("Cannot derive a document name from {}", path.display()))?,
    };

    info!("Uploading {} as {}", path.display(), filename);
    let pipeline = open_pipeline(config).await?;

    let spinner = upload_spinner(&filename);
    let result = pipeline.process_upload(path, &filename).await;
    spinner.finish_and_clear();
    pipeline.shutdown().await;

    let chunks = result?;
    println!(
        "{} Processed {} ({} chunks)",
        style("✓").green(),
        style(&filename).cyan(),
        chunks
    );
    Ok(())
}

/// Ask a question and print the answer with its sources
#[inline]
pub async fn ask_question(config: &Config, question: &str, json: bool) -> Result<()> {
    let pipeline = open_pipeline(config).await?;
    let response = pipeline.query_documents(question).await;
    pipeline.shutdown().await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).context("Failed to serialize response")?
        );
    } else {
        print_response(&response);
    }

    if let QueryStatus::Failed { code } = response.status {
        anyhow::bail!("Query failed ({:?})", code);
    }
    Ok(())
}

/// List uploaded documents from the catalog
#[inline]
pub async fn list_documents(config: &Config) -> Result<()> {
    let pipeline = open_pipeline(config).await?;
    let documents = pipeline.list_documents().await;
    pipeline.shutdown().await;
    let documents = documents?;

    if documents.is_empty() {
        println!("No documents have been uploaded yet.");
        println!("Use 'documind upload <path>' to add one.");
        return Ok(());
    }

    println!("Documents ({} total):", documents.len());
    println!();

    for document in &documents {
        println!("📄 {}", style(&document.filename).bold());
        println!("   Format: {}", document.format);
        println!("   Size: {}", document.display_size());
        println!("   Chunks: {}", document.chunk_count);
        println!(
            "   Uploaded: {}",
            document.uploaded_at.format("%Y-%m-%d %H:%M:%S")
        );
        println!();
    }

    Ok(())
}

/// Show vector store statistics and the state of the model servers
#[inline]
pub async fn show_stats(config: &Config) -> Result<()> {
    let pipeline = open_pipeline(config).await?;
    let stats = pipeline.stats().await;
    let documents = pipeline.list_documents().await.map(|docs| docs.len());
    pipeline.shutdown().await;
    let stats = stats?;

    println!("📊 DocuMind Status");
    println!("{}", "=".repeat(40));
    println!();

    println!("🔍 Vector Store:");
    println!("   Collection: {}", stats.collection);
    println!("   Status: {}", stats.status);
    println!("   Chunks: {}", stats.count);
    match documents {
        Ok(count) => println!("   Documents: {}", count),
        Err(e) => println!("   Documents: Error - {}", e),
    }
    println!();

    println!("🤖 Embeddings:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => println!(
                "   ✅ Ollama: Connected ({}:{}), model {}",
                config.ollama.host, config.ollama.port, config.ollama.model
            ),
            Err(e) => {
                warn!("Ollama health check failed: {:#}", e);
                println!("   ⚠️  Ollama: Unhealthy - {}", e);
            }
        },
        Err(e) => println!("   ❌ Ollama: Failed to configure - {}", e),
    }

    println!("💬 Generation:");
    println!("   Model: {}", config.generation.model);
    println!("   Endpoint: {}", config.generation.base_url);

    Ok(())
}

fn upload_spinner(filename: &str) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template("{spinner} Processing {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let spinner = ProgressBar::new_spinner().with_style(style);
    spinner.set_message(filename.to_string());
    spinner.enable_steady_tick(SPINNER_TICK);
    spinner
}

fn print_response(response: &QueryResponse) {
    println!("{}", response.answer);

    if response.sources.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Sources:").bold());
    for source in &response.sources {
        println!(
            "  • {} (part {}, relevance {:.3})",
            style(&source.filename).cyan(),
            u64::from(source.chunk_index) + 1,
            source.relevance_score
        );
        println!("    {}", style(&source.preview).dim());
    }
}
