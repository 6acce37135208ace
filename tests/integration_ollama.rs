#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance
// Run with: cargo test --test integration_ollama -- --ignored

use documind::config::OllamaConfig;
use documind::database::{ChunkMetadata, MemoryIndex};
use documind::embeddings::{Embedder, OllamaClient};
use documind::store::EmbeddingStore;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const TEST_MODEL: &str = "nomic-embed-text";

fn create_integration_test_client() -> OllamaClient {
    let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = env::var("OLLAMA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(11434);
    let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| TEST_MODEL.to_string());

    let config = OllamaConfig {
        host,
        port,
        model,
        batch_size: 5, // Smaller batch size for testing
        ..OllamaConfig::default()
    };

    OllamaClient::new(&config)
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(3)
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_health_check() {
    init_test_tracing();

    let client = create_integration_test_client();
    let result = client.health_check();

    assert!(
        result.is_ok(),
        "Health check should succeed with local Ollama: {:?}",
        result
    );
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_batch_embeddings() {
    init_test_tracing();

    let client = create_integration_test_client();
    let texts: Vec<String> = (0..12)
        .map(|i| format!("Paragraph {} of the onboarding guide covers laptop setup.", i))
        .collect();

    info!("Generating {} embeddings in batches of 5", texts.len());
    let embeddings = client
        .generate_embeddings(&texts)
        .expect("batch embedding should succeed");

    assert_eq!(embeddings.len(), texts.len());
    let dimension = embeddings[0].len();
    debug!("Embedding dimension: {}", dimension);
    assert!(dimension > 0);
    assert!(embeddings.iter().all(|e| e.len() == dimension));
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a local Ollama instance"]
async fn real_ollama_semantic_ranking() {
    init_test_tracing();

    let client: Arc<dyn Embedder> = Arc::new(create_integration_test_client());
    let store = EmbeddingStore::open(client, Arc::new(MemoryIndex::new()))
        .await
        .expect("should open store");

    let chunks = vec![
        "Employees receive twenty days of paid vacation each year.".to_string(),
        "The data center uses liquid cooling for its GPU racks.".to_string(),
        "Sourdough bread needs a starter, flour, water and salt.".to_string(),
    ];
    let metadatas = ["hr.txt", "infra.txt", "recipes.txt"]
        .iter()
        .map(|source| ChunkMetadata {
            source: (*source).to_string(),
            chunk_index: 0,
            total_chunks: 1,
        })
        .collect();
    store.add(chunks, metadatas).await.expect("should add");

    let hits = store
        .query("How many vacation days do I get?", 3)
        .await
        .expect("should query");

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].metadata.source, "hr.txt");
}
