#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

/// Integration tests for the LanceDB vector index with realistic data
use documind::database::{ChunkMetadata, EmbeddingRecord, VectorIndex, VectorStore};
use std::sync::Arc;
use tempfile::TempDir;

// nomic-embed-text dimension
const DIMENSION: usize = 768;

fn realistic_vector(variation: f32) -> Vec<f32> {
    let vector: Vec<f32> = (0..DIMENSION)
        .map(|i| ((i as f32).mul_add(0.01, variation)).sin())
        .collect();
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    vector.into_iter().map(|x| x / norm).collect()
}

fn record(id: usize, source: &str, chunk_index: u32, total_chunks: u32, variation: f32) -> EmbeddingRecord {
    EmbeddingRecord {
        id: format!("doc_{}", id),
        vector: realistic_vector(variation),
        document: format!("{} part {}: quarterly figures and commentary", source, chunk_index + 1),
        metadata: ChunkMetadata {
            source: source.to_string(),
            chunk_index,
            total_chunks,
        },
    }
}

fn document_dataset() -> Vec<EmbeddingRecord> {
    let mut records = Vec::new();
    let mut id = 0;
    for (doc, source) in ["annual-report.pdf", "handbook.docx", "budget.xlsx", "roadmap.pptx"]
        .iter()
        .enumerate()
    {
        for chunk in 0..5u32 {
            records.push(record(id, source, chunk, 5, doc as f32 * 10.0 + chunk as f32 * 0.1));
            id += 1;
        }
    }
    records
}

async fn open_store(dir: &TempDir) -> VectorStore {
    VectorStore::open(&dir.path().join("vectors"))
        .await
        .expect("should open vector store")
}

#[tokio::test]
async fn realistic_storage_and_search() {
    let dir = TempDir::new().expect("should create temp dir");
    let store = open_store(&dir).await;
    let dataset = document_dataset();

    store.add(dataset.clone()).await.expect("should store records");
    assert_eq!(store.count().await.expect("count"), dataset.len() as u64);

    let hits = store
        .query(&dataset[7].vector, 3)
        .await
        .expect("search should succeed");

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].document, dataset[7].document);
    assert_eq!(hits[0].metadata, dataset[7].metadata);
    assert!(hits[0].distance.abs() < 1e-4);
    assert!(hits.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
    assert!(hits.iter().all(|hit| hit.metadata.source == "handbook.docx"));
}

#[tokio::test]
async fn large_batch_processing() {
    let dir = TempDir::new().expect("should create temp dir");
    let store = open_store(&dir).await;

    let records: Vec<EmbeddingRecord> = (0..500)
        .map(|i| record(i, "large.pdf", i as u32, 500, i as f32 * 0.37))
        .collect();
    store.add(records).await.expect("should store large batch");

    assert_eq!(store.count().await.expect("count"), 500);
    let hits = store
        .query(&realistic_vector(0.0), 20)
        .await
        .expect("search should succeed");
    assert_eq!(hits.len(), 20);
}

#[tokio::test]
async fn metadata_preservation() {
    let dir = TempDir::new().expect("should create temp dir");
    let store = open_store(&dir).await;

    let mut unusual = record(0, "Résumé – final (v2).docx", 41, 42, 3.0);
    unusual.document = "Ünïcödé text\nwith lines\tand tabs".to_string();
    store.add(vec![unusual.clone()]).await.expect("should store");

    let hits = store.query(&unusual.vector, 1).await.expect("search");
    assert_eq!(hits[0].document, unusual.document);
    assert_eq!(hits[0].metadata, unusual.metadata);
}

#[tokio::test]
async fn reopening_keeps_records_and_dimension() {
    let dir = TempDir::new().expect("should create temp dir");
    {
        let store = open_store(&dir).await;
        store.add(document_dataset()).await.expect("should store");
    }

    let store = open_store(&dir).await;
    assert_eq!(store.count().await.expect("count"), 20);

    let short = EmbeddingRecord {
        vector: vec![1.0; 8],
        ..record(99, "short.txt", 0, 1, 0.0)
    };
    assert!(store.add(vec![short]).await.is_err());
    assert_eq!(store.count().await.expect("count"), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_inserts() {
    let dir = TempDir::new().expect("should create temp dir");
    let store = Arc::new(open_store(&dir).await);

    let mut handles = Vec::new();
    for task in 0..4usize {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let records: Vec<EmbeddingRecord> = (0..10)
                .map(|i| record(task * 10 + i, "shared.pdf", i as u32, 10, (task * 10 + i) as f32))
                .collect();
            store.add(records).await
        }));
    }

    for handle in handles {
        handle
            .await
            .expect("task should finish")
            .expect("insert should succeed");
    }

    assert_eq!(store.count().await.expect("count"), 40);
}
