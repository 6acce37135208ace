use super::*;
use tempfile::TempDir;

fn create_test_record(n: usize, vector: Vec<f32>, source: &str) -> EmbeddingRecord {
    EmbeddingRecord {
        id: format!("doc_{}", n),
        vector,
        document: format!("This is test content for chunk {}", n),
        metadata: ChunkMetadata {
            source: source.to_string(),
            chunk_index: n as u32,
            total_chunks: 3,
        },
    }
}

async fn create_test_store() -> (VectorStore, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = VectorStore::open(&temp_dir.path().join("vectors"))
        .await
        .expect("should open vector store");
    (store, temp_dir)
}

#[tokio::test]
async fn vector_store_initialization() {
    let (store, _temp_dir) = create_test_store().await;

    assert_eq!(store.collection(), "documind_collection");
    assert_eq!(store.count().await.expect("should count"), 0);
    assert!(
        store
            .query(&[1.0, 0.0, 0.0], 5)
            .await
            .expect("query on missing table")
            .is_empty()
    );
}

#[tokio::test]
async fn store_and_search() {
    let (store, _temp_dir) = create_test_store().await;

    store
        .add(vec![
            create_test_record(0, vec![1.0, 0.0, 0.0], "a.txt"),
            create_test_record(1, vec![0.0, 1.0, 0.0], "b.txt"),
            create_test_record(2, vec![0.8, 0.6, 0.0], "a.txt"),
        ])
        .await
        .expect("should store embeddings");

    assert_eq!(store.count().await.expect("should count"), 3);

    let hits = store
        .query(&[1.0, 0.0, 0.0], 2)
        .await
        .expect("should search");

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].document, "This is test content for chunk 0");
    assert_eq!(hits[0].metadata.source, "a.txt");
    assert_eq!(hits[1].metadata.chunk_index, 2);
    assert!(hits[0].distance <= hits[1].distance);
    assert!(hits[0].distance.abs() < 1e-4);
    assert!((hits[1].distance - 0.2).abs() < 1e-4);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let (store, _temp_dir) = create_test_store().await;

    store.add(Vec::new()).await.expect("empty add succeeds");
    assert_eq!(store.count().await.expect("should count"), 0);
}

#[tokio::test]
async fn dimension_is_fixed_by_first_insert() {
    let (store, _temp_dir) = create_test_store().await;

    store
        .add(vec![create_test_record(0, vec![1.0, 0.0, 0.0], "a.txt")])
        .await
        .expect("first insert");

    let err = store
        .add(vec![create_test_record(1, vec![1.0, 0.0], "a.txt")])
        .await
        .expect_err("different dimension should fail");
    assert!(matches!(err, DocumindError::StoreWriteFailed(_)));

    let err = store
        .query(&[1.0, 0.0], 1)
        .await
        .expect_err("query dimension mismatch");
    assert!(matches!(err, DocumindError::StoreQueryFailed(_)));
}

#[tokio::test]
async fn mixed_dimensions_in_one_batch_fail() {
    let (store, _temp_dir) = create_test_store().await;

    let err = store
        .add(vec![
            create_test_record(0, vec![1.0, 0.0, 0.0], "a.txt"),
            create_test_record(1, vec![1.0, 0.0], "a.txt"),
        ])
        .await
        .expect_err("ragged batch should fail");
    assert!(matches!(err, DocumindError::StoreWriteFailed(_)));
    assert_eq!(store.count().await.expect("should count"), 0);
}

#[tokio::test]
async fn records_persist_across_reopen() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("vectors");

    {
        let store = VectorStore::open(&path).await.expect("should open");
        store
            .add(vec![
                create_test_record(0, vec![0.0, 1.0], "notes.txt"),
                create_test_record(1, vec![1.0, 0.0], "notes.txt"),
            ])
            .await
            .expect("should store");
    }

    let reopened = VectorStore::open(&path).await.expect("should reopen");
    assert_eq!(reopened.count().await.expect("should count"), 2);

    let hits = reopened.query(&[0.0, 1.0], 1).await.expect("should search");
    assert_eq!(hits[0].document, "This is test content for chunk 0");
    assert_eq!(hits[0].metadata.total_chunks, 3);
}
