use super::*;
use crate::database::{ChunkMetadata, MemoryIndex};
use crate::testing::FakeEmbedder;

fn hit(source: &str, chunk_index: u32, document: &str, distance: f32) -> SearchHit {
    SearchHit {
        document: document.to_string(),
        metadata: ChunkMetadata {
            source: source.to_string(),
            chunk_index,
            total_chunks: 10,
        },
        distance,
    }
}

#[test]
fn context_blocks_in_ranking_order() {
    let hits = vec![
        hit("a.pdf", 0, "Alpha text.", 0.1),
        hit("b.docx", 4, "Beta text.", 0.3),
    ];

    assert_eq!(
        format_context(&hits),
        "[Source: a.pdf, Part 1]\nAlpha text.\n\n---\n[Source: b.docx, Part 5]\nBeta text.\n"
    );
}

#[test]
fn single_hit_has_no_separator() {
    let hits = vec![hit("only.txt", 2, "Lone chunk", 0.0)];
    assert_eq!(format_context(&hits), "[Source: only.txt, Part 3]\nLone chunk\n");
}

#[test]
fn sources_deduplicated_by_first_appearance() {
    let hits = vec![
        hit("a.pdf", 3, "best chunk of a", 0.1),
        hit("b.pdf", 0, "chunk of b", 0.2),
        hit("a.pdf", 1, "worse chunk of a", 0.25),
        hit("c.pdf", 7, "chunk of c", 0.4),
    ];

    let sources = extract_sources(&hits, 150);
    let names: Vec<&str> = sources.iter().map(|s| s.filename.as_str()).collect();

    assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    assert_eq!(sources[0].chunk_index, 3);
    assert_eq!(sources[0].preview, "best chunk of a");
    assert_eq!(sources[2].relevance_score, 0.6);
}

#[test]
fn relevance_rounds_to_three_decimals() {
    assert_eq!(relevance_score(0.0), 1.0);
    assert_eq!(relevance_score(0.2), 0.8);
    assert_eq!(relevance_score(0.123_456), 0.877);
    assert_eq!(relevance_score(1.5), -0.5);
}

#[test]
fn preview_truncates_long_text() {
    let long = "x".repeat(200);
    let sources = extract_sources(&[hit("long.txt", 0, &long, 0.0)], 150);
    assert_eq!(sources[0].preview.chars().count(), 153);
    assert!(sources[0].preview.ends_with("..."));

    let exact = "y".repeat(150);
    let sources = extract_sources(&[hit("exact.txt", 0, &exact, 0.0)], 150);
    assert_eq!(sources[0].preview, exact);
}

#[test]
fn preview_respects_multibyte_characters() {
    let text = "é".repeat(151);
    let sources = extract_sources(&[hit("accents.txt", 0, &text, 0.0)], 150);
    assert_eq!(sources[0].preview, format!("{}...", "é".repeat(150)));
}

#[tokio::test]
async fn empty_store_yields_no_documents() {
    let store = EmbeddingStore::open(Arc::new(FakeEmbedder::new(16)), Arc::new(MemoryIndex::new()))
        .await
        .expect("should open store");
    let retriever = Retriever::new(Arc::new(store), RetrievalConfig::default());

    let retrieval = retriever.retrieve("anything?").await.expect("should retrieve");
    assert_eq!(retrieval, Retrieval::NoDocuments);
}

#[tokio::test]
async fn retrieve_respects_top_k() {
    let store = EmbeddingStore::open(Arc::new(FakeEmbedder::new(16)), Arc::new(MemoryIndex::new()))
        .await
        .expect("should open store");

    let chunks: Vec<String> = (0..8).map(|i| format!("chunk number {} about storage", i)).collect();
    let metadatas = (0..8)
        .map(|i| ChunkMetadata {
            source: format!("file{}.txt", i % 2),
            chunk_index: i,
            total_chunks: 8,
        })
        .collect();
    store.add(chunks, metadatas).await.expect("should add");

    let retriever = Retriever::new(
        Arc::new(store),
        RetrievalConfig {
            top_k: 3,
            preview_chars: 20,
        },
    );

    let Retrieval::Found { context, sources } =
        retriever.retrieve("storage").await.expect("should retrieve")
    else {
        panic!("expected results");
    };

    assert_eq!(context.matches("[Source: ").count(), 3);
    assert_eq!(context.matches("\n---\n").count(), 2);
    assert!(sources.len() <= 2);
    assert!(sources.iter().all(|s| s.preview.chars().count() <= 23));
}
