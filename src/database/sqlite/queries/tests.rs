use super::*;
use crate::database::sqlite::Database;
use tempfile::TempDir;

async fn create_test_database() -> Result<(TempDir, Database)> {
    let temp_dir = TempDir::new()?;
    let database = Database::open(&temp_dir.path().join("catalog.db")).await?;
    Ok((temp_dir, database))
}

fn new_document(filename: &str, chunk_count: i64) -> NewDocument {
    NewDocument {
        filename: filename.to_string(),
        format: "txt".to_string(),
        size_bytes: 1200,
        chunk_count,
    }
}

#[tokio::test]
async fn upsert_inserts_then_updates() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let first = DocumentQueries::upsert(database.pool(), &new_document("notes.txt", 3)).await?;
    assert_eq!(first.filename, "notes.txt");
    assert_eq!(first.chunk_count, 3);

    let second = DocumentQueries::upsert(database.pool(), &new_document("notes.txt", 7)).await?;
    assert_eq!(second.id, first.id);
    assert_eq!(second.chunk_count, 7);
    assert!(second.uploaded_at >= first.uploaded_at);

    assert_eq!(DocumentQueries::count(database.pool()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn get_missing_document() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let missing = DocumentQueries::get_by_filename(database.pool(), "nope.pdf").await?;
    assert!(missing.is_none());
    Ok(())
}

#[tokio::test]
async fn list_returns_every_document() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    DocumentQueries::upsert(database.pool(), &new_document("a.txt", 1)).await?;
    DocumentQueries::upsert(database.pool(), &new_document("b.txt", 2)).await?;
    DocumentQueries::upsert(database.pool(), &new_document("c.txt", 3)).await?;

    let documents = DocumentQueries::list_all(database.pool()).await?;
    assert_eq!(documents.len(), 3);

    let mut names: Vec<&str> = documents.iter().map(|d| d.filename.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    Ok(())
}
