#[cfg(test)]
mod tests;

use super::models::{DocumentEntry, NewDocument};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

const SELECT_DOCUMENT: &str =
    "SELECT id, filename, format, size_bytes, chunk_count, uploaded_at FROM documents";

pub struct DocumentQueries;

impl DocumentQueries {
    /// Insert a document, or refresh the existing row with the same filename
    #[inline]
    pub async fn upsert(pool: &SqlitePool, document: &NewDocument) -> Result<DocumentEntry> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO documents (filename, format, size_bytes, chunk_count, uploaded_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(filename) DO UPDATE SET
                format = excluded.format,
                size_bytes = excluded.size_bytes,
                chunk_count = excluded.chunk_count,
                uploaded_at = excluded.uploaded_at
            "#,
        )
        .bind(&document.filename)
        .bind(&document.format)
        .bind(document.size_bytes)
        .bind(document.chunk_count)
        .bind(now)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to record document {}", document.filename))?;

        debug!("Recorded catalog entry for {}", document.filename);

        Self::get_by_filename(pool, &document.filename)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve recorded document"))
    }

    #[inline]
    pub async fn get_by_filename(pool: &SqlitePool, filename: &str) -> Result<Option<DocumentEntry>> {
        let query = format!("{} WHERE filename = ?", SELECT_DOCUMENT);

        sqlx::query_as::<_, DocumentEntry>(&query)
            .bind(filename)
            .fetch_optional(pool)
            .await
            .context("Failed to get document by filename")
    }

    /// Every document, most recently uploaded first
    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<DocumentEntry>> {
        let query = format!("{} ORDER BY uploaded_at DESC, id DESC", SELECT_DOCUMENT);

        sqlx::query_as::<_, DocumentEntry>(&query)
            .fetch_all(pool)
            .await
            .context("Failed to list documents")
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(pool)
            .await
            .context("Failed to count documents")
    }
}
