#[cfg(test)]
mod tests;

use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::database::{ChunkMetadata, EmbeddingRecord, SearchHit, VectorIndex};
use crate::{DocumindError, Result};

pub const DEFAULT_TABLE_NAME: &str = "documind_collection";

/// Opened table plus the vector dimension fixed by its schema
#[derive(Clone)]
struct TableHandle {
    table: Table,
    dimension: usize,
}

/// Vector index backed by a LanceDB table on local disk.
///
/// The table is created lazily by the first insert, whose vectors fix the
/// collection's dimension. Creation is serialized so concurrent first
/// inserts cannot race.
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    handle: Mutex<Option<TableHandle>>,
}

impl VectorStore {
    /// Open (or create) the vector database at `db_path`
    #[inline]
    pub async fn open(db_path: &Path) -> Result<Self> {
        Self::open_with_table(db_path, DEFAULT_TABLE_NAME).await
    }

    #[inline]
    pub async fn open_with_table(db_path: &Path, table_name: &str) -> Result<Self> {
        debug!("Initializing LanceDB at path: {}", db_path.display());

        std::fs::create_dir_all(db_path).map_err(|e| {
            DocumindError::Database(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = db_path.to_string_lossy();
        let connection = lancedb::connect(uri.as_ref())
            .execute()
            .await
            .map_err(|e| DocumindError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        let store = Self {
            connection,
            table_name: table_name.to_string(),
            handle: Mutex::new(None),
        };

        if let Some(handle) = store.open_existing_table().await? {
            info!(
                "Opened table {} ({} dimensions)",
                store.table_name, handle.dimension
            );
            *store.handle.lock().await = Some(handle);
        } else {
            debug!("Table {} does not exist yet", store.table_name);
        }

        Ok(store)
    }

    async fn open_existing_table(&self) -> Result<Option<TableHandle>> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| DocumindError::Database(format!("Failed to list tables: {}", e)))?;

        if !table_names.contains(&self.table_name) {
            return Ok(None);
        }

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| DocumindError::Database(format!("Failed to open table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| DocumindError::Database(format!("Failed to get table schema: {}", e)))?;

        let dimension = schema
            .field_with_name("vector")
            .ok()
            .and_then(|field| match field.data_type() {
                DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
                _ => None,
            })
            .ok_or_else(|| {
                DocumindError::Database(
                    "Could not find vector column or determine dimension".to_string(),
                )
            })?;

        Ok(Some(TableHandle { table, dimension }))
    }

    /// Current table handle, or `None` before the first insert
    async fn current(&self) -> Option<TableHandle> {
        self.handle.lock().await.clone()
    }

    /// Schema with the specified vector dimension
    fn create_schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("document", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("total_chunks", DataType::UInt32, false),
        ]))
    }

    /// Build a RecordBatch from embedding records
    fn create_record_batch(records: &[EmbeddingRecord], vector_dim: usize) -> Result<RecordBatch> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);
        let mut documents = Vec::with_capacity(len);
        let mut sources = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut totals = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            documents.push(record.document.as_str());
            sources.push(record.metadata.source.as_str());
            chunk_indices.push(record.metadata.chunk_index);
            totals.push(record.metadata.total_chunks);
        }

        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array = FixedSizeListArray::try_new(
            field,
            vector_dim as i32,
            Arc::new(Float32Array::from(flat_values)),
            None,
        )
        .map_err(|e| {
            DocumindError::StoreWriteFailed(format!("Failed to create vector array: {}", e))
        })?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(documents)),
            Arc::new(StringArray::from(sources)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(UInt32Array::from(totals)),
        ];

        RecordBatch::try_new(Self::create_schema(vector_dim), arrays).map_err(|e| {
            DocumindError::StoreWriteFailed(format!("Failed to create record batch: {}", e))
        })
    }

    /// Parse a single record batch from search results
    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
        let documents = string_column(batch, "document")?;
        let sources = string_column(batch, "source")?;
        let chunk_indices = u32_column(batch, "chunk_index")?;
        let totals = u32_column(batch, "total_chunks")?;

        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| {
                DocumindError::StoreQueryFailed("Missing _distance column".to_string())
            })?;

        Ok((0..batch.num_rows())
            .map(|row| SearchHit {
                document: documents.value(row).to_string(),
                metadata: ChunkMetadata {
                    source: sources.value(row).to_string(),
                    chunk_index: chunk_indices.value(row),
                    total_chunks: totals.value(row),
                },
                distance: if distances.is_null(row) {
                    0.0
                } else {
                    distances.value(row)
                },
            })
            .collect())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DocumindError::StoreQueryFailed(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DocumindError::StoreQueryFailed(format!("Invalid {} column type", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DocumindError::StoreQueryFailed(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| DocumindError::StoreQueryFailed(format!("Invalid {} column type", name)))
}

#[async_trait]
impl VectorIndex for VectorStore {
    #[inline]
    async fn add(&self, records: Vec<EmbeddingRecord>) -> Result<()> {
        let Some(first) = records.first() else {
            debug!("No embeddings to store");
            return Ok(());
        };
        let incoming_dim = first.vector.len();

        if let Some(record) = records.iter().find(|r| r.vector.len() != incoming_dim) {
            return Err(DocumindError::StoreWriteFailed(format!(
                "vector for {} has dimension {}, batch uses {}",
                record.id,
                record.vector.len(),
                incoming_dim
            )));
        }

        // Held across creation and insert so the first writer fixes the dimension
        let mut guard = self.handle.lock().await;

        let handle = match guard.as_ref() {
            Some(handle) => handle.clone(),
            None => {
                info!(
                    "Creating table {} with {} dimensions",
                    self.table_name, incoming_dim
                );
                let table = self
                    .connection
                    .create_empty_table(&self.table_name, Self::create_schema(incoming_dim))
                    .execute()
                    .await
                    .map_err(|e| {
                        DocumindError::StoreWriteFailed(format!("Failed to create table: {}", e))
                    })?;
                let handle = TableHandle {
                    table,
                    dimension: incoming_dim,
                };
                *guard = Some(handle.clone());
                handle
            }
        };

        if handle.dimension != incoming_dim {
            return Err(DocumindError::StoreWriteFailed(format!(
                "vectors have dimension {}, collection {} uses {}",
                incoming_dim, self.table_name, handle.dimension
            )));
        }

        debug!("Storing batch of {} embeddings", records.len());

        let record_batch = Self::create_record_batch(&records, handle.dimension)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        handle
            .table
            .add(reader)
            .execute()
            .await
            .map_err(|e| {
                DocumindError::StoreWriteFailed(format!("Failed to insert embeddings: {}", e))
            })?;

        drop(guard);
        info!("Successfully stored {} embeddings", records.len());
        Ok(())
    }

    #[inline]
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let Some(handle) = self.current().await else {
            debug!("Query against missing table {}; no results", self.table_name);
            return Ok(Vec::new());
        };

        if vector.len() != handle.dimension {
            return Err(DocumindError::StoreQueryFailed(format!(
                "query vector has dimension {}, collection uses {}",
                vector.len(),
                handle.dimension
            )));
        }

        debug!("Searching for similar vectors with limit: {}", k);

        let mut stream = handle
            .table
            .vector_search(vector)
            .map_err(|e| {
                DocumindError::StoreQueryFailed(format!("Failed to create vector search: {}", e))
            })?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .map_err(|e| DocumindError::StoreQueryFailed(format!("Failed to execute search: {}", e)))?;

        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(|e| {
            DocumindError::StoreQueryFailed(format!("Failed to read result stream: {}", e))
        })? {
            hits.extend(Self::parse_search_batch(&batch)?);
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);

        debug!("Parsed {} search results", hits.len());
        Ok(hits)
    }

    #[inline]
    async fn count(&self) -> Result<u64> {
        let Some(handle) = self.current().await else {
            return Ok(0);
        };

        let count = handle
            .table
            .count_rows(None)
            .await
            .map_err(|e| DocumindError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    #[inline]
    fn collection(&self) -> &str {
        &self.table_name
    }
}
