//! SQLite-backed chunk catalog.
//!
//! One `chunks` table keyed by `chunk_id`, with a uniqueness constraint on
//! `vector_id` enforcing the catalog-wide invariant that no two chunks map
//! to the same index position. Batch writes run inside one transaction so a
//! rejected row rolls back the whole batch.

use async_trait::async_trait;
use docsearch_core::{CatalogError, ChunkCatalog, ChunkRecord, VectorId};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS chunks (
    chunk_id TEXT PRIMARY KEY,
    vector_id INTEGER NOT NULL UNIQUE,
    document_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    content TEXT NOT NULL,
    sequence_index INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id);
";

/// Chunk catalog persisted in a SQLite database.
///
/// rusqlite is synchronous; every call runs briefly under the connection
/// lock, which also serializes catalog reads. Lookups are short point
/// queries, so the index snapshot write, not the catalog, dominates
/// ingestion latency.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open or create the catalog database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CatalogError::Storage(e.to_string()))?;
            }
        }

        let conn = Connection::open(path).map_err(storage)?;
        conn.execute_batch(SCHEMA_SQL).map_err(storage)?;
        debug!("opened chunk catalog at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a throwaway in-memory catalog.
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        conn.execute_batch(SCHEMA_SQL).map_err(storage)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl ChunkCatalog for SqliteCatalog {
    async fn put_batch(&self, rows: &[ChunkRecord]) -> Result<(), CatalogError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO chunks (
                        chunk_id, vector_id, document_id, user_id, content, sequence_index
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(storage)?;

            for row in rows {
                let vector_id = i64::try_from(row.vector_id)
                    .map_err(|_| CatalogError::VectorIdOverflow(row.vector_id))?;
                stmt.execute(params![
                    row.chunk_id.to_string(),
                    vector_id,
                    row.document_id.to_string(),
                    row.user_id.to_string(),
                    row.content,
                    i64::from(row.sequence_index),
                ])
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        CatalogError::DuplicateVectorId(row.vector_id)
                    } else {
                        storage(e)
                    }
                })?;
            }
        }
        tx.commit().map_err(storage)?;

        debug!("committed {} chunk rows", rows.len());
        Ok(())
    }

    async fn get_by_vector_ids(
        &self,
        ids: &[VectorId],
    ) -> Result<HashMap<VectorId, ChunkRecord>, CatalogError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT chunk_id, vector_id, document_id, user_id, content, sequence_index
                 FROM chunks WHERE vector_id = ?1",
            )
            .map_err(storage)?;

        let mut found = HashMap::with_capacity(ids.len());
        for &id in ids {
            // Ids beyond the storable range cannot have rows.
            let Ok(vector_id) = i64::try_from(id) else {
                continue;
            };
            let record = stmt
                .query_row(params![vector_id], decode_chunk_row)
                .optional()
                .map_err(storage)?;
            if let Some(record) = record {
                found.insert(id, record);
            }
        }

        Ok(found)
    }

    async fn list_by_document(&self, document_id: Uuid) -> Result<Vec<ChunkRecord>, CatalogError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT chunk_id, vector_id, document_id, user_id, content, sequence_index
                 FROM chunks WHERE document_id = ?1 ORDER BY sequence_index",
            )
            .map_err(storage)?;

        let rows = stmt
            .query_map(params![document_id.to_string()], decode_chunk_row)
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;

        Ok(rows)
    }

    async fn max_vector_id(&self) -> Result<Option<VectorId>, CatalogError> {
        let conn = self.conn.lock().await;
        let max: Option<i64> = conn
            .query_row("SELECT MAX(vector_id) FROM chunks", [], |row| row.get(0))
            .map_err(storage)?;

        Ok(max.map(|id| id as VectorId))
    }

    async fn count(&self) -> Result<u64, CatalogError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(storage)?;

        Ok(count as u64)
    }
}

fn storage(err: rusqlite::Error) -> CatalogError {
    CatalogError::Storage(err.to_string())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    )
}

fn decode_chunk_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChunkRecord> {
    let chunk_id: String = row.get(0)?;
    let vector_id: i64 = row.get(1)?;
    let document_id: String = row.get(2)?;
    let user_id: String = row.get(3)?;
    let content: String = row.get(4)?;
    let sequence_index: i64 = row.get(5)?;

    Ok(ChunkRecord {
        chunk_id: parse_uuid(0, &chunk_id)?,
        vector_id: decode_int(1, u64::try_from(vector_id))?,
        document_id: parse_uuid(2, &document_id)?,
        user_id: parse_uuid(3, &user_id)?,
        content,
        sequence_index: decode_int(5, u32::try_from(sequence_index))?,
    })
}

fn parse_uuid(index: usize, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
    })
}

fn decode_int<T>(
    index: usize,
    value: Result<T, std::num::TryFromIntError>,
) -> rusqlite::Result<T> {
    value.map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Integer,
            Box::new(err),
        )
    })
}
