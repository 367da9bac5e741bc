use crate::domain::entities::record::{Record, ScoredRecord};
use crate::domain::ports::vector_store::{StoreError, VectorStore};
use crate::domain::values::embedding::{dot, EmbeddingVector};
use crate::domain::values::metadata::Metadata;
use crate::domain::values::modality::Modality;
use crate::infrastructure::sqlite::migrations::run_migrations;
use chrono::DateTime;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

const SELECT_COLS: &str = "id, type, payload, vector, metadata, created_at";

/// Embedded store: one table, brute-force similarity scan per query.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    pub fn new(conn: Connection) -> Result<Self, String> {
        run_migrations(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Opens (or creates) a database file; `":memory:"` gives a private in-memory store.
    pub fn open(path: &str) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| format!("DB error: {e}"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| format!("WAL error: {e}"))?;
        Self::new(conn)
    }

    /// Scoped session for one operation.
    fn session(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::session(format!("connection unavailable: {e}")))
    }

    fn serialize_vector(v: &[f32]) -> Vec<u8> {
        v.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_vector(bytes: &[u8]) -> Vec<f32> {
        bytes.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<Record, rusqlite::Error> {
        let id: String = row.get(0)?;
        let type_str: String = row.get(1)?;
        let blob: Vec<u8> = row.get(3)?;
        let metadata_str: String = row.get(4)?;
        let created_str: String = row.get(5)?;

        let modality = type_str.parse::<Modality>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
        })?;
        let created_at = DateTime::parse_from_rfc3339(&created_str)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
            })?
            .with_timezone(&chrono::Utc);

        Ok(Record {
            modality,
            payload: row.get(2)?,
            vector: EmbeddingVector::from_stored(Self::deserialize_vector(&blob)),
            metadata: serde_json::from_str(&metadata_str).unwrap_or_else(|e| {
                warn!(id = %id, error = %e, "unreadable metadata, using empty");
                Metadata::default()
            }),
            created_at,
            id,
        })
    }
}

/// Busy/locked databases clear up on their own; everything else is a bug in
/// the query or the data.
fn classify(e: rusqlite::Error) -> StoreError {
    match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            StoreError::transient(format!("sqlite busy: {e}"))
        }
        Some(ErrorCode::CannotOpen) => StoreError::session(format!("sqlite open: {e}")),
        _ => StoreError::permanent(format!("sqlite: {e}")),
    }
}

#[async_trait::async_trait]
impl VectorStore for SqliteVectorStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), StoreError> {
        let conn = self.session()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM collection_meta WHERE key = 'dimension'",
                [],
                |r| r.get(0),
            )
            .optional()
            .map_err(classify)?;

        match stored {
            Some(value) if value != dimension.to_string() => Err(StoreError::permanent(format!(
                "collection has dimension {value}, requested {dimension}"
            ))),
            Some(_) => Ok(()),
            None => {
                conn.execute(
                    "INSERT INTO collection_meta (key, value) VALUES ('dimension', ?1)",
                    params![dimension.to_string()],
                )
                .map_err(classify)?;
                Ok(())
            }
        }
    }

    async fn upsert(&self, records: &[Record]) -> Result<(), StoreError> {
        let mut conn = self.session()?;
        let tx = conn.transaction().map_err(classify)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO records (id, type, payload, vector, metadata, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(id) DO UPDATE SET
                        type = excluded.type,
                        payload = excluded.payload,
                        vector = excluded.vector,
                        metadata = excluded.metadata,
                        created_at = excluded.created_at",
                )
                .map_err(classify)?;
            for r in records {
                let metadata = serde_json::to_string(&r.metadata)
                    .map_err(|e| StoreError::permanent(format!("metadata encoding: {e}")))?;
                stmt.execute(params![
                    r.id,
                    r.modality.as_type_tag(),
                    r.payload,
                    Self::serialize_vector(r.vector.as_slice()),
                    metadata,
                    r.created_at.to_rfc3339(),
                ])
                .map_err(classify)?;
            }
        }
        tx.commit().map_err(classify)
    }

    async fn fetch(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let conn = self.session()?;
        conn.query_row(
            &format!("SELECT {SELECT_COLS} FROM records WHERE id = ?1"),
            params![id],
            Self::row_to_record,
        )
        .optional()
        .map_err(classify)
    }

    async fn fetch_all(&self, limit: usize) -> Result<Vec<Record>, StoreError> {
        let conn = self.session()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {SELECT_COLS} FROM records ORDER BY seq LIMIT ?1"))
            .map_err(classify)?;
        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_record)
            .map_err(classify)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(classify)
    }

    async fn near_vector(
        &self,
        modality: Modality,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        let conn = self.session()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLS} FROM records WHERE type = ?1 ORDER BY seq"
            ))
            .map_err(classify)?;
        let mut results: Vec<ScoredRecord> = stmt
            .query_map(params![modality.as_type_tag()], Self::row_to_record)
            .map_err(classify)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(classify)?
            .into_iter()
            .map(|record| {
                // stored and query vectors are unit-norm, so the dot product is the cosine
                let score = dot(vector, record.vector.as_slice());
                ScoredRecord { record, score }
            })
            .collect();

        // stable: equal scores stay in insertion order
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        Ok(results)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.session()?;
        let n = conn
            .execute("DELETE FROM records WHERE id = ?1", params![id])
            .map_err(classify)?;
        Ok(n > 0)
    }

    async fn count(&self, modality: Option<Modality>) -> Result<usize, StoreError> {
        let conn = self.session()?;
        let n: i64 = match modality {
            Some(m) => conn.query_row(
                "SELECT COUNT(*) FROM records WHERE type = ?1",
                params![m.as_type_tag()],
                |r| r.get(0),
            ),
            None => conn.query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0)),
        }
        .map_err(classify)?;
        Ok(n as usize)
    }
}
