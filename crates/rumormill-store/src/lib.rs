//! Rumormill Storage Layer
//!
//! Implements the `RumorStore` trait on SQLite.
//!
//! # Concurrency
//!
//! Writes use optimistic versioning. A new rumor (version 0) is inserted at
//! version 1; an update only succeeds if the stored version still equals the
//! in-memory one, and bumps it. Otherwise `StoreError::VersionConflict` is
//! returned and the caller is expected to reload and retry. Every save runs in
//! a single transaction, so a rumor is never half written.
//!
//! # Examples
//!
//! ```
//! use rumormill_domain::{Rumor, RumorSeverity, RumorStore};
//! use rumormill_store::SqliteStore;
//!
//! let mut store = SqliteStore::new(":memory:").unwrap();
//! let mut rumor = Rumor::new("npc_1", "The mill is haunted", vec![], RumorSeverity::Minor, 0.2, 0);
//! store.save_rumor(&mut rumor).unwrap();
//! assert_eq!(rumor.version, 1);
//! assert!(store.get_rumor(rumor.id()).unwrap().is_some());
//! ```

#![warn(missing_docs)]

use rumormill_domain::{
    Rumor, RumorCategory, RumorId, RumorParts, RumorQuery, RumorSeverity, RumorStatus, RumorStore,
    Spread, Variant, VariantId,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Metadata could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Update targeted a rumor that is not stored
    #[error("Rumor not found: {0}")]
    NotFound(String),

    /// Stored row could not be turned back into a rumor
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The rumor was modified by someone else since it was loaded
    #[error("Version conflict on rumor {id}: expected {expected}, found {found}")]
    VersionConflict {
        /// Rumor being saved
        id: RumorId,
        /// Version held by the caller
        expected: u64,
        /// Version currently stored
        found: u64,
    },
}

impl StoreError {
    /// Whether reloading and retrying may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

const RUMOR_COLUMNS: &str =
    "id, originator_id, original_content, severity, truth_value, status, created_at, version";

/// Scalar columns of a rumor row, before children are attached
struct RumorRow {
    id: RumorId,
    originator_id: String,
    original_content: String,
    severity: RumorSeverity,
    truth_value: f64,
    status: RumorStatus,
    created_at: u64,
    version: u64,
}

fn conversion_error(column: usize, kind: rusqlite::types::Type, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, kind, Box::new(StoreError::InvalidData(message)))
}

fn rumor_id_column(row: &Row<'_>, column: usize) -> rusqlite::Result<RumorId> {
    let bytes: Vec<u8> = row.get(column)?;
    RumorId::from_bytes(&bytes).ok_or_else(|| {
        conversion_error(
            column,
            rusqlite::types::Type::Blob,
            format!("Expected 16 bytes for RumorId, got {}", bytes.len()),
        )
    })
}

fn variant_id_column(row: &Row<'_>, column: usize) -> rusqlite::Result<VariantId> {
    let bytes: Vec<u8> = row.get(column)?;
    VariantId::from_bytes(&bytes).ok_or_else(|| {
        conversion_error(
            column,
            rusqlite::types::Type::Blob,
            format!("Expected 16 bytes for VariantId, got {}", bytes.len()),
        )
    })
}

fn rumor_row(row: &Row<'_>) -> rusqlite::Result<RumorRow> {
    let severity: String = row.get(3)?;
    let status: String = row.get(5)?;
    Ok(RumorRow {
        id: rumor_id_column(row, 0)?,
        originator_id: row.get(1)?,
        original_content: row.get(2)?,
        severity: RumorSeverity::parse(&severity).ok_or_else(|| {
            conversion_error(3, rusqlite::types::Type::Text, format!("Unknown severity: {}", severity))
        })?,
        truth_value: row.get(4)?,
        status: RumorStatus::parse(&status).ok_or_else(|| {
            conversion_error(5, rusqlite::types::Type::Text, format!("Unknown status: {}", status))
        })?,
        created_at: row.get::<_, i64>(6)? as u64,
        version: row.get::<_, i64>(7)? as u64,
    })
}

/// Whether a rusqlite error is about row contents rather than the database
fn is_decode_error(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
    )
}

/// SQLite-based implementation of `RumorStore`
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store between tasks by
/// wrapping it in a mutex, or give each thread its own instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open a fresh in-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Number of stored rumors
    pub fn rumor_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM rumors", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn stored_version(tx: &Transaction<'_>, id_bytes: &[u8]) -> Result<Option<u64>, StoreError> {
        let version = tx
            .query_row("SELECT version FROM rumors WHERE id = ?1", params![id_bytes], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(version.map(|v| v as u64))
    }

    fn write_children(tx: &Transaction<'_>, rumor: &Rumor, id_bytes: &[u8]) -> Result<(), StoreError> {
        tx.execute("DELETE FROM spread WHERE rumor_id = ?1", params![id_bytes])?;
        tx.execute("DELETE FROM variants WHERE rumor_id = ?1", params![id_bytes])?;
        tx.execute("DELETE FROM rumor_categories WHERE rumor_id = ?1", params![id_bytes])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO rumor_categories (rumor_id, position, category) VALUES (?1, ?2, ?3)",
            )?;
            for (position, category) in rumor.categories().iter().enumerate() {
                stmt.execute(params![id_bytes, position as i64, category.as_str()])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO variants
                 (id, rumor_id, position, content, created_at, parent_variant_id, entity_id, mutation_metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for (position, variant) in rumor.variants().iter().enumerate() {
                let metadata = serde_json::to_string(&variant.mutation_metadata)?;
                stmt.execute(params![
                    &variant.id.to_bytes()[..],
                    id_bytes,
                    position as i64,
                    &variant.content,
                    variant.created_at as i64,
                    variant.parent_variant_id.map(|p| p.to_bytes().to_vec()),
                    &variant.entity_id,
                    metadata,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO spread
                 (rumor_id, entity_id, variant_id, heard_from_entity_id, believability, heard_at, last_reinforced_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for record in rumor.spread_records() {
                stmt.execute(params![
                    id_bytes,
                    &record.entity_id,
                    &record.variant_id.to_bytes()[..],
                    &record.heard_from_entity_id,
                    record.believability(),
                    record.heard_at as i64,
                    record.last_reinforced_at as i64,
                ])?;
            }
        }

        Ok(())
    }

    fn load_categories(&self, id_bytes: &[u8]) -> Result<Vec<RumorCategory>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT category FROM rumor_categories WHERE rumor_id = ?1 ORDER BY position")?;
        let names = stmt
            .query_map(params![id_bytes], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RumorCategory::normalize(names))
    }

    fn load_variants(&self, id_bytes: &[u8]) -> Result<Vec<Variant>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, created_at, parent_variant_id, entity_id, mutation_metadata
             FROM variants WHERE rumor_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![id_bytes], |row| {
                let parent: Option<Vec<u8>> = row.get(3)?;
                let parent_variant_id = match parent {
                    Some(bytes) => Some(VariantId::from_bytes(&bytes).ok_or_else(|| {
                        conversion_error(3, rusqlite::types::Type::Blob, "Malformed parent variant id".to_string())
                    })?),
                    None => None,
                };
                Ok((
                    variant_id_column(row, 0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)? as u64,
                    parent_variant_id,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, content, created_at, parent_variant_id, entity_id, metadata)| {
                let mutation_metadata: BTreeMap<String, String> = serde_json::from_str(&metadata)?;
                Ok(Variant {
                    id,
                    content,
                    created_at,
                    parent_variant_id,
                    entity_id,
                    mutation_metadata,
                })
            })
            .collect()
    }

    fn load_spread(&self, id_bytes: &[u8]) -> Result<Vec<Spread>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT entity_id, variant_id, heard_from_entity_id, believability, heard_at, last_reinforced_at
             FROM spread WHERE rumor_id = ?1 ORDER BY entity_id",
        )?;
        let records = stmt
            .query_map(params![id_bytes], |row| {
                let mut record = Spread::new(
                    row.get::<_, String>(0)?,
                    variant_id_column(row, 1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, i64>(4)? as u64,
                );
                record.last_reinforced_at = row.get::<_, i64>(5)? as u64;
                Ok(record)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn assemble(&self, row: RumorRow) -> Result<Rumor, StoreError> {
        let id_bytes = row.id.to_bytes();
        let parts = RumorParts {
            id: row.id,
            created_at: row.created_at,
            originator_id: row.originator_id,
            original_content: row.original_content,
            categories: self.load_categories(&id_bytes)?,
            severity: row.severity,
            truth_value: row.truth_value,
            variants: self.load_variants(&id_bytes)?,
            spread: self.load_spread(&id_bytes)?,
            status: row.status,
            version: row.version,
        };
        Ok(Rumor::from_parts(parts))
    }

    /// Run a rumor listing, skipping rows that cannot be decoded
    ///
    /// One corrupt rumor must not hide the rest; it is logged and left out.
    /// `get_rumor` still reports the error for that id.
    fn query_rows(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Rumor>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, rumor_row)?;

        let mut rumors = Vec::new();
        for row in rows {
            let rumor = match row {
                Ok(row) => {
                    let id = row.id;
                    self.assemble(row).map_err(|e| (Some(id), e))
                }
                Err(e) => Err((None, StoreError::from(e))),
            };
            match rumor {
                Ok(rumor) => rumors.push(rumor),
                Err((id, StoreError::Database(e))) if !is_decode_error(&e) => {
                    tracing::error!(rumor_id = ?id, "Rumor listing failed: {}", e);
                    return Err(StoreError::Database(e));
                }
                Err((id, e)) => {
                    tracing::warn!(rumor_id = ?id, "Skipping undecodable rumor: {}", e);
                }
            }
        }
        Ok(rumors)
    }
}

impl RumorStore for SqliteStore {
    type Error = StoreError;

    fn save_rumor(&mut self, rumor: &mut Rumor) -> Result<(), Self::Error> {
        let id_bytes = rumor.id().to_bytes();
        let tx = self.conn.transaction()?;

        let next_version = rumor.version + 1;

        if rumor.version == 0 {
            if let Some(found) = Self::stored_version(&tx, &id_bytes)? {
                return Err(StoreError::VersionConflict {
                    id: rumor.id(),
                    expected: 0,
                    found,
                });
            }
            tx.execute(
                "INSERT INTO rumors
                 (id, originator_id, original_content, severity, severity_rank, truth_value, status, created_at, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    &id_bytes[..],
                    rumor.originator_id(),
                    rumor.original_content(),
                    rumor.severity.as_str(),
                    rumor.severity as i64,
                    rumor.truth_value(),
                    rumor.status.as_str(),
                    rumor.created_at() as i64,
                    next_version as i64,
                ],
            )?;
        } else {
            let changed = tx.execute(
                "UPDATE rumors
                 SET severity = ?1, severity_rank = ?2, truth_value = ?3, status = ?4, version = ?5
                 WHERE id = ?6 AND version = ?7",
                params![
                    rumor.severity.as_str(),
                    rumor.severity as i64,
                    rumor.truth_value(),
                    rumor.status.as_str(),
                    next_version as i64,
                    &id_bytes[..],
                    rumor.version as i64,
                ],
            )?;
            if changed == 0 {
                return match Self::stored_version(&tx, &id_bytes)? {
                    Some(found) => Err(StoreError::VersionConflict {
                        id: rumor.id(),
                        expected: rumor.version,
                        found,
                    }),
                    None => Err(StoreError::NotFound(rumor.id().to_string())),
                };
            }
        }

        Self::write_children(&tx, rumor, &id_bytes)?;
        tx.commit()?;

        rumor.version = next_version;
        tracing::debug!(rumor_id = %rumor.id(), version = rumor.version, "Saved rumor");
        Ok(())
    }

    fn get_rumor(&self, id: RumorId) -> Result<Option<Rumor>, Self::Error> {
        let id_bytes = id.to_bytes();
        let sql = format!("SELECT {} FROM rumors WHERE id = ?1", RUMOR_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![&id_bytes[..]], rumor_row)
            .optional()?;
        row.map(|r| self.assemble(r)).transpose()
    }

    fn get_all_rumors(&self) -> Result<Vec<Rumor>, Self::Error> {
        let sql = format!("SELECT {} FROM rumors ORDER BY created_at, id", RUMOR_COLUMNS);
        self.query_rows(&sql, &[])
    }

    fn get_rumor_ids(&self) -> Result<Vec<RumorId>, Self::Error> {
        let mut stmt = self.conn.prepare("SELECT id FROM rumors ORDER BY created_at, id")?;
        let ids = stmt
            .query_map([], |row| rumor_id_column(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn get_rumors_by_entity(&self, entity_id: &str) -> Result<Vec<Rumor>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM rumors r
             WHERE EXISTS (SELECT 1 FROM spread s WHERE s.rumor_id = r.id AND s.entity_id = ?1)
             ORDER BY created_at, id",
            RUMOR_COLUMNS
        );
        self.query_rows(&sql, &[&entity_id])
    }

    fn get_rumors_by_filters(&self, query: &RumorQuery) -> Result<Vec<Rumor>, Self::Error> {
        let mut sql = format!("SELECT {} FROM rumors r WHERE 1=1", RUMOR_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(min) = query.min_severity {
            sql.push_str(" AND severity_rank >= ?");
            params.push(Box::new(min as i64));
        }

        if !query.categories.is_empty() {
            let placeholders = vec!["?"; query.categories.len()].join(", ");
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM rumor_categories c WHERE c.rumor_id = r.id AND c.category IN ({}))",
                placeholders
            ));
            for category in &query.categories {
                params.push(Box::new(category.as_str()));
            }
        }

        if let Some(entity) = &query.entity_id {
            sql.push_str(" AND EXISTS (SELECT 1 FROM spread s WHERE s.rumor_id = r.id AND s.entity_id = ?");
            params.push(Box::new(entity.clone()));
            if let Some(min) = query.min_believability {
                sql.push_str(" AND s.believability >= ?");
                params.push(Box::new(min));
            }
            sql.push(')');
        }

        sql.push_str(" ORDER BY created_at, id");

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rumors = self.query_rows(&sql, &param_refs)?;

        // Substring matching stays in Rust: SQLite's LIKE only folds ASCII case
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rumors
            .into_iter()
            .filter(|r| query.matches(r))
            .take(limit)
            .collect())
    }

    fn delete_rumor(&mut self, id: RumorId) -> Result<bool, Self::Error> {
        let id_bytes = id.to_bytes();
        let removed = self
            .conn
            .execute("DELETE FROM rumors WHERE id = ?1", params![&id_bytes[..]])?;
        Ok(removed > 0)
    }

    fn is_conflict(error: &Self::Error) -> bool {
        error.is_conflict()
    }
}
