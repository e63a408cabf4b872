//! SQLite-backed transaction store.
//!
//! RULE: Only the store talks to the database.
//! The engine reads through the `TransactionSource` impl below and
//! never executes SQL directly.

use crate::{
    error::{RetentionError, RetentionResult},
    source::{TransactionFilter, TransactionRecord, TransactionSource},
    types::PartitionKey,
};
use rusqlite::{params, Connection};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct TransactionStore {
    conn: Mutex<Connection>,
}

impl TransactionStore {
    pub fn open(path: &str) -> RetentionResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> RetentionResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> RetentionResult<()> {
        self.conn()
            .execute_batch(include_str!("../../../migrations/001_transactions.sql"))?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Writes (ingestion and synthesizer only) ─────────────────

    pub fn insert_transaction(
        &self,
        partition: PartitionKey,
        record: &TransactionRecord,
    ) -> RetentionResult<()> {
        self.conn().execute(
            "INSERT INTO pos_transaction (
                 partition_id, customer_name, raw_phone, visit_date,
                 gross_payment, cover_charge
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                partition,
                record.customer_name,
                record.raw_phone,
                record.visit_date,
                record.gross_payment,
                record.cover_charge,
            ],
        )?;
        Ok(())
    }

    /// Insert many rows inside one SQLite transaction.
    pub fn insert_batch(
        &self,
        partition: PartitionKey,
        records: &[TransactionRecord],
    ) -> RetentionResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO pos_transaction (
                     partition_id, customer_name, raw_phone, visit_date,
                     gross_payment, cover_charge
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for r in records {
                stmt.execute(params![
                    partition,
                    r.customer_name,
                    r.raw_phone,
                    r.visit_date,
                    r.gross_payment,
                    r.cover_charge,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    // ── Reads ───────────────────────────────────────────────────

    pub fn count_for_partition(&self, partition: PartitionKey) -> RetentionResult<i64> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM pos_transaction WHERE partition_id = ?1",
            params![partition],
            |r| r.get(0),
        )?;
        Ok(n)
    }

    fn select_page(
        &self,
        partition: PartitionKey,
        offset: usize,
        limit: usize,
    ) -> rusqlite::Result<Vec<TransactionRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT customer_name, raw_phone, visit_date, gross_payment, cover_charge
             FROM pos_transaction
             WHERE partition_id = ?1
             ORDER BY id ASC
             LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
            .query_map(params![partition, limit as i64, offset as i64], |r| {
                Ok(TransactionRecord {
                    customer_name: r.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    raw_phone:     r.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    visit_date:    r.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    gross_payment: r.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                    cover_charge:  r.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl TransactionSource for TransactionStore {
    fn fetch_page(
        &self,
        filter: &TransactionFilter,
        offset: usize,
        limit: usize,
    ) -> RetentionResult<Vec<TransactionRecord>> {
        self.select_page(filter.partition, offset, limit)
            .map_err(|e| RetentionError::SourceUnavailable {
                offset,
                reason: e.to_string(),
            })
    }
}
