use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, params};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::normalize::StatTable;

/// Outcome of one bulk insert. `conflicts` counts rows skipped because an
/// identical key was already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub inserted: usize,
    pub conflicts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub collection: String,
    pub team: String,
    pub year: u16,
    pub bucket: String,
    pub document: Map<String, Value>,
    pub inserted_at: String,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS stat_records (
            record_id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            team TEXT NOT NULL,
            year INTEGER NOT NULL,
            bucket TEXT NOT NULL,
            document TEXT NOT NULL,
            inserted_at TEXT NOT NULL,
            UNIQUE (collection, team, year, bucket, document)
        );
        CREATE INDEX IF NOT EXISTS idx_stat_records_team_year ON stat_records(team, year);
        "#,
    )?;
    Ok(())
}

/// Writes every row of `table` into `collection`, tagged with team and year.
///
/// A row identical to one already stored for the same (collection, team,
/// year, bucket) is skipped and counted, never raised. A row whose values
/// changed is appended. An empty table is a no-op.
pub fn save_table(
    conn: &mut Connection,
    table: &StatTable,
    collection: &str,
    team: &str,
    year: u16,
) -> Result<PersistReport> {
    if table.is_empty() {
        return Ok(PersistReport::default());
    }

    let now = Utc::now().to_rfc3339();
    let mut report = PersistReport::default();
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO stat_records (collection, team, year, bucket, document, inserted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in &table.rows {
            let document = row_document(table, row.bucket.as_str(), &row.values, team, year);
            let changed = stmt.execute(params![
                collection,
                team,
                i64::from(year),
                row.bucket,
                Value::Object(document).to_string(),
                now,
            ])?;
            if changed == 0 {
                report.conflicts += 1;
            } else {
                report.inserted += 1;
            }
        }
    }
    tx.commit()?;

    if report.conflicts > 0 {
        warn!(
            collection,
            team,
            year,
            conflicts = report.conflicts,
            "some records were not inserted due to duplicates"
        );
    }
    debug!(collection, team, year, inserted = report.inserted, "persisted table");
    Ok(report)
}

pub fn load_records(
    conn: &Connection,
    collection: &str,
    team: &str,
    year: u16,
) -> Result<Vec<StoredRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT collection, team, year, bucket, document, inserted_at
        FROM stat_records
        WHERE collection = ?1 AND team = ?2 AND year = ?3
        ORDER BY record_id ASC
        "#,
    )?;
    let rows = stmt.query_map(params![collection, team, i64::from(year)], |row| {
        let raw: String = row.get(4)?;
        let document = serde_json::from_str::<Map<String, Value>>(&raw).unwrap_or_default();
        Ok(StoredRecord {
            collection: row.get(0)?,
            team: row.get(1)?,
            year: row.get::<_, u16>(2)?,
            bucket: row.get(3)?,
            document,
            inserted_at: row.get(5)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn count_records(conn: &Connection, collection: &str) -> Result<usize> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM stat_records WHERE collection = ?1",
        params![collection],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(n).unwrap_or(0))
}

/// Flat document for one row: bucket, every metric (null when empty), team, year.
fn row_document(
    table: &StatTable,
    bucket: &str,
    values: &[Option<f64>],
    team: &str,
    year: u16,
) -> Map<String, Value> {
    let mut doc = Map::new();
    doc.insert("index".to_string(), Value::from(bucket));
    for (column, value) in table.columns.iter().zip(values) {
        let cell = value
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        doc.insert(column.clone(), cell);
    }
    doc.insert("team".to_string(), Value::from(team));
    doc.insert("year".to_string(), Value::from(year));
    doc
}
