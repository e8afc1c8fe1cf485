use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rusqlite::types::Value;
use rusqlite::{Connection, params};

use crate::frame::{Cell, Frame};
use crate::page_cache::app_cache_dir;

pub const BASETABLE_TABLE: &str = "all_stats";
pub const PREDICTORS_TABLE: &str = "mvp_predictors";

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("mvp_stats.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS pipeline_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            year_start INTEGER NOT NULL,
            year_end INTEGER NOT NULL,
            seasons_attempted INTEGER NOT NULL,
            seasons_succeeded INTEGER NOT NULL,
            basetable_rows INTEGER NOT NULL,
            failures_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Drop-and-recreate handoff: each run replaces the named table wholesale
/// inside one transaction, so readers only ever see a complete dataset.
/// Fully numeric frame columns become REAL, everything else TEXT.
pub fn replace_table(conn: &mut Connection, name: &str, frame: &Frame) -> Result<()> {
    if frame.columns.is_empty() {
        return Err(anyhow!("refusing to write table {name} with no columns"));
    }

    let tx = conn.transaction().context("begin replace transaction")?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))
        .context("drop previous table")?;

    // Stat headers carry %, / and digits, so every identifier is quoted.
    let decls = frame
        .columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let ty = if column_is_numeric(frame, idx) {
                "REAL"
            } else {
                "TEXT"
            };
            format!("{} {}", quote_ident(col), ty)
        })
        .collect::<Vec<_>>()
        .join(", ");
    tx.execute_batch(&format!("CREATE TABLE {} ({decls})", quote_ident(name)))
        .context("create table")?;

    {
        let placeholders = (1..=frame.columns.len())
            .map(|n| format!("?{n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = tx
            .prepare(&format!(
                "INSERT INTO {} VALUES ({placeholders})",
                quote_ident(name)
            ))
            .context("prepare insert")?;
        for row in &frame.rows {
            stmt.execute(rusqlite::params_from_iter(row.iter().map(cell_value)))
                .context("insert row")?;
        }
    }

    tx.commit().context("commit replace transaction")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RunLedgerEntry {
    pub started_at: String,
    pub finished_at: String,
    pub year_start: u16,
    pub year_end: u16,
    pub seasons_attempted: usize,
    pub seasons_succeeded: usize,
    pub basetable_rows: usize,
    pub failures: Vec<String>,
}

pub fn record_run(conn: &Connection, entry: &RunLedgerEntry) -> Result<i64> {
    let failures_json =
        serde_json::to_string(&entry.failures).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO pipeline_runs(
            started_at, finished_at, year_start, year_end,
            seasons_attempted, seasons_succeeded, basetable_rows, failures_json
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.started_at,
            entry.finished_at,
            entry.year_start as i64,
            entry.year_end as i64,
            entry.seasons_attempted as i64,
            entry.seasons_succeeded as i64,
            entry.basetable_rows as i64,
            failures_json,
        ],
    )
    .context("insert pipeline run")?;
    Ok(conn.last_insert_rowid())
}

fn column_is_numeric(frame: &Frame, idx: usize) -> bool {
    !frame.rows.is_empty()
        && frame
            .rows
            .iter()
            .all(|row| matches!(row[idx], Cell::Number(_)))
}

fn cell_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Text(value) => Value::Text(value.clone()),
        Cell::Number(value) => Value::Real(*value),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
