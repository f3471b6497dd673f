//! Tabular adapter: SQLite key/value stores (`state.vscdb`).
//!
//! Rows live in a single `ItemTable(key, value)`. Purge deletes every row whose
//! key matches the term set. Matching happens in Rust, not in SQL `LIKE`, so
//! "sensitive" means the same thing here as in the other adapters.

use crate::core::error::ScrubError;
use crate::core::terms::MatchTermSet;
use crate::plugins::{Applied, parse_failure, write_failure};
use rusqlite::{Connection, OpenFlags, params};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const ITEM_TABLE: &str = "ItemTable";

/// Open an existing store read-write. Never creates a file and never changes
/// the journal mode, so a store that is only inspected stays byte-identical.
pub fn connect(path: &Path) -> Result<Connection, ScrubError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| parse_failure(path, e))?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(ScrubError::RusqliteError)?;
    Ok(conn)
}

/// Keys in table order that match `terms`.
pub fn matching_keys(conn: &Connection, path: &Path, terms: &MatchTermSet) -> Result<Vec<String>, ScrubError> {
    let sql = format!("SELECT key FROM {} ORDER BY rowid", ITEM_TABLE);
    let mut stmt = conn.prepare(&sql).map_err(|e| parse_failure(path, e))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, Option<String>>(0))
        .map_err(|e| parse_failure(path, e))?;

    let mut out = Vec::new();
    for row in rows {
        if let Some(key) = row.map_err(|e| parse_failure(path, e))? {
            if terms.matches(&key) {
                out.push(key);
            }
        }
    }
    Ok(out)
}

pub fn purge(path: &Path, terms: &MatchTermSet) -> Result<Applied, ScrubError> {
    let mut conn = connect(path)?;
    let keys = matching_keys(&conn, path, terms)?;
    if keys.is_empty() {
        debug!(path = %path.display(), "no matching rows");
        return Ok(Applied::Unchanged);
    }
    debug!(path = %path.display(), rows = keys.len(), "deleting matching rows");

    let tx = conn.transaction().map_err(|e| write_failure(path, e))?;
    let mut removed = 0;
    {
        let sql = format!("DELETE FROM {} WHERE key = ?1", ITEM_TABLE);
        let mut stmt = tx.prepare(&sql).map_err(|e| write_failure(path, e))?;
        for key in &keys {
            removed += stmt
                .execute(params![key])
                .map_err(|e| write_failure(path, e))?;
        }
    }
    tx.commit().map_err(|e| write_failure(path, e))?;

    Ok(Applied::removed(removed))
}

/// Integrity check plus a read of the item table.
pub fn verify(path: &Path) -> Result<(), ScrubError> {
    let conn = connect(path)?;
    let status: String = conn
        .query_row("PRAGMA quick_check", [], |row| row.get(0))
        .map_err(|e| parse_failure(path, e))?;
    if status != "ok" {
        return Err(parse_failure(path, format!("integrity check reported '{}'", status)));
    }
    let sql = format!("SELECT COUNT(*) FROM {}", ITEM_TABLE);
    conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
        .map_err(|e| parse_failure(path, e))?;
    Ok(())
}
