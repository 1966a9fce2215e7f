//! Ordered schema migrations.
//!
//! Migration `n` (1-based) is the `n`-th entry of `MIGRATIONS`; entries are
//! append-only.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

const MIGRATIONS: [&str; 2] = [
    include_str!("0001_radar_items.sql"),
    include_str!("0002_radar_indexes.sql"),
];

/// Schema version produced by a full migration run.
pub fn latest_version() -> u32 {
    MIGRATIONS.len() as u32
}

/// Reads `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Brings the schema to `latest_version()`, one transaction per step.
///
/// # Errors
/// - `SchemaTooNew` when the database is ahead of this build.
pub fn migrate(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    for (version, sql) in (1..).zip(MIGRATIONS).skip(found as usize) {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        info!("event=db_migrate module=db status=ok version={version}");
    }
    Ok(())
}
