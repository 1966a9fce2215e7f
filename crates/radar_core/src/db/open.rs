//! Connection bootstrap: pragmas, then migrations.

use super::migrations::migrate;
use super::DbResult;
use log::{info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy)]
enum Location<'a> {
    File(&'a Path),
    Memory,
}

impl Location<'_> {
    fn label(self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }

    fn connect(self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}

/// Opens (creating if needed) a database file with the schema up to date.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open(Location::File(path.as_ref()))
}

/// Opens a private in-memory database with the schema up to date.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open(Location::Memory)
}

fn open(location: Location<'_>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result: DbResult<Connection> = location.connect().map_err(Into::into).and_then(|mut conn| {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrate(&mut conn)?;
        Ok(conn)
    });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            location.label(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=db_open module=db status=error mode={} duration_ms={} error={err}",
            location.label(),
            started_at.elapsed().as_millis()
        ),
    }
    result
}
