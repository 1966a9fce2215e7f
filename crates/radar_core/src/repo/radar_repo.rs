//! Radar repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the storage seam used by ingestion, views and news sync.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `RadarItem::validate()` before any mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `list_radar` returns rows in insertion order.
//! - Patch and bulk replace are all-or-nothing.

use crate::clock::{format_timestamp, parse_timestamp};
use crate::db::DbError;
use crate::model::radar_item::{
    Kind, Lane, Level, RadarId, RadarItem, RadarPatch, RadarStatus, RadarValidationError, TocAxis,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};

const RADAR_SELECT_SQL: &str = "SELECT
    id,
    title,
    source,
    url,
    lane,
    kind,
    score,
    impact,
    urgency,
    toc_axis,
    status,
    created_at,
    updated_at
FROM radar_items";

const RADAR_INSERT_SQL: &str = "INSERT INTO radar_items (
    id,
    title,
    source,
    url,
    lane,
    kind,
    score,
    impact,
    urgency,
    toc_axis,
    status,
    created_at,
    updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for radar persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RadarValidationError),
    Db(DbError),
    Io(std::io::Error),
    Json(serde_json::Error),
    NotFound(RadarId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "radar store unavailable: {err}"),
            Self::Json(err) => write!(f, "radar store encoding failed: {err}"),
            Self::NotFound(id) => write!(f, "radar item not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted radar data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<RadarValidationError> for RepoError {
    fn from(value: RadarValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Storage seam for the radar collection.
pub trait RadarRepository {
    /// Lists every stored item in insertion order.
    fn list_radar(&self) -> RepoResult<Vec<RadarItem>>;
    /// Appends one fully built item.
    fn insert_radar_item(&mut self, item: &RadarItem) -> RepoResult<()>;
    /// Applies `patch` to the item with `id` and returns the stored result.
    ///
    /// Fails with `RepoError::NotFound` when `id` is absent.
    fn patch_radar_item(
        &mut self,
        id: &str,
        patch: &RadarPatch,
        now: DateTime<Utc>,
    ) -> RepoResult<RadarItem>;
    /// Replaces the whole collection in one write.
    fn replace_radar(&mut self, items: &[RadarItem]) -> RepoResult<()>;
}

/// SQLite-backed radar repository.
pub struct SqliteRadarRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteRadarRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when migrations were not applied.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        if !table_exists(conn, "radar_items")? {
            return Err(RepoError::MissingRequiredTable("radar_items"));
        }
        Ok(Self { conn })
    }
}

impl RadarRepository for SqliteRadarRepository<'_> {
    fn list_radar(&self) -> RepoResult<Vec<RadarItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RADAR_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(parse_radar_row(row)?);
        }

        Ok(items)
    }

    fn insert_radar_item(&mut self, item: &RadarItem) -> RepoResult<()> {
        item.validate()?;
        insert_row(self.conn, item)?;
        Ok(())
    }

    fn patch_radar_item(
        &mut self,
        id: &str,
        patch: &RadarPatch,
        now: DateTime<Utc>,
    ) -> RepoResult<RadarItem> {
        let tx = self.conn.transaction()?;
        let mut item = load_in_tx(&tx, id)?.ok_or_else(|| RepoError::NotFound(id.to_string()))?;

        if !patch.apply_to(&mut item, now) {
            return Ok(item);
        }
        item.validate()?;

        tx.execute(
            "UPDATE radar_items
             SET
                title = ?2,
                source = ?3,
                url = ?4,
                lane = ?5,
                kind = ?6,
                score = ?7,
                impact = ?8,
                urgency = ?9,
                toc_axis = ?10,
                status = ?11,
                updated_at = ?12
             WHERE id = ?1;",
            params![
                item.id.as_str(),
                item.title.as_str(),
                item.source.as_str(),
                item.url.as_str(),
                item.lane.as_str(),
                item.kind.as_str(),
                item.score,
                item.impact.as_str(),
                item.urgency.as_str(),
                item.toc_axis.map(TocAxis::as_str),
                item.status.as_str(),
                format_timestamp(item.updated_at),
            ],
        )?;
        tx.commit()?;

        Ok(item)
    }

    fn replace_radar(&mut self, items: &[RadarItem]) -> RepoResult<()> {
        for item in items {
            item.validate()?;
        }

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM radar_items;", [])?;
        for item in items {
            insert_row(&tx, item)?;
        }
        tx.commit()?;

        Ok(())
    }
}

fn insert_row(conn: &Connection, item: &RadarItem) -> rusqlite::Result<usize> {
    conn.execute(
        RADAR_INSERT_SQL,
        params![
            item.id.as_str(),
            item.title.as_str(),
            item.source.as_str(),
            item.url.as_str(),
            item.lane.as_str(),
            item.kind.as_str(),
            item.score,
            item.impact.as_str(),
            item.urgency.as_str(),
            item.toc_axis.map(TocAxis::as_str),
            item.status.as_str(),
            format_timestamp(item.created_at),
            format_timestamp(item.updated_at),
        ],
    )
}

fn load_in_tx(tx: &Transaction<'_>, id: &str) -> RepoResult<Option<RadarItem>> {
    let item = tx
        .query_row(&format!("{RADAR_SELECT_SQL} WHERE id = ?1;"), [id], |row| {
            Ok(parse_radar_row(row))
        })
        .optional()?;
    item.transpose()
}

fn parse_radar_row(row: &Row<'_>) -> RepoResult<RadarItem> {
    let lane_text: String = row.get("lane")?;
    let kind_text: String = row.get("kind")?;
    let impact_text: String = row.get("impact")?;
    let urgency_text: String = row.get("urgency")?;
    let status_text: String = row.get("status")?;

    let toc_axis = match row.get::<_, Option<String>>("toc_axis")? {
        Some(value) => Some(parse_column(&value, "toc_axis", TocAxis::parse)?),
        None => None,
    };

    let item = RadarItem {
        id: row.get("id")?,
        title: row.get("title")?,
        source: row.get("source")?,
        url: row.get("url")?,
        lane: parse_column(&lane_text, "lane", Lane::parse)?,
        kind: parse_column(&kind_text, "kind", Kind::parse)?,
        score: row.get("score")?,
        impact: parse_column(&impact_text, "impact", Level::parse)?,
        urgency: parse_column(&urgency_text, "urgency", Level::parse)?,
        toc_axis,
        status: RadarStatus::from_stored(&status_text),
        created_at: parse_time_column(row, "created_at")?,
        updated_at: parse_time_column(row, "updated_at")?,
    };
    item.validate()?;
    Ok(item)
}

fn parse_column<T>(value: &str, column: &str, parse: fn(&str) -> Option<T>) -> RepoResult<T> {
    parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid value `{value}` in radar_items.{column}"))
    })
}

fn parse_time_column(row: &Row<'_>, column: &str) -> RepoResult<DateTime<Utc>> {
    let value: String = row.get(column)?;
    parse_timestamp(&value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid timestamp `{value}` in radar_items.{column}"))
    })
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
