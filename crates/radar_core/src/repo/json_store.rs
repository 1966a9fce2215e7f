//! JSON-file radar repository.
//!
//! # Responsibility
//! - Persist the radar collection as the `radar` array of a JSON document.
//! - Preserve sibling top-level keys (`tasks`, `entities`, `links`, ...) that
//!   other tools keep in the same document.
//!
//! # Invariants
//! - A missing file is an empty collection; a corrupt file is an error and is
//!   never reset.
//! - Every save rewrites the whole document through a temp file persisted
//!   over the target, so readers never observe a half-written file.

use crate::model::radar_item::{RadarItem, RadarPatch};
use crate::repo::radar_repo::{RadarRepository, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use log::{debug, error};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const RADAR_KEY: &str = "radar";

/// Radar repository over one JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileRadarRepository {
    path: PathBuf,
}

impl JsonFileRadarRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_document(&self) -> RepoResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(RepoError::InvalidData(format!(
                "`{}` is not a JSON object",
                self.path.display()
            ))),
            Err(err) => Err(RepoError::InvalidData(format!(
                "`{}` is not valid JSON: {err}",
                self.path.display()
            ))),
        }
    }

    fn load(&self) -> RepoResult<(Map<String, Value>, Vec<RadarItem>)> {
        let document = self.load_document()?;
        let items = match document.get(RADAR_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(rows)) => rows
                .iter()
                .enumerate()
                .map(|(index, row)| parse_row(index, row))
                .collect::<RepoResult<Vec<_>>>()?,
            Some(_) => {
                return Err(RepoError::InvalidData(format!(
                    "`{RADAR_KEY}` in `{}` is not an array",
                    self.path.display()
                )))
            }
        };
        Ok((document, items))
    }

    fn save(&self, mut document: Map<String, Value>, items: &[RadarItem]) -> RepoResult<()> {
        document.insert(RADAR_KEY.to_string(), serde_json::to_value(items)?);
        let mut serialized = serde_json::to_string_pretty(&Value::Object(document))?;
        serialized.push('\n');

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(serialized.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| {
            error!(
                "event=radar_save module=repo status=error error_code=persist_failed error={}",
                err.error
            );
            RepoError::Io(err.error)
        })?;

        debug!(
            "event=radar_save module=repo status=ok backend=json rows={}",
            items.len()
        );
        Ok(())
    }
}

impl RadarRepository for JsonFileRadarRepository {
    fn list_radar(&self) -> RepoResult<Vec<RadarItem>> {
        self.load().map(|(_, items)| items)
    }

    fn insert_radar_item(&mut self, item: &RadarItem) -> RepoResult<()> {
        item.validate()?;
        let (document, mut items) = self.load()?;
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(RepoError::InvalidData(format!(
                "duplicate radar id `{}`",
                item.id
            )));
        }
        items.push(item.clone());
        self.save(document, &items)
    }

    fn patch_radar_item(
        &mut self,
        id: &str,
        patch: &RadarPatch,
        now: DateTime<Utc>,
    ) -> RepoResult<RadarItem> {
        let (document, mut items) = self.load()?;
        let slot = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;

        let mut updated = slot.clone();
        if !patch.apply_to(&mut updated, now) {
            return Ok(updated);
        }
        updated.validate()?;
        *slot = updated.clone();

        self.save(document, &items)?;
        Ok(updated)
    }

    fn replace_radar(&mut self, items: &[RadarItem]) -> RepoResult<()> {
        for item in items {
            item.validate()?;
        }
        let (document, _) = self.load()?;
        self.save(document, items)
    }
}

fn parse_row(index: usize, row: &Value) -> RepoResult<RadarItem> {
    let item: RadarItem = serde_json::from_value(row.clone())
        .map_err(|err| RepoError::InvalidData(format!("radar[{index}]: {err}")))?;
    item.validate()
        .map_err(|err| RepoError::InvalidData(format!("radar[{index}]: {err}")))?;
    Ok(item)
}
