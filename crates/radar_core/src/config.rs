//! Radar configuration.
//!
//! # Responsibility
//! - Hold the vocabularies and thresholds used by ranking and news sync.
//! - Load overrides from a JSON file; every field falls back to defaults.
//!
//! # Invariants
//! - Term lists are trimmed, lower-cased and free of empty entries after
//!   loading. Ranking region terms are additionally diacritic-folded because
//!   they are matched against folded text.

use crate::canon::text::fold_diacritics;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_SWISS_TERMS: &[&str] = &[
    "schweiz",
    "suisse",
    "svizzera",
    "bern",
    "zurich",
    "zuerich",
    "basel",
    ".ch",
    "bundesrat",
    "nationalrat",
    "standerat",
    "staenderat",
];

const DEFAULT_DACH_TERMS: &[&str] = &[
    "deutschland",
    "osterreich",
    ".de",
    ".at",
    "germany",
    "austria",
    "dach",
];

const DEFAULT_NOISE_TERMS: &[&str] = &[
    "hundeschule",
    "haustier",
    "welpe",
    "katzenvideo",
    "tiervideo",
    "lustig",
];

const DEFAULT_RELEVANT_TERMS: &[&str] = &[
    "tierschutz",
    "tierrecht",
    "tierrechte",
    "nutztiere",
    "tierhaltung",
    "tierschutzgesetz",
    "tierschutzrecht",
    "schlachthof",
    "schlacht",
    "massentierhaltung",
    "tiertransport",
    "tierversuch",
    "wildtier",
    "zoo",
    "pelz",
    "animal welfare",
    "animal rights",
    "livestock",
    "factory farming",
    "animal law",
];

const DEFAULT_SYNC_REGION_TERMS: &[&str] = &[
    "schweiz",
    "bern",
    "zürich",
    "basel",
    "österreich",
    "deutschland",
    "dach",
    "eu",
    "europe",
    "england",
    "uk",
    "grossbritannien",
    "britain",
    "usa",
    "united states",
    "australien",
    "australia",
];

/// Configuration load error.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid radar config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadarConfig {
    pub ranking: RankingConfig,
    pub sync: SyncConfig,
}

/// Region vocabulary for the ranking region tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankingConfig {
    /// Terms giving region tier 3.
    pub swiss_terms: Vec<String>,
    /// Terms giving region tier 2.
    pub dach_terms: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            swiss_terms: to_owned_terms(DEFAULT_SWISS_TERMS),
            dach_terms: to_owned_terms(DEFAULT_DACH_TERMS),
        }
    }
}

/// Relevance vocabulary and thresholds for the news-sync job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Any match rejects the feed item.
    pub noise_terms: Vec<String>,
    /// At least one match required.
    pub relevant_terms: Vec<String>,
    /// At least one match required.
    pub region_terms: Vec<String>,
    /// Minimum external relevance score (0–1 scale).
    pub min_feed_score: f64,
    /// Maximum age of `publishedAt` in days.
    pub max_age_days: f64,
    pub max_inserts_per_run: usize,
    /// Upper bound of the stored collection after pruning.
    pub capacity: usize,
    /// Minimum score for non-curated items to survive pruning.
    pub retain_min_score: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            noise_terms: to_owned_terms(DEFAULT_NOISE_TERMS),
            relevant_terms: to_owned_terms(DEFAULT_RELEVANT_TERMS),
            region_terms: to_owned_terms(DEFAULT_SYNC_REGION_TERMS),
            min_feed_score: 0.7,
            max_age_days: 10.0,
            max_inserts_per_run: 30,
            capacity: 180,
            retain_min_score: 65.0,
        }
    }
}

impl RadarConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    /// - `ConfigError::Io` when the file cannot be read.
    /// - `ConfigError::Parse` when the document is not valid config JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parses configuration from JSON text and normalizes term lists.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        Ok(parsed.normalized())
    }

    fn normalized(mut self) -> Self {
        self.ranking.swiss_terms = normalize_terms(&self.ranking.swiss_terms, true);
        self.ranking.dach_terms = normalize_terms(&self.ranking.dach_terms, true);
        self.sync.noise_terms = normalize_terms(&self.sync.noise_terms, false);
        self.sync.relevant_terms = normalize_terms(&self.sync.relevant_terms, false);
        self.sync.region_terms = normalize_terms(&self.sync.region_terms, false);
        self
    }
}

fn normalize_terms(terms: &[String], fold: bool) -> Vec<String> {
    terms
        .iter()
        .map(|term| {
            let trimmed = term.trim();
            if fold {
                fold_diacritics(trimmed)
            } else {
                trimmed.to_lowercase()
            }
        })
        .filter(|term| !term.is_empty())
        .collect()
}

fn to_owned_terms(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|term| (*term).to_string()).collect()
}
