use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "radar",
    version,
    about = "Ingest, triage and rank advocacy radar signals"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "data/db.json",
        help = "JSON document holding the radar collection"
    )]
    pub store: PathBuf,

    #[arg(
        long,
        global = true,
        help = "Use a SQLite database instead of the JSON document"
    )]
    pub sqlite: Option<PathBuf>,

    #[arg(long, global = true, help = "JSON configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        default_value = "warn",
        help = "trace|debug|info|warn|error|off"
    )]
    pub log_level: String,

    #[arg(
        long,
        global = true,
        help = "Absolute directory for rolling log files (default: stderr)"
    )]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the deduplicated collection in first-seen order
    List,
    /// Print one ranked view of the collection
    Query {
        #[arg(long, help = "stats|top|board|actionable")]
        mode: Option<String>,
        #[arg(long)]
        limit: Option<String>,
    },
    /// Add a signal, merging it into an existing duplicate
    Ingest {
        #[arg(long, help = "Raw JSON body; field flags override its keys")]
        json: Option<String>,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Edit fields of one item
    Patch {
        id: String,
        #[arg(long, help = "Raw JSON body; field flags override its keys")]
        json: Option<String>,
        #[arg(long, conflicts_with = "toc_axis", help = "Remove the tocAxis tag")]
        clear_toc_axis: bool,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Run one news-sync pass against a published feed
    Sync {
        #[arg(long, default_value = "data/feed.json")]
        feed: PathBuf,
    },
}

/// Item fields as raw strings; the core payload parsers decide validity.
#[derive(Args, Debug, Default)]
pub struct FieldArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long, help = "politik|medienarbeit|buchprojekt")]
    pub lane: Option<String>,
    #[arg(long, help = "news|vorstoss|kampagne|analyse")]
    pub kind: Option<String>,
    #[arg(long, help = "0-100, decimal comma accepted")]
    pub score: Option<String>,
    #[arg(long, help = "low|med|high")]
    pub impact: Option<String>,
    #[arg(long, help = "low|med|high")]
    pub urgency: Option<String>,
    #[arg(long)]
    pub toc_axis: Option<String>,
    #[arg(long, help = "new|accepted|rejected|watchlist")]
    pub status: Option<String>,
}

impl FieldArgs {
    /// Writes every supplied flag into `fields` under its wire name.
    pub fn merge_into(self, fields: &mut Map<String, Value>) {
        let pairs = [
            ("title", self.title),
            ("source", self.source),
            ("url", self.url),
            ("lane", self.lane),
            ("kind", self.kind),
            ("score", self.score),
            ("impact", self.impact),
            ("urgency", self.urgency),
            ("tocAxis", self.toc_axis),
            ("status", self.status),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value));
            }
        }
    }
}
