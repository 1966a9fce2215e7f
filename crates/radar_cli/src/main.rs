mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use log::info;
use radar_core::{
    init_logging, init_stderr_logging, open_db, run_news_sync, IngestPayload, JsonFileFeed,
    JsonFileRadarRepository, PatchPayload, RadarConfig, RadarQuery, RadarRepository, RadarService,
    SqliteRadarRepository, SystemClock,
};
use serde::Serialize;
use serde_json::{Map, Value};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.log_dir.as_deref() {
        Some(dir) => init_logging(&cli.log_level, dir),
        None => init_stderr_logging(&cli.log_level),
    }?;

    let config = match cli.config.as_deref() {
        Some(path) => RadarConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RadarConfig::default(),
    };

    match cli.sqlite.as_deref() {
        Some(path) => {
            let mut conn = open_db(path)
                .with_context(|| format!("failed to open database {}", path.display()))?;
            let repo = SqliteRadarRepository::try_new(&mut conn)?;
            execute(repo, cli.command, &config)
        }
        None => execute(
            JsonFileRadarRepository::new(&cli.store),
            cli.command,
            &config,
        ),
    }
}

fn execute<R: RadarRepository>(
    repo: R,
    command: Commands,
    config: &RadarConfig,
) -> anyhow::Result<()> {
    let mut service = RadarService::new(repo).with_ranking_config(config.ranking.clone());
    match command {
        Commands::List => print_json(&service.list()?),
        Commands::Query { mode, limit } => {
            let query = RadarQuery::parse(mode.as_deref(), limit.as_deref());
            print_json(&service.query(&query)?)
        }
        Commands::Ingest { json, fields } => {
            let mut body = base_body(json.as_deref())?;
            fields.merge_into(&mut body);
            print_json(&service.ingest_payload(IngestPayload::from_map(body))?)
        }
        Commands::Patch {
            id,
            json,
            clear_toc_axis,
            fields,
        } => {
            let mut body = base_body(json.as_deref())?;
            fields.merge_into(&mut body);
            if clear_toc_axis {
                body.insert("tocAxis".to_string(), Value::Null);
            }
            print_json(&service.patch_payload(&id, PatchPayload::from_map(body))?)
        }
        Commands::Sync { feed } => {
            info!("event=cli_sync module=cli feed={}", feed.display());
            let mut repo = service.into_repository();
            let feed = JsonFileFeed::new(feed);
            print_json(&run_news_sync(&mut repo, &feed, &config.sync, &SystemClock)?)
        }
    }
}

fn base_body(raw: Option<&str>) -> anyhow::Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw).context("--json is not valid JSON")? {
        Value::Object(fields) => Ok(fields),
        _ => anyhow::bail!("--json must be a JSON object"),
    }
}

fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}
