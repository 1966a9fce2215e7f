use assert_cmd::Command;
use chrono::{Duration, SecondsFormat, Utc};
use predicates::str::contains;
use serde_json::{json, Value};
use std::path::Path;

fn radar(store: &Path) -> Command {
    let mut cmd = Command::cargo_bin("radar").unwrap();
    cmd.arg("--store").arg(store).arg("--log-level").arg("off");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn ingest_args(cmd: &mut Command, url: &str) {
    cmd.args([
        "ingest",
        "--title",
        "Motion zum Tierschutz",
        "--source",
        "Parlament",
        "--url",
        url,
        "--lane",
        "politik",
        "--kind",
        "vorstoss",
        "--score",
        "72,5",
    ]);
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("radar")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("ingest"))
        .stdout(contains("sync"));
}

#[test]
fn second_ingest_of_same_url_merges() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("db.json");

    let mut first = radar(&store);
    ingest_args(&mut first, "https://www.parlament.ch/motion/1?utm_source=mail");
    let created = stdout_json(&mut first);
    assert_eq!(created["outcome"], "created");
    assert_eq!(created["item"]["score"], json!(72.5));

    let mut second = radar(&store);
    ingest_args(&mut second, "https://parlament.ch/motion/1/");
    let merged = stdout_json(&mut second);
    assert_eq!(merged["outcome"], "merged");
    assert_eq!(merged["item"]["id"], created["item"]["id"]);

    let list = stdout_json(radar(&store).arg("list"));
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[test]
fn stats_view_counts_items() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("db.json");

    let mut ingest = radar(&store);
    ingest_args(&mut ingest, "https://www.parlament.ch/motion/2");
    ingest.assert().success();

    let stats = stdout_json(radar(&store).args(["query", "--mode", "stats"]));
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["fresh"], 1);
    assert_eq!(stats["lanePolitik"], 1);
}

#[test]
fn patch_updates_status_and_rejects_unknown_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("db.json");

    let mut ingest = radar(&store);
    ingest_args(&mut ingest, "https://www.parlament.ch/motion/3");
    let created = stdout_json(&mut ingest);
    let id = created["item"]["id"].as_str().unwrap().to_string();

    let patched = stdout_json(radar(&store).args(["patch", &id, "--status", "accepted"]));
    assert_eq!(patched["status"], "accepted");

    radar(&store)
        .args(["patch", "radar_missing", "--status", "accepted"])
        .assert()
        .failure()
        .stderr(contains("not found"));

    radar(&store)
        .args(["patch", &id, "--status", "vielleicht"])
        .assert()
        .failure();
}

#[test]
fn ingest_without_title_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("db.json");

    radar(&store)
        .args(["ingest", "--source", "SRF", "--url", "https://srf.ch/a"])
        .assert()
        .failure();
    assert!(!store.exists());
}

#[test]
fn sync_inserts_relevant_feed_items() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("db.json");
    let feed = dir.path().join("feed.json");
    let published = (Utc::now() - Duration::hours(2)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let document = json!([
        {
            "id": "https://www.srf.ch/news/tierschutz-neu",
            "title": "Neues Tierschutzgesetz in der Schweiz",
            "summary": "Der Bundesrat legt eine Revision vor.",
            "sourceId": "srf",
            "score": 0.8,
            "matchedKeywords": ["tierschutz"],
            "publishedAt": published
        },
        {
            "id": "https://example.com/wetter",
            "title": "Wetterbericht",
            "score": 0.9,
            "publishedAt": published
        }
    ]);
    std::fs::write(&feed, document.to_string()).unwrap();

    let report = stdout_json(radar(&store).arg("sync").arg("--feed").arg(&feed));
    assert_eq!(report, json!({ "inserted": 1, "skipped": 1, "total": 1 }));

    let list = stdout_json(radar(&store).arg("list"));
    assert_eq!(list[0]["lane"], "medienarbeit");
    assert_eq!(list[0]["kind"], "news");
}

#[test]
fn sqlite_backend_round_trips_through_cli() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("unused.json");
    let db = dir.path().join("radar.db");

    let mut ingest = radar(&store);
    ingest.arg("--sqlite").arg(&db);
    ingest_args(&mut ingest, "https://www.parlament.ch/motion/4");
    ingest.assert().success();

    let list = stdout_json(radar(&store).arg("--sqlite").arg(&db).arg("list"));
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert!(!store.exists());
}
