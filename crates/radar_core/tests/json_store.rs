use chrono::{DateTime, Duration, TimeZone, Utc};
use radar_core::{
    JsonFileRadarRepository, Kind, Lane, Level, RadarItem, RadarPatch, RadarRepository,
    RadarStatus, RepoError,
};
use serde_json::{json, Value};

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn item(id: &str) -> RadarItem {
    RadarItem {
        id: id.to_string(),
        title: format!("Signal {id}"),
        source: "Tages-Anzeiger".to_string(),
        url: format!("https://www.tagesanzeiger.ch/{id}"),
        lane: Lane::Medienarbeit,
        kind: Kind::News,
        score: 66.0,
        impact: Level::Med,
        urgency: Level::High,
        toc_axis: None,
        status: RadarStatus::New,
        created_at: at(),
        updated_at: at(),
    }
}

#[test]
fn missing_file_is_an_empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRadarRepository::new(dir.path().join("db.json"));

    assert!(repo.list_radar().unwrap().is_empty());
}

#[test]
fn insert_creates_file_with_camel_case_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("db.json");
    let mut repo = JsonFileRadarRepository::new(&path);

    repo.insert_radar_item(&item("radar_a")).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.ends_with('\n'));
    let document: Value = serde_json::from_str(&raw).unwrap();
    let row = &document["radar"][0];
    assert_eq!(row["id"], "radar_a");
    assert_eq!(row["createdAt"], "2026-03-01T12:00:00.000Z");
    assert_eq!(row["urgency"], "high");
    assert!(row.get("tocAxis").is_none());
}

#[test]
fn sibling_keys_survive_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(
        &path,
        serde_json::to_string(&json!({
            "tasks": [{ "id": "t1" }],
            "radar": []
        }))
        .unwrap(),
    )
    .unwrap();

    let mut repo = JsonFileRadarRepository::new(&path);
    repo.insert_radar_item(&item("radar_a")).unwrap();

    let document: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document["tasks"][0]["id"], "t1");
    assert_eq!(document["radar"].as_array().unwrap().len(), 1);
}

#[test]
fn records_written_by_other_tools_are_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(
        &path,
        r#"{
  "radar": [
    {
      "id": "radar_lx2k9a_abc12",
      "title": "Pelzimport-Verbot",
      "source": "SRF",
      "url": "https://www.srf.ch/pelz",
      "lane": "politik",
      "kind": "vorstoss",
      "score": 81,
      "impact": "high",
      "urgency": "med",
      "tocAxis": "weltbild",
      "status": "accepted",
      "createdAt": "2026-02-01T08:00:00.000Z",
      "updatedAt": "2026-02-02T08:00:00.000Z"
    }
  ]
}"#,
    )
    .unwrap();

    let repo = JsonFileRadarRepository::new(&path);
    let rows = repo.list_radar().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].score, 81.0);
    assert_eq!(rows[0].status, RadarStatus::Accepted);
    assert_eq!(rows[0].lane, Lane::Politik);
}

#[test]
fn corrupt_file_is_reported_not_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut repo = JsonFileRadarRepository::new(&path);
    assert!(matches!(repo.list_radar(), Err(RepoError::InvalidData(_))));
    assert!(matches!(
        repo.insert_radar_item(&item("radar_a")),
        Err(RepoError::InvalidData(_))
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn non_array_radar_field_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, r#"{ "radar": { "id": "x" } }"#).unwrap();

    let repo = JsonFileRadarRepository::new(&path);
    assert!(matches!(repo.list_radar(), Err(RepoError::InvalidData(_))));
}

#[test]
fn patch_persists_and_unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let mut repo = JsonFileRadarRepository::new(&path);
    repo.insert_radar_item(&item("radar_a")).unwrap();

    let later = at() + Duration::minutes(5);
    let patch = RadarPatch {
        status: Some(RadarStatus::Rejected),
        ..RadarPatch::default()
    };
    let patched = repo.patch_radar_item("radar_a", &patch, later).unwrap();
    assert_eq!(patched.status, RadarStatus::Rejected);
    assert_eq!(patched.updated_at, later);

    let reopened = JsonFileRadarRepository::new(&path);
    assert_eq!(reopened.list_radar().unwrap(), vec![patched]);

    let err = repo.patch_radar_item("radar_b", &patch, later).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn duplicate_ids_are_rejected_on_insert() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = JsonFileRadarRepository::new(dir.path().join("db.json"));
    repo.insert_radar_item(&item("radar_a")).unwrap();

    assert!(repo.insert_radar_item(&item("radar_a")).is_err());
    assert_eq!(repo.list_radar().unwrap().len(), 1);
}

#[test]
fn unrecognized_status_is_read_as_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let mut archived = serde_json::to_value(item("radar_old")).unwrap();
    archived["status"] = json!("archived");
    let document = json!({ "radar": [serde_json::to_value(item("radar_a")).unwrap(), archived] });
    std::fs::write(&path, document.to_string()).unwrap();

    let repo = JsonFileRadarRepository::new(&path);
    let rows = repo.list_radar().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].status, RadarStatus::New);
    assert_eq!(rows[1].status, RadarStatus::Unknown);
}
