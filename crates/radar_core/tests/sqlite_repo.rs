use chrono::{DateTime, Duration, TimeZone, Utc};
use radar_core::db::open_db_in_memory;
use radar_core::{
    Kind, Lane, Level, RadarItem, RadarPatch, RadarRepository, RadarStatus, RepoError,
    SqliteRadarRepository, TocAxis,
};
use rusqlite::Connection;

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn item(id: &str, title: &str) -> RadarItem {
    RadarItem {
        id: id.to_string(),
        title: title.to_string(),
        source: "SRF".to_string(),
        url: format!("https://www.srf.ch/news/{id}"),
        lane: Lane::Politik,
        kind: Kind::Vorstoss,
        score: 72.5,
        impact: Level::High,
        urgency: Level::Low,
        toc_axis: Some(TocAxis::Repraesentation),
        status: RadarStatus::Watchlist,
        created_at: at(),
        updated_at: at(),
    }
}

#[test]
fn insert_and_list_roundtrip_in_insertion_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRadarRepository::try_new(&mut conn).unwrap();

    repo.insert_radar_item(&item("radar_b", "Zweiter Vorstoss")).unwrap();
    repo.insert_radar_item(&item("radar_a", "Erster Vorstoss")).unwrap();

    let rows = repo.list_radar().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "radar_b");
    assert_eq!(rows[1], item("radar_a", "Erster Vorstoss"));
}

#[test]
fn insert_rejects_invalid_items() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRadarRepository::try_new(&mut conn).unwrap();

    let mut invalid = item("radar_a", "Titel");
    invalid.url = "ftp://example.com/file".to_string();

    let err = repo.insert_radar_item(&invalid).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.list_radar().unwrap().is_empty());
}

#[test]
fn patch_updates_fields_and_timestamp() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRadarRepository::try_new(&mut conn).unwrap();
    repo.insert_radar_item(&item("radar_a", "Titel")).unwrap();

    let later = at() + Duration::hours(2);
    let patch = RadarPatch {
        status: Some(RadarStatus::Accepted),
        toc_axis: Some(None),
        score: Some(140.0),
        ..RadarPatch::default()
    };
    let patched = repo.patch_radar_item("radar_a", &patch, later).unwrap();

    assert_eq!(patched.status, RadarStatus::Accepted);
    assert_eq!(patched.toc_axis, None);
    assert_eq!(patched.score, 100.0);
    assert_eq!(patched.updated_at, later);
    assert_eq!(patched.created_at, at());
    assert_eq!(repo.list_radar().unwrap(), vec![patched]);
}

#[test]
fn noop_patch_keeps_updated_at() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRadarRepository::try_new(&mut conn).unwrap();
    repo.insert_radar_item(&item("radar_a", "Titel")).unwrap();

    let patch = RadarPatch {
        status: Some(RadarStatus::Watchlist),
        ..RadarPatch::default()
    };
    let patched = repo
        .patch_radar_item("radar_a", &patch, at() + Duration::days(1))
        .unwrap();
    assert_eq!(patched.updated_at, at());
}

#[test]
fn patch_unknown_id_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRadarRepository::try_new(&mut conn).unwrap();

    let patch = RadarPatch {
        status: Some(RadarStatus::Rejected),
        ..RadarPatch::default()
    };
    let err = repo.patch_radar_item("radar_missing", &patch, at()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == "radar_missing"));
}

#[test]
fn replace_radar_swaps_whole_collection() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRadarRepository::try_new(&mut conn).unwrap();
    repo.insert_radar_item(&item("radar_a", "Alt")).unwrap();

    let replacement = vec![item("radar_c", "Neu C"), item("radar_b", "Neu B")];
    repo.replace_radar(&replacement).unwrap();

    assert_eq!(repo.list_radar().unwrap(), replacement);
}

#[test]
fn replace_radar_is_all_or_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRadarRepository::try_new(&mut conn).unwrap();
    repo.insert_radar_item(&item("radar_a", "Alt")).unwrap();

    // Duplicate ids violate the UNIQUE constraint halfway through.
    let replacement = vec![item("radar_b", "Neu"), item("radar_b", "Neu")];
    assert!(repo.replace_radar(&replacement).is_err());

    let rows = repo.list_radar().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "radar_a");
}

#[test]
fn try_new_requires_migrated_schema() {
    let mut conn = Connection::open_in_memory().unwrap();
    let result = SqliteRadarRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("radar_items"))
    ));
}

#[test]
fn invalid_persisted_rows_are_reported() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO radar_items (
            id, title, source, url, lane, kind, score, impact, urgency, status,
            created_at, updated_at
        ) VALUES (
            'radar_x', 'Titel', 'SRF', 'not a url', 'politik', 'news', 50,
            'med', 'med', 'new', 'yesterday', '2026-03-01T12:00:00.000Z'
        );",
        [],
    )
    .unwrap();

    let repo = SqliteRadarRepository::try_new(&mut conn).unwrap();
    let err = repo.list_radar().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
