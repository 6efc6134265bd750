mod common;

use std::fs;

use assert_matches::assert_matches;
use common::utf8;
use pdf_harvester::domain::{EntityKey, StatusRecord, StatusTable};
use pdf_harvester::error::HarvestError;
use pdf_harvester::tabular::{ColumnMap, CsvStore, JsonStore, TableFormat, TabularStore};

fn key(value: &str) -> EntityKey {
    value.parse().unwrap()
}

#[test]
fn csv_entities_keep_candidate_order() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("input.csv"));
    fs::write(
        path.as_std_path(),
        "Name,BRnum,Pdf_URL,Report Html Address\nAcme, 10 ,http://p,http://f\nBeta,11,,\n,,http://orphan,\n",
    )
    .unwrap();

    let entities = CsvStore.read_entities(&path, &ColumnMap::default()).unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0].key, key("10"));
    assert_eq!(entities[0].candidate_urls, vec!["http://p", "http://f"]);
    assert_eq!(entities[1].candidate_urls, vec!["", ""]);
}

#[test]
fn fallback_column_is_optional() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("input.json"));
    fs::write(path.as_std_path(), r#"[{"BRnum": 7, "Pdf_URL": "http://p"}]"#).unwrap();

    let entities = JsonStore.read_entities(&path, &ColumnMap::default()).unwrap();
    assert_eq!(entities[0].key, key("7"));
    assert_eq!(entities[0].candidate_urls, vec!["http://p"]);
}

#[test]
fn missing_primary_column_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("input.csv"));
    fs::write(path.as_std_path(), "BRnum,Link\n1,http://x\n").unwrap();

    let err = CsvStore
        .read_entities(&path, &ColumnMap::default())
        .unwrap_err();
    assert_matches!(err, HarvestError::MissingColumn { column, .. } if column == "Pdf_URL");
}

#[test]
fn duplicate_input_keys_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("input.csv"));
    fs::write(path.as_std_path(), "BRnum,Pdf_URL\n1,a\n1,b\n").unwrap();

    let err = CsvStore
        .read_entities(&path, &ColumnMap::default())
        .unwrap_err();
    assert_matches!(err, HarvestError::DuplicateKey { key, .. } if key == "1");
}

#[test]
fn rows_with_unsafe_keys_are_skipped() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("input.csv"));
    fs::write(path.as_std_path(), "BRnum,Pdf_URL\n../etc,a\nok,b\n").unwrap();

    let entities = CsvStore.read_entities(&path, &ColumnMap::default()).unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].key, key("ok"));
}

#[test]
fn absent_metadata_reads_as_none() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("Metadata.csv"));
    for format in [TableFormat::Csv, TableFormat::Json] {
        let statuses = format
            .store()
            .read_statuses(&path, &ColumnMap::default())
            .unwrap();
        assert!(statuses.is_none());
    }
}

#[test]
fn metadata_with_unknown_status_leaves_key_out() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("Metadata.csv"));
    fs::write(
        path.as_std_path(),
        "BRnum,pdf_downloaded\n1,maybe\n2,\n3,YES\n4,no\n",
    )
    .unwrap();

    let statuses = CsvStore
        .read_statuses(&path, &ColumnMap::default())
        .unwrap()
        .unwrap();
    assert_eq!(statuses.len(), 2);
    assert!(!statuses.contains(&key("1")));
    assert!(!statuses.contains(&key("2")));
    assert_eq!(statuses.get(&key("3")), Some(true));
    assert_eq!(statuses.get(&key("4")), Some(false));
}

#[test]
fn metadata_without_status_column_reads_as_none() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("Metadata.json"));
    fs::write(path.as_std_path(), r#"[{"BRnum": "1", "done": "yes"}]"#).unwrap();

    let statuses = JsonStore
        .read_statuses(&path, &ColumnMap::default())
        .unwrap();
    assert!(statuses.is_none());
}

#[test]
fn duplicate_metadata_keys_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("Metadata.json"));
    fs::write(
        path.as_std_path(),
        r#"[{"BRnum": "1", "pdf_downloaded": "yes"}, {"BRnum": "1", "pdf_downloaded": "no"}]"#,
    )
    .unwrap();

    let err = JsonStore
        .read_statuses(&path, &ColumnMap::default())
        .unwrap_err();
    assert_matches!(err, HarvestError::DuplicateKey { .. });
}

#[test]
fn write_replaces_previous_table() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("nested").join("Metadata.json"));
    let columns = ColumnMap::default();

    let mut first = StatusTable::new();
    for (name, downloaded) in [("a", true), ("b", false), ("c", true)] {
        first
            .insert_unique(
                StatusRecord {
                    key: key(name),
                    downloaded,
                },
                "test",
            )
            .unwrap();
    }
    JsonStore.write_statuses(&path, &first, &columns).unwrap();

    let mut second = StatusTable::new();
    second
        .insert_unique(
            StatusRecord {
                key: key("b"),
                downloaded: true,
            },
            "test",
        )
        .unwrap();
    JsonStore.write_statuses(&path, &second, &columns).unwrap();

    let read_back = JsonStore.read_statuses(&path, &columns).unwrap().unwrap();
    assert_eq!(read_back, second);
    let leftovers = fs::read_dir(path.parent().unwrap().as_std_path())
        .unwrap()
        .count();
    assert_eq!(leftovers, 1);
}

#[test]
fn custom_columns_are_honoured() {
    let temp = tempfile::tempdir().unwrap();
    let path = utf8(temp.path().join("input.csv"));
    fs::write(path.as_std_path(), "id,url\nX,http://x\n").unwrap();
    let columns = ColumnMap {
        key: "id".to_string(),
        primary_url: "url".to_string(),
        fallback_url: None,
        status: "done".to_string(),
    };

    let entities = CsvStore.read_entities(&path, &columns).unwrap();
    assert_eq!(entities[0].candidate_urls, vec!["http://x"]);

    let out = utf8(temp.path().join("out.csv"));
    let mut table = StatusTable::new();
    table
        .insert_unique(
            StatusRecord {
                key: key("X"),
                downloaded: false,
            },
            "test",
        )
        .unwrap();
    CsvStore.write_statuses(&out, &table, &columns).unwrap();
    assert_eq!(
        fs::read_to_string(out.as_std_path()).unwrap(),
        "id,done\nX,no\n"
    );
}
