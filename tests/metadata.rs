use assert_matches::assert_matches;

use pdf_harvester::domain::{EntityKey, Outcome, StatusRecord, StatusTable};
use pdf_harvester::error::HarvestError;
use pdf_harvester::metadata::merge;

fn key(value: &str) -> EntityKey {
    value.parse().unwrap()
}

fn carried(names: &[&str]) -> StatusTable {
    let mut table = StatusTable::new();
    for name in names {
        table
            .insert_unique(
                StatusRecord {
                    key: key(name),
                    downloaded: true,
                },
                "carried",
            )
            .unwrap();
    }
    table
}

#[test]
fn merge_is_a_union() {
    let outcomes = vec![
        Outcome {
            key: key("B"),
            downloaded: false,
        },
        Outcome {
            key: key("C"),
            downloaded: true,
        },
    ];
    let merged = merge(carried(&["A"]), outcomes).unwrap();

    assert_eq!(merged.len(), 3);
    assert_eq!(merged.get(&key("A")), Some(true));
    assert_eq!(merged.get(&key("B")), Some(false));
    assert_eq!(merged.downloaded_count(), 2);
}

#[test]
fn merge_rejects_overlap() {
    let outcomes = vec![Outcome {
        key: key("A"),
        downloaded: false,
    }];
    let err = merge(carried(&["A"]), outcomes).unwrap_err();
    assert_matches!(err, HarvestError::DuplicateKey { key, .. } if key == "A");
}
