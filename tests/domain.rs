use assert_matches::assert_matches;

use pdf_harvester::domain::{DownloadStatus, EntityKey};
use pdf_harvester::error::HarvestError;

#[test]
fn parse_entity_key_valid() {
    let key: EntityKey = "GRI-2017-0042".parse().unwrap();
    assert_eq!(key.as_str(), "GRI-2017-0042");
    assert_eq!(key.file_name(), "GRI-2017-0042.pdf");
}

#[test]
fn parse_entity_key_invalid() {
    for value in ["", "   ", ".", "..", "a/b", "a\\b", "tab\there"] {
        let err = value.parse::<EntityKey>().unwrap_err();
        assert_matches!(err, HarvestError::InvalidKey(_));
    }
}

#[test]
fn download_status_literals() {
    assert_eq!(DownloadStatus::from(true).as_str(), "yes");
    assert_eq!(DownloadStatus::from(false).as_str(), "no");
    assert_eq!("YES".parse::<DownloadStatus>(), Ok(DownloadStatus::Yes));
    assert_eq!(" no ".parse::<DownloadStatus>(), Ok(DownloadStatus::No));
    assert!("true".parse::<DownloadStatus>().is_err());
}
