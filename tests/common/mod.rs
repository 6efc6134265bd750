#![allow(dead_code)]

use std::fs;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};

use pdf_harvester::error::HarvestError;
use pdf_harvester::transport::{Transport, TransportResponse};

pub const PDF_BODY: &[u8] = b"%PDF-1.4 mock";

/// `"fail"` errors, `"not pdf"` answers with HTML, `"panic"` panics, and
/// every other URL serves a PDF.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Transport for MockTransport {
    fn fetch(&self, url: &str) -> Result<TransportResponse, HarvestError> {
        self.calls.lock().unwrap().push(url.to_string());
        match url {
            "fail" => Err(HarvestError::Http("mock failure".to_string())),
            "not pdf" => Ok(TransportResponse {
                content_type: "text/html".to_string(),
                body: b"<html>not a pdf</html>".to_vec(),
            }),
            "panic" => panic!("mock transport asked to panic"),
            _ => Ok(TransportResponse {
                content_type: "application/pdf".to_string(),
                body: PDF_BODY.to_vec(),
            }),
        }
    }
}

pub fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path).unwrap()
}

pub fn pdf_files(dir: &Utf8Path) -> Vec<String> {
    if !dir.as_std_path().exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = fs::read_dir(dir.as_std_path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
