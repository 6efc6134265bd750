use std::io::Write;

use camino::Utf8Path;
use tracing::{debug, warn};

use crate::error::HarvestError;
use crate::transport::Transport;

const PDF_CONTENT_TYPES: [&str; 2] = ["application/pdf", "application/x-pdf"];

/// Returns true for `application/pdf` (and the legacy `application/x-pdf`),
/// ignoring case and any `; charset=...` style parameters.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    PDF_CONTENT_TYPES.contains(&media_type.as_str())
}

pub struct Fetcher<'a, T: Transport> {
    transport: &'a T,
}

impl<'a, T: Transport> Fetcher<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// One GET of `url`, kept only if the server says it is a PDF.
    ///
    /// The file at `destination` is replaced only on success; on every
    /// failure path it is left exactly as it was.
    pub fn fetch(&self, url: &str, destination: &Utf8Path) -> bool {
        if url.trim().is_empty() || destination.as_str().is_empty() {
            debug!(%destination, "skipping empty url or destination");
            return false;
        }

        let response = match self.transport.fetch(url) {
            Ok(response) => response,
            Err(err) => {
                warn!(url, error = %err, "fetch failed");
                return false;
            }
        };

        if !is_pdf_content_type(&response.content_type) {
            warn!(url, content_type = %response.content_type, "response is not a pdf");
            return false;
        }

        match write_atomic(destination, &response.body) {
            Ok(()) => {
                debug!(url, %destination, bytes = response.body.len(), "pdf written");
                true
            }
            Err(err) => {
                warn!(url, %destination, error = %err, "could not write pdf");
                false
            }
        }
    }
}

fn write_atomic(destination: &Utf8Path, content: &[u8]) -> Result<(), HarvestError> {
    let parent = match destination.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix(".pdf-harvest")
        .suffix(".part")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| HarvestError::Filesystem(format!("create temp in {parent}: {err}")))?;
    temp.write_all(content)
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    temp.flush()
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    temp.persist(destination.as_std_path())
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    Ok(())
}
