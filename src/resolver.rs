use camino::Utf8Path;
use tracing::debug;

use crate::fetcher::Fetcher;
use crate::transport::Transport;

pub struct CandidateResolver<'a, T: Transport> {
    fetcher: Fetcher<'a, T>,
}

impl<'a, T: Transport> CandidateResolver<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            fetcher: Fetcher::new(transport),
        }
    }

    /// Tries each candidate in list order and stops at the first PDF.
    /// An empty candidate list resolves to `false`.
    pub fn resolve(&self, candidates: &[String], destination: &Utf8Path) -> bool {
        for (index, url) in candidates.iter().enumerate() {
            if self.fetcher.fetch(url, destination) {
                debug!(%destination, candidate = index, "resolved");
                return true;
            }
        }
        debug!(%destination, tried = candidates.len(), "all candidates failed");
        false
    }
}
