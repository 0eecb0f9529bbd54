//! Video search and candidate selection.

use crate::{duration::parse_duration, error::SceneReelError};

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Human-readable title.
    pub title: String,
    /// Address the downloader accepts.
    pub link: String,
    /// Length as reported by the search provider, e.g. `"4:13"`.
    pub duration: String,
}

impl Candidate {
    /// Length in whole seconds; `0` when missing or malformed.
    pub fn duration_seconds(&self) -> u64 {
        parse_duration(&self.duration)
    }
}

/// A source of video candidates for a free-text query.
pub trait VideoSearch {
    /// Return up to `limit` candidates for `query`, in provider order.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, SceneReelError>;
}

/// Search settings.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// How many results to request. Default: 10.
    pub limit: usize,
    /// Candidates must be strictly shorter than this. Default: 600 s.
    pub max_duration_seconds: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            max_duration_seconds: 600,
        }
    }
}

impl SearchOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the duration ceiling in seconds.
    pub fn with_max_duration_seconds(mut self, seconds: u64) -> Self {
        self.max_duration_seconds = seconds;
        self
    }
}

/// Pick the first candidate whose duration is known and below the ceiling.
///
/// Candidates whose duration parses to `0` (missing, live, malformed) are
/// skipped.
pub fn select_candidate(candidates: &[Candidate], max_duration_seconds: u64) -> Option<&Candidate> {
    candidates.iter().find(|candidate| {
        let seconds = candidate.duration_seconds();
        seconds > 0 && seconds < max_duration_seconds
    })
}

/// Run a search and select a candidate.
///
/// # Errors
///
/// Search failures are propagated; an empty or all-too-long result set gives
/// [`SceneReelError::NoCandidate`].
pub fn find_candidate<S: VideoSearch + ?Sized>(
    search: &S,
    query: &str,
    options: &SearchOptions,
) -> Result<Candidate, SceneReelError> {
    let candidates = search.search(query, options.limit)?;
    log::info!("Search for {query:?} returned {} candidates", candidates.len());

    select_candidate(&candidates, options.max_duration_seconds)
        .cloned()
        .ok_or_else(|| SceneReelError::NoCandidate {
            query: query.to_string(),
            max_duration_seconds: options.max_duration_seconds,
        })
}
