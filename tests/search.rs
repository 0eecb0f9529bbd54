//! Candidate search and selection tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use scenereel::{
    Candidate, SceneReelError, SearchOptions, VideoDownloader, VideoSearch, YtDlp,
    find_candidate, select_candidate,
};

fn candidate(title: &str, duration: &str) -> Candidate {
    Candidate {
        title: title.to_string(),
        link: format!("https://video.example/{title}"),
        duration: duration.to_string(),
    }
}

struct FixedSearch {
    results: Vec<Candidate>,
    queries: RefCell<Vec<(String, usize)>>,
}

impl FixedSearch {
    fn new(results: Vec<Candidate>) -> Self {
        Self {
            results,
            queries: RefCell::new(Vec::new()),
        }
    }
}

impl VideoSearch for FixedSearch {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, SceneReelError> {
        self.queries.borrow_mut().push((query.to_string(), limit));
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

// ── Selection ──────────────────────────────────────────────────────

#[test]
fn first_short_enough_candidate_wins() {
    let candidates = [
        candidate("lecture", "1:02:03"),
        candidate("clip", "4:13"),
        candidate("other", "2:00"),
    ];
    let chosen = select_candidate(&candidates, 600).unwrap();
    assert_eq!(chosen.title, "clip");
}

#[test]
fn ceiling_is_exclusive() {
    let candidates = [candidate("exact", "10:00"), candidate("under", "9:59")];
    assert_eq!(select_candidate(&candidates, 600).unwrap().title, "under");
}

#[test]
fn unknown_durations_are_skipped() {
    let candidates = [
        candidate("live", ""),
        candidate("broken", "n/a"),
        candidate("ok", "0:30"),
    ];
    assert_eq!(select_candidate(&candidates, 600).unwrap().title, "ok");
    assert_eq!(candidates[0].duration_seconds(), 0);
}

#[test]
fn nothing_selectable() {
    let candidates = [candidate("long", "20:00")];
    assert!(select_candidate(&candidates, 600).is_none());
    assert!(select_candidate(&[], 600).is_none());
}

#[test]
fn find_candidate_passes_limit_and_reports_no_candidate() {
    let search = FixedSearch::new(vec![candidate("long", "45:00")]);
    let options = SearchOptions::new().with_limit(3);

    match find_candidate(&search, "cats", &options) {
        Err(SceneReelError::NoCandidate {
            query,
            max_duration_seconds,
        }) => {
            assert_eq!(query, "cats");
            assert_eq!(max_duration_seconds, 600);
        }
        other => panic!("Expected NoCandidate, got: {other:?}"),
    }
    assert_eq!(search.queries.borrow().as_slice(), &[("cats".to_string(), 3)]);
}

#[test]
fn find_candidate_returns_selection() {
    let search = FixedSearch::new(vec![candidate("long", "45:00"), candidate("short", "1:30")]);
    let chosen = find_candidate(&search, "dogs", &SearchOptions::default()).unwrap();
    assert_eq!(chosen.title, "short");
}

#[test]
fn search_options_defaults() {
    let options = SearchOptions::default();
    assert_eq!(options.limit, 10);
    assert_eq!(options.max_duration_seconds, 600);
}

// ── yt-dlp ─────────────────────────────────────────────────────────

#[test]
fn ytdlp_output_parses_into_candidates() {
    let output = "Intro to Rust\thttps://www.youtube.com/watch?v=aaa\t4:13\n\
                  Live stream\thttps://www.youtube.com/watch?v=bbb\tNA\n\
                  \n\
                  No link\tNA\t1:00\n\
                  Short\thttps://www.youtube.com/watch?v=ccc\t59\n";
    let candidates = YtDlp::parse_search_output(output);

    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0].title, "Intro to Rust");
    assert_eq!(candidates[0].duration_seconds(), 253);
    assert_eq!(candidates[1].duration, "");
    assert_eq!(candidates[2].link, "https://www.youtube.com/watch?v=ccc");
}

#[test]
fn missing_ytdlp_is_a_search_error() {
    let ytdlp = YtDlp::with_command("scenereel-no-such-downloader");
    assert!(matches!(
        ytdlp.search("anything", 1),
        Err(SceneReelError::SearchError(_))
    ));
}

struct FakeDownloader;

impl VideoDownloader for FakeDownloader {
    fn download(&self, link: &str, directory: &Path) -> Result<PathBuf, SceneReelError> {
        let name = link.rsplit('/').next().unwrap_or("video");
        Ok(directory.join(format!("{name}.mp4")))
    }
}

#[test]
fn downloader_is_object_safe() {
    let downloader: Box<dyn VideoDownloader> = Box::new(FakeDownloader);
    let path = downloader
        .download("https://video.example/abc", Path::new("downloads"))
        .unwrap();
    assert_eq!(path, PathBuf::from("downloads/abc.mp4"));
}
