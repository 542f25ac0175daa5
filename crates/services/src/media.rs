//! Video source resolution.
//!
//! A question names a clip; the host needs an ordered list of places to try
//! and one retry policy across them.

use std::collections::HashMap;

use survey_core::model::QuestionRecord;

pub const DEFAULT_MAX_ATTEMPTS_PER_CANDIDATE: u32 = 3;

const VIDEO_EXT: &str = ".mp4";

/// Clip file name of a question, or `None` for text-only questions.
///
/// An explicit `videoUrl` wins; otherwise the name is built from the id and,
/// when present, the clip offset.
#[must_use]
pub fn media_id(question: &QuestionRecord) -> Option<String> {
    if let Some(url) = question.video_url() {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let name = path.rsplit('/').next().unwrap_or(path);
        return (!name.is_empty()).then(|| name.to_owned());
    }
    let id = question.id().as_str();
    match question.video_time() {
        Some(time) => Some(format!("{id}_{time}{VIDEO_EXT}")),
        None if question.scenario_text().is_none() => Some(format!("{id}{VIDEO_EXT}")),
        None => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// URL from the hosted-file mapping.
    Remote(String),
    /// Path relative to the page.
    Local(String),
    /// Last resort: a link the respondent opens by hand.
    ManualLink(String),
}

impl MediaSource {
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            MediaSource::Remote(s) | MediaSource::Local(s) | MediaSource::ManualLink(s) => s,
        }
    }

    /// Whether a player should try to load it.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        !matches!(self, MediaSource::ManualLink(_))
    }
}

/// Maps clip names to candidate sources.
#[derive(Debug, Clone, Default)]
pub struct MediaResolver {
    mapping: HashMap<String, String>,
    local_dirs: Vec<String>,
    manual_base: Option<String>,
}

impl MediaResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: HashMap<String, String>) -> Self {
        self.mapping = mapping;
        self
    }

    #[must_use]
    pub fn with_local_dir(mut self, dir: impl Into<String>) -> Self {
        self.local_dirs.push(dir.into().trim_end_matches('/').to_owned());
        self
    }

    #[must_use]
    pub fn with_manual_base(mut self, base: impl Into<String>) -> Self {
        self.manual_base = Some(base.into().trim_end_matches('/').to_owned());
        self
    }

    /// Mapped URL for `file`, trying the name as given, without and with the
    /// extension, then the same in lowercase.
    #[must_use]
    pub fn lookup(&self, file: &str) -> Option<&str> {
        let stem = file.strip_suffix(VIDEO_EXT).unwrap_or(file);
        let with_ext = format!("{stem}{VIDEO_EXT}");
        let variants = [file.to_owned(), stem.to_owned(), with_ext];
        variants
            .iter()
            .cloned()
            .chain(variants.iter().map(|v| v.to_lowercase()))
            .find_map(|key| self.mapping.get(&key))
            .map(String::as_str)
    }

    /// Ordered sources to try for `question`: local paths, remote URLs, manual link.
    #[must_use]
    pub fn candidates(&self, question: &QuestionRecord) -> Vec<MediaSource> {
        let Some(file) = media_id(question) else {
            return Vec::new();
        };
        let mut out = Vec::new();

        let stem = file.strip_suffix(VIDEO_EXT).unwrap_or(&file);
        let base_id = stem.rsplit_once('_').map_or(stem, |(head, _)| head);
        let names = [
            file.clone(),
            format!("{stem}{VIDEO_EXT}"),
            format!("{base_id}{VIDEO_EXT}"),
            format!("{}{VIDEO_EXT}", base_id.to_lowercase()),
        ];
        for dir in &self.local_dirs {
            for name in &names {
                push_unique(&mut out, MediaSource::Local(format!("{dir}/{name}")));
            }
        }

        if let Some(url) = question.video_url().filter(|u| is_absolute(u)) {
            push_unique(&mut out, MediaSource::Remote(url.to_owned()));
        }
        if let Some(url) = self.lookup(&file) {
            push_unique(&mut out, MediaSource::Remote(url.to_owned()));
        }

        if let Some(base) = &self.manual_base {
            out.push(MediaSource::ManualLink(format!("{base}/{file}")));
        }
        out
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn push_unique(out: &mut Vec<MediaSource>, source: MediaSource) {
    if !out.contains(&source) {
        out.push(source);
    }
}

/// One retry policy across all candidates.
///
/// Each playable candidate gets up to `max_attempts_per_candidate` tries
/// before the next one is offered.
#[derive(Debug, Clone)]
pub struct PlaybackAttempts {
    candidates: Vec<MediaSource>,
    max_attempts_per_candidate: u32,
    index: usize,
    failures: u32,
}

impl PlaybackAttempts {
    #[must_use]
    pub fn new(candidates: Vec<MediaSource>, max_attempts_per_candidate: u32) -> Self {
        Self {
            candidates,
            max_attempts_per_candidate: max_attempts_per_candidate.max(1),
            index: 0,
            failures: 0,
        }
    }

    #[must_use]
    pub fn with_default_policy(candidates: Vec<MediaSource>) -> Self {
        Self::new(candidates, DEFAULT_MAX_ATTEMPTS_PER_CANDIDATE)
    }

    /// Source to try now; `None` once every candidate is used up.
    #[must_use]
    pub fn current(&self) -> Option<&MediaSource> {
        self.candidates.get(self.index)
    }

    /// Record a failed load and return what to try next.
    pub fn record_failure(&mut self) -> Option<&MediaSource> {
        let playable = self.current().is_some_and(MediaSource::is_playable);
        self.failures += 1;
        if !playable || self.failures >= self.max_attempts_per_candidate {
            self.index += 1;
            self.failures = 0;
        }
        self.current()
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.candidates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_core::model::QuestionDraft;

    fn video_question(id: &str, time: Option<&str>) -> QuestionRecord {
        let mut draft = QuestionDraft::new(id, "basketball", "gt", vec!["x".into()], true);
        draft.video_time = time.map(str::to_owned);
        draft.validate().unwrap()
    }

    #[test]
    fn media_id_prefers_url_then_offset_then_id() {
        let mut draft = QuestionDraft::new("Q7", "dance", "gt", vec!["x".into()], true);
        draft.video_url = Some("https://cdn.example.org/clips/q7_12.mp4?sig=1".into());
        assert_eq!(media_id(&draft.validate().unwrap()).as_deref(), Some("q7_12.mp4"));

        assert_eq!(
            media_id(&video_question("Q7", Some("12"))).as_deref(),
            Some("Q7_12.mp4")
        );
        assert_eq!(media_id(&video_question("Q7", None)).as_deref(), Some("Q7.mp4"));

        let mut text = QuestionDraft::new("t1", "cooking", "gt", vec!["x".into()], false);
        text.scenario_text = Some("A cook is slicing onions.".into());
        assert_eq!(media_id(&text.validate().unwrap()), None);
    }

    #[test]
    fn candidates_order_local_then_remote_then_manual() {
        let mapping = HashMap::from([(
            "bb_3_40.mp4".to_owned(),
            "https://bucket.example.org/bb_3_40.mp4".to_owned(),
        )]);
        let resolver = MediaResolver::new()
            .with_mapping(mapping)
            .with_local_dir("clips/")
            .with_manual_base("https://drive.example.org/share");

        let got = resolver.candidates(&video_question("BB_3", Some("40")));
        assert_eq!(
            got,
            vec![
                MediaSource::Local("clips/BB_3_40.mp4".into()),
                MediaSource::Local("clips/BB_3.mp4".into()),
                MediaSource::Local("clips/bb_3.mp4".into()),
                MediaSource::Remote("https://bucket.example.org/bb_3_40.mp4".into()),
                MediaSource::ManualLink("https://drive.example.org/share/BB_3_40.mp4".into()),
            ]
        );
    }

    #[test]
    fn lookup_tries_extension_and_case_variants() {
        let resolver = MediaResolver::new().with_mapping(HashMap::from([(
            "clip".to_owned(),
            "https://x.example.org/clip".to_owned(),
        )]));
        assert_eq!(resolver.lookup("CLIP.mp4"), Some("https://x.example.org/clip"));
        assert_eq!(resolver.lookup("other.mp4"), None);
    }

    #[test]
    fn attempts_follow_one_policy_across_candidates() {
        let mut attempts = PlaybackAttempts::new(
            vec![
                MediaSource::Remote("r".into()),
                MediaSource::Local("l".into()),
                MediaSource::ManualLink("m".into()),
            ],
            2,
        );
        assert_eq!(attempts.current().map(MediaSource::location), Some("r"));
        assert_eq!(attempts.record_failure().map(MediaSource::location), Some("r"));
        assert_eq!(attempts.record_failure().map(MediaSource::location), Some("l"));
        attempts.record_failure();
        assert_eq!(attempts.record_failure().map(MediaSource::location), Some("m"));
        assert!(!attempts.is_exhausted());
        assert_eq!(attempts.record_failure(), None);
        assert!(attempts.is_exhausted());
    }
}
