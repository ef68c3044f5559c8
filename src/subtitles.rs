use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A transcript fragment on the clip's own 0-based timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptChunk {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Half-open containment: `start <= t < end`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

/// Text of the first chunk active at `t`, if any.
pub fn active_text(chunks: &[TranscriptChunk], t: f64) -> Option<&str> {
    chunks
        .iter()
        .find(|chunk| chunk.contains(t))
        .map(|chunk| chunk.text.as_str())
}

/// Remove every character in a Unicode punctuation category (`P*`).
pub fn strip_punctuation(text: &str) -> String {
    static PUNCTUATION_RE: OnceLock<Regex> = OnceLock::new();
    let re = PUNCTUATION_RE
        .get_or_init(|| Regex::new(r"\p{P}").expect("punctuation regex should compile"));
    re.replace_all(text, "").into_owned()
}

/// Subtitle text ready for layout: active chunk, punctuation removed,
/// `None` when nothing printable remains.
pub fn subtitle_for_time(chunks: &[TranscriptChunk], t: f64) -> Option<String> {
    let text = active_text(chunks, t)?;
    let cleaned = strip_punctuation(text);
    let trimmed = cleaned.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks() -> Vec<TranscriptChunk> {
        vec![
            TranscriptChunk::new(0.0, 2.0, "a"),
            TranscriptChunk::new(2.0, 4.0, "b"),
        ]
    }

    #[test]
    fn upper_bound_is_exclusive() {
        let chunks = chunks();
        assert_eq!(active_text(&chunks, 1.999), Some("a"));
        assert_eq!(active_text(&chunks, 2.0), Some("b"));
        assert_eq!(active_text(&chunks, 4.0), None);
    }

    #[test]
    fn before_first_chunk_is_none() {
        assert_eq!(active_text(&chunks(), -0.1), None);
        assert_eq!(active_text(&[], 1.0), None);
    }

    #[test]
    fn first_matching_chunk_wins() {
        let chunks = vec![
            TranscriptChunk::new(0.0, 3.0, "first"),
            TranscriptChunk::new(1.0, 2.0, "second"),
        ];
        assert_eq!(active_text(&chunks, 1.5), Some("first"));
    }

    #[test]
    fn strips_unicode_punctuation() {
        assert_eq!(
            strip_punctuation("Ciao, mondo! «Dentro» l'intervallo… ¿sì?"),
            "Ciao mondo Dentro lintervallo sì"
        );
    }

    #[test]
    fn keeps_symbols_that_are_not_punctuation() {
        assert_eq!(strip_punctuation("5 + 3 = 8 €"), "5 + 3 = 8 €");
    }

    #[test]
    fn punctuation_only_chunk_has_no_subtitle() {
        let chunks = vec![TranscriptChunk::new(0.0, 1.0, "...!")];
        assert_eq!(subtitle_for_time(&chunks, 0.5), None);
    }
}
