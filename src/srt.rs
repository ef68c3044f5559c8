//! SRT parsing with overlap-and-clip semantics: any cue that overlaps the
//! soundbite window is kept, clipped to it and shifted to clip time.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{CollabResult, CollaboratorError};
use crate::subtitles::TranscriptChunk;
use crate::timecode::parse_srt_time;

pub fn read_srt_file(path: &Path) -> CollabResult<String> {
    fs::read_to_string(path).map_err(|error| {
        CollaboratorError::transcript(format!("failed to read {}: {error}", path.display()))
    })
}

/// Cues overlapping `[start, start + duration)`, on the clip's 0-based
/// timeline. Malformed cues are skipped.
pub fn parse_srt_to_chunks(srt_text: &str, start: f64, duration: f64) -> Vec<TranscriptChunk> {
    static BLOCK_SEPARATOR_RE: OnceLock<Regex> = OnceLock::new();
    let separator = BLOCK_SEPARATOR_RE
        .get_or_init(|| Regex::new(r"\n\s*\n").expect("block separator regex should compile"));

    let window_end = start + duration;
    let text = srt_text.replace("\r\n", "\n");
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    for block in separator.split(text) {
        let lines: Vec<&str> = block.trim().lines().collect();
        if lines.len() < 3 {
            continue;
        }
        let Some((from, to)) = lines[1].split_once("-->") else {
            continue;
        };
        let (cue_start, cue_end) = match (parse_srt_time(from), parse_srt_time(to)) {
            (Ok(cue_start), Ok(cue_end)) => (cue_start, cue_end),
            (Err(error), _) | (_, Err(error)) => {
                warn!(%error, cue = lines[0], "skipping malformed SRT cue");
                continue;
            }
        };

        if cue_end <= start || cue_start >= window_end {
            continue;
        }
        let clipped_start = cue_start.max(start);
        let clipped_end = cue_end.min(window_end);
        if clipped_end <= clipped_start {
            continue;
        }
        chunks.push(TranscriptChunk::new(
            clipped_start - start,
            clipped_end - start,
            lines[2..].join(" "),
        ));
    }
    debug!(count = chunks.len(), start, duration, "selected transcript chunks");
    chunks
}

/// All chunk texts in the window joined by spaces; `None` when empty.
pub fn transcript_text(srt_text: &str, start: f64, duration: f64) -> Option<String> {
    let joined = parse_srt_to_chunks(srt_text, start, duration)
        .into_iter()
        .map(|chunk| chunk.text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}
