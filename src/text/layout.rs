//! Greedy word wrapping, ellipsis truncation and shrink-to-fit sizing.
//!
//! All measurements go through [`Face`], so the same code serves real fonts
//! and the built-in block face used by tests.

use crate::text::face::{Face, LineMetrics};

pub const ELLIPSIS: &str = "...";

/// Characters removed per step when compressing an overflowing last line.
const COMPRESS_TRIM_CHARS: usize = 4;

/// Shorten `text` from the end until it plus an ellipsis fits `max_width`.
/// Empty when not even the bare ellipsis fits.
pub fn truncate_with_ellipsis(face: &dyn Face, text: &str, px: f32, max_width: f32) -> String {
    if face.measure(text, px) <= max_width {
        return text.to_owned();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while chars.pop().is_some() {
        let head: String = chars.iter().collect();
        let candidate = format!("{}{ELLIPSIS}", head.trim_end());
        if face.measure(&candidate, px) <= max_width {
            return candidate;
        }
    }
    String::new()
}

/// Greedy word wrap. A word that alone exceeds `max_width` is hard-truncated
/// with an ellipsis. Lines past `max_lines` are dropped.
pub fn wrap(
    face: &dyn Face,
    text: &str,
    px: f32,
    max_width: f32,
    max_lines: Option<usize>,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };

        if face.measure(&candidate, px) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        current = truncate_with_ellipsis(face, word, px, max_width);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if let Some(max_lines) = max_lines {
        lines.truncate(max_lines);
    }
    lines
}

/// Wrap each explicit paragraph (`\n`-separated) independently.
pub fn wrap_paragraphs(face: &dyn Face, text: &str, px: f32, max_width: f32) -> Vec<String> {
    text.lines()
        .flat_map(|paragraph| wrap(face, paragraph, px, max_width, None))
        .collect()
}

/// Keep `max_lines` lines by folding everything from the last allowed line
/// onward into one line, then trimming it (four characters at a time, with
/// an ellipsis) until it fits.
pub fn compress_to_max_lines(
    face: &dyn Face,
    lines: Vec<String>,
    px: f32,
    max_width: f32,
    max_lines: usize,
) -> Vec<String> {
    if max_lines == 0 {
        return Vec::new();
    }
    if lines.len() <= max_lines {
        return lines;
    }

    let mut kept = lines[..max_lines - 1].to_vec();
    let mut last = lines[max_lines - 1..].join(" ");
    while face.measure(&last, px) > max_width
        && last.chars().count() > COMPRESS_TRIM_CHARS
    {
        let keep = last.chars().count() - COMPRESS_TRIM_CHARS;
        let head: String = last.chars().take(keep).collect();
        last = format!("{}{ELLIPSIS}", head.trim_end());
    }
    kept.push(last);
    kept
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Lines past the limit are dropped.
    Drop,
    /// Lines past the limit are folded into the last one and truncated.
    Compress,
}

/// Padding and spacing around a block, expressed as fractions of the line
/// height so they scale with the font size while shrinking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockFrame {
    pub pad_x_ratio: f32,
    pub pad_y_ratio: f32,
    pub gap_ratio: f32,
    /// One padded box per line (subtitle cards) instead of one around all.
    pub per_line: bool,
}

impl BlockFrame {
    pub const PLAIN: BlockFrame = BlockFrame {
        pad_x_ratio: 0.0,
        pad_y_ratio: 0.0,
        gap_ratio: 0.2,
        per_line: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitPolicy {
    pub base_px: f32,
    pub min_px: f32,
    pub step_px: f32,
    /// Outer width including horizontal padding.
    pub max_width: f32,
    /// Outer height including padding and gaps.
    pub max_height: f32,
    pub max_lines: usize,
    pub overflow: OverflowPolicy,
    /// Honour explicit line breaks before wrapping.
    pub paragraphs: bool,
    pub frame: BlockFrame,
}

/// A wrapped block at a concrete font size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub px: f32,
    pub metrics: LineMetrics,
    pub frame: BlockFrame,
    /// Still taller than its budget at the smallest allowed size.
    pub overflowed: bool,
}

impl TextBlock {
    pub fn line_height(&self) -> f32 {
        self.metrics.line_height()
    }

    pub fn pad_x(&self) -> f32 {
        (self.line_height() * self.frame.pad_x_ratio).round()
    }

    pub fn pad_y(&self) -> f32 {
        (self.line_height() * self.frame.pad_y_ratio).round()
    }

    pub fn gap(&self) -> f32 {
        (self.line_height() * self.frame.gap_ratio).round()
    }

    /// Height of one line slot: the padded card for per-line frames, the
    /// bare line otherwise.
    pub fn line_box_height(&self) -> f32 {
        if self.frame.per_line {
            self.line_height() + 2.0 * self.pad_y()
        } else {
            self.line_height()
        }
    }

    pub fn pitch(&self) -> f32 {
        self.line_box_height() + self.gap()
    }

    pub fn outer_height(&self) -> f32 {
        outer_height_for(self.lines.len(), self.line_box_height(), self.gap(), self.frame, self.pad_y())
    }

    pub fn widest_line(&self, face: &dyn Face) -> f32 {
        self.lines
            .iter()
            .map(|line| face.measure(line, self.px))
            .fold(0.0, f32::max)
    }

    /// Drop trailing lines until the block fits `max_height` (at least one
    /// line is kept).
    pub fn truncate_to_height(&mut self, max_height: f32) {
        while self.lines.len() > 1 && self.outer_height() > max_height {
            self.lines.pop();
        }
    }
}

fn outer_height_for(count: usize, line_box: f32, gap: f32, frame: BlockFrame, pad_y: f32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let stacked = count as f32 * line_box + (count - 1) as f32 * gap;
    if frame.per_line {
        stacked
    } else {
        stacked + 2.0 * pad_y
    }
}

fn layout_at(face: &dyn Face, text: &str, px: f32, policy: &FitPolicy) -> TextBlock {
    let metrics = face.line_metrics(px);
    let pad_x = (metrics.line_height() * policy.frame.pad_x_ratio).round();
    let inner_width = (policy.max_width - 2.0 * pad_x).max(0.0);

    let lines = if policy.paragraphs {
        wrap_paragraphs(face, text, px, inner_width)
    } else {
        wrap(face, text, px, inner_width, None)
    };
    let lines = match policy.overflow {
        OverflowPolicy::Drop => {
            let mut lines = lines;
            lines.truncate(policy.max_lines);
            lines
        }
        OverflowPolicy::Compress => {
            compress_to_max_lines(face, lines, px, inner_width, policy.max_lines)
        }
    };

    TextBlock {
        lines,
        px,
        metrics,
        frame: policy.frame,
        overflowed: false,
    }
}

/// Wrap `text` at `policy.base_px`, shrinking by `step_px` (re-wrapping each
/// time) until the block fits `max_height` or `min_px` is reached. A block
/// that still overflows at the floor is returned flagged, never discarded.
pub fn fit_block(face: &dyn Face, text: &str, policy: &FitPolicy) -> TextBlock {
    let min_px = policy.min_px.max(1.0);
    let mut px = policy.base_px.max(min_px);
    loop {
        let block = layout_at(face, text, px, policy);
        if block.outer_height() <= policy.max_height {
            return block;
        }
        if px <= min_px || policy.step_px <= 0.0 {
            return TextBlock {
                overflowed: true,
                ..block
            };
        }
        px = (px - policy.step_px).max(min_px);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::face::BlockFace;

    // BlockFace advances exactly px/2 per character; at 20px that is 10px.
    const PX: f32 = 20.0;

    #[test]
    fn wraps_two_words_per_line() {
        // "one two" is 7 chars = 70px; "one two three" would be 130px.
        let lines = wrap(&BlockFace, "one two three", PX, 70.0, None);
        assert_eq!(lines, vec!["one two".to_owned(), "three".to_owned()]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(wrap(&BlockFace, "", PX, 100.0, None).is_empty());
        assert!(wrap(&BlockFace, "   \n ", PX, 100.0, None).is_empty());
    }

    #[test]
    fn overlong_word_is_truncated_with_ellipsis() {
        let lines = wrap(&BlockFace, "supercalifragilistic", PX, 80.0, None);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(ELLIPSIS));
        assert!(BlockFace.measure(&lines[0], PX) <= 80.0);
        assert_eq!(lines[0], "super...");
    }

    #[test]
    fn ellipsis_wider_than_the_box_yields_nothing() {
        // "..." is 30px wide with the block face.
        assert_eq!(truncate_with_ellipsis(&BlockFace, "abcdef", PX, 30.0), "...");
        assert_eq!(truncate_with_ellipsis(&BlockFace, "abcdef", PX, 20.0), "");
        assert_eq!(truncate_with_ellipsis(&BlockFace, "ab", PX, 20.0), "ab");
        assert!(wrap(&BlockFace, "supercalifragilistic", PX, 20.0, None).is_empty());
    }

    #[test]
    fn extra_lines_are_dropped() {
        let lines = wrap(&BlockFace, "a b c d e f", PX, 10.0, Some(2));
        assert_eq!(lines, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn paragraphs_wrap_independently() {
        let lines = wrap_paragraphs(&BlockFace, "one two\nthree", PX, 200.0);
        assert_eq!(lines, vec!["one two".to_owned(), "three".to_owned()]);
    }

    #[test]
    fn compress_folds_tail_into_last_line() {
        let lines = vec!["aaaa".to_owned(), "bbbb".to_owned(), "cccc".to_owned()];
        // 2 lines max, 100px = 10 chars wide.
        let out = compress_to_max_lines(&BlockFace, lines, PX, 100.0, 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], "aaaa");
        // "bbbb cccc" is 9 chars and already fits.
        assert_eq!(out[1], "bbbb cccc");
    }

    #[test]
    fn compress_trims_until_fit() {
        let lines = vec!["aaaa".to_owned(), "bbbbbbbb".to_owned(), "cccccccc".to_owned()];
        let out = compress_to_max_lines(&BlockFace, lines, PX, 100.0, 2);
        assert_eq!(out.len(), 2);
        assert!(out[1].ends_with(ELLIPSIS));
        assert!(BlockFace.measure(&out[1], PX) <= 100.0);
        assert!(out[1].starts_with("bbbbbbb"));
    }

    #[test]
    fn compress_keeps_short_input() {
        let lines = vec!["x".to_owned()];
        assert_eq!(
            compress_to_max_lines(&BlockFace, lines.clone(), PX, 5.0, 3),
            lines
        );
        assert!(compress_to_max_lines(&BlockFace, lines, PX, 5.0, 0).is_empty());
    }

    fn policy(max_height: f32) -> FitPolicy {
        FitPolicy {
            base_px: 40.0,
            min_px: 20.0,
            step_px: 4.0,
            max_width: 400.0,
            max_height,
            max_lines: 2,
            overflow: OverflowPolicy::Compress,
            paragraphs: true,
            frame: BlockFrame {
                pad_x_ratio: 0.0,
                pad_y_ratio: 0.0,
                gap_ratio: 0.0,
                per_line: false,
            },
        }
    }

    #[test]
    fn fit_keeps_base_size_when_it_fits() {
        let block = fit_block(&BlockFace, "hello", &policy(100.0));
        assert_eq!(block.px, 40.0);
        assert!(!block.overflowed);
        assert_eq!(block.outer_height(), 40.0);
    }

    #[test]
    fn fit_shrinks_until_block_fits() {
        // Two lines at 40px need 80px; the budget allows 60px -> 2 lines of <=30px.
        let text = "aaaaaaaaaaaa bbbbbbbbbbbb";
        let block = fit_block(&BlockFace, text, &policy(60.0));
        assert!(!block.overflowed);
        assert!(block.outer_height() <= 60.0);
        assert!(block.px < 40.0);
    }

    #[test]
    fn fit_flags_overflow_at_floor() {
        let block = fit_block(&BlockFace, "one two", &policy(5.0));
        assert!(block.overflowed);
        assert_eq!(block.px, 20.0);
        assert!(!block.lines.is_empty());
    }

    #[test]
    fn fit_of_empty_text_is_empty() {
        let block = fit_block(&BlockFace, "", &policy(0.0));
        assert!(block.lines.is_empty());
        assert_eq!(block.outer_height(), 0.0);
        assert!(!block.overflowed);
    }

    #[test]
    fn per_line_frame_pads_every_line() {
        let mut p = policy(1_000.0);
        p.frame = BlockFrame {
            pad_x_ratio: 0.5,
            pad_y_ratio: 0.25,
            gap_ratio: 0.1,
            per_line: true,
        };
        p.max_width = 100.0;
        let block = fit_block(&BlockFace, "ab cd", &p);
        // line height 40, pad_y 10, gap 4: two cards of 60 plus one gap.
        assert_eq!(block.lines.len(), 2);
        assert_eq!(block.outer_height(), 124.0);
    }

    #[test]
    fn truncate_to_height_keeps_one_line() {
        let mut block = fit_block(&BlockFace, "a b c", &{
            let mut p = policy(1_000.0);
            p.max_width = 20.0;
            p.max_lines = 3;
            p
        });
        assert_eq!(block.lines.len(), 3);
        block.truncate_to_height(1.0);
        assert_eq!(block.lines.len(), 1);
    }
}
