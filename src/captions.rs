//! Plain-text social post that accompanies each rendered soundbite.

use std::fs;
use std::path::Path;

use crate::error::CollabResult;

pub const DEFAULT_HASHTAG: &str = "podcast";

#[derive(Debug, Clone, Default)]
pub struct CaptionInput<'a> {
    pub episode_number: Option<u32>,
    pub episode_title: &'a str,
    pub episode_link: Option<&'a str>,
    pub soundbite_title: Option<&'a str>,
    pub transcript_text: Option<&'a str>,
    /// Comma-separated keywords from the podcast metadata.
    pub podcast_keywords: Option<&'a str>,
    /// Comma-separated keywords from the episode metadata.
    pub episode_keywords: Option<&'a str>,
    pub config_hashtags: &'a [String],
}

/// Lowercase, drop `#` and all whitespace. Empty results are discarded.
fn normalize_hashtag(raw: &str) -> Option<String> {
    let tag: String = raw
        .chars()
        .filter(|c| *c != '#' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    (!tag.is_empty()).then_some(tag)
}

/// Hashtags from podcast keywords, episode keywords and configuration, in
/// that order, deduplicated. Falls back to `#podcast`.
pub fn collect_hashtags(
    podcast_keywords: Option<&str>,
    episode_keywords: Option<&str>,
    config_hashtags: &[String],
) -> Vec<String> {
    let keywords = [podcast_keywords, episode_keywords]
        .into_iter()
        .flatten()
        .flat_map(|list| list.split(','));
    let configured = config_hashtags.iter().map(String::as_str);

    let mut tags: Vec<String> = Vec::new();
    for tag in keywords.chain(configured).filter_map(normalize_hashtag) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if tags.is_empty() {
        tags.push(DEFAULT_HASHTAG.to_owned());
    }
    tags.into_iter().map(|tag| format!("#{tag}")).collect()
}

pub fn build_caption_text(input: &CaptionInput<'_>) -> String {
    let mut sections = Vec::new();

    let heading = match input.episode_number {
        Some(number) => format!("Episodio {number}: {}", input.episode_title),
        None => input.episode_title.to_owned(),
    };
    sections.push(heading);

    let body: Vec<&str> = [input.soundbite_title, input.transcript_text]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect();
    if !body.is_empty() {
        sections.push(body.join("\n\n"));
    }

    if let Some(link) = input.episode_link.map(str::trim).filter(|l| !l.is_empty()) {
        sections.push(format!("Ascolta l'episodio completo: {link}"));
    }

    sections.push(
        collect_hashtags(
            input.podcast_keywords,
            input.episode_keywords,
            input.config_hashtags,
        )
        .join(" "),
    );

    let mut text = sections.join("\n\n");
    text.push('\n');
    text
}

pub fn write_caption_file(path: &Path, input: &CaptionInput<'_>) -> CollabResult<()> {
    fs::write(path, build_caption_text(input))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashtags_are_normalized_and_unique() {
        let config = vec!["Podcast".to_owned(), "python".to_owned()];
        let tags = collect_hashtags(Some("AI, coding, #Podcast"), Some("AI,   Dev Ops"), &config);
        assert_eq!(tags, vec!["#ai", "#coding", "#podcast", "#devops", "#python"]);
    }

    #[test]
    fn default_hashtag_when_none_given() {
        assert_eq!(collect_hashtags(None, Some(" , #"), &[]), vec!["#podcast"]);
    }

    #[test]
    fn caption_has_heading_body_link_and_tags() {
        let config = vec!["python".to_owned()];
        let text = build_caption_text(&CaptionInput {
            episode_number: Some(42),
            episode_title: "Titolo",
            episode_link: Some("https://example/ep"),
            soundbite_title: Some("SB"),
            transcript_text: Some("Testo"),
            podcast_keywords: Some("AI"),
            episode_keywords: None,
            config_hashtags: &config,
        });
        assert_eq!(
            text,
            "Episodio 42: Titolo\n\nSB\n\nTesto\n\nAscolta l'episodio completo: https://example/ep\n\n#ai #python\n"
        );
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caption.txt");
        write_caption_file(
            &path,
            &CaptionInput {
                episode_title: "x",
                ..CaptionInput::default()
            },
        )
        .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("x\n\n"));
        assert!(content.contains("#podcast"));
    }
}
