use audiogram::composer::{render_frame, FrameComposer, FrameRequest, StaticInputs};
use audiogram::format::{FormatSpec, PixelRect, SafeInsetsPx, VideoFormat};
use audiogram::raster::badge_bounds;
use audiogram::subtitles::TranscriptChunk;
use audiogram::text::face::FontSet;
use audiogram::theme::{ColorTheme, ThemeConfig};
use audiogram::waveform::WaveformTrack;
use audiogram::RgbFrame;
use sha2::{Digest, Sha256};

fn digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn request<'a>(
    format: &'a str,
    (width, height): (u32, u32),
    waveform: &'a WaveformTrack,
    chunks: &'a [TranscriptChunk],
    fonts: &'a FontSet,
    t: f64,
) -> FrameRequest<'a> {
    FrameRequest {
        width,
        height,
        logo_path: None,
        podcast_title: "Il Podcast",
        episode_title: "Episodio di prova con un titolo abbastanza lungo",
        waveform,
        t,
        chunks,
        duration: 4.0,
        theme: None,
        format,
        fonts,
    }
}

#[test]
fn every_format_returns_packed_rgb() {
    let fonts = FontSet::builtin();
    let waveform = WaveformTrack::from_amplitudes(vec![0.3, 0.8, 0.5, 0.1]);
    let chunks = vec![TranscriptChunk::new(0.0, 4.0, "ciao a tutti")];
    for format in VideoFormat::ALL {
        let size = format.dimensions_px();
        for t in [0.0, 1.3, 4.0] {
            let frame = render_frame(&request(format.keyword(), size, &waveform, &chunks, &fonts, t));
            assert_eq!(frame.width, size.0);
            assert_eq!(frame.height, size.1);
            assert_eq!(frame.data.len(), (size.0 * size.1 * 3) as usize);
        }
    }
}

#[test]
fn identical_inputs_render_identical_bytes() {
    let fonts = FontSet::builtin();
    let waveform = WaveformTrack::from_amplitudes(vec![0.2, 0.9, 0.4, 0.7]);
    let chunks = vec![TranscriptChunk::new(0.5, 3.5, "sempre lo stesso frame")];
    for format in VideoFormat::ALL {
        let size = format.dimensions_px();
        let first = render_frame(&request(format.keyword(), size, &waveform, &chunks, &fonts, 2.0));
        let second = render_frame(&request(format.keyword(), size, &waveform, &chunks, &fonts, 2.0));
        assert_eq!(digest(&first.data), digest(&second.data), "{format:?}");
    }
}

#[test]
fn unknown_format_renders_like_vertical() {
    let fonts = FontSet::builtin();
    let waveform = WaveformTrack::from_amplitudes(vec![0.5; 8]);
    let size = VideoFormat::Vertical.dimensions_px();
    let unknown = render_frame(&request("panorama", size, &waveform, &[], &fonts, 1.0));
    let vertical = render_frame(&request("vertical", size, &waveform, &[], &fonts, 1.0));
    assert_eq!(digest(&unknown.data), digest(&vertical.data));
}

#[test]
fn list_colors_are_applied() {
    let fonts = FontSet::builtin();
    let waveform = WaveformTrack::default();
    let theme = ThemeConfig {
        background: Some(vec![10, 20, 30]),
        ..ThemeConfig::default()
    };
    let mut req = request("square", (200, 200), &waveform, &[], &fonts, 0.0);
    req.theme = Some(&theme);
    let frame = render_frame(&req);
    // Middle of the central band is background when there are no bars or logo.
    let center = frame.pixel(5, 100).unwrap();
    assert_eq!((center.r, center.g, center.b), (10, 20, 30));
}

#[test]
fn square_soundbite_shows_subtitle_only_inside_its_chunk() {
    let mut inputs = StaticInputs::new(FormatSpec::preset(VideoFormat::Square), FontSet::builtin());
    inputs.podcast_title = "Podcast".into();
    inputs.episode_title = "Episodio".into();
    inputs.waveform = WaveformTrack::from_amplitudes(vec![0.5; 96]);
    inputs.chunks = vec![TranscriptChunk::new(1.0, 3.0, "hello world")];
    inputs.duration = 4.0;
    let composer = FrameComposer::new(inputs);

    let fps = 24;
    let frames = (0..96).step_by(4).chain([23, 24, 71, 72, 95]);
    for index in frames {
        let t = index as f64 / f64::from(fps);
        let (frame, report) = composer.render_with_report(t);
        assert_eq!(frame.data.len(), 1080 * 1080 * 3);
        assert!(report.bar_count > 0);
        if (1.0..3.0).contains(&t) {
            assert_eq!(report.subtitle_lines, vec!["hello world".to_owned()], "t={t}");
            assert_eq!(report.subtitle_boxes.len(), 1);
        } else {
            assert!(report.subtitle_lines.is_empty(), "t={t}");
            assert!(report.subtitle_boxes.is_empty(), "t={t}");
        }
    }
}

#[test]
fn vertical_safe_area_holds_for_any_text_length() {
    let spec = FormatSpec::preset(VideoFormat::Vertical)
        .with_safe_area(SafeInsetsPx {
            left: 90,
            right: 60,
            top: 220,
            bottom: 380,
        })
        .unwrap();
    let safe = spec.safe_rect();

    for words in [1usize, 4, 12, 40, 120] {
        let mut inputs = StaticInputs::new(spec, FontSet::builtin());
        inputs.theme = ColorTheme::default();
        inputs.podcast_title = "Podcast".into();
        inputs.episode_title = "titolo ".repeat(words);
        inputs.call_to_action = Some("Ascolta ora ".repeat(words));
        inputs.chunks = vec![TranscriptChunk::new(0.0, 2.0, "sottotitolo ".repeat(words))];
        inputs.waveform = WaveformTrack::from_amplitudes(vec![1.0; 10]);
        inputs.duration = 2.0;
        let (_, report) = FrameComposer::new(inputs).render_with_report(1.0);

        // Badges carry a shadow, so their boxes must sit inside the shrunken rect.
        let shadowed = badge_bounds(safe);
        if let Some(cta) = report.cta {
            assert!(
                shadowed.contains(&cta),
                "{words} words: cta {cta:?} outside {shadowed:?}"
            );
        }
        assert!(safe.contains(&report.title.expect("title is drawn")));
        assert!(!report.subtitle_boxes.is_empty(), "{words} words");
        for card in &report.subtitle_boxes {
            assert!(
                shadowed.contains(card),
                "{words} words: card {card:?} outside {shadowed:?}"
            );
        }
    }
}

fn pixels_changed_outside(
    before: &RgbFrame,
    after: &RgbFrame,
    safe: PixelRect,
) -> Vec<(u32, u32)> {
    let mut changed = Vec::new();
    for y in 0..before.height {
        for x in 0..before.width {
            let (fx, fy) = (x as f32, y as f32);
            let inside = fx >= safe.left && fx < safe.right && fy >= safe.top && fy < safe.bottom;
            if !inside && before.pixel(x, y) != after.pixel(x, y) {
                changed.push((x, y));
            }
        }
    }
    changed
}

#[test]
fn badge_shadows_leave_no_ink_outside_vertical_safe_area() {
    let spec = FormatSpec::preset(VideoFormat::Vertical)
        .with_safe_area(SafeInsetsPx {
            left: 90,
            right: 60,
            top: 220,
            bottom: 380,
        })
        .unwrap();
    let safe = spec.safe_rect();

    let render = |subtitle: Option<String>, cta: Option<String>| {
        let mut inputs = StaticInputs::new(spec, FontSet::builtin());
        inputs.podcast_title = "Podcast".into();
        inputs.episode_title = "Episode".into();
        inputs.call_to_action = cta;
        inputs.chunks = subtitle
            .map(|text| vec![TranscriptChunk::new(0.0, 2.0, text)])
            .unwrap_or_default();
        inputs.waveform = WaveformTrack::from_amplitudes(vec![0.5; 10]);
        inputs.duration = 2.0;
        FrameComposer::new(inputs).render_with_report(1.0)
    };

    let (bare, _) = render(None, None);

    let (subtitled, report) = render(Some("x".repeat(500)), None);
    assert_eq!(report.subtitle_boxes.len(), 1);
    let changed = pixels_changed_outside(&bare, &subtitled, safe);
    assert!(
        changed.is_empty(),
        "subtitle ink outside safe area: {} px, first {:?}",
        changed.len(),
        changed.first()
    );

    let (with_cta, report) = render(None, Some("Listen now ".repeat(30)));
    assert!(report.cta.is_some());
    let changed = pixels_changed_outside(&bare, &with_cta, safe);
    assert!(
        changed.is_empty(),
        "cta ink outside safe area: {} px, first {:?}",
        changed.len(),
        changed.first()
    );
}
