//! Soundbite audio decoding through the system `ffmpeg` binary.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{CollabResult, CollaboratorError};
use crate::waveform::PcmAudio;

/// Sample rate used for waveform analysis. Only the envelope matters, so
/// this stays well below playback quality.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

/// Decode `[start, start + duration)` of `path` to mono PCM.
pub fn decode_segment(
    path: &Path,
    start: f64,
    duration: f64,
    sample_rate: u32,
) -> CollabResult<PcmAudio> {
    let decode_error = |message: String| CollaboratorError::AudioDecode {
        path: path.to_path_buf(),
        message,
    };
    if !path.is_file() {
        return Err(decode_error("file not found".to_owned()));
    }
    if !(start.is_finite() && start >= 0.0 && duration.is_finite() && duration > 0.0) {
        return Err(decode_error(format!(
            "invalid window start={start} duration={duration}"
        )));
    }
    if sample_rate == 0 {
        return Err(decode_error("sample rate must be positive".to_owned()));
    }

    let out = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-ss"])
        .arg(format!("{start:.3}"))
        .arg("-t")
        .arg(format!("{duration:.3}"))
        .arg("-i")
        .arg(path)
        .args(["-vn", "-f", "s16le", "-acodec", "pcm_s16le", "-ac", "1", "-ar"])
        .arg(sample_rate.to_string())
        .arg("pipe:1")
        .stdin(Stdio::null())
        .output()
        .map_err(|error| decode_error(format!("failed to run ffmpeg: {error}")))?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(decode_error(format!(
            "ffmpeg exited with {}: {}",
            out.status,
            stderr.trim()
        )));
    }

    let samples = pcm_from_s16le(&out.stdout);
    debug!(
        path = %path.display(),
        start,
        duration,
        samples = samples.len(),
        "decoded soundbite audio"
    );
    Ok(PcmAudio {
        samples,
        sample_rate,
    })
}

/// Little-endian signed 16-bit samples to `[-1, 1)` floats. A trailing odd
/// byte is ignored.
pub fn pcm_from_s16le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32_768.0)
        .collect()
}

/// Whether an `ffmpeg` binary can be started.
pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_s16le() {
        let bytes = [0x00, 0x00, 0x00, 0x40, 0x00, 0x80, 0xff];
        assert_eq!(pcm_from_s16le(&bytes), vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn missing_file_is_decode_error() {
        let err = decode_segment(Path::new("/no/such/audio.mp3"), 0.0, 1.0, 8_000).unwrap_err();
        assert!(matches!(err, CollaboratorError::AudioDecode { .. }));
    }

    #[test]
    fn rejects_empty_window() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = decode_segment(file.path(), 0.0, 0.0, 8_000).unwrap_err();
        assert!(err.to_string().contains("invalid window"));
    }
}
