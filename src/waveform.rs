//! Per-frame amplitude envelope driving the equalizer bars.
//!
//! The envelope is computed once per render job and then only read, so a
//! `WaveformTrack` can be shared by reference across rendering threads.

/// One non-negative normalized amplitude per output video frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformTrack {
    amplitudes: Vec<f32>,
}

impl WaveformTrack {
    /// Negative and non-finite inputs are stored as zero.
    pub fn from_amplitudes(amplitudes: Vec<f32>) -> Self {
        let amplitudes = amplitudes
            .into_iter()
            .map(|value| if value.is_finite() { value.max(0.0) } else { 0.0 })
            .collect();
        Self { amplitudes }
    }

    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.amplitudes
    }

    /// Amplitude for clip time `t`, mapped proportionally over `duration`.
    ///
    /// Times past the end clamp to the last frame. A zero duration reads the
    /// first frame; an empty track has no amplitude at all.
    pub fn amplitude_at(&self, t: f64, duration: f64) -> Option<f32> {
        let last = self.amplitudes.len().checked_sub(1)?;
        let index = if duration > 0.0 && t.is_finite() {
            let position = (t / duration) * self.amplitudes.len() as f64;
            if position <= 0.0 {
                0
            } else {
                position as usize
            }
        } else {
            0
        };
        Some(self.amplitudes[index.min(last)])
    }
}

/// Mono PCM for one soundbite, as handed over by the audio decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PcmAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl PcmAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Average interleaved multi-channel samples down to mono.
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Number of whole video frames covered by `sample_count` samples.
pub fn total_frames(sample_count: usize, sample_rate: u32, fps: u32) -> usize {
    if sample_rate == 0 {
        return 0;
    }
    ((sample_count as u64 * u64::from(fps)) / u64::from(sample_rate)) as usize
}

/// Reduce PCM to one mean-absolute amplitude per video frame.
///
/// Samples are normalized by the global peak (a silent clip stays all
/// zero), split into `floor(samples / frames)`-sized contiguous blocks, and
/// any trailing partial block is ignored.
pub fn sample(pcm: &[f32], sample_rate: u32, fps: u32) -> WaveformTrack {
    let frames = total_frames(pcm.len(), sample_rate, fps);
    let peak = pcm
        .iter()
        .filter(|value| value.is_finite())
        .fold(0.0f32, |acc, value| acc.max(value.abs()));

    if frames == 0 {
        return WaveformTrack::default();
    }
    if peak == 0.0 {
        return WaveformTrack::from_amplitudes(vec![0.0; frames]);
    }

    let samples_per_frame = pcm.len() / frames;
    let mut amplitudes = Vec::with_capacity(frames);
    for index in 0..frames {
        let start = index * samples_per_frame;
        let end = (start + samples_per_frame).min(pcm.len());
        if samples_per_frame == 0 || start >= end {
            amplitudes.push(0.0);
            continue;
        }
        let block = &pcm[start..end];
        let sum: f64 = block
            .iter()
            .map(|value| if value.is_finite() { f64::from(value.abs()) } else { 0.0 })
            .sum();
        let mean = sum / block.len() as f64;
        amplitudes.push((mean / f64::from(peak)) as f32);
    }

    WaveformTrack::from_amplitudes(amplitudes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_amplitude_per_frame() {
        let pcm = vec![0.25f32; 48_000];
        let track = sample(&pcm, 12_000, 24);
        assert_eq!(track.len(), 96);
        assert!(track.as_slice().iter().all(|&a| (a - 1.0).abs() < 1e-6));
    }

    #[test]
    fn silence_is_all_zero() {
        let pcm = vec![0.0f32; 8_000];
        let track = sample(&pcm, 8_000, 24);
        assert_eq!(track.len(), 24);
        assert!(track.as_slice().iter().all(|&a| a == 0.0));
    }

    #[test]
    fn normalizes_by_global_peak() {
        // Two frames: first block quiet, second block loud.
        let mut pcm = vec![0.1f32; 4];
        pcm.extend([-0.4f32, 0.4, -0.4, 0.4]);
        let track = sample(&pcm, 8, 2);
        assert_eq!(track.len(), 2);
        assert!((track.as_slice()[0] - 0.25).abs() < 1e-6);
        assert!((track.as_slice()[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn trailing_partial_block_is_dropped() {
        // 10 samples at 4 Hz, 1 fps -> 2 frames of 5 samples; nothing left over,
        // but with 11 samples the eleventh is ignored.
        let mut pcm = vec![0.5f32; 10];
        pcm.push(1.0);
        let track = sample(&pcm, 4, 1);
        assert_eq!(track.len(), 2);
        assert!((track.as_slice()[0] - 0.5).abs() < 1e-6);
        assert!((track.as_slice()[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn clip_shorter_than_a_frame_yields_empty_track() {
        let track = sample(&[0.3, 0.3], 48_000, 24);
        assert!(track.is_empty());
        assert_eq!(track.amplitude_at(0.0, 1.0), None);
    }

    #[test]
    fn zero_sample_rate_is_empty() {
        assert!(sample(&[1.0; 100], 0, 24).is_empty());
    }

    #[test]
    fn amplitude_lookup_clamps_past_duration() {
        let track = WaveformTrack::from_amplitudes(vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(track.amplitude_at(0.0, 4.0), Some(0.1));
        assert_eq!(track.amplitude_at(2.0, 4.0), Some(0.3));
        assert_eq!(track.amplitude_at(4.0, 4.0), Some(0.4));
        assert_eq!(track.amplitude_at(9.0, 4.0), Some(0.4));
        assert_eq!(track.amplitude_at(1.0, 0.0), Some(0.1));
    }

    #[test]
    fn negative_inputs_are_clamped() {
        let track = WaveformTrack::from_amplitudes(vec![-1.0, f32::NAN, 0.5]);
        assert_eq!(track.as_slice(), &[0.0, 0.0, 0.5]);
    }

    #[test]
    fn downmix_averages_channels() {
        let mono = downmix_to_mono(&[1.0, 0.0, -1.0, -1.0], 2);
        assert_eq!(mono, vec![0.5, -1.0]);
    }
}
