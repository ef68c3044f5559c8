//! Pseudo-equalizer bars: a fixed per-bar "sensitivity" texture scaled by
//! the current audio amplitude.

/// Seed for the bar sensitivity texture. Constant so every render of a
/// format shows the same pattern.
pub const SENSITIVITY_SEED: u64 = 42;

pub const SENSITIVITY_MIN: f32 = 0.6;
pub const SENSITIVITY_MAX: f32 = 1.4;

/// Extra gain for the centre bar, fading linearly to zero at the edges.
pub const CENTER_BOOST: f32 = 0.4;

pub const BAR_MIN_FRACTION: f32 = 0.12;
pub const BAR_MAX_FRACTION: f32 = 0.80;

/// Uniform value in `[0, 1)` for position `index` of the sequence named by
/// `seed` (splitmix64 finaliser, top 24 bits).
fn unit_noise(seed: u64, index: u64) -> f32 {
    let mut z = seed.wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 40) as f32 / (1u64 << 24) as f32
}

/// Mirrored per-bar multipliers in `[SENSITIVITY_MIN, SENSITIVITY_MAX)`.
///
/// The left half is drawn from seeded noise and reflected onto the right
/// half, so `pattern[i] == pattern[n - 1 - i]`.
pub fn sensitivity_pattern(num_bars: usize) -> Vec<f32> {
    let span = SENSITIVITY_MAX - SENSITIVITY_MIN;
    let drawn: Vec<f32> = (0..num_bars.div_ceil(2) as u64)
        .map(|index| SENSITIVITY_MIN + unit_noise(SENSITIVITY_SEED, index + 1) * span)
        .collect();

    let mut pattern = drawn.clone();
    pattern.extend(drawn[..num_bars / 2].iter().rev());
    pattern
}

/// Gain for bar `index`: `1 + CENTER_BOOST` at the centre, `1` at the edges.
pub fn center_boost(index: usize, num_bars: usize) -> f32 {
    let center = num_bars.saturating_sub(1) as f32 / 2.0;
    if center <= 0.0 {
        return 1.0 + CENTER_BOOST;
    }
    let distance = (index as f32 - center).abs();
    1.0 + (1.0 - distance / center) * CENTER_BOOST
}

/// Bars that fit `available_width`, forced even. Zero when fewer than two
/// fit, meaning no equalizer is drawn.
pub fn bar_count(available_width: f32, bar_width: u32, bar_spacing: u32) -> usize {
    let pitch = (bar_width + bar_spacing) as f32;
    if pitch <= 0.0 || available_width <= 0.0 {
        return 0;
    }
    let mut count = (available_width / pitch).floor() as usize;
    if count % 2 != 0 {
        count -= 1;
    }
    if count < 2 {
        0
    } else {
        count
    }
}

/// Height in pixels of every bar for the current `amplitude`.
pub fn bar_heights(amplitude: f32, sensitivities: &[f32], central_height: f32) -> Vec<u32> {
    let min_height = (central_height * BAR_MIN_FRACTION).floor();
    let max_height = (central_height * BAR_MAX_FRACTION).floor();
    let amplitude = if amplitude.is_finite() {
        amplitude.max(0.0)
    } else {
        0.0
    };
    let count = sensitivities.len();

    sensitivities
        .iter()
        .enumerate()
        .map(|(index, sensitivity)| {
            let gain = amplitude * sensitivity * center_boost(index, count);
            let height = (min_height + gain * (max_height - min_height)).floor();
            height.clamp(min_height, max_height) as u32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_is_mirrored_and_in_range() {
        for n in [2usize, 7, 72, 128] {
            let pattern = sensitivity_pattern(n);
            assert_eq!(pattern.len(), n);
            for i in 0..n {
                assert_eq!(pattern[i], pattern[n - 1 - i]);
                assert!((SENSITIVITY_MIN..SENSITIVITY_MAX).contains(&pattern[i]));
            }
        }
    }

    #[test]
    fn pattern_is_stable_between_calls() {
        assert_eq!(sensitivity_pattern(64), sensitivity_pattern(64));
        assert!(sensitivity_pattern(0).is_empty());
    }

    #[test]
    fn pattern_is_not_flat() {
        let pattern = sensitivity_pattern(40);
        assert!(pattern.iter().any(|&v| (v - pattern[0]).abs() > 1e-3));
    }

    #[test]
    fn noise_is_a_pure_function_of_seed_and_index() {
        assert_eq!(unit_noise(7, 3), unit_noise(7, 3));
        assert_ne!(unit_noise(7, 3), unit_noise(7, 4));
        assert_ne!(unit_noise(7, 3), unit_noise(8, 3));
        assert!((0..1_000).all(|i| (0.0..1.0).contains(&unit_noise(SENSITIVITY_SEED, i))));
    }

    #[test]
    fn boost_peaks_in_the_middle() {
        assert!((center_boost(0, 10) - 1.0).abs() < 1e-6);
        assert!((center_boost(9, 10) - 1.0).abs() < 1e-6);
        assert_eq!(center_boost(4, 10), center_boost(5, 10));
        assert!(center_boost(4, 10) > center_boost(2, 10));
    }

    #[test]
    fn bar_count_is_even() {
        assert_eq!(bar_count(1080.0, 12, 3), 72);
        assert_eq!(bar_count(1920.0, 14, 4), 106);
        assert_eq!(bar_count(16.0, 12, 3), 0);
        assert_eq!(bar_count(0.0, 12, 3), 0);
        assert_eq!(bar_count(100.0, 0, 0), 0);
    }

    #[test]
    fn heights_are_clamped_and_symmetric() {
        let pattern = sensitivity_pattern(20);
        let silent = bar_heights(0.0, &pattern, 500.0);
        assert!(silent.iter().all(|&h| h == 60));

        let loud = bar_heights(5.0, &pattern, 500.0);
        assert!(loud.iter().all(|&h| h == 400));

        let mid = bar_heights(0.4, &pattern, 500.0);
        for i in 0..20 {
            assert_eq!(mid[i], mid[19 - i]);
            assert!((60..=400).contains(&mid[i]));
        }
    }
}
