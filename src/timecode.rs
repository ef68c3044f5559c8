use crate::error::{CollabResult, CollaboratorError};

/// `"HH:MM:SS,mmm"` (a `.` separator is accepted too) to seconds.
pub fn parse_srt_time(value: &str) -> CollabResult<f64> {
    let invalid = || CollaboratorError::transcript(format!("invalid SRT timestamp '{value}'"));
    let normalized = value.trim().replace(',', ".");
    let mut parts = normalized.split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let hours: u32 = hours.trim().parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.trim().parse().map_err(|_| invalid())?;
    let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }
    Ok(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}

/// `HH:MM:SS.mmm`, keeping the sign of negative values.
pub fn format_seconds(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let total_millis = (seconds.abs() * 1000.0).round() as u64;
    let millis = total_millis % 1000;
    let total_secs = total_millis / 1000;
    format!(
        "{sign}{:02}:{:02}:{:02}.{millis:03}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_srt_timestamps() {
        assert_eq!(parse_srt_time("00:00:10,500").unwrap(), 10.5);
        assert_eq!(parse_srt_time("01:02:03.250").unwrap(), 3723.25);
        assert_eq!(parse_srt_time(" 00:01:00,000 ").unwrap(), 60.0);
    }

    #[test]
    fn rejects_malformed_timestamps() {
        for bad in ["", "10,5", "00:00", "aa:00:01,000", "00:00:01:00", "00:00:-1"] {
            assert!(parse_srt_time(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn formats_with_millis() {
        assert_eq!(format_seconds(0.0), "00:00:00.000");
        assert_eq!(format_seconds(3723.25), "01:02:03.250");
        assert_eq!(format_seconds(-1.5), "-00:00:01.500");
    }

    #[test]
    fn millisecond_rounding_carries() {
        assert_eq!(format_seconds(59.9996), "00:01:00.000");
    }
}
