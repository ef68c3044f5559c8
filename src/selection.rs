use serde_json::json;

use crate::error_codes::{UsageCode, UsageError};

/// Parse a 1-based soundbite selection: `None`, `"all"` or `"a"` select
/// everything; otherwise a number or comma-separated list, deduplicated in
/// first-seen order.
pub fn parse_soundbite_selection(value: Option<&str>, max: usize) -> Result<Vec<usize>, UsageError> {
    let Some(value) = value else {
        return Ok((1..=max).collect());
    };
    let normalized = value.trim().to_ascii_lowercase();
    if normalized == "all" || normalized == "a" {
        return Ok((1..=max).collect());
    }

    let mut selected = Vec::new();
    for part in normalized.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(UsageError::new(
                UsageCode::InvalidSoundbiteSelection,
                format!("'{part}' is not a soundbite number"),
            )
            .with_details(json!({ "value": value })));
        }
        let number: usize = part.parse().map_err(|_| {
            UsageError::new(
                UsageCode::InvalidSoundbiteSelection,
                format!("'{part}' is not a soundbite number"),
            )
        })?;
        if number < 1 || number > max {
            return Err(UsageError::new(
                UsageCode::SoundbiteOutOfRange,
                format!("soundbite {number} is outside 1..={max}"),
            )
            .with_details(json!({ "value": number, "max": max })));
        }
        if !selected.contains(&number) {
            selected.push(number);
        }
    }

    if selected.is_empty() {
        return Err(UsageError::new(
            UsageCode::EmptySoundbiteSelection,
            "no soundbite selected",
        ));
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_and_all_select_everything() {
        assert_eq!(parse_soundbite_selection(None, 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_soundbite_selection(Some(" ALL "), 2).unwrap(), vec![1, 2]);
        assert_eq!(parse_soundbite_selection(Some("a"), 1).unwrap(), vec![1]);
    }

    #[test]
    fn lists_are_deduplicated_in_order() {
        assert_eq!(parse_soundbite_selection(Some("3, 1,3"), 4).unwrap(), vec![3, 1]);
        assert_eq!(parse_soundbite_selection(Some("2"), 4).unwrap(), vec![2]);
    }

    #[test]
    fn invalid_selections_are_usage_errors() {
        let err = parse_soundbite_selection(Some("5"), 4).unwrap_err();
        assert_eq!(err.code, UsageCode::SoundbiteOutOfRange);
        assert_eq!(
            parse_soundbite_selection(Some("0"), 4).unwrap_err().code,
            UsageCode::SoundbiteOutOfRange
        );
        assert_eq!(
            parse_soundbite_selection(Some("1,x"), 4).unwrap_err().code,
            UsageCode::InvalidSoundbiteSelection
        );
        assert_eq!(
            parse_soundbite_selection(Some(" , "), 4).unwrap_err().code,
            UsageCode::EmptySoundbiteSelection
        );
    }
}
