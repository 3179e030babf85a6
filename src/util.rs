//! Input validation helpers for the services layer.

/// Validate a free-text field: trimmed, non-empty, within a length bound.
/// Returns the trimmed value.
pub fn validate_bounded_string(
    value: &str,
    field: &str,
    min: usize,
    max: usize,
) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.len() < min {
        return Err(format!("{field} must be at least {min} characters"));
    }
    if trimmed.len() > max {
        return Err(format!("{field} must be at most {max} characters"));
    }
    Ok(trimmed.to_string())
}

/// Validate a `YYYY-MM-DD` calendar date string.
pub fn validate_yyyy_mm_dd(value: &str, field: &str) -> Result<(), String> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("{field} must be a YYYY-MM-DD date, got '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_string_trims() {
        assert_eq!(
            validate_bounded_string("  Review PRs  ", "podText", 1, 100).unwrap(),
            "Review PRs"
        );
    }

    #[test]
    fn test_bounded_string_rejects_blank() {
        assert!(validate_bounded_string("   ", "podText", 1, 100).is_err());
    }

    #[test]
    fn test_bounded_string_rejects_too_long() {
        let long = "x".repeat(101);
        assert!(validate_bounded_string(&long, "podText", 1, 100).is_err());
    }

    #[test]
    fn test_yyyy_mm_dd() {
        assert!(validate_yyyy_mm_dd("2024-05-01", "date").is_ok());
        assert!(validate_yyyy_mm_dd("2024-13-01", "date").is_err());
        assert!(validate_yyyy_mm_dd("01/05/2024", "date").is_err());
    }
}
