//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest name accepted for a team, player, staff member or selector.
pub const MAX_NAME_LEN: usize = 120;

/// Rejects names that are empty once surrounding whitespace is removed.
///
/// ```ignore
/// validate_name("Green")  // Ok
/// validate_name("   ")    // Err - blank
/// ```
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }

    let len = trimmed.chars().count();
    if len > MAX_NAME_LEN {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!("Name must be at most {MAX_NAME_LEN} characters (got {len})").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Seasons are calendar years, e.g. `2026`.
pub fn validate_season(season: &str) -> Result<(), ValidationError> {
    let season = season.trim();
    if season.len() != 4 || !season.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("season_format");
        err.message = Some(format!("Season must be a four digit year (got `{season}`)").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_valid() {
        assert!(validate_name("Green").is_ok());
        assert!(validate_name("  Jane Doe ").is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_validate_name_invalid() {
        assert!(validate_name("").is_err());
        assert!(validate_name(" \t ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_season() {
        assert!(validate_season("2026").is_ok());
        assert!(validate_season(" 2025 ").is_ok());
        assert!(validate_season("26").is_err());
        assert!(validate_season("20x6").is_err());
        assert!(validate_season("").is_err());
    }
}
