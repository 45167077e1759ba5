//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest username accepted, in characters.
pub const USERNAME_MAX_CHARS: usize = 10;

/// Validates a display name: 1 to 10 characters, no `#` (reserved for the handle suffix).
///
/// # Examples
///
/// ```ignore
/// validate_username("ann")         // Ok
/// validate_username("ann#1")       // Err - reserved separator
/// validate_username("abcdefghijk") // Err - too long
/// ```
pub fn validate_username(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len == 0 || len > USERNAME_MAX_CHARS {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!("Username must be between 1 and {USERNAME_MAX_CHARS} characters (got {len})")
                .into(),
        );
        return Err(err);
    }

    if name.contains('#') {
        let mut err = ValidationError::new("username_format");
        err.message = Some("Username cannot contain '#'".into());
        return Err(err);
    }

    if name.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("username_format");
        err.message = Some("Username cannot contain whitespace".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert!(validate_username("ann").is_ok());
        assert!(validate_username("abcdefghij").is_ok());
        assert!(validate_username("élodie").is_ok());
    }

    #[test]
    fn test_validate_username_invalid_length() {
        assert!(validate_username("").is_err());
        assert!(validate_username("abcdefghijk").is_err()); // 11 chars
    }

    #[test]
    fn test_validate_username_invalid_format() {
        assert!(validate_username("ann#0042").is_err());
        assert!(validate_username("#").is_err());
        assert!(validate_username("an n").is_err());
    }
}
