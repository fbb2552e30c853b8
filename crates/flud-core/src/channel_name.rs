//! Channel name validation (spec §3).

use crate::errors::CoreError;

const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Validate a channel name: 1-31 characters, none of `/ \ : * ? " < > |` or
/// control bytes, and not `.` or `..`.
///
/// # Errors
///
/// `InvalidChannelName` naming the specific rule that was violated.
pub fn validate_channel_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.chars().count() > 31 {
        return Err(CoreError::InvalidChannelName {
            name: name.to_string(),
            reason: "must be 1-31 characters",
        });
    }
    if name == "." || name == ".." {
        return Err(CoreError::InvalidChannelName {
            name: name.to_string(),
            reason: "must not be \".\" or \"..\"",
        });
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(CoreError::InvalidChannelName {
            name: name.to_string(),
            reason: "must not contain control characters",
        });
    }
    if name.chars().any(|c| FORBIDDEN.contains(&c)) {
        return Err(CoreError::InvalidChannelName {
            name: name.to_string(),
            reason: "must not contain / \\ : * ? \" < > |",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate_channel_name("general").is_ok());
        assert!(validate_channel_name("team-chat_1").is_ok());
    }

    #[test]
    fn rejects_empty_and_overlong() {
        assert!(validate_channel_name("").is_err());
        assert!(validate_channel_name(&"x".repeat(32)).is_err());
    }

    #[test]
    fn rejects_dot_and_dotdot() {
        assert!(validate_channel_name(".").is_err());
        assert!(validate_channel_name("..").is_err());
    }

    #[test]
    fn rejects_forbidden_characters() {
        for bad in ["a/b", "a\\b", "a:b", "a*b", "a?b", "a\"b", "a<b", "a>b", "a|b"] {
            assert!(validate_channel_name(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn rejects_control_bytes() {
        assert!(validate_channel_name("a\nb").is_err());
    }
}
