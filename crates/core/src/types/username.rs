//! Username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input is shorter than the minimum length.
    #[error("username must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The input is longer than the maximum length.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside the allowed set.
    #[error("username cannot contain {0:?}")]
    InvalidCharacter(char),
}

/// A public display handle, unique per user.
///
/// ASCII letters, digits, `_`, `-` and `.` only. Case is preserved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Minimum username length.
    pub const MIN_LENGTH: usize = 3;

    /// Maximum username length.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a `Username` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is outside 3-32 characters or
    /// contains anything other than ASCII alphanumerics, `_`, `-` or `.`.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let s = s.trim();

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(UsernameError::InvalidCharacter(c));
        }

        // All characters are ASCII past this point, so len() counts characters.
        if s.len() < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_usernames() {
        assert!(Username::parse("ada").is_ok());
        assert!(Username::parse("storm_chaser-99.v2").is_ok());
        assert_eq!(
            Username::parse("  padded  ").map(|u| u.to_string()),
            Ok("padded".to_owned())
        );
    }

    #[test]
    fn test_parse_length_limits() {
        assert_eq!(
            Username::parse("ab"),
            Err(UsernameError::TooShort { min: 3 })
        );
        assert_eq!(
            Username::parse(&"a".repeat(33)),
            Err(UsernameError::TooLong { max: 32 })
        );
    }

    #[test]
    fn test_parse_rejects_other_characters() {
        assert_eq!(
            Username::parse("rain drop"),
            Err(UsernameError::InvalidCharacter(' '))
        );
        assert_eq!(
            Username::parse("nuage☁"),
            Err(UsernameError::InvalidCharacter('☁'))
        );
    }
}
