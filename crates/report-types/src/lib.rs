//! Validated primitive types shared across the report generator crates.
//!
//! Values of these types are checked once at construction, so code further down the pipeline
//! can rely on their invariants without re-validating.

/// Maximum number of characters kept from a caller-supplied session identifier.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A caller-supplied session identifier rewritten into a safe single path segment.
///
/// Every character outside `[A-Za-z0-9_-]` is replaced with `_`, so separators (`/`, `\`) and
/// dots can never reach a filesystem path. The result is truncated to
/// [`MAX_SESSION_ID_LEN`] characters.
///
/// ```
/// use report_types::SessionId;
///
/// let id = SessionId::sanitise("../etc/passwd").unwrap();
/// assert_eq!(id.as_str(), "___etc_passwd");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Sanitises `raw` into a `SessionId`.
    ///
    /// Leading and trailing whitespace is trimmed before sanitising.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if `raw` is empty or whitespace-only.
    pub fn sanitise(raw: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }

        let safe: String = trimmed
            .chars()
            .take(MAX_SESSION_ID_LEN)
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        Ok(Self(safe))
    }

    /// Returns the sanitised identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for SessionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SessionId::sanitise(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims() {
        let text = NonEmptyText::new("  hello ").unwrap();
        assert_eq!(text.as_str(), "hello");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn test_session_id_keeps_safe_characters() {
        let id = SessionId::sanitise("Temp_abc-123").unwrap();
        assert_eq!(id.as_str(), "Temp_abc-123");
    }

    #[test]
    fn test_session_id_rewrites_traversal() {
        let id = SessionId::sanitise("../../secret").unwrap();
        assert_eq!(id.as_str(), "______secret");
        assert!(!id.as_str().contains('/'));
        assert!(!id.as_str().contains('.'));
    }

    #[test]
    fn test_session_id_rewrites_separators_and_dots() {
        assert_eq!(SessionId::sanitise("..").unwrap().as_str(), "__");
        assert_eq!(SessionId::sanitise("a\\b/c").unwrap().as_str(), "a_b_c");
        assert_eq!(SessionId::sanitise("s p a c e").unwrap().as_str(), "s_p_a_c_e");
    }

    #[test]
    fn test_session_id_of_only_replaced_characters_is_kept() {
        assert_eq!(SessionId::sanitise("...").unwrap().as_str(), "___");
        assert_eq!(SessionId::sanitise("  //  ").unwrap().as_str(), "__");
    }

    #[test]
    fn test_session_id_rejects_empty() {
        assert_eq!(SessionId::sanitise(""), Err(TextError::Empty));
        assert_eq!(SessionId::sanitise("  \t"), Err(TextError::Empty));
    }

    #[test]
    fn test_session_id_truncates() {
        let long = "a".repeat(MAX_SESSION_ID_LEN + 50);
        let id = SessionId::sanitise(&long).unwrap();
        assert_eq!(id.as_str().len(), MAX_SESSION_ID_LEN);
    }

    #[test]
    fn test_session_id_deserialises_sanitised() {
        let id: SessionId = serde_json::from_str("\"x/y\"").unwrap();
        assert_eq!(id.as_str(), "x_y");
    }
}
