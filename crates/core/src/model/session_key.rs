use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionKeyError {
    #[error("student name must not be empty")]
    EmptyName,
}

/// Persistence key for an in-progress quiz.
///
/// Derived from the student's name rather than generated, so opening the
/// tool again as the same student finds the saved session. Case and
/// whitespace differences map to the same key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// # Errors
    ///
    /// Returns `SessionKeyError::EmptyName` if the name is blank.
    pub fn for_student(name: &str) -> Result<Self, SessionKeyError> {
        let normalized = name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_");
        if normalized.is_empty() {
            return Err(SessionKeyError::EmptyName);
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({})", self.0)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
