use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the quiz can be displayed in.
pub const SUPPORTED_LANGUAGES: [&str; 8] = [
    "English", "Hindi", "Bengali", "Marathi", "Gujarati", "Tamil", "Telugu", "Urdu",
];

const BASE_LANGUAGE: &str = "English";

/// Display language for questions. Questions are generated in the base
/// language; anything else goes through the translator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    #[must_use]
    pub fn base() -> Self {
        Self(BASE_LANGUAGE.to_owned())
    }

    /// Matches `name` against [`SUPPORTED_LANGUAGES`], ignoring case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        SUPPORTED_LANGUAGES
            .iter()
            .find(|l| l.eq_ignore_ascii_case(name))
            .map(|l| Self((*l).to_owned()))
    }

    #[must_use]
    pub fn is_base(&self) -> bool {
        self.0 == BASE_LANGUAGE
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::base()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
