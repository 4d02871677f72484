use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest question set a single session may request.
pub const MAX_QUESTION_COUNT: u32 = 50;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("competition must not be empty")]
    EmptyCompetition,
    #[error("class must not be empty")]
    EmptyClass,
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("at least one chapter must be selected")]
    NoChapters,
    #[error("question count must be between 1 and {MAX_QUESTION_COUNT}, got {0}")]
    QuestionCount(u32),
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

/// How hard the generated questions should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ConfigError::UnknownDifficulty(s.to_owned())),
        }
    }
}

/// The curriculum slice a student asked to be quizzed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    pub competition: String,
    pub class_name: String,
    pub subject: String,
    pub chapters: Vec<String>,
    pub question_count: u32,
    pub difficulty: Difficulty,
}

impl TestConfig {
    /// Normalize and check the configuration before any questions are requested.
    ///
    /// Chapter names are trimmed, blanks dropped and duplicates removed while
    /// keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for blank fields, an empty chapter list, or a
    /// question count outside `1..=MAX_QUESTION_COUNT`.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.competition = self.competition.trim().to_owned();
        self.class_name = self.class_name.trim().to_owned();
        self.subject = self.subject.trim().to_owned();

        if self.competition.is_empty() {
            return Err(ConfigError::EmptyCompetition);
        }
        if self.class_name.is_empty() {
            return Err(ConfigError::EmptyClass);
        }
        if self.subject.is_empty() {
            return Err(ConfigError::EmptySubject);
        }

        let mut chapters: Vec<String> = Vec::with_capacity(self.chapters.len());
        for chapter in self.chapters {
            let chapter = chapter.trim();
            if !chapter.is_empty() && !chapters.iter().any(|c| c == chapter) {
                chapters.push(chapter.to_owned());
            }
        }
        if chapters.is_empty() {
            return Err(ConfigError::NoChapters);
        }
        self.chapters = chapters;

        if self.question_count == 0 || self.question_count > MAX_QUESTION_COUNT {
            return Err(ConfigError::QuestionCount(self.question_count));
        }

        Ok(self)
    }

    /// True when a saved session for `other` may be resumed under this config.
    ///
    /// Only the subject is compared.
    #[must_use]
    pub fn same_subject(&self, other: &TestConfig) -> bool {
        self.subject == other.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TestConfig {
        TestConfig {
            competition: "CBSE Board".into(),
            class_name: "Class 10".into(),
            subject: "Mathematics".into(),
            chapters: vec!["Polynomials".into()],
            question_count: 10,
            difficulty: Difficulty::Medium,
        }
    }

    #[test]
    fn zero_chapters_rejected() {
        let mut c = config();
        c.chapters = vec!["  ".into()];
        assert_eq!(c.validate().unwrap_err(), ConfigError::NoChapters);
    }

    #[test]
    fn chapters_are_deduplicated_in_order() {
        let mut c = config();
        c.chapters = vec!["Triangles".into(), " Polynomials ".into(), "Triangles".into()];
        let c = c.validate().unwrap();
        assert_eq!(c.chapters, vec!["Triangles".to_string(), "Polynomials".to_string()]);
    }

    #[test]
    fn question_count_bounds() {
        let mut c = config();
        c.question_count = 0;
        assert!(matches!(c.clone().validate(), Err(ConfigError::QuestionCount(0))));
        c.question_count = MAX_QUESTION_COUNT + 1;
        assert!(c.validate().is_err());
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
    }
}
