mod ai_settings;
mod attempt;
mod config;
mod ids;
mod language;
mod question;
mod result;
mod session_key;

pub use ai_settings::{AiSettings, AiSettingsDraft, SettingsError};
pub use attempt::{Attempt, attempted_ids, first_pass_attempt, max_round};
pub use config::{ConfigError, Difficulty, MAX_QUESTION_COUNT, TestConfig};
pub use ids::{ParseIdError, QuestionId, ResultId};
pub use language::{Language, SUPPORTED_LANGUAGES};
pub use question::{OPTION_COUNT, Question, QuestionDraft, QuestionError};
pub use result::{ResultError, TestResult, one_shot_accuracy};
pub use session_key::{SessionKey, SessionKeyError};
