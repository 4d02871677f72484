#![forbid(unsafe_code)]

pub mod ai;
pub mod analytics;
pub mod app_services;
pub mod error;
pub mod quiz;
pub mod supplier;
pub mod translation;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AiError, AppServicesError, GenerationError, QuizError};
pub use quiz::{QuizLoopService, QuizSession, QuizSettings, Translation};
pub use supplier::{ChatQuestionSupplier, QuestionBank, QuestionSupplier};
pub use translation::{ChatTranslator, IdentityTranslator, Translator};
