mod service;
mod session;
mod settings;

pub use service::QuizLoopService;
pub use session::{QuizSession, Translation};
pub use settings::QuizSettings;
