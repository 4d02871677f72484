use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use quiz_core::model::{AiSettings, Difficulty, Language, TestConfig};
use services::{AppServices, Clock, QuizSettings};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod report;
mod take;

#[derive(Parser, Debug)]
#[command(name = "quiz")]
#[command(about = "Mastery-loop revision quizzes: missed questions come back until answered")]
struct Cli {
    /// SQLite database for saved sessions and results
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3", global = true)]
    db_url: String,

    /// Use the built-in question bank even when an AI key is configured
    #[arg(long, global = true)]
    offline: bool,

    /// How long answer feedback stays on screen, in milliseconds
    #[arg(long, env = "QUIZ_FEEDBACK_MS", default_value_t = 1200, global = true)]
    feedback_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Take (or resume) a quiz
    Take(TakeArgs),
    /// Overview of every stored result
    Stats,
    /// Best scores for one class and subject
    Leaderboard {
        #[arg(long = "class")]
        class_name: String,
        #[arg(long)]
        subject: String,
    },
}

#[derive(ClapArgs, Debug)]
struct TakeArgs {
    /// Student name; also identifies the saved session
    #[arg(long)]
    name: String,

    /// Board or exam being prepared for
    #[arg(long, default_value = "CBSE Board")]
    competition: String,

    #[arg(long = "class")]
    class_name: String,

    #[arg(long)]
    subject: String,

    /// Chapter to include; repeat for several
    #[arg(long = "chapter", required = true)]
    chapters: Vec<String>,

    #[arg(long, default_value_t = 10)]
    count: u32,

    #[arg(long, default_value = "medium")]
    difficulty: Difficulty,

    /// Display language (English, Hindi, Bengali, Marathi, Gujarati, Tamil, Telugu, Urdu)
    #[arg(long, value_parser = parse_language)]
    language: Option<Language>,
}

impl TakeArgs {
    fn config(&self) -> TestConfig {
        TestConfig {
            competition: self.competition.clone(),
            class_name: self.class_name.clone(),
            subject: self.subject.clone(),
            chapters: self.chapters.clone(),
            question_count: self.count,
            difficulty: self.difficulty,
        }
    }
}

fn parse_language(raw: &str) -> Result<Language, String> {
    Language::parse(raw).ok_or_else(|| format!("unsupported language: {raw}"))
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") || trimmed.starts_with("sqlite:file:") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(format!("invalid --db value: {db_url}").into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

fn init_tracing() {
    // stderr keeps the quiz itself readable on stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_url = normalize_sqlite_url(&cli.db_url);
    prepare_sqlite_file(&db_url)?;
    debug!(%db_url, offline = cli.offline, feedback_ms = cli.feedback_ms, "starting");

    let settings = QuizSettings::default().with_feedback_delay(Duration::from_millis(cli.feedback_ms));
    let ai = AiSettings::from_env()?;
    let services =
        AppServices::new_sqlite(&db_url, Clock::default_clock(), settings, ai, cli.offline).await?;

    match cli.command {
        Command::Take(args) => take::run(&services, &args.name, args.config(), args.language).await,
        Command::Stats => {
            let history = services.history().await?;
            report::print_stats(&history);
            Ok(())
        }
        Command::Leaderboard {
            class_name,
            subject,
        } => {
            let history = services.history().await?;
            report::print_leaderboard(&history, &class_name, &subject);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_take_with_repeated_chapters() {
        let cli = Cli::try_parse_from([
            "quiz", "--offline", "take", "--name", "Asha", "--class", "Class 10", "--subject",
            "Physics", "--chapter", "Optics", "--chapter", "Electricity", "--difficulty", "hard",
            "--language", "hindi",
        ])
        .unwrap();
        assert!(cli.offline);
        let Command::Take(args) = cli.command else {
            panic!("expected take");
        };
        let config = args.config();
        assert_eq!(config.chapters, vec!["Optics", "Electricity"]);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.question_count, 10);
        assert_eq!(args.language.map(|l| l.to_string()), Some("Hindi".to_owned()));
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(parse_language("Klingon").is_err());
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        assert!(normalize_sqlite_url("data/quiz.db").starts_with("sqlite:///"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("sqlite://x.db"), "sqlite://x.db");
    }
}
