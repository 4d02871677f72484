use quiz_core::engine::{StartMode, Transition};
use quiz_core::model::{Language, Question, TestConfig, TestResult};
use services::analytics::{ReviewFilter, review_items, topic_mastery};
use services::{AppServices, QuizLoopService, QuizSession};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::report::letter;

/// What the student typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(usize),
    TogglePause,
    Finish,
    Leave,
    Abandon,
    Language(String),
    Help,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("l ") {
        return Input::Language(rest.trim().to_owned());
    }
    match line.to_ascii_lowercase().as_str() {
        "a" => Input::Answer(0),
        "b" => Input::Answer(1),
        "c" => Input::Answer(2),
        "d" => Input::Answer(3),
        "p" => Input::TogglePause,
        "f" => Input::Finish,
        "q" => Input::Leave,
        "x" => Input::Abandon,
        _ => Input::Help,
    }
}

fn print_help() {
    println!("  a-d  answer    p  pause/resume    f  finish now    q  save and quit    x  discard    l <language>  switch language");
}

fn print_question(session: &QuizSession, question: &Question) {
    let progress = session.progress();
    println!();
    println!(
        "Round {} | question {}/{} | covered {}% | {} carried to next round{}",
        progress.round,
        progress.position,
        progress.pool_size,
        progress.percent(),
        progress.carried_to_next_round,
        if progress.paused { " | PAUSED" } else { "" },
    );
    println!("[{}] {}", question.topic(), question.text());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", letter(i));
    }
}

fn print_summary(result: &TestResult, questions: &[Question]) {
    println!();
    println!(
        "Done. One-shot accuracy {}% over {} questions in {} round(s).",
        result.one_shot_accuracy(),
        result.attempted_count(),
        result.rounds()
    );
    for topic in topic_mastery(result, questions) {
        println!(
            "  {:<24} {:>3}%  ({}/{})",
            topic.topic,
            topic.percent(),
            topic.first_try_correct,
            topic.attempted
        );
    }
    let mistakes = review_items(result, questions, ReviewFilter::Mistakes);
    if !mistakes.is_empty() {
        println!("Missed on the first try:");
        for item in mistakes {
            let Some(question) = item.question else {
                continue;
            };
            println!(
                "  - {} -> {}",
                question.text(),
                question.options()[question.correct_answer()]
            );
            if let Some(explanation) = question.explanation() {
                println!("    {explanation}");
            }
        }
    }
}

/// Input that arrived while feedback was on screen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Swallowed {
    lines: usize,
    closed: bool,
}

/// Keep the feedback up for `delay` while reading and discarding whatever is
/// typed meanwhile, so it never lands on the next question.
async fn hold_feedback<R>(lines: &mut Lines<R>, delay: Duration) -> std::io::Result<Swallowed>
where
    R: AsyncBufRead + Unpin,
{
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    let mut swallowed = Swallowed::default();
    while !swallowed.closed {
        tokio::select! {
            () = &mut sleep => return Ok(swallowed),
            line = lines.next_line() => match line? {
                Some(_) => swallowed.lines += 1,
                None => swallowed.closed = true,
            },
        }
    }
    sleep.await;
    Ok(swallowed)
}

async fn refresh_translation(quiz: &QuizLoopService, session: &mut QuizSession) {
    if let Some(translation) = quiz.translate_current(session).await {
        quiz.apply_translation(session, translation);
    }
}

/// Interactive mastery loop on stdin/stdout.
pub async fn run(
    services: &AppServices,
    student_name: &str,
    config: TestConfig,
    language: Option<Language>,
) -> Result<(), Box<dyn std::error::Error>> {
    let quiz = services.quiz();
    if services.is_remote() {
        println!("Generating questions...");
    }
    let mut session = quiz.start_session(student_name, config).await?;

    match session.start_mode() {
        StartMode::Resumed { .. } => println!("Welcome back, picking up where you left off."),
        StartMode::Discarded(_) => println!("Starting a new quiz (your saved one was for a different subject)."),
        StartMode::Fresh => {}
    }
    if let Some(language) = language {
        quiz.set_language(&mut session, language).await?;
    }
    print_help();

    let delay = quiz.settings().feedback_delay();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut input_closed = false;
    while !session.is_finished() {
        refresh_translation(&quiz, &mut session).await;
        let Some(question) = session.displayed_question().cloned() else {
            break;
        };
        print_question(&session, &question);

        let line = if input_closed {
            None
        } else {
            lines.next_line().await?
        };
        let Some(line) = line else {
            quiz.leave(&mut session).await?;
            return Ok(());
        };

        match parse_input(&line) {
            Input::Answer(selected) => match quiz.submit_answer(&mut session, selected).await {
                Ok(submission) => {
                    if submission.is_correct {
                        println!("Correct!");
                    } else {
                        println!(
                            "Not quite. Answer: {}) {}",
                            letter(submission.correct_answer),
                            question.options()[submission.correct_answer]
                        );
                        if let Some(explanation) = question.explanation() {
                            println!("{explanation}");
                        }
                    }
                    let swallowed = hold_feedback(&mut lines, delay).await?;
                    if swallowed.lines > 0 {
                        println!("(ignored {} line(s) typed during feedback)", swallowed.lines);
                    }
                    input_closed = swallowed.closed;
                    match quiz.commit_feedback(&mut session, &submission.ticket).await? {
                        Transition::NewRound { round, pool_size } => {
                            println!();
                            println!("Round {round}: {pool_size} question(s) to retry.");
                        }
                        Transition::Advanced { .. } | Transition::Completed => {}
                    }
                }
                Err(e) if e.is_rejection() => println!("{e}"),
                Err(e) => return Err(e.into()),
            },
            Input::TogglePause => {
                let paused = quiz.toggle_pause(&mut session).await?;
                println!("{}", if paused { "Paused." } else { "Resumed." });
            }
            Input::Finish => match quiz.finish_now(&mut session).await {
                Ok(_) => {}
                Err(e) if e.is_rejection() => println!("{e}"),
                Err(e) => return Err(e.into()),
            },
            Input::Leave => {
                quiz.leave(&mut session).await?;
                println!("Progress saved. Run the same command again to continue.");
                return Ok(());
            }
            Input::Abandon => {
                quiz.abandon(session).await?;
                println!("Quiz discarded.");
                return Ok(());
            }
            Input::Language(name) => match Language::parse(&name) {
                Some(language) => {
                    quiz.set_language(&mut session, language).await?;
                }
                None => println!("unsupported language: {name}"),
            },
            Input::Help => print_help(),
        }
    }

    if let Some(result) = session.result() {
        print_summary(result, session.engine().state().questions());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input(" B "), Input::Answer(1));
        assert_eq!(parse_input("p"), Input::TogglePause);
        assert_eq!(parse_input("f"), Input::Finish);
        assert_eq!(parse_input("q"), Input::Leave);
        assert_eq!(parse_input("X"), Input::Abandon);
        assert_eq!(parse_input("l Tamil"), Input::Language("Tamil".into()));
        assert_eq!(parse_input("e"), Input::Help);
    }

    #[tokio::test]
    async fn typing_during_feedback_is_swallowed() {
        let mut lines = BufReader::new(&b"b\nc\n"[..]).lines();
        let swallowed = hold_feedback(&mut lines, Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(
            swallowed,
            Swallowed {
                lines: 2,
                closed: true
            }
        );
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn input_after_feedback_reaches_the_next_question() {
        let (reader, mut writer) = tokio::io::duplex(64);
        let mut lines = BufReader::new(reader).lines();
        let swallowed = hold_feedback(&mut lines, Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(swallowed, Swallowed::default());

        writer.write_all(b"a\n").await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("a"));
    }
}
