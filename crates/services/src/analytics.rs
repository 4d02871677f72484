//! Read-only views over finalized results: per-topic mastery, answer review,
//! class leaderboards and the admin overview.

use std::collections::{BTreeMap, HashMap, HashSet};

use quiz_core::model::{Attempt, Question, QuestionId, TestResult, first_pass_attempt, max_round};

/// Number of entries shown on a leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

fn rounded_percent(part: u64, whole: u64) -> u32 {
    let whole = whole.max(1);
    u32::try_from((200 * part + whole) / (2 * whole)).unwrap_or(u32::MAX)
}

//
// ─── TOPIC MASTERY ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMastery {
    pub topic: String,
    pub first_try_correct: usize,
    pub attempted: usize,
}

impl TopicMastery {
    #[must_use]
    pub fn percent(&self) -> u32 {
        rounded_percent(self.first_try_correct as u64, self.attempted as u64)
    }
}

/// First-try mastery per topic, over attempted questions only, in the order
/// topics first appear in `questions`.
#[must_use]
pub fn topic_mastery(result: &TestResult, questions: &[Question]) -> Vec<TopicMastery> {
    let attempted: HashSet<&QuestionId> = result.attempts().iter().map(|a| &a.question_id).collect();
    let mut topics: Vec<TopicMastery> = Vec::new();

    for question in questions.iter().filter(|q| attempted.contains(q.id())) {
        let first_try = first_pass_attempt(result.attempts(), question.id()).is_some_and(|a| a.is_correct);
        let entry = match topics.iter_mut().position(|t| t.topic == question.topic()) {
            Some(i) => &mut topics[i],
            None => {
                topics.push(TopicMastery {
                    topic: question.topic().to_owned(),
                    first_try_correct: 0,
                    attempted: 0,
                });
                let last = topics.len() - 1;
                &mut topics[last]
            }
        };
        entry.attempted += 1;
        if first_try {
            entry.first_try_correct += 1;
        }
    }
    topics
}

//
// ─── ANSWER REVIEW ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewFilter {
    #[default]
    All,
    /// Questions whose round-1 answer was wrong.
    Mistakes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem<'a> {
    pub question_id: &'a QuestionId,
    /// Missing when the question is not in the supplied metadata.
    pub question: Option<&'a Question>,
    pub first_attempt: Option<&'a Attempt>,
}

impl ReviewItem<'_> {
    #[must_use]
    pub fn is_mistake(&self) -> bool {
        self.first_attempt.is_some_and(|a| !a.is_correct)
    }
}

/// Every attempted question in first-attempt order, with its round-1 answer.
#[must_use]
pub fn review_items<'a>(
    result: &'a TestResult,
    questions: &'a [Question],
    filter: ReviewFilter,
) -> Vec<ReviewItem<'a>> {
    let mut seen = HashSet::new();
    result
        .attempts()
        .iter()
        .map(|a| &a.question_id)
        .filter(|id| seen.insert(*id))
        .map(|id| ReviewItem {
            question_id: id,
            question: questions.iter().find(|q| q.id() == id),
            first_attempt: first_pass_attempt(result.attempts(), id),
        })
        .filter(|item| match filter {
            ReviewFilter::All => true,
            ReviewFilter::Mistakes => item.is_mistake(),
        })
        .collect()
}

//
// ─── LEADERBOARD ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub student_name: String,
    pub best_accuracy: u32,
}

/// Best one-shot accuracy per student for one class and subject, highest
/// first, ties by name.
#[must_use]
pub fn leaderboard(history: &[TestResult], class_name: &str, subject: &str) -> Vec<LeaderboardEntry> {
    let mut best: HashMap<&str, u32> = HashMap::new();
    for r in history
        .iter()
        .filter(|r| r.config().class_name == class_name && r.config().subject == subject)
    {
        let score = best.entry(r.student_name()).or_insert(0);
        *score = (*score).max(r.one_shot_accuracy());
    }

    let mut entries: Vec<LeaderboardEntry> = best
        .into_iter()
        .map(|(name, best_accuracy)| LeaderboardEntry {
            student_name: name.to_owned(),
            best_accuracy,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.best_accuracy
            .cmp(&a.best_accuracy)
            .then_with(|| a.student_name.cmp(&b.student_name))
    });
    entries.truncate(LEADERBOARD_SIZE);
    entries
}

//
// ─── ADMIN OVERVIEW ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    pub total_tests: usize,
    pub average_accuracy: u32,
    pub unique_students: usize,
    /// Sum over results of the highest round each one reached.
    pub total_loops: u64,
}

/// Totals across the stored history; `None` when there is nothing stored.
#[must_use]
pub fn overview(history: &[TestResult]) -> Option<Overview> {
    if history.is_empty() {
        return None;
    }
    let accuracy_sum: u64 = history.iter().map(|r| u64::from(r.one_shot_accuracy())).sum();
    let unique_students = history
        .iter()
        .map(TestResult::student_name)
        .collect::<HashSet<_>>()
        .len();
    let total_loops = history
        .iter()
        .map(|r| u64::from(max_round(r.attempts())))
        .sum();

    Some(Overview {
        total_tests: history.len(),
        average_accuracy: rounded_percent(accuracy_sum, history.len() as u64 * 100),
        unique_students,
        total_loops,
    })
}

/// Results grouped by class name.
#[must_use]
pub fn class_folders(history: &[TestResult]) -> BTreeMap<&str, Vec<&TestResult>> {
    let mut folders: BTreeMap<&str, Vec<&TestResult>> = BTreeMap::new();
    for r in history {
        folders.entry(r.config().class_name.as_str()).or_default().push(r);
    }
    folders
}

/// One class's results grouped by student.
#[must_use]
pub fn student_folders<'a>(
    history: &'a [TestResult],
    class_name: &str,
) -> BTreeMap<&'a str, Vec<&'a TestResult>> {
    let mut folders: BTreeMap<&str, Vec<&TestResult>> = BTreeMap::new();
    for r in history.iter().filter(|r| r.config().class_name == class_name) {
        folders.entry(r.student_name()).or_default().push(r);
    }
    folders
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Difficulty, QuestionDraft, ResultId, TestConfig};
    use quiz_core::time::fixed_now;

    fn question(id: &str, topic: &str) -> Question {
        QuestionDraft {
            id: id.into(),
            category: Some("Physics".into()),
            topic: topic.into(),
            question: format!("{id}?"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 0,
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    fn config(class_name: &str, subject: &str) -> TestConfig {
        TestConfig {
            competition: "CBSE Board".into(),
            class_name: class_name.into(),
            subject: subject.into(),
            chapters: vec!["Motion".into()],
            question_count: 4,
            difficulty: Difficulty::Medium,
        }
    }

    fn attempt(id: &str, round: u32, is_correct: bool) -> Attempt {
        Attempt::new(QuestionId::new(id), round, is_correct, 0, fixed_now())
    }

    fn result(student: &str, class_name: &str, subject: &str, attempts: Vec<Attempt>) -> TestResult {
        TestResult::finalize(
            ResultId::new_v4(),
            student,
            config(class_name, subject),
            attempts,
            fixed_now(),
            fixed_now() + Duration::minutes(5),
        )
        .unwrap()
    }

    fn with_accuracy(student: &str, class_name: &str, subject: &str, correct: usize, total: usize) -> TestResult {
        let attempts = (0..total)
            .map(|i| attempt(&format!("q{i}"), 1, i < correct))
            .collect();
        result(student, class_name, subject, attempts)
    }

    #[test]
    fn topic_mastery_counts_only_attempted_questions() {
        let questions = vec![
            question("q1", "Optics"),
            question("q2", "Optics"),
            question("q3", "Motion"),
            question("q4", "Electricity"),
        ];
        let r = result(
            "Asha",
            "Class 10",
            "Physics",
            vec![
                attempt("q1", 1, true),
                attempt("q2", 1, false),
                attempt("q3", 1, false),
                attempt("q2", 2, true),
                attempt("q3", 2, true),
            ],
        );

        let mastery = topic_mastery(&r, &questions);
        assert_eq!(
            mastery,
            vec![
                TopicMastery { topic: "Optics".into(), first_try_correct: 1, attempted: 2 },
                TopicMastery { topic: "Motion".into(), first_try_correct: 0, attempted: 1 },
            ]
        );
        assert_eq!(mastery[0].percent(), 50);
        assert_eq!(mastery[1].percent(), 0);
    }

    #[test]
    fn review_filters_first_pass_mistakes() {
        let questions = vec![question("q1", "Optics"), question("q2", "Optics")];
        let r = result(
            "Asha",
            "Class 10",
            "Physics",
            vec![attempt("q1", 1, true), attempt("q2", 1, false), attempt("q2", 2, true)],
        );

        let all = review_items(&r, &questions, ReviewFilter::All);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].question_id.as_str(), "q1");

        let mistakes = review_items(&r, &questions, ReviewFilter::Mistakes);
        assert_eq!(mistakes.len(), 1);
        assert_eq!(mistakes[0].question_id.as_str(), "q2");
        assert_eq!(mistakes[0].first_attempt.map(|a| a.round), Some(1));
        assert!(mistakes[0].question.is_some());
    }

    #[test]
    fn leaderboard_keeps_best_score_per_student_in_class_and_subject() {
        let history = vec![
            with_accuracy("Asha", "Class 10", "Physics", 1, 4),
            with_accuracy("Asha", "Class 10", "Physics", 3, 4),
            with_accuracy("Ravi", "Class 10", "Physics", 2, 4),
            with_accuracy("Meera", "Class 9", "Physics", 4, 4),
            with_accuracy("Kiran", "Class 10", "Chemistry", 4, 4),
        ];
        let board = leaderboard(&history, "Class 10", "Physics");
        assert_eq!(
            board,
            vec![
                LeaderboardEntry { student_name: "Asha".into(), best_accuracy: 75 },
                LeaderboardEntry { student_name: "Ravi".into(), best_accuracy: 50 },
            ]
        );
    }

    #[test]
    fn leaderboard_is_capped_at_ten() {
        let history: Vec<_> = (0..15)
            .map(|i| with_accuracy(&format!("S{i:02}"), "Class 10", "Physics", 1, 1))
            .collect();
        let board = leaderboard(&history, "Class 10", "Physics");
        assert_eq!(board.len(), LEADERBOARD_SIZE);
        assert_eq!(board[0].student_name, "S00");
    }

    #[test]
    fn overview_sums_max_round_per_result() {
        let history = vec![
            result(
                "Asha",
                "Class 10",
                "Physics",
                vec![attempt("q1", 1, false), attempt("q1", 2, false), attempt("q1", 3, true)],
            ),
            result("Asha", "Class 10", "Physics", vec![attempt("q1", 1, true)]),
            result("Ravi", "Class 9", "Biology", vec![]),
        ];
        let stats = overview(&history).unwrap();
        assert_eq!(stats.total_tests, 3);
        assert_eq!(stats.unique_students, 2);
        assert_eq!(stats.total_loops, 4);
        // accuracies 0, 100, 0 -> 33
        assert_eq!(stats.average_accuracy, 33);
        assert!(overview(&[]).is_none());
    }

    #[test]
    fn folders_group_by_class_then_student() {
        let history = vec![
            with_accuracy("Asha", "Class 10", "Physics", 1, 1),
            with_accuracy("Ravi", "Class 9", "Physics", 1, 1),
            with_accuracy("Asha", "Class 10", "Biology", 1, 1),
        ];
        let classes = class_folders(&history);
        assert_eq!(classes.keys().copied().collect::<Vec<_>>(), vec!["Class 10", "Class 9"]);
        assert_eq!(classes["Class 10"].len(), 2);

        let students = student_folders(&history, "Class 10");
        assert_eq!(students.len(), 1);
        assert_eq!(students["Asha"].len(), 2);
    }
}
