use quiz_core::model::TestResult;
use services::analytics::{class_folders, leaderboard, overview, student_folders};

/// Option index as shown on screen.
pub fn letter(index: usize) -> char {
    ['A', 'B', 'C', 'D'].get(index).copied().unwrap_or('?')
}

pub fn print_stats(history: &[TestResult]) {
    let Some(stats) = overview(history) else {
        println!("No results stored yet.");
        return;
    };
    println!("Tests taken:       {}", stats.total_tests);
    println!("Average accuracy:  {}%", stats.average_accuracy);
    println!("Students:          {}", stats.unique_students);
    println!("Total loops:       {}", stats.total_loops);

    for (class_name, results) in class_folders(history) {
        println!();
        println!("{class_name} ({} records)", results.len());
        for (student, attempts) in student_folders(history, class_name) {
            let best = attempts.iter().map(|r| r.one_shot_accuracy()).max().unwrap_or(0);
            println!("  {student:<24} {:>3} tests  best {best:>3}%", attempts.len());
        }
    }
}

pub fn print_leaderboard(history: &[TestResult], class_name: &str, subject: &str) {
    let board = leaderboard(history, class_name, subject);
    if board.is_empty() {
        println!("No results for {class_name} / {subject}.");
        return;
    }
    println!("{class_name} / {subject}");
    for (rank, entry) in board.iter().enumerate() {
        println!("  {:>2}. {:<24} {:>3}%", rank + 1, entry.student_name, entry.best_accuracy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_option_indices() {
        assert_eq!(letter(0), 'A');
        assert_eq!(letter(3), 'D');
        assert_eq!(letter(7), '?');
    }
}
