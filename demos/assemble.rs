//! Assemble a full placement test and print its shape.
//!
//! Run with: `cargo run --example assemble`
//!
//! Set `RUST_LOG=practice_assembly=debug` to see shortfall warnings and the
//! assembly summary.
//!
//! The bank here holds a handful of authored maths questions, so most of the
//! test is procedurally generated. The same RNG seed always produces the
//! same test.

use std::collections::{BTreeSet, HashSet};

use practice_assembly::{Difficulty, PracticeEngine, Question, QuestionBank};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

fn authored(id: &str, content: &str, answer: &str, wrong: [&str; 3], difficulty: Difficulty) -> Question {
    let mut options: Vec<String> = wrong.iter().map(|w| w.to_string()).collect();
    options.insert(1, answer.to_string());
    Question {
        id: id.to_string(),
        content: content.to_string(),
        options,
        correct_answer: answer.to_string(),
        explanation: String::new(),
        subject: "Mathematics".to_string(),
        topic: "Arithmetic".to_string(),
        grade: "5".to_string(),
        difficulty,
        tags: BTreeSet::new(),
        is_generated: false,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let bank = QuestionBank::from_questions(vec![
        authored("bank-1", "What is 12 + 30?", "42", ["40", "32", "52"], Difficulty::Easy),
        authored("bank-2", "What is 9 × 7?", "63", ["56", "72", "61"], Difficulty::Easy),
        authored("bank-3", "What is 3/4 of 24?", "18", ["6", "16", "20"], Difficulty::Medium),
        authored("bank-4", "What is 15% of 80?", "12", ["8", "15", "18"], Difficulty::Medium),
        authored("bank-5", "Solve 3x + 4 = 19.", "5", ["4", "6", "7"], Difficulty::Hard),
    ]);
    let engine = PracticeEngine::new(bank);

    let report = engine.validate("opportunity-class", "5").expect("bank loads");
    println!("Can the bank alone fill the test? {}", report.can_generate);
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    println!();

    let mut rng = StdRng::seed_from_u64(2024);
    let test = engine
        .assemble_with_rng("opportunity-class", "5", &HashSet::new(), &mut rng)
        .expect("assembly succeeds");

    println!("Test {}  ({} questions, {} minutes)", test.id, test.total_questions, test.time_limit_minutes);
    for section in &test.sections {
        println!(
            "━━ {} [{}..{})  generated: {}",
            section.name, section.start_index, section.end_index, section.generated_count
        );
        for q in section.questions.iter().take(2) {
            let first_line = q.content.lines().next().unwrap_or_default();
            println!("   {:<28} {}", q.id, first_line);
            println!("   {:<28} options: {}  answer: {}", "", q.options.join(" | "), q.correct_answer);
        }
    }
}
