//! Stream questions to a practice session until the learner stops.
//!
//! Run with: `cargo run --example practice_session`
//!
//! The session starts with the bank's matching questions, then tops its
//! reserve up with generated ones. Running on a tokio runtime lets the
//! low-water top-up happen in the background between batches.

use practice_assembly::{Difficulty, PracticeEngine, QuestionBank};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engine = PracticeEngine::new(QuestionBank::from_questions(Vec::new()));

    for round in 1..=3 {
        let batch = engine
            .next_batch("demo-learner", "thinking-skills", "6", Difficulty::Medium, 5)
            .expect("session serves questions");
        println!("── round {round} ──");
        for q in &batch {
            println!("{} [{}]", q.id, q.topic);
            println!("  {}", q.content.replace('\n', "\n  "));
            println!("  options: {}", q.options.join(" | "));
        }
        let reserve = engine.sessions().reserve_len("demo-learner").unwrap_or(0);
        println!("reserve after round {round}: {reserve}");
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    let delivered = engine.sessions().delivered_count("demo-learner").unwrap_or(0);
    println!("delivered {delivered} distinct questions");
    engine.close_session("demo-learner");
}
