//! Thinking-skills puzzles: patterns, analogies, syllogisms, directions and
//! ordering. Answers are derived from the puzzle parameters, never looked up.

use rand::Rng;

use crate::assembly_engine::{
    helpers::{finalize_options, numeric_options, text_distractors, Draft, GradeBand},
    models::Difficulty,
    shuffle::{pick, shuffle, shuffled},
};

#[derive(Debug, Clone, Copy)]
enum Archetype {
    NumberPattern,
    LetterPattern,
    Analogy,
    Syllogism,
    CompassTurn,
    Ordering,
}

fn catalogue(band: GradeBand, difficulty: Difficulty) -> &'static [Archetype] {
    use Archetype::*;
    match (band, difficulty) {
        (GradeBand::Early, _)                      => &[NumberPattern, Analogy, CompassTurn],
        (_, Difficulty::Easy)                      => &[NumberPattern, LetterPattern, Analogy],
        (GradeBand::Primary, Difficulty::Medium)   => &[NumberPattern, CompassTurn, Ordering],
        (_, Difficulty::Medium)                    => &[LetterPattern, CompassTurn, Ordering, Syllogism],
        (_, Difficulty::Hard)                      => &[NumberPattern, Syllogism, Ordering, CompassTurn],
    }
}

pub fn generate<R: Rng>(rng: &mut R, level: u8, difficulty: Difficulty) -> Draft {
    let band = GradeBand::from_level(level);
    match *pick(catalogue(band, difficulty), rng) {
        Archetype::NumberPattern => number_pattern(rng, difficulty),
        Archetype::LetterPattern => letter_pattern(rng, difficulty),
        Archetype::Analogy       => analogy(rng, difficulty),
        Archetype::Syllogism     => syllogism(rng, difficulty),
        Archetype::CompassTurn   => compass_turn(rng, difficulty),
        Archetype::Ordering      => ordering(rng, difficulty),
    }
}

// ── patterns ────────────────────────────────────────────────────────────────

fn number_pattern<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    let (terms, next, rule): (Vec<i64>, i64, String) = match difficulty {
        Difficulty::Easy => {
            let start = rng.gen_range(1..=20);
            let step = rng.gen_range(2..=9);
            let terms: Vec<i64> = (0..5).map(|i| start + i * step).collect();
            (terms, start + 5 * step, format!("Each term is {step} more than the one before."))
        }
        Difficulty::Medium => {
            let start = rng.gen_range(1..=5);
            let ratio = rng.gen_range(2..=3i64);
            let terms: Vec<i64> = (0..5).map(|i| start * ratio.pow(i)).collect();
            (terms, start * ratio.pow(5), format!("Each term is {ratio} times the one before."))
        }
        Difficulty::Hard => {
            // Differences grow by one each step: +g, +(g+1), +(g+2), ...
            let start = rng.gen_range(1..=15);
            let gap = rng.gen_range(1..=5);
            let mut terms = vec![start];
            for i in 0..5 {
                let last = terms[terms.len() - 1];
                terms.push(last + gap + i);
            }
            let next = terms[5];
            terms.truncate(5);
            (
                terms,
                next,
                format!("The gaps grow by one each time: +{gap}, +{}, +{} and so on.", gap + 1, gap + 2),
            )
        }
    };
    let shown = terms.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
    let (answer, options) = numeric_options(rng, next, 4, |n| n.to_string());
    Draft {
        topic: "Number Patterns",
        content: format!("What number comes next in the pattern?\n{shown}, ?"),
        explanation: format!("{rule} The next number is {next}."),
        answer,
        options,
    }
}

fn letter(index: u8) -> char {
    (b'A' + index) as char
}

fn letter_pattern<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    let (indices, next, rule): ([u8; 4], u8, String) = if difficulty == Difficulty::Hard {
        // Steps of +1, +2, +3, then +4.
        let start = rng.gen_range(0..=15u8);
        ([start, start + 1, start + 3, start + 6], start + 10, "The steps grow: +1, +2, +3, +4.".to_string())
    } else {
        let step: u8 = if difficulty == Difficulty::Easy { rng.gen_range(1..=3) } else { rng.gen_range(2..=5) };
        let start = rng.gen_range(0..=25 - 4 * step);
        let seq = [start, start + step, start + 2 * step, start + 3 * step];
        (seq, start + 4 * step, format!("Each letter is {step} place(s) further along the alphabet."))
    };

    let answer = letter(next).to_string();
    let mut wrong: Vec<String> = [next as i16 - 1, next as i16 + 1, next as i16 - 2, next as i16 + 2, next as i16 - 3]
        .into_iter()
        .filter(|i| (0..26).contains(i))
        .map(|i| letter(i as u8).to_string())
        .collect();
    shuffle(&mut wrong, rng);
    let options = finalize_options(rng, &answer, wrong);
    let shown = indices.iter().map(|&i| letter(i).to_string()).collect::<Vec<_>>().join(", ");
    Draft {
        topic: "Letter Patterns",
        content: format!("Which letter comes next?\n{shown}, ?"),
        explanation: format!("{rule} The next letter is {answer}."),
        answer,
        options,
    }
}

// ── verbal reasoning ────────────────────────────────────────────────────────

/// (relationship, pairs that share it)
const ANALOGIES: [(&str, &[(&str, &str)]); 4] = [
    ("a young animal and its adult", &[
        ("puppy", "dog"), ("kitten", "cat"), ("calf", "cow"),
        ("foal", "horse"), ("cub", "bear"), ("lamb", "sheep"),
    ]),
    ("an animal and its home", &[
        ("bird", "nest"), ("bee", "hive"), ("dog", "kennel"),
        ("spider", "web"), ("horse", "stable"), ("rabbit", "burrow"),
    ]),
    ("a worker and their tool", &[
        ("painter", "brush"), ("writer", "pen"), ("chef", "knife"),
        ("farmer", "plough"), ("doctor", "stethoscope"), ("carpenter", "hammer"),
    ]),
    ("a word and its opposite", &[
        ("ancient", "modern"), ("generous", "selfish"), ("scarce", "plentiful"),
        ("cautious", "reckless"), ("humble", "arrogant"), ("transparent", "opaque"),
    ]),
];

fn analogy<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    let (relation, pairs) = match difficulty {
        Difficulty::Hard => ANALOGIES[3],
        _ => ANALOGIES[rng.gen_range(0..3)],
    };
    let chosen = shuffled(pairs.to_vec(), rng);
    let (a, b) = chosen[0];
    let (c, d) = chosen[1];

    // The question word itself is a tempting wrong answer.
    let pool: Vec<&str> = chosen[2..].iter().map(|p| p.1).collect();
    let mut wrong = vec![c.to_string()];
    wrong.extend(text_distractors(rng, d, &pool));
    let options = finalize_options(rng, d, wrong);
    Draft {
        topic: "Analogies",
        content: format!("{a} is to {b} as {c} is to ?"),
        explanation: format!("Both pairs show {relation}: {a} and {b}, {c} and {d}."),
        answer: d.to_string(),
        options,
    }
}

const NONSENSE: [&str; 8] = ["bloops", "razzies", "lazzies", "quibs", "zorbs", "flims", "grots", "snarks"];

fn syllogism<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    let words = shuffled(NONSENSE.to_vec(), rng);
    let (a, b, c) = (words[0], words[1], words[2]);
    let (premises, answer, wrong) = match difficulty {
        Difficulty::Easy | Difficulty::Medium if rng.gen_bool(0.5) => (
            format!("All {a} are {b}. All {b} are {c}."),
            format!("All {a} are {c}."),
            vec![
                format!("All {c} are {a}."),
                format!("All {b} are {a}."),
                format!("No {a} are {c}."),
            ],
        ),
        Difficulty::Easy | Difficulty::Medium => (
            format!("All {a} are {b}. Some {c} are {a}."),
            format!("Some {c} are {b}."),
            vec![
                format!("All {c} are {b}."),
                format!("All {b} are {a}."),
                format!("No {c} are {b}."),
            ],
        ),
        Difficulty::Hard => (
            format!("No {a} are {b}. All {c} are {a}."),
            format!("No {c} are {b}."),
            vec![
                format!("Some {c} are {b}."),
                format!("All {a} are {c}."),
                format!("All {b} are {c}."),
            ],
        ),
    };
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Logical Deduction",
        content: format!("{premises}\nWhich statement must be true?"),
        explanation: format!("From \"{premises}\" it follows that {}", answer.to_lowercase()),
        answer,
        options,
    }
}

// ── spatial and ordering ────────────────────────────────────────────────────

const COMPASS: [&str; 8] = [
    "North", "North-East", "East", "South-East", "South", "South-West", "West", "North-West",
];

fn compass_turn<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    // Turn amounts in eighths of a full circle.
    let (turns, unit_choices): (usize, &[i32]) = match difficulty {
        Difficulty::Easy   => (rng.gen_range(1..=2), &[2][..]),
        Difficulty::Medium => (3, &[2, 4][..]),
        Difficulty::Hard   => (3, &[1, 2, 3][..]),
    };
    let start = 2 * rng.gen_range(0..4) as i32;
    let mut heading = start;
    let mut steps = Vec::with_capacity(turns);
    for _ in 0..turns {
        let eighths = *pick(unit_choices, rng);
        let right = rng.gen_bool(0.5);
        heading += if right { eighths } else { -eighths };
        steps.push(format!("turns {} degrees {}", eighths * 45, if right { "right" } else { "left" }));
    }
    let end = heading.rem_euclid(8) as usize;
    let answer = COMPASS[end].to_string();
    // Quarter turns either way and the opposite direction.
    let wrong = [2, 6, 4]
        .iter()
        .map(|off| COMPASS[(end + off) % 8].to_string())
        .collect();
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Spatial Reasoning",
        content: format!(
            "A hiker is facing {}. The hiker {}. Which direction is the hiker facing now?",
            COMPASS[start as usize],
            steps.join(", then ")
        ),
        explanation: format!("Tracking each turn from {} ends facing {answer}.", COMPASS[start as usize]),
        answer,
        options,
    }
}

const PEOPLE: [&str; 8] = ["Ava", "Ben", "Chloe", "Dev", "Emma", "Finn", "Grace", "Hugo"];

fn ordering<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    let n = if difficulty == Difficulty::Hard { 5 } else { 4 };
    // `order[0]` is the tallest.
    let order: Vec<&str> = shuffled(PEOPLE.to_vec(), rng).into_iter().take(n).collect();
    let mut clues: Vec<String> = order
        .windows(2)
        .map(|pair| {
            if rng.gen_bool(0.5) {
                format!("{} is taller than {}.", pair[0], pair[1])
            } else {
                format!("{} is shorter than {}.", pair[1], pair[0])
            }
        })
        .collect();
    shuffle(&mut clues, rng);

    let (question, position) = match difficulty {
        Difficulty::Easy   => ("Who is the tallest?", 0),
        Difficulty::Medium => ("Who is the shortest?", n - 1),
        Difficulty::Hard   => ("Who is the second tallest?", 1),
    };
    let answer = order[position];
    let wrong = text_distractors(rng, answer, &order);
    let options = finalize_options(rng, answer, wrong);
    Draft {
        topic: "Ordering",
        content: format!("{}\n{question}", clues.join(" ")),
        explanation: format!("From tallest to shortest the order is {}.", order.join(", ")),
        answer: answer.to_string(),
        options,
    }
}
