use rand::Rng;

use crate::assembly_engine::{
    helpers::{finalize_options, numeric_options, pad_distractors, Draft, GradeBand},
    models::Difficulty,
    shuffle::pick,
};

#[derive(Debug, Clone, Copy)]
enum Archetype {
    Arithmetic,
    Multiplication,
    OrderOfOperations,
    WordProblem,
    FractionOf,
    Percentage,
    LinearEquation,
    SystemOfEquations,
    Quadratic,
}

fn catalogue(band: GradeBand, difficulty: Difficulty) -> &'static [Archetype] {
    use Archetype::*;
    match (band, difficulty) {
        (GradeBand::Early, Difficulty::Easy)     => &[Arithmetic],
        (GradeBand::Early, Difficulty::Medium)   => &[Arithmetic, WordProblem],
        (GradeBand::Early, Difficulty::Hard)     => &[WordProblem],
        (GradeBand::Primary, Difficulty::Easy)   => &[Arithmetic],
        (GradeBand::Primary, Difficulty::Medium) => &[Multiplication, WordProblem],
        (GradeBand::Primary, Difficulty::Hard)   => &[FractionOf, WordProblem],
        (GradeBand::Upper, Difficulty::Easy)     => &[Arithmetic, Multiplication],
        (GradeBand::Upper, Difficulty::Medium)   => &[FractionOf, Percentage],
        (GradeBand::Upper, Difficulty::Hard)     => &[WordProblem, Percentage, OrderOfOperations],
        (GradeBand::Middle, Difficulty::Easy)    => &[OrderOfOperations, Percentage],
        (GradeBand::Middle, Difficulty::Medium)  => &[LinearEquation],
        (GradeBand::Middle, Difficulty::Hard)    => &[SystemOfEquations, LinearEquation],
        (GradeBand::Senior, Difficulty::Easy)    => &[LinearEquation, Percentage],
        (GradeBand::Senior, Difficulty::Medium)  => &[Quadratic, SystemOfEquations],
        (GradeBand::Senior, Difficulty::Hard)    => &[Quadratic, SystemOfEquations],
    }
}

const NAMES: [&str; 8] = ["Mia", "Noah", "Aisha", "Liam", "Priya", "Kenji", "Zara", "Oscar"];
const CONTAINERS: [(&str, &str); 5] = [
    ("boxes", "pencils"),
    ("bags", "marbles"),
    ("crates", "apples"),
    ("packets", "stickers"),
    ("trays", "muffins"),
];

pub fn generate<R: Rng>(rng: &mut R, level: u8, difficulty: Difficulty) -> Draft {
    let band = GradeBand::from_level(level);
    match *pick(catalogue(band, difficulty), rng) {
        Archetype::Arithmetic        => arithmetic(rng, band),
        Archetype::Multiplication    => multiplication(rng, band),
        Archetype::OrderOfOperations => order_of_operations(rng, band),
        Archetype::WordProblem       => word_problem(rng, band, difficulty),
        Archetype::FractionOf        => fraction_of(rng, band),
        Archetype::Percentage        => percentage(rng, band),
        Archetype::LinearEquation    => linear_equation(rng, band),
        Archetype::SystemOfEquations => system_of_equations(rng),
        Archetype::Quadratic         => quadratic(rng, difficulty),
    }
}

fn arithmetic<R: Rng>(rng: &mut R, band: GradeBand) -> Draft {
    let limit = band.operand_limit();
    let a = rng.gen_range(limit / 4..=limit);
    let b = rng.gen_range(1..=limit / 2);
    let (content, answer, explanation) = if rng.gen_bool(0.5) {
        (format!("What is {a} + {b}?"), a + b, format!("{a} + {b} = {}", a + b))
    } else {
        let (hi, lo) = (a.max(b), a.min(b));
        (format!("What is {hi} - {lo}?"), hi - lo, format!("{hi} - {lo} = {}", hi - lo))
    };
    let (answer, options) = numeric_options(rng, answer, 10, |n| n.to_string());
    Draft { topic: "Arithmetic", content, answer, options, explanation }
}

fn multiplication<R: Rng>(rng: &mut R, band: GradeBand) -> Draft {
    let (a, b) = match band {
        GradeBand::Early | GradeBand::Primary => (rng.gen_range(2..=10), rng.gen_range(2..=10)),
        _ => (rng.gen_range(11..=40), rng.gen_range(3..=12)),
    };
    let product = a * b;
    // Off-by-one-factor slips: a × (b ± 1) are the classic wrong answers.
    let wrong = vec![
        (a * (b + 1)).to_string(),
        (a * (b - 1)).to_string(),
        (product + 10).to_string(),
        (product - 1).to_string(),
    ];
    let answer = product.to_string();
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Multiplication",
        content: format!("What is {a} × {b}?"),
        explanation: format!("{a} × {b} = {product}"),
        answer,
        options,
    }
}

fn order_of_operations<R: Rng>(rng: &mut R, band: GradeBand) -> Draft {
    let scale = if band >= GradeBand::Middle { 20 } else { 12 };
    let a = rng.gen_range(2..=scale);
    let b = rng.gen_range(2..=12);
    let c = rng.gen_range(2..=12);
    let correct = a + b * c;
    let left_to_right = (a + b) * c;
    let answer = correct.to_string();
    let wrong = pad_distractors(rng, correct, c, vec![left_to_right, correct + c, correct - 1])
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Order of Operations",
        content: format!("Evaluate: {a} + {b} × {c}"),
        explanation: format!(
            "Multiplication comes before addition: {b} × {c} = {}, then {a} + {} = {correct}.",
            b * c,
            b * c
        ),
        answer,
        options,
    }
}

fn word_problem<R: Rng>(rng: &mut R, band: GradeBand, difficulty: Difficulty) -> Draft {
    let name = *pick(&NAMES, rng);
    let (container, item) = *pick(&CONTAINERS, rng);
    let per_max = match band {
        GradeBand::Early => 5,
        GradeBand::Primary => 10,
        _ => 25,
    };
    let groups = rng.gen_range(2..=6i64);
    let per = rng.gen_range(2..=per_max as i64);
    let total = groups * per;

    if difficulty == Difficulty::Hard || band >= GradeBand::Upper {
        let given = rng.gen_range(1..total);
        let left = total - given;
        let (answer, options) = numeric_options(rng, left, per, |n| n.to_string());
        Draft {
            topic: "Word Problems",
            content: format!(
                "{name} has {groups} {container} with {per} {item} in each. \
                 {name} gives away {given} {item}. How many {item} are left?"
            ),
            explanation: format!(
                "{groups} × {per} = {total} {item}; {total} - {given} = {left}."
            ),
            answer,
            options,
        }
    } else {
        let (answer, options) = numeric_options(rng, total, per, |n| n.to_string());
        Draft {
            topic: "Word Problems",
            content: format!(
                "{name} has {groups} {container}. Each holds {per} {item}. \
                 How many {item} does {name} have altogether?"
            ),
            explanation: format!("{groups} groups of {per} make {groups} × {per} = {total}."),
            answer,
            options,
        }
    }
}

fn fraction_of<R: Rng>(rng: &mut R, band: GradeBand) -> Draft {
    let denominators: &[i64] = if band <= GradeBand::Primary { &[2, 3, 4, 5] } else { &[3, 4, 5, 6, 8, 10] };
    let d = *pick(denominators, rng);
    let n = rng.gen_range(1..d);
    let whole = d * rng.gen_range(2..=12);
    let part = whole / d * n;
    let unit = whole / d;
    // A unit fraction instead of n/d is the most common mistake.
    let wrong = pad_distractors(rng, part, unit, vec![unit, part + unit, part + 1, part + 10])
        .into_iter()
        .map(|v| v.to_string())
        .collect();
    let answer = part.to_string();
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Fractions",
        content: format!("What is {n}/{d} of {whole}?"),
        explanation: format!("{whole} ÷ {d} = {unit}, and {unit} × {n} = {part}."),
        answer,
        options,
    }
}

fn percentage<R: Rng>(rng: &mut R, band: GradeBand) -> Draft {
    let percents: &[i64] = if band <= GradeBand::Upper { &[10, 25, 50, 75] } else { &[5, 15, 20, 35, 40, 60, 85] };
    let p = *pick(percents, rng);
    let base = 20 * rng.gen_range(2..=25);
    let value = base * p / 100;
    let (answer, options) = numeric_options(rng, value, base / 10, |n| n.to_string());
    Draft {
        topic: "Percentages",
        content: format!("What is {p}% of {base}?"),
        explanation: format!("{p}% of {base} = {base} × {p} ÷ 100 = {value}."),
        answer,
        options,
    }
}

fn linear_equation<R: Rng>(rng: &mut R, band: GradeBand) -> Draft {
    let x = rng.gen_range(-9..=15i64);
    let a = rng.gen_range(2..=9i64);
    let b_max = if band >= GradeBand::Senior { 40 } else { 20 };
    let b = rng.gen_range(1..=b_max);
    let c = a * x + b;
    let (answer, options) = numeric_options(rng, x, 3, |n| format!("x = {n}"));
    Draft {
        topic: "Linear Equations",
        content: format!("Solve for x: {a}x + {b} = {c}"),
        explanation: format!(
            "Subtract {b}: {a}x = {}. Divide by {a}: x = {x}.",
            c - b
        ),
        answer,
        options,
    }
}

fn system_of_equations<R: Rng>(rng: &mut R) -> Draft {
    let x = rng.gen_range(1..=8i64);
    let y = rng.gen_range(1..=6i64);
    let (a1, b1) = (rng.gen_range(1..=4i64), rng.gen_range(1..=4i64));
    // Keep the second row independent of the first so the solution is unique.
    let (a2, b2) = loop {
        let pair = (rng.gen_range(1..=4i64), rng.gen_range(1..=4i64));
        if a1 * pair.1 != b1 * pair.0 {
            break pair;
        }
    };
    let c1 = a1 * x + b1 * y;
    let c2 = a2 * x + b2 * y;
    let render = |x: i64, y: i64| format!("x = {x}, y = {y}");
    let answer = render(x, y);
    let wrong = vec![render(y, x), render(x + 1, y), render(x, y + 1), render(x - 1, y + 2)];
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Simultaneous Equations",
        content: format!("Solve the system of equations:\n{a1}x + {b1}y = {c1}\n{a2}x + {b2}y = {c2}"),
        explanation: format!(
            "Check: {a1}({x}) + {b1}({y}) = {c1} and {a2}({x}) + {b2}({y}) = {c2}, so {answer}."
        ),
        answer,
        options,
    }
}

fn quadratic<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    let range: i64 = if difficulty == Difficulty::Hard { 12 } else { 7 };
    let r1 = rng.gen_range(-range..=range);
    let r2 = loop {
        let r = rng.gen_range(-range..=range);
        if r != r1 {
            break r;
        }
    };
    let (lo, hi) = (r1.min(r2), r1.max(r2));
    let sum = lo + hi;
    let product = lo * hi;

    let render = |a: i64, b: i64| format!("x = {} or x = {}", a.min(b), a.max(b));
    let answer = render(lo, hi);
    // Sign slips and a root shifted by one.
    let wrong = vec![
        render(-lo, -hi),
        render(lo, -hi),
        render(lo + 1, hi),
        render(lo, hi + 2),
    ];
    let options = finalize_options(rng, &answer, wrong);

    let term = |coef: i64, var: &str| -> String {
        match coef {
            0 => String::new(),
            c if c > 0 => format!(" + {}{var}", if c == 1 && !var.is_empty() { String::new() } else { c.to_string() }),
            c => format!(" - {}{var}", if c == -1 && !var.is_empty() { String::new() } else { (-c).to_string() }),
        }
    };
    let equation = format!("x²{}{} = 0", term(-sum, "x"), term(product, ""));
    Draft {
        topic: "Quadratic Equations",
        content: format!("Solve: {equation}"),
        explanation: format!(
            "Find two numbers that multiply to {product} and add to {sum}: {lo} and {hi}. \
             So (x - ({lo}))(x - ({hi})) = 0 and {answer}."
        ),
        answer,
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_band_and_difficulty_has_an_archetype() {
        for level in 1..=12 {
            for d in Difficulty::ALL {
                assert!(!catalogue(GradeBand::from_level(level), d).is_empty());
            }
        }
    }

    #[test]
    fn arithmetic_answer_matches_rendered_expression() {
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let draft = arithmetic(&mut rng, GradeBand::Primary);
            let expr = draft.content.trim_start_matches("What is ").trim_end_matches('?');
            let parts: Vec<&str> = expr.split(' ').collect();
            let (a, op, b): (i64, &str, i64) = (parts[0].parse().unwrap(), parts[1], parts[2].parse().unwrap());
            let expected = if op == "+" { a + b } else { a - b };
            assert_eq!(draft.answer, expected.to_string(), "{}", draft.content);
        }
    }

    #[test]
    fn quadratic_roots_satisfy_the_equation() {
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let draft = quadratic(&mut rng, Difficulty::Hard);
            let roots: Vec<i64> = draft
                .answer
                .split(" or ")
                .map(|s| s.trim_start_matches("x = ").parse().unwrap())
                .collect();
            assert_eq!(roots.len(), 2);
            assert_ne!(roots[0], roots[1]);
            assert!(draft.options.contains(&draft.answer));
        }
    }

    #[test]
    fn colliding_slips_still_leave_four_options() {
        // Unit fractions make `unit == part`; a = c = 2 makes (a+b)c == a+bc+c.
        for seed in 0..300 {
            for band in [GradeBand::Primary, GradeBand::Upper, GradeBand::Middle] {
                let mut rng = StdRng::seed_from_u64(seed);
                let fraction = fraction_of(&mut rng, band);
                let operations = order_of_operations(&mut rng, band);
                for draft in [fraction, operations] {
                    let mut opts = draft.options.clone();
                    opts.sort();
                    opts.dedup();
                    assert_eq!(opts.len(), 4, "{}: {:?}", draft.content, draft.options);
                    assert!(draft.options.contains(&draft.answer));
                }
            }
        }
    }

    #[test]
    fn fraction_answers_are_whole_numbers() {
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let draft = fraction_of(&mut rng, GradeBand::Upper);
            assert!(draft.answer.parse::<i64>().is_ok(), "{}", draft.answer);
            assert_eq!(draft.options.len(), 4);
        }
    }
}
