//! Multi-step applied problems: rates, ratios, averages, time and money.

use rand::Rng;

use crate::assembly_engine::{
    helpers::{finalize_options, numeric_options, pad_distractors, Draft, GradeBand},
    models::Difficulty,
    shuffle::{pick, shuffle},
};

#[derive(Debug, Clone, Copy)]
enum Archetype {
    WorkRate,
    RatioSharing,
    AverageMissing,
    ElapsedTime,
    Change,
    ConsecutiveSum,
}

fn catalogue(band: GradeBand, difficulty: Difficulty) -> &'static [Archetype] {
    use Archetype::*;
    match (band, difficulty) {
        (GradeBand::Early | GradeBand::Primary, Difficulty::Easy) => &[Change, ElapsedTime],
        (GradeBand::Early | GradeBand::Primary, _)                => &[Change, ElapsedTime, WorkRate],
        (_, Difficulty::Easy)                                     => &[Change, ElapsedTime, RatioSharing],
        (_, Difficulty::Medium)                                   => &[RatioSharing, AverageMissing, WorkRate],
        (_, Difficulty::Hard)                                     => &[WorkRate, AverageMissing, ConsecutiveSum],
    }
}

const NAMES: [&str; 6] = ["Sam", "Lena", "Omar", "Ruby", "Theo", "Ines"];

pub fn generate<R: Rng>(rng: &mut R, level: u8, difficulty: Difficulty) -> Draft {
    let band = GradeBand::from_level(level);
    match *pick(catalogue(band, difficulty), rng) {
        Archetype::WorkRate       => work_rate(rng, difficulty),
        Archetype::RatioSharing   => ratio_sharing(rng, band),
        Archetype::AverageMissing => average_missing(rng, difficulty),
        Archetype::ElapsedTime    => elapsed_time(rng, difficulty),
        Archetype::Change         => change(rng, band),
        Archetype::ConsecutiveSum => consecutive_sum(rng),
    }
}

fn work_rate<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    let machines = rng.gen_range(2..=5i64);
    let per_machine = rng.gen_range(2..=12i64);
    let minutes = rng.gen_range(2..=6i64) * 5;
    let produced = machines * per_machine;
    let more = machines + rng.gen_range(1..=4i64);
    let time_factor = if difficulty == Difficulty::Hard { 2 } else { 1 };
    let answer_value = more * per_machine * time_factor;

    let later = if time_factor == 1 {
        format!("{minutes} minutes")
    } else {
        format!("{} minutes", minutes * time_factor)
    };
    // Scaling the wrong quantity, or adding instead of multiplying.
    let wrong_factor = 3 - time_factor;
    let mut wrong = vec![
        (produced + (more - machines)).to_string(),
        (more * per_machine * wrong_factor).to_string(),
        (answer_value + per_machine).to_string(),
        (answer_value - per_machine).to_string(),
    ];
    shuffle(&mut wrong, rng);
    let answer = answer_value.to_string();
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Rates",
        content: format!(
            "{machines} identical machines make {produced} badges in {minutes} minutes. \
             How many badges would {more} of these machines make in {later}?"
        ),
        explanation: format!(
            "One machine makes {produced} ÷ {machines} = {per_machine} badges in {minutes} minutes, \
             so {more} machines make {answer_value} in {later}."
        ),
        answer,
        options,
    }
}

fn ratio_sharing<R: Rng>(rng: &mut R, band: GradeBand) -> Draft {
    let first = *pick(&NAMES[..3], rng);
    let second = *pick(&NAMES[3..], rng);
    let a = rng.gen_range(1..=5i64);
    let mut b = rng.gen_range(1..=5i64);
    if b == a {
        b += 1;
    }
    let unit = if band >= GradeBand::Middle { rng.gen_range(6..=40i64) } else { rng.gen_range(2..=12i64) };
    let total = (a + b) * unit;
    let share = a * unit;

    // The other share and an even split are the usual slips.
    let mut likely = vec![b * unit, share + unit, share - unit];
    if total % 2 == 0 {
        likely.push(total / 2);
    }
    shuffle(&mut likely, rng);
    let answer = format!("${share}");
    let wrong = pad_distractors(rng, share, unit, likely)
        .into_iter()
        .map(|w| format!("${w}"))
        .collect();
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Ratio and Sharing",
        content: format!(
            "{first} and {second} share ${total} in the ratio {a}:{b}. How much does {first} receive?"
        ),
        explanation: format!(
            "There are {a} + {b} = {} parts, each worth ${total} ÷ {} = ${unit}. {first} gets {a} × ${unit} = ${share}.",
            a + b,
            a + b
        ),
        answer,
        options,
    }
}

fn average_missing<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    let n: i64 = if difficulty == Difficulty::Hard { 5 } else { 4 };
    let average = rng.gen_range(40..=90i64);
    let known: Vec<i64> = (0..n - 1).map(|_| rng.gen_range(average - 10..=average + 10)).collect();
    let known_sum: i64 = known.iter().sum();
    let missing = n * average - known_sum;

    let (answer, options) = numeric_options(rng, missing, n, |v| v.to_string());
    let listed = known.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
    Draft {
        topic: "Averages",
        content: format!(
            "The average of {n} numbers is {average}. {} of the numbers are {listed}. What is the missing number?",
            n - 1
        ),
        explanation: format!(
            "The {n} numbers total {n} × {average} = {}. The known ones add to {known_sum}, so the missing number is {missing}.",
            n * average
        ),
        answer,
        options,
    }
}

fn clock(minutes: i64) -> String {
    let m = minutes.rem_euclid(24 * 60);
    format!("{:02}:{:02}", m / 60, m % 60)
}

fn elapsed_time<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    let start = rng.gen_range(6 * 60..=17 * 60) / 5 * 5;
    let duration = match difficulty {
        Difficulty::Easy   => rng.gen_range(2..=12) * 5,
        Difficulty::Medium => rng.gen_range(13..=40) * 5,
        Difficulty::Hard   => rng.gen_range(40..=100) * 5,
    };
    let end = start + duration;
    let answer = clock(end);
    let mut wrong: Vec<String> = [end + 60, end - 60, end + 10, end - 10]
        .into_iter()
        .map(clock)
        .collect();
    shuffle(&mut wrong, rng);
    let options = finalize_options(rng, &answer, wrong);
    let name = *pick(&NAMES, rng);
    Draft {
        topic: "Time",
        content: format!(
            "{name} starts a train journey at {}. The journey takes {} hour(s) and {} minute(s). \
             At what time does the journey end?",
            clock(start),
            duration / 60,
            duration % 60
        ),
        explanation: format!("{} plus {duration} minutes is {answer}.", clock(start)),
        answer,
        options,
    }
}

fn money(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

fn change<R: Rng>(rng: &mut R, band: GradeBand) -> Draft {
    let items = rng.gen_range(2..=4i64);
    let price = if band <= GradeBand::Primary {
        rng.gen_range(2..=9) * 50
    } else {
        rng.gen_range(105..=1995) / 5 * 5
    };
    let cost = items * price;
    let note = [500, 1000, 2000, 5000, 10000]
        .into_iter()
        .find(|&n| n > cost)
        .unwrap_or(cost + 1000);
    let due = note - cost;

    let mut wrong: Vec<String> = [due + 100, due + 10, due + 50, cost, due - 10]
        .into_iter()
        .filter(|&c| c > 0 && c != due)
        .map(money)
        .collect();
    shuffle(&mut wrong, rng);
    let answer = money(due);
    let options = finalize_options(rng, &answer, wrong);
    let name = *pick(&NAMES, rng);
    Draft {
        topic: "Money",
        content: format!(
            "{name} buys {items} notebooks costing {} each and pays with a {} note. How much change should {name} get?",
            money(price),
            money(note)
        ),
        explanation: format!(
            "{items} × {} = {}; {} - {} = {answer}.",
            money(price),
            money(cost),
            money(note),
            money(cost)
        ),
        answer,
        options,
    }
}

fn consecutive_sum<R: Rng>(rng: &mut R) -> Draft {
    let k = rng.gen_range(3..=5i64);
    let smallest = rng.gen_range(5..=60i64);
    let sum = k * smallest + k * (k - 1) / 2;
    let largest = smallest + k - 1;
    // Naming the smallest or the middle number instead of the largest.
    let mut wrong = vec![
        smallest.to_string(),
        (largest + 1).to_string(),
        (smallest + (k - 1) / 2).to_string(),
        (largest - 1).to_string(),
    ];
    shuffle(&mut wrong, rng);
    let answer = largest.to_string();
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Number Reasoning",
        content: format!("The sum of {k} consecutive whole numbers is {sum}. What is the largest of them?"),
        explanation: format!(
            "The numbers are {smallest} to {largest}: {}.",
            (smallest..=largest).map(|n| n.to_string()).collect::<Vec<_>>().join(" + ")
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
    fn options_are_distinct_and_contain_answer() {
        for seed in 0..80 {
            for level in [1, 3, 5, 7, 10] {
                for d in Difficulty::ALL {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let draft = generate(&mut rng, level, d);
                    assert!(draft.options.contains(&draft.answer), "{draft:?}");
                    let mut opts = draft.options.clone();
                    opts.sort();
                    opts.dedup();
                    assert_eq!(opts.len(), draft.options.len());
                    assert_eq!(opts.len(), 4, "{draft:?}");
                }
            }
        }
    }

    #[test]
    fn ratio_sharing_keeps_three_wrong_shares() {
        // Adjacent ratios such as 2:3 make the other share equal one extra unit.
        for seed in 0..300 {
            for band in [GradeBand::Primary, GradeBand::Middle] {
                let mut rng = StdRng::seed_from_u64(seed);
                let draft = ratio_sharing(&mut rng, band);
                let mut opts = draft.options.clone();
                opts.sort();
                opts.dedup();
                assert_eq!(opts.len(), 4, "{}: {:?}", draft.content, draft.options);
                assert!(draft.options.iter().all(|o| o.starts_with('$')));
            }
        }
    }

    #[test]
    fn clock_wraps_past_midnight() {
        assert_eq!(clock(23 * 60 + 50 + 20), "00:10");
        assert_eq!(clock(-10), "23:50");
        assert_eq!(clock(9 * 60 + 5), "09:05");
    }

    #[test]
    fn money_renders_cents() {
        assert_eq!(money(1205), "$12.05");
        assert_eq!(money(50), "$0.50");
    }

    #[test]
    fn consecutive_sum_answer_reconstructs_the_total() {
        let mut rng = StdRng::seed_from_u64(17);
        let draft = consecutive_sum(&mut rng);
        let largest: i64 = draft.answer.parse().unwrap();
        let k: i64 = draft.content.split_whitespace().nth(3).unwrap().parse().unwrap();
        let sum: i64 = draft
            .content
            .split("is ")
            .nth(1)
            .unwrap()
            .trim_end_matches(|c: char| !c.is_ascii_digit())
            .split('.')
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!((largest - k + 1..=largest).sum::<i64>(), sum);
    }
}
