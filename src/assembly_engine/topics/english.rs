use rand::Rng;

use crate::assembly_engine::{
    helpers::{finalize_options, text_distractors, Draft, GradeBand},
    models::Difficulty,
    shuffle::{pick, shuffled},
};

#[derive(Debug, Clone, Copy)]
enum Archetype {
    Plural,
    Agreement,
    PastTense,
    Superlative,
    Synonym,
    Antonym,
}

fn catalogue(band: GradeBand, difficulty: Difficulty) -> &'static [Archetype] {
    use Archetype::*;
    match (difficulty, band <= GradeBand::Primary) {
        (Difficulty::Easy, true)    => &[Plural, Agreement],
        (Difficulty::Easy, false)   => &[Agreement, Plural, Synonym],
        (Difficulty::Medium, true)  => &[PastTense, Superlative, Synonym],
        (Difficulty::Medium, false) => &[PastTense, Synonym, Superlative],
        (Difficulty::Hard, true)    => &[Superlative, Antonym, PastTense],
        (Difficulty::Hard, false)   => &[Antonym, Synonym],
    }
}

pub fn generate<R: Rng>(rng: &mut R, level: u8, difficulty: Difficulty) -> Draft {
    let band = GradeBand::from_level(level);
    match *pick(catalogue(band, difficulty), rng) {
        Archetype::Plural      => plural(rng),
        Archetype::Agreement   => agreement(rng),
        Archetype::PastTense   => past_tense(rng, difficulty),
        Archetype::Superlative => superlative(rng),
        Archetype::Synonym     => vocabulary(rng, band, false),
        Archetype::Antonym     => vocabulary(rng, band, true),
    }
}

// ---------------------------------------------------------------------------
// Morphology rules
// ---------------------------------------------------------------------------

const IRREGULAR_PLURALS: [(&str, &str); 7] = [
    ("child", "children"),
    ("mouse", "mice"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("person", "people"),
    ("woman", "women"),
    ("sheep", "sheep"),
];

const IRREGULAR_PAST: [(&str, &str); 12] = [
    ("run", "ran"),
    ("go", "went"),
    ("do", "did"),
    ("have", "had"),
    ("eat", "ate"),
    ("write", "wrote"),
    ("swim", "swam"),
    ("catch", "caught"),
    ("teach", "taught"),
    ("bring", "brought"),
    ("sing", "sang"),
    ("take", "took"),
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn consonant_y(word: &str) -> bool {
    let mut rev = word.chars().rev();
    matches!((rev.next(), rev.next()), (Some('y'), Some(c)) if !is_vowel(c))
}

fn sibilant(word: &str) -> bool {
    ["s", "sh", "ch", "x", "z"].iter().any(|end| word.ends_with(end))
}

/// One-syllable words ending consonant-vowel-consonant double their last letter.
fn doubles_final(word: &str) -> bool {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    n >= 3
        && chars.iter().filter(|c| is_vowel(**c)).count() == 1
        && !is_vowel(chars[n - 3])
        && is_vowel(chars[n - 2])
        && !is_vowel(chars[n - 1])
        && !matches!(chars[n - 1], 'w' | 'x' | 'y')
}

fn plural_of(noun: &str) -> String {
    if let Some((_, p)) = IRREGULAR_PLURALS.iter().find(|(s, _)| *s == noun) {
        return p.to_string();
    }
    if consonant_y(noun) {
        format!("{}ies", &noun[..noun.len() - 1])
    } else if sibilant(noun) {
        format!("{noun}es")
    } else {
        format!("{noun}s")
    }
}

fn third_person(verb: &str) -> String {
    match verb {
        "have" => "has".to_string(),
        "go" | "do" => format!("{verb}es"),
        _ if consonant_y(verb) => format!("{}ies", &verb[..verb.len() - 1]),
        _ if sibilant(verb) => format!("{verb}es"),
        _ => format!("{verb}s"),
    }
}

fn past_of(verb: &str) -> String {
    if let Some((_, p)) = IRREGULAR_PAST.iter().find(|(v, _)| *v == verb) {
        return p.to_string();
    }
    if verb.ends_with('e') {
        format!("{verb}d")
    } else if consonant_y(verb) {
        format!("{}ied", &verb[..verb.len() - 1])
    } else if doubles_final(verb) {
        let last = verb.chars().last().unwrap_or_default();
        format!("{verb}{last}ed")
    } else {
        format!("{verb}ed")
    }
}

fn ing_of(verb: &str) -> String {
    if verb.ends_with('e') && verb != "see" {
        format!("{}ing", &verb[..verb.len() - 1])
    } else if doubles_final(verb) {
        let last = verb.chars().last().unwrap_or_default();
        format!("{verb}{last}ing")
    } else {
        format!("{verb}ing")
    }
}

// ---------------------------------------------------------------------------
// Archetypes
// ---------------------------------------------------------------------------

const NOUNS: [&str; 16] = [
    "cat", "box", "baby", "bus", "city", "brush", "church", "lady", "toy", "day",
    "child", "mouse", "tooth", "foot", "person", "sheep",
];

fn plural<R: Rng>(rng: &mut R) -> Draft {
    let noun = *pick(&NOUNS, rng);
    let answer = plural_of(noun);
    let stem = noun.strip_suffix('y').unwrap_or(noun);
    let wrong = vec![
        format!("{noun}s"),
        format!("{noun}es"),
        format!("{stem}ies"),
        format!("{noun}en"),
    ];
    let wrong = shuffled(wrong, rng);
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Plurals",
        content: format!("What is the plural of \"{noun}\"?"),
        explanation: if IRREGULAR_PLURALS.iter().any(|(s, _)| *s == noun) {
            format!("\"{noun}\" has an irregular plural: \"{answer}\".")
        } else if consonant_y(noun) {
            format!("Nouns ending in a consonant + y change y to ies: \"{answer}\".")
        } else if sibilant(noun) {
            format!("Nouns ending in s, sh, ch, x or z add es: \"{answer}\".")
        } else {
            format!("Most nouns just add s: \"{answer}\".")
        },
        answer,
        options,
    }
}

/// (verb, complement)
const VERBS: [(&str, &str); 8] = [
    ("run", "in the park"),
    ("play", "football after school"),
    ("watch", "the birds from the window"),
    ("carry", "the heavy bags"),
    ("go", "to the library"),
    ("do", "the dishes"),
    ("have", "lunch at noon"),
    ("walk", "to school"),
];

/// (subject, is_plural)
const SUBJECTS: [(&str, bool); 8] = [
    ("The dog", false),
    ("She", false),
    ("My brother", false),
    ("The teacher", false),
    ("The dogs", true),
    ("They", true),
    ("My friends", true),
    ("We", true),
];

fn agreement<R: Rng>(rng: &mut R) -> Draft {
    let (subject, is_plural) = *pick(&SUBJECTS, rng);
    let (verb, complement) = *pick(&VERBS, rng);
    let answer = if is_plural { verb.to_string() } else { third_person(verb) };
    let wrong = vec![
        if is_plural { third_person(verb) } else { verb.to_string() },
        ing_of(verb),
        format!("is {}", ing_of(verb)),
        past_of(verb),
    ];
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Subject-Verb Agreement",
        content: format!("Choose the word that completes the sentence:\n{subject} _____ {complement} every day."),
        explanation: if is_plural {
            format!("\"{subject}\" is plural, so the verb stays \"{answer}\".")
        } else {
            format!("\"{subject}\" is singular, so the present tense verb is \"{answer}\".")
        },
        answer,
        options,
    }
}

const PAST_VERBS: [(&str, &str); 12] = [
    ("stop", "at the corner"),
    ("plan", "a picnic"),
    ("carry", "the shopping"),
    ("bake", "a cake"),
    ("jump", "over the puddle"),
    ("swim", "across the lake"),
    ("catch", "the ball"),
    ("write", "a letter"),
    ("bring", "snacks"),
    ("teach", "the class"),
    ("eat", "an apple"),
    ("go", "to the beach"),
];

fn past_tense<R: Rng>(rng: &mut R, difficulty: Difficulty) -> Draft {
    // Hard questions stick to irregular verbs.
    let pool: Vec<(&str, &str)> = PAST_VERBS
        .iter()
        .copied()
        .filter(|(v, _)| difficulty != Difficulty::Hard || IRREGULAR_PAST.iter().any(|(i, _)| i == v))
        .collect();
    let (verb, complement) = *pick(&pool, rng);
    let name = *pick(&["Sam", "Lily", "Omar", "Grace", "Leo"], rng);
    let answer = past_of(verb);
    let wrong = vec![
        format!("{verb}ed"),
        verb.to_string(),
        third_person(verb),
        ing_of(verb),
    ];
    let options = finalize_options(rng, &answer, wrong);
    let irregular = IRREGULAR_PAST.iter().any(|(v, _)| *v == verb);
    Draft {
        topic: "Past Tense",
        content: format!("Choose the correct word:\nYesterday, {name} _____ {complement}."),
        explanation: if irregular {
            format!("\"{verb}\" is irregular; its past tense is \"{answer}\".")
        } else {
            format!("The regular past tense of \"{verb}\" is \"{answer}\".")
        },
        answer,
        options,
    }
}

/// (adjective, noun it describes)
const ADJECTIVES: [(&str, &str); 8] = [
    ("tall", "tree"),
    ("big", "dog"),
    ("happy", "child"),
    ("funny", "joke"),
    ("good", "story"),
    ("bad", "storm"),
    ("beautiful", "garden"),
    ("careful", "driver"),
];

fn superlative_of(adj: &str) -> String {
    match adj {
        "good" => "best".to_string(),
        "bad" => "worst".to_string(),
        _ if adj.chars().count() > 6 => format!("most {adj}"),
        _ if consonant_y(adj) => format!("{}iest", &adj[..adj.len() - 1]),
        _ if doubles_final(adj) => format!("{adj}{}est", adj.chars().last().unwrap_or_default()),
        _ => format!("{adj}est"),
    }
}

fn comparative_of(adj: &str) -> String {
    match adj {
        "good" => "better".to_string(),
        "bad" => "worse".to_string(),
        _ if adj.chars().count() > 6 => format!("more {adj}"),
        _ if consonant_y(adj) => format!("{}ier", &adj[..adj.len() - 1]),
        _ if doubles_final(adj) => format!("{adj}{}er", adj.chars().last().unwrap_or_default()),
        _ => format!("{adj}er"),
    }
}

fn superlative<R: Rng>(rng: &mut R) -> Draft {
    let (adj, noun) = *pick(&ADJECTIVES, rng);
    let answer = superlative_of(adj);
    let wrong = vec![
        comparative_of(adj),
        format!("most {adj}est"),
        format!("{adj}est"),
        format!("more {adj}"),
        adj.to_string(),
    ];
    let wrong = shuffled(wrong, rng);
    let options = finalize_options(rng, &answer, wrong);
    Draft {
        topic: "Comparatives and Superlatives",
        content: format!("Choose the correct word:\nOf all the ones we saw, this is the _____ {noun}."),
        explanation: format!(
            "Comparing three or more things needs the superlative form of \"{adj}\": \"{answer}\"."
        ),
        answer,
        options,
    }
}

/// (word, synonym, antonym)
type VocabEntry = (&'static str, &'static str, &'static str);

const VOCAB_PRIMARY: [VocabEntry; 6] = [
    ("happy", "glad", "sad"),
    ("big", "large", "small"),
    ("fast", "quick", "slow"),
    ("begin", "start", "finish"),
    ("brave", "bold", "afraid"),
    ("tired", "sleepy", "energetic"),
];

const VOCAB_UPPER: [VocabEntry; 6] = [
    ("magnificent", "splendid", "ordinary"),
    ("peculiar", "odd", "normal"),
    ("tremendous", "enormous", "tiny"),
    ("meticulous", "careful", "careless"),
    ("resilient", "tough", "fragile"),
    ("eloquent", "articulate", "inarticulate"),
];

const VOCAB_SENIOR: [VocabEntry; 7] = [
    ("ambiguous", "unclear", "definite"),
    ("tenacious", "persistent", "yielding"),
    ("innovative", "inventive", "conventional"),
    ("candid", "frank", "evasive"),
    ("benevolent", "kind", "malevolent"),
    ("frugal", "thrifty", "extravagant"),
    ("ephemeral", "fleeting", "permanent"),
];

fn vocabulary<R: Rng>(rng: &mut R, band: GradeBand, antonym: bool) -> Draft {
    let entries: &[VocabEntry] = match band {
        GradeBand::Early | GradeBand::Primary => &VOCAB_PRIMARY,
        GradeBand::Upper => &VOCAB_UPPER,
        GradeBand::Middle | GradeBand::Senior => &VOCAB_SENIOR,
    };
    let (word, synonym, opposite) = *pick(entries, rng);
    let answer = if antonym { opposite } else { synonym };

    // The word's own opposite (or synonym) is the most tempting wrong answer.
    let mut wrong = vec![(if antonym { synonym } else { opposite }).to_string()];
    let others: Vec<&str> = entries
        .iter()
        .filter(|(w, _, _)| *w != word)
        .map(|&(_, s, a)| if antonym { a } else { s })
        .collect();
    wrong.extend(text_distractors(rng, answer, &others));
    let options = finalize_options(rng, answer, wrong);

    let (topic, relation) = if antonym { ("Antonyms", "the OPPOSITE of") } else { ("Synonyms", "closest in meaning to") };
    Draft {
        topic,
        content: format!("Which word is {relation} \"{word}\"?"),
        explanation: format!("\"{word}\" is {relation} \"{answer}\"."),
        answer: answer.to_string(),
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_rules() {
        assert_eq!(plural_of("cat"), "cats");
        assert_eq!(plural_of("box"), "boxes");
        assert_eq!(plural_of("city"), "cities");
        assert_eq!(plural_of("toy"), "toys");
        assert_eq!(plural_of("church"), "churches");
        assert_eq!(plural_of("child"), "children");
    }

    #[test]
    fn verb_forms() {
        assert_eq!(third_person("carry"), "carries");
        assert_eq!(third_person("watch"), "watches");
        assert_eq!(third_person("play"), "plays");
        assert_eq!(third_person("have"), "has");
        assert_eq!(past_of("stop"), "stopped");
        assert_eq!(past_of("bake"), "baked");
        assert_eq!(past_of("carry"), "carried");
        assert_eq!(past_of("play"), "played");
        assert_eq!(past_of("catch"), "caught");
        assert_eq!(ing_of("run"), "running");
        assert_eq!(ing_of("bake"), "baking");
    }

    #[test]
    fn superlative_question_offers_four_forms() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let draft = superlative(&mut rng);
            assert_eq!(draft.options.len(), 4, "{:?}", draft.options);
            assert_eq!(draft.options.iter().filter(|o| **o == draft.answer).count(), 1);
        }
    }

    #[test]
    fn adjective_forms() {
        assert_eq!(superlative_of("big"), "biggest");
        assert_eq!(superlative_of("happy"), "happiest");
        assert_eq!(superlative_of("beautiful"), "most beautiful");
        assert_eq!(superlative_of("good"), "best");
        assert_eq!(comparative_of("tall"), "taller");
    }
}
