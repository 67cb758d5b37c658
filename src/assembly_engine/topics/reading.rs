//! Reading comprehension over templated passages.
//!
//! A passage is rendered from a [`Story`] whose fields are drawn from small
//! catalogues. Every question asks about one of those fields, so the answer
//! key is read straight off the parameters that produced the text.

use rand::Rng;

use crate::assembly_engine::{
    helpers::{finalize_options, text_distractors, Draft, GradeBand},
    models::Difficulty,
    shuffle::{pick, shuffled},
};

const NAMES: [&str; 6] = ["Maya", "Tom", "Ana", "Ravi", "Ella", "Jack"];

const PLACES: [&str; 6] = [
    "the old lighthouse",
    "the school garden",
    "the city museum",
    "the riverbank",
    "the family attic",
    "the forest trail",
];

const FINDS: [&str; 6] = [
    "a leather journal",
    "a silver key",
    "a hand-drawn map",
    "a tiny bird's nest",
    "a carved wooden box",
    "a faded photograph",
];

const EVENTS: [&str; 7] = [
    "packed a small bag",
    "called a friend",
    "drew a careful map",
    "read the notice board",
    "fed the neighbour's cat",
    "wrote a short note",
    "checked the weather",
];

/// (feeling, what happened that implies it)
const FEELINGS: [(&str, &str); 5] = [
    ("proud", "finished the whole model bridge without any help"),
    ("nervous", "had to read a speech in front of the entire school"),
    ("curious", "heard a strange tapping sound behind the wall"),
    ("relieved", "finally found the lost library book under the bed"),
    ("disappointed", "learned that the class trip had been cancelled"),
];

/// (word, meaning, sentence with `{}` where the word goes)
const CONTEXT_WORDS: [(&str, &str, &str); 6] = [
    ("glimmered", "shone faintly", "A small light {} in the distance."),
    ("trudged", "walked slowly and heavily", "Tired from the long day, they {} up the hill."),
    ("peculiar", "strange or unusual", "There was a {} smell coming from the cupboard."),
    ("vast", "very large", "Beyond the gate lay a {} field that seemed to have no end."),
    ("fragile", "easily broken", "The old vase was so {} that nobody dared to touch it."),
    ("reluctant", "unwilling", "At first the dog was {} to step into the cold water."),
];

#[derive(Debug, Clone, Copy)]
enum Archetype {
    Setting,
    Detail,
    Sequence,
    Inference,
    WordInContext,
}

fn catalogue(band: GradeBand, difficulty: Difficulty) -> &'static [Archetype] {
    use Archetype::*;
    match difficulty {
        Difficulty::Easy => &[Setting, Detail],
        Difficulty::Medium if band <= GradeBand::Primary => &[Detail, Sequence],
        Difficulty::Medium => &[Sequence, WordInContext],
        Difficulty::Hard => &[Inference, WordInContext],
    }
}

struct Story {
    name: &'static str,
    place: &'static str,
    find: &'static str,
    events: [&'static str; 3],
    feeling: (&'static str, &'static str),
    word: (&'static str, &'static str, &'static str),
}

impl Story {
    fn draw<R: Rng>(rng: &mut R) -> Self {
        let events = shuffled(EVENTS.to_vec(), rng);
        Story {
            name: *pick(&NAMES, rng),
            place: *pick(&PLACES, rng),
            find: *pick(&FINDS, rng),
            events: [events[0], events[1], events[2]],
            feeling: *pick(&FEELINGS, rng),
            word: *pick(&CONTEXT_WORDS, rng),
        }
    }

    fn render(&self, band: GradeBand) -> String {
        let Story { name, place, find, events, feeling, word } = self;
        let context_sentence = word.2.replace("{}", word.0);
        match band {
            GradeBand::Early | GradeBand::Primary => format!(
                "{name}'s Discovery\n\n\
                 On Saturday, {name} went to {place}. First, {name} {}. Then {name} {}. \
                 Last of all, {name} {}. {context_sentence} Under an old blanket, {name} found {find}. \
                 Later that week, {name} {}.",
                events[0], events[1], events[2], feeling.1
            ),
            _ => format!(
                "An Unexpected Afternoon\n\n\
                 Nobody expected much from the rainy afternoon {name} spent at {place}. \
                 Before setting out, {name} {}; after that, {name} {}, and only then {}. \
                 {context_sentence} It was there, half hidden in the dust, that {name} uncovered {find}. \
                 The following week brought its own surprise: {name} {}.",
                events[0], events[1], events[2], feeling.1
            ),
        }
    }
}

pub fn generate<R: Rng>(rng: &mut R, level: u8, difficulty: Difficulty) -> Draft {
    let band = GradeBand::from_level(level);
    let archetype = *pick(catalogue(band, difficulty), rng);
    let story = Story::draw(rng);
    let passage = story.render(band);
    let name = story.name;

    let (topic, question, answer, pool, explanation): (&'static str, String, &str, Vec<&str>, String) =
        match archetype {
            Archetype::Setting => (
                "Literal Comprehension",
                format!("Where did {name} go?"),
                story.place,
                PLACES.to_vec(),
                format!("The passage says {name} went to {}.", story.place),
            ),
            Archetype::Detail => (
                "Literal Comprehension",
                format!("What did {name} find?"),
                story.find,
                FINDS.to_vec(),
                format!("The passage states that {name} found {}.", story.find),
            ),
            Archetype::Sequence => {
                // The later events are the strongest distractors.
                let mut pool = vec![story.events[1], story.events[2]];
                pool.extend(EVENTS.iter().copied().filter(|e| !story.events.contains(e)));
                (
                    "Sequence of Events",
                    format!("What did {name} do first?"),
                    story.events[0],
                    pool,
                    format!(
                        "{name} {} first, then {}, and finally {}.",
                        story.events[0], story.events[1], story.events[2]
                    ),
                )
            }
            Archetype::Inference => (
                "Inference",
                format!("How did {name} most likely feel at the end of the passage?"),
                story.feeling.0,
                FEELINGS.iter().map(|f| f.0).collect(),
                format!(
                    "Someone who {} would most likely feel {}.",
                    story.feeling.1, story.feeling.0
                ),
            ),
            Archetype::WordInContext => (
                "Vocabulary in Context",
                format!("In the passage, the word \"{}\" most likely means:", story.word.0),
                story.word.1,
                CONTEXT_WORDS.iter().map(|w| w.1).collect(),
                format!(
                    "In \"{}\", the word \"{}\" means {}.",
                    story.word.2.replace("{}", story.word.0),
                    story.word.0,
                    story.word.1
                ),
            ),
        };

    let wrong = if matches!(archetype, Archetype::Sequence) {
        // Keep the two later events, then fill from the rest of the pool.
        let mut w: Vec<String> = pool[..2].iter().map(|s| s.to_string()).collect();
        w.extend(text_distractors(rng, answer, &pool[2..]));
        w
    } else {
        text_distractors(rng, answer, &pool)
    };
    let options = finalize_options(rng, answer, wrong);

    Draft {
        topic,
        content: format!("Read the passage:\n\n{passage}\n\nQuestion: {question}"),
        answer: answer.to_string(),
        options,
        explanation,
    }
}
