//! Fixed data the mock service starts with.

use crate::{PhrasalVerb, Progress};

/// Spanish ↔ English pairs used by the vocabulary endpoint.
pub(crate) const DICTIONARY: &[(&str, &str, &str)] = &[
    ("casa", "house", "noun"),
    ("perro", "dog", "noun"),
    ("libro", "book", "noun"),
    ("hola", "hello", "interjection"),
    ("correr", "run", "verb"),
    ("rápido", "fast", "adjective"),
];

/// (wrong, right, error type, rule)
pub(crate) const CORRECTION_RULES: &[(&str, &str, &str, &str)] = &[
    (
        "I are",
        "I am",
        "grammar",
        "Subject-verb agreement: 'I' takes 'am' in the present tense.",
    ),
    (
        "he go ",
        "he goes ",
        "grammar",
        "Third person singular verbs take -s in the present simple.",
    ),
    (
        "she don't",
        "she doesn't",
        "grammar",
        "Use 'doesn't' with he/she/it.",
    ),
    ("teh", "the", "spelling", "Common misspelling of 'the'."),
    (
        "recieve",
        "receive",
        "spelling",
        "'i' before 'e' except after 'c'.",
    ),
];

pub(crate) const GRAMMAR_TOPICS: &[&str] = &[
    "articles",
    "present_perfect",
    "conditionals",
    "modal_verbs",
    "prepositions",
    "phrasal_verbs",
];

pub(crate) const WORD_COMPARISONS: &[(&str, &str)] = &[
    ("affect", "effect"),
    ("then", "than"),
    ("advice", "advise"),
    ("lose", "loose"),
];

pub(crate) fn phrasal_verbs(stamp: &str) -> Vec<PhrasalVerb> {
    let rows: &[(&str, &str, &str, &[&str])] = &[
        (
            "give up",
            "To stop trying to do something",
            "beginner",
            &["Don't give up on your dreams.", "She gave up smoking."],
        ),
        (
            "look up",
            "To search for information",
            "beginner",
            &["Look up the word in a dictionary."],
        ),
        (
            "put off",
            "To postpone something",
            "intermediate",
            &["They put off the meeting until Friday."],
        ),
        (
            "come across",
            "To find something by chance",
            "intermediate",
            &["I came across an old photo."],
        ),
        (
            "bring about",
            "To cause something to happen",
            "advanced",
            &["The reforms brought about big changes."],
        ),
        (
            "look forward to",
            "To feel happy about something that will happen",
            "beginner",
            &["I look forward to seeing you."],
        ),
    ];

    rows.iter()
        .enumerate()
        .map(|(i, (verb, definition, difficulty, examples))| PhrasalVerb {
            id: i as u32 + 1,
            verb: verb.to_string(),
            definition: definition.to_string(),
            examples: examples.iter().map(|e| e.to_string()).collect(),
            difficulty: difficulty.to_string(),
            status: "pending".to_string(),
            progress: Progress::default(),
            created_at: stamp.to_string(),
            updated_at: stamp.to_string(),
        })
        .collect()
}
