//! Name matching between planned activities and logged records
//!
//! Records carry free text typed by the vet ("Vacuna antirrábica",
//! "Anemia infecciosa", ...). A planned activity and a record match when
//! both mention the same disease from a small fixed vocabulary. Text that
//! names none of these diseases never matches.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Disease concepts and the substrings that identify them, after folding
const VOCABULARY: &[(&str, &[&str])] = &[
    ("aie", &["aie", "anemia"]),
    ("influenza", &["influenza"]),
    ("rabies", &["rabia", "rabica"]),
    ("adenitis", &["adenitis"]),
    ("quintuple", &["quintuple"]),
];

/// Lowercase and strip diacritics, whether typed precomposed or decomposed.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn concepts(folded: &str) -> impl Iterator<Item = &'static str> + '_ {
    VOCABULARY
        .iter()
        .filter(move |(_, terms)| terms.iter().any(|term| folded.contains(term)))
        .map(|(concept, _)| *concept)
}

/// Whether a record's free-text type fulfils the planned activity name
pub fn matches(activity_name: &str, record_type: &str) -> bool {
    let activity = fold(activity_name);
    let record = fold(record_type);
    concepts(&activity).any(|concept| concepts(&record).any(|other| other == concept))
}
