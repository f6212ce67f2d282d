//! Fixed word lists used by roster parsing and name detection
//!
//! All entries are normalized (see [`crate::text::normalize`]).

pub const HONORIFICS: &[&str] = &[
    "prof", "professor", "dr", "mr", "mrs", "ms", "mx", "miss", "sir", "madam",
];

/// Lowercase surname particles that never stand alone as a name
pub const SURNAME_PARTICLES: &[&str] = &[
    "al", "bin", "da", "das", "de", "del", "della", "den", "der", "di", "dos", "du", "ibn", "la",
    "le", "st", "van", "von",
];

pub const MODAL_WORDS: &[&str] = &[
    "can", "could", "did", "do", "does", "may", "might", "must", "shall", "should", "will",
    "would",
];

pub const SUBJECT_PRONOUNS: &[&str] = &["he", "i", "it", "she", "they", "we", "you"];

/// Capitalized words that are never the start or part of a person name
pub const FUNCTION_WORDS: &[&str] = &[
    // pronouns and determiners
    "i", "me", "my", "we", "us", "our", "you", "your", "he", "him", "his", "she", "her", "they",
    "them", "their", "it", "its", "a", "an", "the", "this", "that", "these", "those", "there",
    "here", "some", "any", "all", "each", "every", "no", "none",
    // conjunctions, prepositions, question words
    "and", "or", "but", "so", "if", "then", "when", "where", "why", "how", "what", "who", "which",
    "in", "on", "at", "for", "with", "from", "to", "of", "by", "as", "also", "just", "not",
    "is", "are", "was", "were", "be", "been", "have", "has", "had",
    // imperatives that open forum sentences
    "ask", "see", "check", "email", "contact", "let", "try", "use", "read", "look", "refer",
    "submit", "make", "go", "run", "post", "reply",
    // greetings and sign-offs
    "hi", "hello", "hey", "dear", "thanks", "thank", "yes", "ok", "okay", "please", "sorry",
    "regards", "best", "cheers",
    // calendar
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
    // course vocabulary
    "lab", "homework", "hw", "exam", "midterm", "final", "quiz", "project", "lecture",
    "assignment", "question", "answer", "problem", "part", "section", "chapter", "week",
    "update", "note", "edit", "piazza",
];

pub fn is_honorific(word: &str) -> bool {
    HONORIFICS.contains(&word)
}

pub fn is_particle(word: &str) -> bool {
    SURNAME_PARTICLES.contains(&word)
}

pub fn is_modal(word: &str) -> bool {
    MODAL_WORDS.contains(&word)
}

pub fn is_subject_pronoun(word: &str) -> bool {
    SUBJECT_PRONOUNS.contains(&word)
}

pub fn is_function_word(word: &str) -> bool {
    FUNCTION_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_are_normalized() {
        for list in [
            HONORIFICS,
            SURNAME_PARTICLES,
            MODAL_WORDS,
            SUBJECT_PRONOUNS,
            FUNCTION_WORDS,
        ] {
            for word in list {
                assert_eq!(&crate::text::normalize(word), word);
            }
        }
    }

    #[test]
    fn test_lookups() {
        assert!(is_honorific("prof"));
        assert!(is_modal("will"));
        assert!(is_subject_pronoun("you"));
        assert!(is_particle("van"));
        assert!(!is_function_word("grace"));
        assert!(is_function_word("ask"));
    }
}
