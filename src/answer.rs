use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::AnswerKey;

/// Option letters accepted by the format: Latin and Cyrillic upper case.
pub const LETTER_CLASS: &str = "A-ZА-ЯЁ";

static PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^([{0}])\s*-\s*([{0}])$", LETTER_CLASS)).expect("static regex")
});

static LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^[{}]$", LETTER_CLASS)).expect("static regex"));

static CANDIDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^[{0}](?:\s*-\s*[{0}])?(?:\s*,\s*[{0}](?:\s*-\s*[{0}])?)*\s*$",
        LETTER_CLASS
    ))
    .expect("static regex")
});

/// Structural pre-check: could this line be an answer line at all?
///
/// Used by the parser before classification; the line is upper-cased first.
pub fn looks_like_answer_line(line: &str) -> bool {
    CANDIDATE_RE.is_match(&line.trim().to_uppercase())
}

/// Classify a single answer line.
///
/// Returns `None` for empty lines, for lines with any token that is neither a
/// letter nor a `letter-letter` pair, and for lines mixing both shapes.
pub fn classify_answer_line(line: &str) -> Option<AnswerKey> {
    let line = line.trim().to_uppercase();
    let mut letters: Vec<String> = Vec::new();
    let mut pairs: Vec<(String, String)> = Vec::new();

    for part in line.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(caps) = PAIR_RE.captures(part) {
            pairs.push((caps[1].to_string(), caps[2].to_string()));
        } else if LETTER_RE.is_match(part) {
            letters.push(part.to_string());
        } else {
            return None;
        }
    }

    match (letters.is_empty(), pairs.is_empty()) {
        (true, false) => Some(AnswerKey::Matching(pairs)),
        (false, true) if letters.len() == 1 => letters.pop().map(AnswerKey::Single),
        (false, true) => Some(AnswerKey::Multiple(letters.into_iter().collect::<BTreeSet<_>>())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_letter_is_single_choice() {
        assert_eq!(classify_answer_line("b"), Some(AnswerKey::Single("B".into())));
    }

    #[test]
    fn letter_list_is_multiple_choice() {
        assert_eq!(
            classify_answer_line("A, C"),
            Some(AnswerKey::Multiple(set(&["A", "C"])))
        );
    }

    #[test]
    fn repeated_letter_still_counts_as_multiple() {
        assert_eq!(
            classify_answer_line("A,A"),
            Some(AnswerKey::Multiple(set(&["A"])))
        );
    }

    #[test]
    fn pairs_keep_authored_order() {
        assert_eq!(
            classify_answer_line("B - Y, A-X"),
            Some(AnswerKey::Matching(vec![
                ("B".into(), "Y".into()),
                ("A".into(), "X".into()),
            ]))
        );
    }

    #[test]
    fn cyrillic_letters_are_accepted() {
        assert_eq!(classify_answer_line("ё"), Some(AnswerKey::Single("Ё".into())));
        assert_eq!(
            classify_answer_line("А-Б"),
            Some(AnswerKey::Matching(vec![("А".into(), "Б".into())]))
        );
    }

    #[test]
    fn mixed_and_empty_lines_are_rejected() {
        assert_eq!(classify_answer_line("A, B-C"), None);
        assert_eq!(classify_answer_line(""), None);
        assert_eq!(classify_answer_line("AB"), None);
        assert_eq!(classify_answer_line("A, 1"), None);
    }

    #[test]
    fn candidate_check_is_structural() {
        assert!(looks_like_answer_line("a, b"));
        assert!(looks_like_answer_line("A-X,B - Y  "));
        assert!(!looks_like_answer_line("Paris"));
        assert!(!looks_like_answer_line("A,,B"));
        assert!(!looks_like_answer_line(""));
    }
}
