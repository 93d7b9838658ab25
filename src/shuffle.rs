use std::collections::{BTreeSet, HashMap};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{AnswerKey, Choice, Question};

const LABELS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Labels for `n` shuffled options: `A`..`Z`, or `Opt1`..`OptN` when the
/// alphabet is too short.
pub fn new_labels(n: usize) -> Vec<String> {
    if n <= LABELS.len() {
        LABELS.chars().take(n).map(String::from).collect()
    } else {
        (1..=n).map(|i| format!("Opt{}", i)).collect()
    }
}

/// Shuffle the options of a single or multiple choice question.
///
/// Matching and free-form questions come back unchanged.
pub fn shuffle_options<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Question {
    shuffle_options_with_mapping(question, rng).0
}

/// Like [`shuffle_options`], also returning the old-label to new-label map.
/// The map is empty when nothing was shuffled.
pub fn shuffle_options_with_mapping<R: Rng + ?Sized>(
    question: &Question,
    rng: &mut R,
) -> (Question, HashMap<String, String>) {
    if !matches!(question.key, AnswerKey::Single(_) | AnswerKey::Multiple(_)) {
        return (question.clone(), HashMap::new());
    }

    let mut pairs = question.choices.clone();
    pairs.shuffle(rng);

    let labels = new_labels(pairs.len());
    let mut old_to_new: HashMap<String, String> = HashMap::new();
    let choices: Vec<Choice> = pairs
        .into_iter()
        .zip(labels)
        .map(|(choice, label)| {
            old_to_new.insert(choice.label, label.clone());
            Choice::new(label, choice.text.trim())
        })
        .collect();

    let remap = |old: &String| old_to_new.get(old).cloned().unwrap_or_else(|| old.clone());
    let key = match &question.key {
        AnswerKey::Single(letter) => AnswerKey::Single(remap(letter)),
        AnswerKey::Multiple(letters) => {
            AnswerKey::Multiple(letters.iter().map(remap).collect::<BTreeSet<_>>())
        }
        other => other.clone(),
    };

    let shuffled = Question {
        text: question.text.clone(),
        choices,
        key,
        images: question.images.clone(),
        source_topic: question.source_topic.clone(),
    };
    (shuffled, old_to_new)
}

/// Per-question option shuffle followed by a shuffle of the question order.
pub fn prepare_questions<R: Rng + ?Sized>(questions: &[Question], rng: &mut R) -> Vec<Question> {
    let mut prepared: Vec<Question> = questions.iter().map(|q| shuffle_options(q, rng)).collect();
    prepared.shuffle(rng);
    prepared
}

/// Random subset of at most `max` questions; `max == 0` keeps everything.
pub fn sample_questions<R: Rng + ?Sized>(
    questions: Vec<Question>,
    max: usize,
    rng: &mut R,
) -> Vec<Question> {
    if max == 0 || questions.len() <= max {
        return questions;
    }
    questions.choose_multiple(rng, max).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(key: AnswerKey, n: usize) -> Question {
        Question {
            text: "Q".into(),
            choices: new_labels(n)
                .into_iter()
                .enumerate()
                .map(|(i, l)| Choice::new(l, format!("option {}", i)))
                .collect(),
            key,
            images: Vec::new(),
            source_topic: String::new(),
        }
    }

    fn texts(q: &Question) -> BTreeSet<String> {
        q.choices.iter().map(|c| c.text.clone()).collect()
    }

    #[test]
    fn single_answer_follows_its_option() {
        let original = question(AnswerKey::Single("C".into()), 5);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (shuffled, map) = shuffle_options_with_mapping(&original, &mut rng);
            assert_eq!(texts(&shuffled), texts(&original));
            let AnswerKey::Single(new) = &shuffled.key else {
                panic!("kind changed");
            };
            assert_eq!(new, &map["C"]);
            assert_eq!(shuffled.choice(new).unwrap().text, "option 2");
        }
    }

    #[test]
    fn multiple_answer_is_remapped_as_a_set() {
        let key: BTreeSet<String> = ["A", "D"].iter().map(|s| s.to_string()).collect();
        let original = question(AnswerKey::Multiple(key), 4);
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = shuffle_options(&original, &mut rng);
        let AnswerKey::Multiple(letters) = &shuffled.key else {
            panic!("kind changed");
        };
        let picked: BTreeSet<String> = letters
            .iter()
            .map(|l| shuffled.choice(l).unwrap().text.clone())
            .collect();
        let expected: BTreeSet<String> =
            ["option 0", "option 3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(picked, expected);
    }

    #[test]
    fn matching_and_freeform_pass_through() {
        let matching = question(AnswerKey::Matching(vec![("A".into(), "B".into())]), 3);
        let freeform = Question {
            choices: Vec::new(),
            ..question(AnswerKey::FreeForm(vec!["x".into()]), 0)
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(shuffle_options(&matching, &mut rng), matching);
        assert_eq!(shuffle_options(&freeform, &mut rng), freeform);
        assert_eq!(freeform.kind(), QuestionKind::FreeForm);
    }

    #[test]
    fn long_option_lists_use_synthetic_labels() {
        assert_eq!(new_labels(3), vec!["A", "B", "C"]);
        let labels = new_labels(27);
        assert_eq!(labels[0], "Opt1");
        assert_eq!(labels[26], "Opt27");
    }

    #[test]
    fn sampling_respects_limit() {
        let pool: Vec<Question> = (0..10)
            .map(|_| question(AnswerKey::Single("A".into()), 2))
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(sample_questions(pool.clone(), 4, &mut rng).len(), 4);
        assert_eq!(sample_questions(pool.clone(), 0, &mut rng).len(), 10);
        assert_eq!(sample_questions(pool, 50, &mut rng).len(), 10);
    }
}
