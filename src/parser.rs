use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::answer::{classify_answer_line, looks_like_answer_line, LETTER_CLASS};
use crate::error::{QuizError, Result};
use crate::images::{extract_images, ImageRoots};
use crate::model::*;

static SECTION_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*\.\s*").expect("static regex"));

static QUESTION_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*\.\s+").expect("static regex"));

static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^([{}])\)\s*(.+)$", LETTER_CLASS)).expect("static regex")
});

/// File-system context the storage layer hands to the parser.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Shared quiz root; topics are derived relative to it.
    pub tests_root: Option<PathBuf>,
    pub project_root: PathBuf,
    pub cwd: PathBuf,
}

impl ParseContext {
    pub fn from_cwd(tests_root: Option<PathBuf>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            tests_root,
            project_root: cwd.clone(),
            cwd,
        }
    }

    /// `path` joined onto the working directory unless already absolute.
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    fn image_roots(&self, quiz_path: &Path) -> ImageRoots {
        ImageRoots {
            source_dir: quiz_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            tests_root: self.tests_root.clone(),
            project_root: self.project_root.clone(),
            cwd: self.cwd.clone(),
        }
    }
}

pub fn parse_quiz_file(path: &Path, ctx: &ParseContext) -> Result<Quiz> {
    let bytes = fs::read(path).map_err(|source| QuizError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|_| QuizError::NotText {
        path: path.to_path_buf(),
    })?;
    parse_quiz(&content, path, ctx)
}

/// Parse a quiz document.
///
/// Question blocks that do not make sense are dropped without an error so a
/// single typo cannot take the whole quiz down.
pub fn parse_quiz(content: &str, path: &Path, ctx: &ParseContext) -> Result<Quiz> {
    let lines: Vec<&str> = content.lines().map(str::trim_end).collect();
    if lines.is_empty() {
        return Err(QuizError::Empty {
            path: path.to_path_buf(),
        });
    }

    let title_line = lines[0].trim();
    let name = if title_line.is_empty() {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    } else {
        strip_section_prefix(title_line)
    };

    let abs_path = ctx.absolute(path);
    let topic = source_topic(&abs_path, ctx.tests_root.as_deref());
    let roots = ctx.image_roots(&abs_path);
    let mut questions: Vec<Question> = Vec::new();

    let mut i = 1;
    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            continue;
        }

        let header_line = i + 1;
        let (text, images) = extract_images(&strip_section_prefix(line), &roots);
        i += 1;

        let mut choices: Vec<Choice> = Vec::new();
        while i < lines.len() {
            match parse_option_line(lines[i].trim()) {
                Some(choice) => {
                    choices.push(choice);
                    i += 1;
                }
                None => break,
            }
        }

        if choices.is_empty() {
            let mut accepted: Vec<String> = Vec::new();
            while i < lines.len() {
                let ans = lines[i].trim();
                if ans.is_empty() || QUESTION_START_RE.is_match(ans) || OPTION_RE.is_match(ans) {
                    break;
                }
                accepted.extend(split_accepted_answers(ans));
                i += 1;
            }
            i = skip_blank(&lines, i);

            if accepted.is_empty() {
                debug!(line = header_line, "dropping block without options or answers");
                continue;
            }
            questions.push(Question {
                text,
                choices,
                key: AnswerKey::FreeForm(accepted),
                images,
                source_topic: topic.clone(),
            });
            continue;
        }

        if i >= lines.len() {
            debug!(line = header_line, "options run into end of file, no answer line");
            break;
        }

        let answer_line = lines[i].trim();
        i += 1;

        if !looks_like_answer_line(answer_line) {
            debug!(line = header_line, answer = answer_line, "dropping block with malformed answer line");
            i = skip_blank(&lines, i);
            continue;
        }

        let Some(key) = classify_answer_line(answer_line) else {
            debug!(line = header_line, answer = answer_line, "dropping block with unclassifiable answer");
            continue;
        };

        if key_matches_choices(&key, &choices) && !text.is_empty() {
            questions.push(Question {
                text,
                choices,
                key,
                images,
                source_topic: topic.clone(),
            });
        } else {
            debug!(line = header_line, "dropping block whose answer names unknown options");
        }

        i = skip_blank(&lines, i);
    }

    Ok(Quiz {
        name,
        questions,
        file_path: path.to_path_buf(),
        source_hash: compute_str_hash(content),
    })
}

/// Drop a leading `1.2. ` style numbering.
pub fn strip_section_prefix(text: &str) -> String {
    SECTION_PREFIX_RE.replace(text, "").trim().to_string()
}

/// Topic label for a quiz file: its directory relative to the shared root
/// joined with `" / "`, or the name of its parent directory otherwise.
pub fn source_topic(path: &Path, tests_root: Option<&Path>) -> String {
    if let Some(root) = tests_root {
        if let Ok(rel) = path.strip_prefix(root) {
            return rel
                .parent()
                .map(|dir| {
                    dir.components()
                        .map(|c| c.as_os_str().to_string_lossy().to_string())
                        .collect::<Vec<_>>()
                        .join(" / ")
                })
                .unwrap_or_default();
        }
    }
    path.parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn parse_option_line(line: &str) -> Option<Choice> {
    let caps = OPTION_RE.captures(line)?;
    Some(Choice::new(&caps[1], caps[2].trim()))
}

fn split_accepted_answers(line: &str) -> Vec<String> {
    if line.contains(',') {
        line.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_lowercase)
            .collect()
    } else {
        vec![line.to_lowercase()]
    }
}

fn key_matches_choices(key: &AnswerKey, choices: &[Choice]) -> bool {
    let labels: BTreeSet<&str> = choices.iter().map(|c| c.label.as_str()).collect();
    match key {
        AnswerKey::Single(letter) => labels.contains(letter.as_str()),
        AnswerKey::Multiple(letters) => letters.iter().all(|l| labels.contains(l.as_str())),
        AnswerKey::Matching(pairs) => pairs.iter().all(|(left, _)| labels.contains(left.as_str())),
        AnswerKey::FreeForm(_) => true,
    }
}

fn skip_blank(lines: &[&str], mut i: usize) -> usize {
    while i < lines.len() && lines[i].trim().is_empty() {
        i += 1;
    }
    i
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn compute_str_hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("sha256:{}", hex_encode(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Quiz {
        parse_quiz(content, Path::new("/nowhere/topic/quiz.txt"), &ParseContext::default()).unwrap()
    }

    #[test]
    fn single_choice_block() {
        let quiz = parse("Title\n1. Q?\nA) X\nB) Y\nB");
        assert_eq!(quiz.name, "Title");
        assert_eq!(quiz.questions.len(), 1);
        let q = &quiz.questions[0];
        assert_eq!(q.text, "Q?");
        assert_eq!(q.options(), vec!["A) X", "B) Y"]);
        assert_eq!(q.key, AnswerKey::Single("B".into()));
        assert_eq!(q.source_topic, "topic");
    }

    #[test]
    fn title_prefix_is_stripped() {
        let quiz = parse("1.2. Chemistry basics\n");
        assert_eq!(quiz.name, "Chemistry basics");
        assert!(quiz.questions.is_empty());
    }

    #[test]
    fn blank_title_falls_back_to_file_name() {
        let quiz = parse("\n1. Capital of France?\nParis\n");
        assert_eq!(quiz.name, "quiz.txt");
        assert_eq!(quiz.questions.len(), 1);
    }

    #[test]
    fn empty_document_is_an_error() {
        let err = parse_quiz("", Path::new("a.txt"), &ParseContext::default()).unwrap_err();
        assert!(matches!(err, QuizError::Empty { .. }));
    }

    #[test]
    fn freeform_answers_split_on_commas() {
        let quiz = parse("T\n\n1. Name a primary colour\nRed, BLUE\nyellow\n\n2. Next?\nA) a\nA\n");
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(
            quiz.questions[0].key,
            AnswerKey::FreeForm(vec!["red".into(), "blue".into(), "yellow".into()])
        );
    }

    #[test]
    fn freeform_stops_at_numbered_header() {
        let quiz = parse("T\n1. Capital of Italy?\nRome\n2. Capital of Spain?\nMadrid\n");
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[1].text, "Capital of Spain?");
        assert_eq!(quiz.questions[1].key, AnswerKey::FreeForm(vec!["madrid".into()]));
    }

    #[test]
    fn header_without_answers_is_dropped() {
        let quiz = parse("T\n1. Orphan question\n\n2. Q?\nA) x\nB) y\nA\n");
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].text, "Q?");
    }

    #[test]
    fn malformed_answer_line_drops_only_that_block() {
        let quiz = parse("T\n1. Bad?\nA) x\nB) y\nnot an answer\n\n2. Good?\nA) x\nB) y\nA, B\n");
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].kind(), QuestionKind::Multiple);
    }

    #[test]
    fn answer_naming_unknown_option_is_dropped() {
        let quiz = parse("T\n1. Q?\nA) x\nB) y\nC\n\n2. Q2?\nA) x\nB) y\nB\n");
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].text, "Q2?");
    }

    #[test]
    fn matching_checks_left_letters_only() {
        let quiz = parse("T\n1. Match\nA) one\nB) two\nX) 1\nY) 2\nA-X, B-Y\n");
        assert_eq!(
            quiz.questions[0].key,
            AnswerKey::Matching(vec![("A".into(), "X".into()), ("B".into(), "Y".into())])
        );
    }

    #[test]
    fn options_at_end_of_file_end_parsing() {
        let quiz = parse("T\n1. Q?\nA) x\nB) y");
        assert!(quiz.questions.is_empty());
    }

    #[test]
    fn topic_relative_to_shared_root() {
        let root = Path::new("/srv/quizzes");
        assert_eq!(
            source_topic(Path::new("/srv/quizzes/bio/cells/q.txt"), Some(root)),
            "bio / cells"
        );
        assert_eq!(source_topic(Path::new("/srv/quizzes/q.txt"), Some(root)), "");
        assert_eq!(source_topic(Path::new("/home/u/chem/q.txt"), Some(root)), "chem");
    }

    #[test]
    fn relative_path_is_resolved_against_cwd() {
        let ctx = ParseContext {
            tests_root: Some(PathBuf::from("/srv/quizzes")),
            project_root: PathBuf::from("/srv"),
            cwd: PathBuf::from("/srv"),
        };
        let quiz = parse_quiz("T\n1. Q?\nA) x\nA\n", Path::new("quizzes/bio/cells/q.txt"), &ctx).unwrap();
        assert_eq!(quiz.questions[0].source_topic, "bio / cells");
        assert_eq!(quiz.file_path, Path::new("quizzes/bio/cells/q.txt"));
    }

    #[test]
    fn freeform_answers_stop_at_option_line() {
        let quiz = parse("T\n1. Largest planet?\nJupiter\nA) stray\n\n2. Next?\nB) x\nB\n");
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[0].key, AnswerKey::FreeForm(vec!["jupiter".into()]));
        assert_eq!(quiz.questions[1].text, "Next?");
    }

    #[test]
    fn cyrillic_option_labels() {
        let quiz = parse("Тест\n1. Столиця України?\nА) Київ\nБ) Львів\nЁ) Одеса\nА\n\n2. Оберіть міста\nА) Київ\nБ) Рим\nВ) Харків\nА, В\n");
        assert_eq!(quiz.name, "Тест");
        assert_eq!(quiz.questions.len(), 2);
        let first = &quiz.questions[0];
        assert_eq!(first.options(), vec!["А) Київ", "Б) Львів", "Ё) Одеса"]);
        assert_eq!(first.key, AnswerKey::Single("А".into()));
        assert_eq!(
            quiz.questions[1].key,
            AnswerKey::Multiple(["А", "В"].iter().map(|s| s.to_string()).collect())
        );
    }

    #[test]
    fn parsing_is_deterministic() {
        let doc = "T\n1. Q?\nA) x\nB) y\nA\n\n2. F?\nfoo\n";
        let a = parse(doc);
        let b = parse(doc);
        assert_eq!(a.questions, b.questions);
        assert_eq!(a.source_hash, b.source_hash);
    }
}
