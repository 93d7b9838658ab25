use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{QuizError, Result};
use crate::model::{Quiz, TestResult};
use crate::parser::ParseContext;

pub const QUIZ_EXTENSION: &str = "txt";

/// Anything that accepts a finished result: storage, notification, display.
pub trait ResultSink {
    fn deliver(&self, result: &TestResult, sources: &[SourceRef]) -> Result<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub path: PathBuf,
    pub hash: String,
}

impl SourceRef {
    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            path: quiz.file_path.clone(),
            hash: quiz.source_hash.clone(),
        }
    }
}

/// What gets written to the results directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    #[serde(flatten)]
    pub result: TestResult,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(skip)]
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Library {
    pub bundled_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Library {
    /// Library rooted at the platform data directory.
    pub fn open(bundled_dir: Option<PathBuf>) -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "plainquiz")
            .ok_or_else(|| QuizError::NotFound(PathBuf::from("home directory")))?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let bundled_dir = bundled_dir.unwrap_or_else(|| cwd.join("quizzes"));
        Ok(Self::at(absolutize(&bundled_dir, &cwd), dirs.data_dir().to_path_buf()))
    }

    pub fn at(bundled_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            bundled_dir,
            data_dir,
        }
    }

    pub fn user_dir(&self) -> PathBuf {
        self.data_dir.join("quizzes")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.data_dir.join("results")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.yaml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("plainquiz.log")
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.user_dir(), self.results_dir()] {
            fs::create_dir_all(&dir).map_err(|source| QuizError::Write { path: dir, source })?;
        }
        Ok(())
    }

    /// Parse context for documents in this library. The bundled tree is the
    /// shared root for topics and images.
    pub fn parse_context(&self) -> ParseContext {
        ParseContext::from_cwd(Some(self.bundled_dir.clone()))
    }

    /// All quiz documents, user files shadowing bundled ones.
    pub fn find_quiz_files(&self, include_bundled: bool) -> Vec<PathBuf> {
        let mut by_rel: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
        if include_bundled {
            collect_into(&self.bundled_dir, &mut by_rel);
        }
        collect_into(&self.user_dir(), &mut by_rel);
        by_rel.into_values().collect()
    }

    /// Copy a quiz document into the user tree, together with a sibling
    /// `images/` directory when present. Returns the new path.
    pub fn import(&self, source: &Path) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(QuizError::NotFound(source.to_path_buf()));
        }
        let user_dir = self.user_dir();
        fs::create_dir_all(&user_dir).map_err(|e| write_err(&user_dir, e))?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "quiz".to_string());
        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let dest = unique_path(&user_dir, &format!("{}{}", stem, ext));
        fs::copy(source, &dest).map_err(|e| write_err(&dest, e))?;

        if let Some(images) = source.parent().map(|p| p.join("images")) {
            if images.is_dir() {
                if let Err(e) = copy_tree(&images, &user_dir.join("images")) {
                    warn!(error = %e, "images were not copied completely");
                }
            }
        }

        info!(from = %source.display(), to = %dest.display(), "quiz imported");
        Ok(dest)
    }

    /// Names shipped with the installation, one per line.
    pub fn base_names_path(&self) -> PathBuf {
        self.data_dir.join("names_base.txt")
    }

    /// Names typed in by students on earlier runs.
    pub fn user_names_path(&self) -> PathBuf {
        self.data_dir.join("names_user.txt")
    }

    /// Both name lists; user names already in the base list are left out.
    pub fn load_names(&self) -> NameLists {
        let base = read_name_list(&self.base_names_path());
        let user = read_name_list(&self.user_names_path())
            .into_iter()
            .filter(|n| !base.contains(n))
            .collect();
        NameLists { base, user }
    }

    /// Remember `name` for later runs. Returns false when it was already known.
    pub fn save_name(&self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() || self.load_names().contains(name) {
            return Ok(false);
        }
        let path = self.user_names_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| write_err(&path, e))?;
        writeln!(file, "{}", name).map_err(|e| write_err(&path, e))?;
        debug!(name, "name saved");
        Ok(true)
    }

    pub fn clear_user_names(&self) -> Result<()> {
        let path = self.user_names_path();
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(write_err(&path, e)),
            _ => Ok(()),
        }
    }

    /// Delete imported quiz documents. Returns how many were removed.
    pub fn clear_user_quizzes(&self) -> usize {
        let mut found = BTreeMap::new();
        collect_into(&self.user_dir(), &mut found);
        found
            .values()
            .filter(|path| fs::remove_file(path).is_ok())
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameLists {
    pub base: Vec<String>,
    pub user: Vec<String>,
}

impl NameLists {
    pub fn contains(&self, name: &str) -> bool {
        self.base.iter().chain(&self.user).any(|n| n == name)
    }

    /// Names offered on the name screen: only the base list when entry is
    /// restricted to it, the remembered names otherwise.
    pub fn offered(self, restrict_to_base: bool) -> Vec<String> {
        if restrict_to_base {
            self.base
        } else {
            self.user
        }
    }
}

fn read_name_list(path: &Path) -> Vec<String> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut names: Vec<String> = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !names.iter().any(|n| n == line) {
            names.push(line.to_string());
        }
    }
    names
}

/// Writes results as YAML files, one per finished session.
#[derive(Debug, Clone)]
pub struct ResultStore {
    pub dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Stored results, newest first. Unreadable files are skipped.
    pub fn load_results(&self) -> Vec<StoredResult> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut results: Vec<StoredResult> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == "yaml"))
            .filter_map(|path| {
                let content = fs::read_to_string(&path).ok()?;
                match serde_yaml::from_str::<StoredResult>(&content) {
                    Ok(mut stored) => {
                        stored.file = path;
                        Some(stored)
                    }
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "skipping unreadable result");
                        None
                    }
                }
            })
            .collect();

        results.sort_by(|a, b| b.result.timestamp.cmp(&a.result.timestamp));
        results
    }
}

impl ResultSink for ResultStore {
    fn deliver(&self, result: &TestResult, sources: &[SourceRef]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| write_err(&self.dir, e))?;

        let path = unique_path(&self.dir, &result_file_name(result));
        let stored = StoredResult {
            result: result.clone(),
            sources: sources.to_vec(),
            file: path.clone(),
        };
        let yaml = serde_yaml::to_string(&stored)?;
        atomic_write(&path, &yaml)?;

        info!(path = %path.display(), "result saved");
        Ok(path)
    }
}

pub fn result_file_name(result: &TestResult) -> String {
    let student: String = result
        .student_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let student = if student.is_empty() { "Unknown".to_string() } else { student };
    let stamp = result.timestamp.replace(':', "-").replace(' ', "_");
    format!("{}_{}.yaml", student, stamp)
}

/// `dir/name`, or `dir/stem_N.ext` with the first free `N` when taken.
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let file = Path::new(name);
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut path = dir.join(name);
    let mut counter = 1;
    while path.exists() {
        path = dir.join(format!("{}_{}{}", stem, counter, ext));
        counter += 1;
    }
    path
}

/// Expand command-line arguments into quiz files: files as given,
/// directories to the documents inside them.
pub fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = BTreeMap::new();
            collect_into(path, &mut found);
            out.extend(found.into_values());
        } else if path.is_file() {
            out.push(path.clone());
        } else {
            return Err(QuizError::NotFound(path.clone()));
        }
    }
    Ok(out)
}

fn collect_into(root: &Path, out: &mut BTreeMap<PathBuf, PathBuf>) {
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_symlink() && path.is_dir() {
                debug!(path = %path.display(), "not following directory link");
            } else if path.extension().is_some_and(|e| e == QUIZ_EXTENSION) {
                if let Ok(rel) = path.strip_prefix(root) {
                    out.insert(rel.to_path_buf(), path.clone());
                }
            }
        }
    }
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|e| write_err(to, e))?;
    let entries = fs::read_dir(from).map_err(|source| QuizError::Read {
        path: from.to_path_buf(),
        source,
    })?;
    for entry in entries.flatten() {
        let src = entry.path();
        let dst = to.join(entry.file_name());
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            copy_tree(&src, &dst)?;
        } else {
            fs::copy(&src, &dst).map_err(|e| write_err(&dst, e))?;
        }
    }
    Ok(())
}

fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).map_err(|e| write_err(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| write_err(path, e))?;
    Ok(())
}

fn write_err(path: &Path, source: std::io::Error) -> QuizError {
    QuizError::Write {
        path: path.to_path_buf(),
        source,
    }
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(tmp: &Path) -> Library {
        Library::at(tmp.join("bundled"), tmp.join("data"))
    }

    #[test]
    fn user_files_shadow_bundled_ones() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = library(tmp.path());
        fs::create_dir_all(lib.bundled_dir.join("bio")).unwrap();
        fs::create_dir_all(lib.user_dir().join("bio")).unwrap();
        fs::write(lib.bundled_dir.join("bio/cells.txt"), "T\n").unwrap();
        fs::write(lib.bundled_dir.join("bio/notes.md"), "x").unwrap();
        fs::write(lib.bundled_dir.join("maths.txt"), "T\n").unwrap();
        fs::write(lib.user_dir().join("bio/cells.txt"), "Mine\n").unwrap();

        let files = lib.find_quiz_files(true);
        assert_eq!(files.len(), 2);
        assert!(files.contains(&lib.user_dir().join("bio/cells.txt")));
        assert!(files.contains(&lib.bundled_dir.join("maths.txt")));

        let only_user = lib.find_quiz_files(false);
        assert_eq!(only_user, vec![lib.user_dir().join("bio/cells.txt")]);
    }

    #[test]
    fn import_adds_suffix_and_copies_images() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = library(tmp.path());
        let src_dir = tmp.path().join("incoming");
        fs::create_dir_all(src_dir.join("images")).unwrap();
        fs::write(src_dir.join("quiz.txt"), "T\n").unwrap();
        fs::write(src_dir.join("images/pic.png"), b"png").unwrap();

        let first = lib.import(&src_dir.join("quiz.txt")).unwrap();
        let second = lib.import(&src_dir.join("quiz.txt")).unwrap();
        assert_eq!(first, lib.user_dir().join("quiz.txt"));
        assert_eq!(second, lib.user_dir().join("quiz_1.txt"));
        assert!(lib.user_dir().join("images/pic.png").is_file());

        assert_eq!(lib.clear_user_quizzes(), 2);
        assert!(lib.find_quiz_files(false).is_empty());
    }

    #[test]
    fn import_of_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = library(tmp.path());
        assert!(matches!(
            lib.import(&tmp.path().join("nope.txt")),
            Err(QuizError::NotFound(_))
        ));
    }

    #[test]
    fn directory_links_are_not_followed() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("quizzes");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("q.txt"), "T\n").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(&root, root.join("again")).unwrap();

        let files = expand_paths(&[root.clone()]).unwrap();
        assert_eq!(files, vec![root.join("q.txt")]);
    }

    #[test]
    fn names_are_remembered_once() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = library(tmp.path());
        fs::create_dir_all(&lib.data_dir).unwrap();
        fs::write(lib.base_names_path(), "Ann\n\nBo\nAnn\n").unwrap();
        fs::write(lib.user_names_path(), "Bo\nCy\n").unwrap();

        let names = lib.load_names();
        assert_eq!(names.base, vec!["Ann", "Bo"]);
        assert_eq!(names.user, vec!["Cy"]);

        assert!(!lib.save_name(" Ann ").unwrap());
        assert!(!lib.save_name("Cy").unwrap());
        assert!(lib.save_name("Dee").unwrap());
        assert_eq!(lib.load_names().offered(false), vec!["Cy", "Dee"]);
        assert_eq!(lib.load_names().offered(true), vec!["Ann", "Bo"]);

        lib.clear_user_names().unwrap();
        lib.clear_user_names().unwrap();
        assert!(lib.load_names().user.is_empty());
    }

    #[test]
    fn same_second_results_do_not_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResultStore::new(tmp.path().to_path_buf());
        let result = sample_result();

        let first = store.deliver(&result, &[]).unwrap();
        let second = store.deliver(&result, &[]).unwrap();
        assert_ne!(first, second);
        assert_eq!(second, tmp.path().join("Ann_Lee_3_2025-01-02_10-11-12_1.yaml"));
        assert_eq!(store.load_results().len(), 2);
    }

    #[test]
    fn file_names_are_safe() {
        assert_eq!(result_file_name(&sample_result()), "Ann_Lee_3_2025-01-02_10-11-12.yaml");
    }

    fn sample_result() -> TestResult {
        TestResult {
            student_name: "Ann Lee/3".into(),
            quiz_name: "Q".into(),
            total_questions: 0,
            correct_answers: 0,
            percentage: 0.0,
            grade_12: 0,
            grade_5: 2,
            passed: false,
            timestamp: "2025-01-02 10:11:12".into(),
            time_left: None,
            timeout: false,
            detailed_results: Vec::new(),
        }
    }
}
