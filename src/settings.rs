use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::warn;

use crate::error::{QuizError, Result};

/// How long a session may run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimerRaw", into = "TimerRaw")]
pub enum TimerSetting {
    /// Fixed number of minutes for the whole quiz; 0 disables the timer.
    Minutes(f64),
    /// One minute per question (`"A"`).
    Auto,
    /// Given minutes per question (`"A(1.5)"`).
    PerQuestion(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TimerRaw {
    Number(f64),
    Text(String),
}

impl TryFrom<TimerRaw> for TimerSetting {
    type Error = String;

    fn try_from(raw: TimerRaw) -> std::result::Result<Self, Self::Error> {
        match raw {
            TimerRaw::Number(n) => Ok(TimerSetting::Minutes(n)),
            TimerRaw::Text(s) => TimerSetting::parse(&s).ok_or_else(|| format!("bad timer value: {}", s)),
        }
    }
}

impl From<TimerSetting> for TimerRaw {
    fn from(t: TimerSetting) -> Self {
        match t {
            TimerSetting::Minutes(n) => TimerRaw::Number(n),
            other => TimerRaw::Text(other.to_string()),
        }
    }
}

impl TimerSetting {
    pub fn parse(s: &str) -> Option<Self> {
        let raw = s.trim().to_uppercase();
        if raw == "A" {
            return Some(TimerSetting::Auto);
        }
        if let Some(inner) = raw.strip_prefix("A(").and_then(|r| r.strip_suffix(')')) {
            let valid = !inner.is_empty()
                && inner.chars().all(|c| c.is_ascii_digit() || c == '.')
                && inner.matches('.').count() <= 1
                && !inner.starts_with('.')
                && !inner.ends_with('.');
            if valid {
                return inner.parse().ok().map(TimerSetting::PerQuestion);
            }
            return None;
        }
        raw.parse::<f64>().ok().map(TimerSetting::Minutes)
    }
}

impl fmt::Display for TimerSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerSetting::Minutes(n) => write!(f, "{}", n),
            TimerSetting::Auto => f.write_str("A"),
            TimerSetting::PerQuestion(n) => write!(f, "A({})", n),
        }
    }
}

/// Time limit in seconds for `question_count` questions; 0 means no limit.
pub fn resolve_time_limit_seconds(timer: TimerSetting, question_count: usize) -> u64 {
    let secs = match timer {
        TimerSetting::Minutes(m) => m * 60.0,
        TimerSetting::Auto => question_count as f64 * 60.0,
        TimerSetting::PerQuestion(m) => question_count as f64 * m * 60.0,
    };
    if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeScale {
    Percent,
    Twelve,
    Five,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub timer: TimerSetting,
    pub show_timer: bool,
    pub max_questions: usize,
    /// Which scores the result screen shows.
    pub grade_mode: Vec<GradeScale>,
    pub pass_threshold: f64,
    pub auto_next: bool,
    /// `None` or `"auto"` store into the results directory, anything else
    /// is a directory path.
    pub default_save_dir: Option<String>,
    pub hide_builtin_quizzes: bool,
    /// Only names from the base names file may be entered.
    #[serde(default)]
    pub restrict_name_to_list: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timer: TimerSetting::PerQuestion(1.1),
            show_timer: true,
            max_questions: 60,
            grade_mode: vec![GradeScale::Percent, GradeScale::Twelve, GradeScale::Five],
            pass_threshold: 65.0,
            auto_next: false,
            default_save_dir: None,
            hide_builtin_quizzes: false,
            restrict_name_to_list: false,
        }
    }
}

impl Settings {
    /// Build settings from an arbitrary YAML document, field by field.
    pub fn from_value(raw: &Value) -> Self {
        let defaults = Settings::default();

        let timer = match field(raw, "timer") {
            Some(Value::Number(n)) => n.as_f64().map(TimerSetting::Minutes),
            Some(Value::String(s)) => TimerSetting::parse(s),
            _ => None,
        }
        .unwrap_or(defaults.timer);

        let grade_mode = match field(raw, "grade_mode") {
            Some(Value::String(s)) if s == "all" => defaults.grade_mode.clone(),
            Some(v @ Value::String(_)) => parse_scale(v).map(|s| vec![s]).unwrap_or_default(),
            Some(Value::Sequence(items)) => {
                let mut scales: Vec<GradeScale> = Vec::new();
                for scale in items.iter().filter_map(parse_scale) {
                    if !scales.contains(&scale) {
                        scales.push(scale);
                    }
                }
                scales
            }
            _ => Vec::new(),
        };
        let grade_mode = if grade_mode.is_empty() {
            defaults.grade_mode.clone()
        } else {
            grade_mode
        };

        let default_save_dir = match field(raw, "default_save_dir") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        };

        Settings {
            timer,
            show_timer: field(raw, "show_timer").and_then(Value::as_bool).unwrap_or(defaults.show_timer),
            max_questions: field(raw, "max_questions")
                .and_then(Value::as_i64)
                .map(|n| n.max(0) as usize)
                .unwrap_or(defaults.max_questions),
            grade_mode,
            pass_threshold: field(raw, "pass_threshold")
                .and_then(Value::as_f64)
                .filter(|p| p.is_finite())
                .map(|p| p.clamp(0.0, 100.0))
                .unwrap_or(defaults.pass_threshold),
            auto_next: field(raw, "auto_next").and_then(Value::as_bool).unwrap_or(defaults.auto_next),
            default_save_dir,
            hide_builtin_quizzes: field(raw, "hide_builtin_quizzes")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.hide_builtin_quizzes),
            restrict_name_to_list: field(raw, "restrict_name_to_list")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.restrict_name_to_list),
        }
    }

    /// Load settings from `path`, writing defaults when the file is absent
    /// and the normalised form otherwise.
    pub fn load_or_init(path: &Path) -> Result<Settings> {
        if !path.is_file() {
            let defaults = Settings::default();
            defaults.save(path)?;
            return Ok(defaults);
        }

        let content = fs::read_to_string(path).map_err(|source| QuizError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = match serde_yaml::from_str::<Value>(&content) {
            Ok(raw) => Settings::from_value(&raw),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt settings file, using defaults");
                return Ok(Settings::default());
            }
        };
        if let Err(e) = settings.save(path) {
            warn!(path = %path.display(), error = %e, "cannot rewrite settings");
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| QuizError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|source| QuizError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Where results should be written, given the default results directory.
    pub fn save_dir(&self, results_dir: &Path) -> PathBuf {
        match self.default_save_dir.as_deref() {
            None | Some("auto") => results_dir.to_path_buf(),
            Some(dir) => PathBuf::from(dir),
        }
    }
}

fn field<'a>(raw: &'a Value, name: &str) -> Option<&'a Value> {
    raw.get(name).filter(|v| !v.is_null())
}

fn parse_scale(v: &Value) -> Option<GradeScale> {
    match v.as_str()? {
        "%" | "percent" => Some(GradeScale::Percent),
        "12" | "twelve" => Some(GradeScale::Twelve),
        "5" | "five" => Some(GradeScale::Five),
        _ => None,
    }
}
