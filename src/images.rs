use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::ImageRef;

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)!\(\s*([^)]+?)\s*\)\[\s*([^\]]+\.(?:png|jpg|jpeg|gif|bmp|webp))\s*\]")
        .expect("static regex")
});

/// Directories consulted when resolving an image path.
#[derive(Debug, Clone, Default)]
pub struct ImageRoots {
    /// Directory of the quiz document.
    pub source_dir: PathBuf,
    /// Shared quiz root (bundled library).
    pub tests_root: Option<PathBuf>,
    pub project_root: PathBuf,
    pub cwd: PathBuf,
}

impl ImageRoots {
    /// Literal locations, in priority order.
    fn candidates(&self, rel: &Path) -> Vec<PathBuf> {
        let mut out = vec![
            self.source_dir.join(rel),
            self.source_dir.join("images").join(rel),
        ];
        if let Some(root) = &self.tests_root {
            out.push(root.join("images").join(rel));
        }
        out.push(self.project_root.join("images").join(rel));
        out.push(self.project_root.join("tests").join("images").join(rel));
        out.push(self.cwd.join(rel));
        out.push(self.cwd.join("images").join(rel));
        out
    }

    /// Roots for the recursive by-name search.
    fn search_roots(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if let Some(parent) = self.source_dir.parent() {
            out.push(parent.to_path_buf());
        }
        out.push(self.source_dir.clone());
        out.push(self.source_dir.join("images"));
        if let Some(root) = &self.tests_root {
            out.push(root.clone());
            out.push(root.join("images"));
        }
        out.push(self.project_root.join("images"));
        out.push(self.cwd.clone());
        out
    }
}

/// Remove image markup from `text`, returning the cleaned text and the
/// references in order of appearance.
pub fn extract_images(text: &str, roots: &ImageRoots) -> (String, Vec<ImageRef>) {
    let images = IMAGE_RE
        .captures_iter(text)
        .map(|caps| ImageRef {
            caption: caps[1].trim().to_string(),
            path: resolve_image(caps[2].trim(), roots),
        })
        .collect();

    let cleaned = IMAGE_RE.replace_all(text, "").trim().to_string();
    (cleaned, images)
}

/// Resolve a relative image path against `roots`.
pub fn resolve_image(raw: &str, roots: &ImageRoots) -> PathBuf {
    let normalized = raw.replace('\\', "/");
    let rel = Path::new(normalized.trim_start_matches('/'));

    let candidates = roots.candidates(rel);
    if let Some(hit) = candidates.iter().find(|c| c.exists()) {
        return hit.clone();
    }

    if let Some(name) = rel.file_name().and_then(|n| n.to_str()) {
        if let Some(found) = find_by_basename(name, &roots.search_roots()) {
            debug!(image = raw, found = %found.display(), "image located by file name");
            return found;
        }
    }

    debug!(image = raw, "image not found, keeping placeholder path");
    candidates
        .into_iter()
        .next()
        .unwrap_or_else(|| rel.to_path_buf())
}

/// Case-insensitive recursive search for a file name under `roots`.
pub fn find_by_basename(name: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    let target = name.to_lowercase();
    roots
        .iter()
        .filter(|root| root.is_dir())
        .find_map(|root| walk_for(root, &target))
}

fn walk_for(dir: &Path, target: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            subdirs.push(path);
        } else if entry.file_name().to_string_lossy().to_lowercase() == target {
            return Some(path);
        }
    }

    subdirs.sort();
    subdirs.iter().find_map(|d| walk_for(d, target))
}
