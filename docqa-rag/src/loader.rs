//! Loading source documents from a directory.

use std::fs;
use std::path::Path;

use glob::{MatchOptions, Pattern};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::{Document, SOURCE_KEY};
use crate::error::{RagError, Result};

/// Default glob used to select document files.
pub const DEFAULT_PATTERN: &str = "**/*.txt";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Load every file under `root` whose relative path matches `pattern`.
///
/// Documents are returned sorted by relative path. The document ID is derived
/// from the relative path, so it is stable across runs.
///
/// # Errors
///
/// Returns [`RagError::LoaderError`] if `root` is missing or not a directory,
/// if the pattern is invalid, if no file matches, or if a matching file cannot
/// be read as UTF-8 text.
pub fn load_documents(root: impl AsRef<Path>, pattern: &str) -> Result<Vec<Document>> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(RagError::LoaderError(format!(
            "documents directory does not exist: {}",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(RagError::LoaderError(format!(
            "documents path is not a directory: {}",
            root.display()
        )));
    }

    let matcher = PathMatcher::new(pattern)?;

    let mut relative_paths = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .filter(|relative| matcher.matches(relative))
        .collect::<Vec<_>>();
    relative_paths.sort();

    if relative_paths.is_empty() {
        return Err(RagError::LoaderError(format!(
            "no files matching '{pattern}' in {}",
            root.display()
        )));
    }

    let documents = relative_paths
        .iter()
        .map(|relative| load_document(root, relative))
        .collect::<Result<Vec<_>>>()?;

    info!(root = %root.display(), pattern, document_count = documents.len(), "loaded documents");
    Ok(documents)
}

fn load_document(root: &Path, relative: &Path) -> Result<Document> {
    let path = root.join(relative);
    let text = fs::read_to_string(&path).map_err(|e| {
        RagError::LoaderError(format!("failed to read {}: {e}", path.display()))
    })?;

    // Forward slashes keep IDs identical across platforms.
    let source = relative.to_string_lossy().replace('\\', "/");
    debug!(source = %source, bytes = text.len(), "read document");

    let mut document = Document::new(document_id(&source), text);
    document.metadata.insert(SOURCE_KEY.to_string(), source);
    document.source_uri = path.canonicalize().ok().map(|p| p.display().to_string());
    Ok(document)
}

/// Stable document ID: the first 16 hex digits of the SHA-256 of the relative path.
pub fn document_id(relative_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    format!("{:x}", hasher.finalize()).chars().take(16).collect()
}

/// Glob matcher where a leading `**/` also matches files at the root.
struct PathMatcher {
    full: Pattern,
    root_level: Option<Pattern>,
}

impl PathMatcher {
    fn new(pattern: &str) -> Result<Self> {
        let compile = |p: &str| {
            Pattern::new(p)
                .map_err(|e| RagError::LoaderError(format!("invalid file pattern '{p}': {e}")))
        };
        let full = compile(pattern)?;
        let root_level = pattern.strip_prefix("**/").map(compile).transpose()?;
        Ok(Self { full, root_level })
    }

    fn matches(&self, relative: &Path) -> bool {
        self.full.matches_path_with(relative, MATCH_OPTIONS)
            || self
                .root_level
                .as_ref()
                .is_some_and(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_matching_files_recursively_in_path_order() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("b.txt"), "bravo").unwrap();
        fs::write(root.join("a.txt"), "alpha").unwrap();
        fs::write(root.join("nested/deeper/c.txt"), "charlie").unwrap();
        fs::write(root.join("notes.md"), "ignored").unwrap();

        let docs = load_documents(root, DEFAULT_PATTERN).unwrap();
        let sources: Vec<_> = docs.iter().map(|d| d.source().unwrap()).collect();
        assert_eq!(sources, ["a.txt", "b.txt", "nested/deeper/c.txt"]);
        assert_eq!(docs[0].text, "alpha");
        assert!(docs.iter().all(|d| d.source_uri.is_some()));
    }

    #[test]
    fn ids_are_stable_and_unique() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("one.txt"), "1").unwrap();
        fs::write(temp.path().join("two.txt"), "2").unwrap();

        let first = load_documents(temp.path(), DEFAULT_PATTERN).unwrap();
        let second = load_documents(temp.path(), DEFAULT_PATTERN).unwrap();
        assert_eq!(first[0].id, second[0].id);
        assert_ne!(first[0].id, first[1].id);
        assert_eq!(first[0].id, document_id("one.txt"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = load_documents(temp.path().join("absent"), DEFAULT_PATTERN).unwrap_err();
        assert!(matches!(err, RagError::LoaderError(_)));
    }

    #[test]
    fn no_matching_files_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("readme.md"), "# hi").unwrap();
        let err = load_documents(temp.path(), DEFAULT_PATTERN).unwrap_err();
        assert!(err.to_string().contains("no files matching"));
    }

    #[test]
    fn non_recursive_pattern_only_matches_top_level() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("top.txt"), "top").unwrap();
        fs::write(temp.path().join("sub/inner.txt"), "inner").unwrap();

        let docs = load_documents(temp.path(), "*.txt").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source(), Some("top.txt"));
    }
}
