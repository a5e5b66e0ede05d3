//! Export a batch of sentences to a text file

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::Sentence;
use crate::error::BundleError;
use crate::output::{OutputFormat, format_sentence};

/// File name used when the export target is a directory
pub const DEFAULT_EXPORT_FILE: &str = "hitokoto.txt";

/// Default number of sentences to export
pub const DEFAULT_EXPORT_COUNT: usize = 10;

/// Work out which file an export to `target` should create
///
/// An existing file, or a path ending in `.txt`/`.json`, names the file
/// itself; anything else is a directory that receives `hitokoto.txt`. The
/// name is then made unique so nothing is overwritten.
pub fn resolve_export_path(target: &Path) -> PathBuf {
    let is_file = target.is_file()
        || target
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("json"));

    let (dir, file_name) = if is_file {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_EXPORT_FILE.to_string());
        (dir, name)
    } else {
        (target.to_path_buf(), DEFAULT_EXPORT_FILE.to_string())
    };

    unique_path(&dir, &file_name)
}

/// `dir/name`, or `dir/stem(n).ext` with the smallest free `n`
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(file_name);
    let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let ext = path.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = dir.join(format!("{}({}){}", stem, counter, ext));
        if !candidate.exists() {
            debug!(?candidate, "unique_path: found free name");
            return candidate;
        }
        counter += 1;
    }
}

/// Write `sentences` as text, separated by blank lines, to a fresh file under `target`
pub fn export_to_file(sentences: &[Sentence], target: &Path, include_source: bool) -> Result<PathBuf, BundleError> {
    let path = resolve_export_path(target);
    debug!(?path, count = sentences.len(), "export_to_file: called");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let blocks = sentences
        .iter()
        .map(|s| format_sentence(s, include_source, OutputFormat::Text))
        .collect::<Result<Vec<_>, _>>()?;
    fs::write(&path, blocks.join("\n\n"))?;

    info!(path = %path.display(), count = sentences.len(), "Exported sentences");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use tempfile::TempDir;

    #[test]
    fn test_unique_path() {
        let temp = TempDir::new().unwrap();
        assert_eq!(unique_path(temp.path(), "out.txt"), temp.path().join("out.txt"));

        fs::write(temp.path().join("out.txt"), "").unwrap();
        assert_eq!(unique_path(temp.path(), "out.txt"), temp.path().join("out(1).txt"));

        fs::write(temp.path().join("out(1).txt"), "").unwrap();
        assert_eq!(unique_path(temp.path(), "out.txt"), temp.path().join("out(2).txt"));
    }

    #[test]
    fn test_resolve_directory_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("exports");
        assert_eq!(resolve_export_path(&target), target.join(DEFAULT_EXPORT_FILE));
    }

    #[test]
    fn test_resolve_file_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("quotes.json");
        assert_eq!(resolve_export_path(&target), target);

        // An existing file without a known extension is still a file
        let plain = temp.path().join("quotes");
        fs::write(&plain, "old").unwrap();
        assert_eq!(resolve_export_path(&plain), temp.path().join("quotes(1)"));
    }

    #[test]
    fn test_export_writes_blocks_without_overwriting() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("nested").join("out.txt");
        let mut first = Sentence::new(1, "one", Category::Anime);
        first.from = Some("work".to_string());
        let sentences = vec![first, Sentence::new(2, "two", Category::Game)];

        let written = export_to_file(&sentences, &target, true).unwrap();
        assert_eq!(written, target);
        assert_eq!(fs::read_to_string(&written).unwrap(), "one —— 「work」\n\ntwo");

        let second = export_to_file(&sentences, &target, false).unwrap();
        assert_eq!(second, temp.path().join("nested").join("out(1).txt"));
        assert_eq!(fs::read_to_string(&second).unwrap(), "one\n\ntwo");
        assert_eq!(fs::read_to_string(&written).unwrap(), "one —— 「work」\n\ntwo");
    }
}
