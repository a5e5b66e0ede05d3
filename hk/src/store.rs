//! Bundle store: the offline sentence collection on disk
//!
//! # Layout
//!
//! ```text
//! <bundle-dir>/
//! ├── sentences.jsonl   # one sentence record per line
//! └── index.json        # category counts + download provenance
//! ```
//!
//! Both files are replaced atomically (temp file + rename) so an interrupted
//! write never leaves a half-written bundle behind.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::Sentence;
use crate::error::BundleError;
use crate::index::{BundleIndex, INDEX_VERSION, Provenance};

/// Sentence data file name
pub const DATA_FILE: &str = "sentences.jsonl";

/// Index file name
pub const INDEX_FILE: &str = "index.json";

/// A line of the data file that was skipped during load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub reason: String,
}

/// Result of loading the data file
#[derive(Debug, Clone, Default)]
pub struct LoadedBundle {
    /// Valid records in file order
    pub records: Vec<Sentence>,
    /// Lines that could not be used
    pub skipped: Vec<SkippedLine>,
}

/// Outcome of an integrity check
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    /// Number of valid records in the data file
    pub total: usize,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// The offline bundle rooted at a directory
#[derive(Debug, Clone)]
pub struct BundleStore {
    dir: PathBuf,
}

impl BundleStore {
    /// Store rooted at `dir`; nothing is created until the first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(?dir, "BundleStore::new: called");
        Self { dir }
    }

    /// Store rooted at the configured bundle directory
    pub fn open(config: &Config) -> Self {
        Self::new(&config.bundle_dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Whether a bundle data file is present
    pub fn exists(&self) -> bool {
        self.data_path().is_file()
    }

    /// Read every record from the data file
    ///
    /// Bad lines are skipped and reported in [`LoadedBundle::skipped`].
    /// Fails with `StoreCorrupt` only when no line at all is usable.
    pub fn load(&self) -> Result<LoadedBundle, BundleError> {
        let path = self.data_path();
        debug!(?path, "BundleStore::load: called");

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("BundleStore::load: data file missing");
                return Err(BundleError::StoreMissing { path });
            }
            Err(e) => return Err(e.into()),
        };

        let mut loaded = LoadedBundle::default();
        let mut seen_ids = HashSet::new();

        for (idx, raw) in BufReader::new(file).split(b'\n').enumerate() {
            let raw = raw?;
            let line_no = idx + 1;

            let line = match String::from_utf8(raw) {
                Ok(s) => s,
                Err(_) => {
                    loaded.skipped.push(SkippedLine {
                        line: line_no,
                        reason: "invalid UTF-8".to_string(),
                    });
                    continue;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let result = serde_json::from_str::<Sentence>(line)
                .map_err(|e| e.to_string())
                .and_then(|s| s.validate().map(|_| s));

            match result {
                Ok(sentence) if !seen_ids.insert(sentence.id) => {
                    loaded.skipped.push(SkippedLine {
                        line: line_no,
                        reason: format!("duplicate id {}", sentence.id),
                    });
                }
                Ok(sentence) => loaded.records.push(sentence),
                Err(reason) => loaded.skipped.push(SkippedLine { line: line_no, reason }),
            }
        }

        for skipped in &loaded.skipped {
            warn!(line = skipped.line, reason = %skipped.reason, "Skipping unreadable bundle line");
        }

        if loaded.records.is_empty() && !loaded.skipped.is_empty() {
            return Err(BundleError::StoreCorrupt {
                path,
                reason: format!("none of {} lines could be parsed", loaded.skipped.len()),
            });
        }

        debug!(
            records = loaded.records.len(),
            skipped = loaded.skipped.len(),
            "BundleStore::load: done"
        );
        Ok(loaded)
    }

    /// Replace the data file with `records`, in order
    pub fn save(&self, records: &[Sentence]) -> Result<(), BundleError> {
        debug!(count = records.len(), "BundleStore::save: called");
        fs::create_dir_all(&self.dir)?;

        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }

        write_atomic(&self.data_path(), &buf)?;
        info!(count = records.len(), path = %self.data_path().display(), "Saved bundle");
        Ok(())
    }

    /// Recompute the index from the records on disk and persist it
    pub fn rebuild_index(&self, provenance: Provenance) -> Result<BundleIndex, BundleError> {
        debug!("BundleStore::rebuild_index: called");
        let loaded = self.load()?;
        let index = BundleIndex::compute(&loaded.records, provenance);

        let bytes = serde_json::to_vec_pretty(&index)?;
        write_atomic(&self.index_path(), &bytes)?;

        info!(total = index.total, "Rebuilt bundle index");
        Ok(index)
    }

    /// Read the index file, `None` if there is none yet
    pub fn load_index(&self) -> Result<Option<BundleIndex>, BundleError> {
        let path = self.index_path();
        debug!(?path, "BundleStore::load_index: called");

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| BundleError::StoreCorrupt {
                path,
                reason: format!("unreadable index: {}", e),
            })
    }

    /// Provenance recorded in the current index, or an empty one
    pub fn current_provenance(&self) -> Provenance {
        match self.load_index() {
            Ok(Some(index)) => index.provenance,
            Ok(None) => Provenance::default(),
            Err(e) => {
                warn!("Ignoring unreadable index: {}", e);
                Provenance::default()
            }
        }
    }

    /// Compare the index against the data file
    pub fn check_integrity(&self) -> Result<IntegrityReport, BundleError> {
        debug!("BundleStore::check_integrity: called");
        let loaded = self.load()?;
        let mut report = IntegrityReport {
            total: loaded.records.len(),
            issues: Vec::new(),
        };

        for skipped in &loaded.skipped {
            report
                .issues
                .push(format!("{} line {}: {}", DATA_FILE, skipped.line, skipped.reason));
        }

        match self.load_index() {
            Ok(Some(index)) => {
                if index.version != INDEX_VERSION {
                    report.issues.push(format!(
                        "index version {} (expected {}), run --update-index",
                        index.version, INDEX_VERSION
                    ));
                }
                let actual = BundleIndex::compute(&loaded.records, index.provenance.clone());
                report.issues.extend(index.count_mismatches(&actual));
            }
            Ok(None) => report.issues.push(format!("missing index file: {}", INDEX_FILE)),
            Err(e) => report.issues.push(e.to_string()),
        }

        Ok(report)
    }

    /// Remove the files this store writes, then the directory once it is empty
    ///
    /// Anything else in the directory is left alone, and so is the directory
    /// itself. Returns false when there was nothing to delete.
    pub fn delete(&self) -> Result<bool, BundleError> {
        if !self.dir.exists() {
            debug!("BundleStore::delete: nothing to delete");
            return Ok(false);
        }

        let mut removed = false;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if is_bundle_file(&entry.file_name().to_string_lossy()) {
                fs::remove_file(entry.path())?;
                removed = true;
            }
        }

        match fs::remove_dir(&self.dir) {
            Ok(()) => removed = true,
            Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => {
                warn!(dir = %self.dir.display(), "Kept bundle directory, it holds other files");
            }
            Err(e) => return Err(e.into()),
        }

        if removed {
            info!(dir = %self.dir.display(), "Deleted bundle");
        }
        Ok(removed)
    }
}

// Data and index files, plus temp files left by an interrupted write
fn is_bundle_file(name: &str) -> bool {
    [DATA_FILE, INDEX_FILE]
        .iter()
        .any(|f| name == *f || name.starts_with(&format!(".{}.tmp-", f)))
}

/// Write `bytes` to a sibling temp file, sync it, then rename over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), BundleError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("bundle");
    let tmp = parent.join(format!(".{}.tmp-{}", name, std::process::id()));

    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::fetcher::Mirror;
    use tempfile::TempDir;

    fn sample_records() -> Vec<Sentence> {
        let mut first = Sentence::new(1, "短句", Category::Anime);
        first.from = Some("幸运星".to_string());
        first.extra.insert("creator".to_string(), "tester".into());
        vec![
            first,
            Sentence::new(2, "这是一条更长的句子测试", Category::Literature),
            Sentence::new(3, "third", Category::Anime),
        ]
    }

    #[test]
    fn test_load_missing_store() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path().join("bundle"));
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(BundleError::StoreMissing { .. })));
    }

    #[test]
    fn test_save_load_round_trip_preserves_order() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path().join("bundle"));

        store.save(&sample_records()).unwrap();
        let first = store.load().unwrap();
        assert_eq!(first.records, sample_records());
        assert!(first.skipped.is_empty());

        store.save(&first.records).unwrap();
        let second = store.load().unwrap();
        assert_eq!(second.records, first.records);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path());
        store.save(&sample_records()).unwrap();
        store.rebuild_index(Provenance::default()).unwrap();

        let mut names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec![INDEX_FILE.to_string(), DATA_FILE.to_string()]);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path());
        let content = [
            r#"{"id":1,"hitokoto":"ok","type":"a"}"#,
            "not json",
            r#"{"id":2,"hitokoto":"bad category","type":"z"}"#,
            "",
            r#"{"id":3,"hitokoto":"   ","type":"b"}"#,
            r#"{"id":1,"hitokoto":"dup","type":"c"}"#,
            r#"{"id":4,"hitokoto":"also ok","type":"d"}"#,
        ]
        .join("\n");
        fs::write(store.data_path(), content).unwrap();

        let loaded = store.load().unwrap();
        let ids: Vec<u64> = loaded.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 4]);

        let lines: Vec<usize> = loaded.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 3, 5, 6]);
        assert!(loaded.skipped[3].reason.contains("duplicate id 1"));
    }

    #[test]
    fn test_all_lines_corrupt_is_store_corrupt() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path());
        fs::write(store.data_path(), "garbage\n{also garbage\n").unwrap();

        assert!(matches!(store.load(), Err(BundleError::StoreCorrupt { .. })));
    }

    #[test]
    fn test_empty_data_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path());
        fs::write(store.data_path(), "").unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.records.is_empty());
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_rebuild_index_counts_match_store() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path());
        store.save(&sample_records()).unwrap();

        let provenance = Provenance {
            mirror: Some(Mirror::Official),
            ..Default::default()
        };
        let index = store.rebuild_index(provenance.clone()).unwrap();
        assert_eq!(index.total, 3);
        assert_eq!(index.count(Category::Anime), 2);
        assert_eq!(index.count(Category::Literature), 1);

        let persisted = store.load_index().unwrap().unwrap();
        assert_eq!(persisted, index);
        assert_eq!(store.current_provenance(), provenance);
    }

    #[test]
    fn test_check_integrity() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path());
        store.save(&sample_records()).unwrap();

        let report = store.check_integrity().unwrap();
        assert!(!report.is_ok());
        assert!(report.issues[0].contains("missing index"));

        store.rebuild_index(Provenance::default()).unwrap();
        let report = store.check_integrity().unwrap();
        assert!(report.is_ok(), "{:?}", report.issues);
        assert_eq!(report.total, 3);

        // Data changes behind the index's back
        store.save(&sample_records()[..1]).unwrap();
        let report = store.check_integrity().unwrap();
        assert!(!report.is_ok());
        assert!(report.issues.iter().any(|i| i.starts_with("total")));
    }

    #[test]
    fn test_unreadable_index() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path());
        store.save(&sample_records()).unwrap();
        fs::write(store.index_path(), "{").unwrap();

        assert!(matches!(store.load_index(), Err(BundleError::StoreCorrupt { .. })));
        assert_eq!(store.current_provenance(), Provenance::default());
    }

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path().join("bundle"));
        assert!(!store.delete().unwrap());

        store.save(&sample_records()).unwrap();
        assert!(store.exists());
        assert!(store.delete().unwrap());
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_delete_keeps_foreign_files() {
        let temp = TempDir::new().unwrap();
        let store = BundleStore::new(temp.path());
        store.save(&sample_records()).unwrap();
        store.rebuild_index(Provenance::default()).unwrap();
        fs::write(temp.path().join(".sentences.jsonl.tmp-999"), "partial").unwrap();
        fs::write(temp.path().join("my_notes.txt"), "keep me").unwrap();

        assert!(store.delete().unwrap());
        assert!(!store.data_path().exists());
        assert!(!store.index_path().exists());
        assert!(!temp.path().join(".sentences.jsonl.tmp-999").exists());
        assert_eq!(fs::read_to_string(temp.path().join("my_notes.txt")).unwrap(), "keep me");

        // Only the foreign file is left, so there is nothing more to delete
        assert!(!store.delete().unwrap());
        assert!(temp.path().exists());
    }
}
