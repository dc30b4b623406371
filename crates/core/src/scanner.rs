use crate::config::RunConfig;
use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub original_name: String,
    /// Lowercased, without the leading dot.
    pub extension: String,
    pub directory: PathBuf,
}

impl FileEntry {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.original_name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub scanned_files: usize,
    pub eligible: usize,
    pub skipped_unsupported: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub entries: Vec<FileEntry>,
    pub stats: ScanStats,
}

/// Lists regular files directly under `dir` whose extension is allowed.
/// Entries come back in directory order; sorting is the sequencer's job.
pub fn scan_directory(dir: &Path, config: &RunConfig) -> Result<ScanResult, ScanError> {
    let meta = fs::metadata(dir).map_err(|err| ScanError::from_io(dir.to_path_buf(), err))?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let mut result = ScanResult::default();
    let read = fs::read_dir(dir).map_err(|err| ScanError::from_io(dir.to_path_buf(), err))?;
    for entry in read {
        let entry = entry.map_err(|err| ScanError::from_io(dir.to_path_buf(), err))?;
        let path = entry.path();

        if !is_regular_file(&entry, &path) {
            continue;
        }
        result.stats.scanned_files += 1;

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(path = %path.display(), "skipping file name that is not valid UTF-8");
            result.stats.skipped_unsupported += 1;
            continue;
        };

        match extension_of(&name) {
            Some(extension) if config.allows(&extension) => {
                result.stats.eligible += 1;
                result.entries.push(FileEntry {
                    original_name: name,
                    extension,
                    directory: dir.to_path_buf(),
                });
            }
            _ => {
                tracing::debug!(name = %name, "extension not in allow-list");
                result.stats.skipped_unsupported += 1;
            }
        }
    }

    Ok(result)
}

/// Lowercased text after the last dot. A lone leading dot is not an extension.
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}

fn is_regular_file(entry: &fs::DirEntry, path: &Path) -> bool {
    match entry.file_type() {
        Ok(kind) if kind.is_file() => true,
        Ok(kind) if kind.is_symlink() => fs::metadata(path).map(|m| m.is_file()).unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(result: &ScanResult) -> Vec<String> {
        let mut out: Vec<String> = result
            .entries
            .iter()
            .map(|e| e.original_name.clone())
            .collect();
        out.sort();
        out
    }

    #[test]
    fn extension_of_handles_edge_names() {
        assert_eq!(extension_of("IMG_0001.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension_of("archive.tar.PNG").as_deref(), Some("png"));
        assert_eq!(extension_of(".jpg"), None);
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn scan_filters_by_extension_case_insensitively() {
        let temp = tempdir().expect("tempdir");
        for name in ["a.JPG", "b.png", "notes.txt", "README", ".hidden"] {
            fs::write(temp.path().join(name), b"x").expect("write file");
        }

        let result = scan_directory(temp.path(), &RunConfig::default()).expect("scan");
        assert_eq!(names(&result), vec!["a.JPG", "b.png"]);
        assert_eq!(result.stats.scanned_files, 5);
        assert_eq!(result.stats.eligible, 2);
        assert_eq!(result.stats.skipped_unsupported, 3);

        let jpg = result
            .entries
            .iter()
            .find(|e| e.original_name == "a.JPG")
            .expect("a.JPG scanned");
        assert_eq!(jpg.extension, "jpg");
        assert_eq!(jpg.path(), temp.path().join("a.JPG"));
    }

    #[test]
    fn scan_does_not_descend_into_subdirectories() {
        let temp = tempdir().expect("tempdir");
        let nested = temp.path().join("nested.jpg");
        fs::create_dir_all(&nested).expect("create nested dir");
        fs::write(nested.join("inner.jpg"), b"x").expect("write inner");
        fs::write(temp.path().join("top.jpg"), b"x").expect("write top");

        let result = scan_directory(temp.path(), &RunConfig::default()).expect("scan");
        assert_eq!(names(&result), vec!["top.jpg"]);
    }

    #[test]
    fn scan_respects_custom_allow_list() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.jpg"), b"x").expect("write jpg");
        fs::write(temp.path().join("b.cr2"), b"x").expect("write cr2");

        let config = RunConfig::default().with_extensions(["CR2"]);
        let result = scan_directory(temp.path(), &config).expect("scan");
        assert_eq!(names(&result), vec!["b.cr2"]);
    }

    #[test]
    fn scan_missing_directory_fails() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("missing");
        let err = scan_directory(&missing, &RunConfig::default()).expect_err("should fail");
        assert!(matches!(err, ScanError::DirectoryNotFound(p) if p == missing));
    }

    #[test]
    fn scan_file_path_is_not_a_directory() {
        let temp = tempdir().expect("tempdir");
        let file = temp.path().join("a.jpg");
        fs::write(&file, b"x").expect("write file");
        let err = scan_directory(&file, &RunConfig::default()).expect_err("should fail");
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn scan_follows_symlinks_to_files_only() {
        let temp = tempdir().expect("tempdir");
        let target = temp.path().join("real.jpg");
        fs::write(&target, b"x").expect("write target");
        std::os::unix::fs::symlink(&target, temp.path().join("link.jpg")).expect("symlink");
        std::os::unix::fs::symlink(temp.path().join("gone.jpg"), temp.path().join("dangling.jpg"))
            .expect("dangling symlink");

        let result = scan_directory(temp.path(), &RunConfig::default()).expect("scan");
        assert_eq!(names(&result), vec!["link.jpg", "real.jpg"]);
    }
}
