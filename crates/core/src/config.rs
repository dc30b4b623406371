use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_START_NUMBER: u64 = 1;
pub const DEFAULT_PAD_WIDTH: usize = 4;

pub const FULL_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "svg", "ico", "raw", "cr2", "nef",
    "arw",
];

pub const COMMON_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// Immutable settings for one invocation. Passed explicitly into every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub start_number: u64,
    pub pad_width: usize,
    pub dry_run: bool,
    pub allowed_extensions: BTreeSet<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_number: DEFAULT_START_NUMBER,
            pad_width: DEFAULT_PAD_WIDTH,
            dry_run: false,
            allowed_extensions: normalize_extensions(FULL_EXTENSIONS.iter().copied()),
        }
    }
}

impl RunConfig {
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = normalize_extensions(extensions);
        self
    }

    /// `ext` must already be lowercased.
    pub fn allows(&self, ext: &str) -> bool {
        self.allowed_extensions.contains(ext)
    }
}

/// Strips a leading dot and lowercases; empty entries are dropped.
pub fn normalize_extensions<I, S>(extensions: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Defaults read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub start_number: u64,
    pub pad_width: usize,
    pub extensions: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_number: DEFAULT_START_NUMBER,
            pad_width: DEFAULT_PAD_WIDTH,
            extensions: FULL_EXTENSIONS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl AppConfig {
    pub fn to_run_config(&self, dry_run: bool) -> RunConfig {
        RunConfig {
            start_number: self.start_number,
            pad_width: self.pad_width,
            dry_run,
            allowed_extensions: normalize_extensions(&self.extensions),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("com", "seqrename", "seqrename")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// With an explicit path the file must exist; the default location may be absent.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                return Ok(AppConfig::default());
            }
            path
        }
    };
    load_config_from(&path)
}

fn load_config_from(path: &Path) -> Result<AppConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("設定ファイルを読めませんでした: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("設定ファイルのパースに失敗しました: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn normalize_strips_dots_and_case() {
        let set = normalize_extensions([".JPG", "Png", "", " .webp "]);
        let expected: BTreeSet<String> = ["jpg", "png", "webp"]
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn default_run_config_matches_full_preset() {
        let config = RunConfig::default();
        assert_eq!(config.start_number, 1);
        assert_eq!(config.pad_width, 4);
        assert!(!config.dry_run);
        assert_eq!(config.allowed_extensions.len(), FULL_EXTENSIONS.len());
        assert!(config.allows("cr2"));
        assert!(!config.allows("txt"));
    }

    #[test]
    fn partial_config_file_falls_back_to_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "start_number = 100\n").expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.start_number, 100);
        assert_eq!(config.pad_width, DEFAULT_PAD_WIDTH);

        let run = config.to_run_config(true);
        assert!(run.dry_run);
        assert!(run.allows("jpeg"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let err = load_config(Some(&temp.path().join("missing.toml")))
            .expect_err("missing explicit config should fail");
        assert!(err.to_string().contains("設定ファイルを読めませんでした"));
    }

    #[test]
    fn malformed_config_reports_parse_failure() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "pad_width = \"wide\"\n").expect("write config");

        let err = load_config(Some(&path)).expect_err("bad config should fail");
        assert!(err.to_string().contains("設定ファイルのパースに失敗しました"));
    }
}
