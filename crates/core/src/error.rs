use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Directory-level failures. These abort the run before anything is renamed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("フォルダが存在しません: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("ディレクトリではありません: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("フォルダへのアクセス権がありません: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("フォルダを読めませんでした: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub(crate) fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => ScanError::DirectoryNotFound(path),
            io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(path),
            _ => ScanError::Io { path, source },
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("連番が上限を超えました: 開始番号 {start} + {count}件")]
    SequenceOverflow { start: u64, count: usize },
    #[error("桁数が大きすぎます: {requested} (最大 {max})")]
    PadWidthTooLarge { requested: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Per-file outcome. Failures are recorded here instead of aborting the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenameStatus {
    Renamed,
    SkippedAlreadyCorrect,
    SkippedDryRun,
    FailedCollision,
    FailedPermission,
    FailedIo,
}

impl RenameStatus {
    pub fn label(self) -> &'static str {
        match self {
            RenameStatus::Renamed => "renamed",
            RenameStatus::SkippedAlreadyCorrect => "skipped-already-correct",
            RenameStatus::SkippedDryRun => "skipped-dry-run",
            RenameStatus::FailedCollision => "failed-collision",
            RenameStatus::FailedPermission => "failed-permission",
            RenameStatus::FailedIo => "failed-io",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            RenameStatus::FailedCollision | RenameStatus::FailedPermission | RenameStatus::FailedIo
        )
    }

    pub fn is_skip(self) -> bool {
        matches!(
            self,
            RenameStatus::SkippedAlreadyCorrect | RenameStatus::SkippedDryRun
        )
    }

    pub(crate) fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => RenameStatus::FailedPermission,
            io::ErrorKind::AlreadyExists => RenameStatus::FailedCollision,
            _ => RenameStatus::FailedIo,
        }
    }
}
