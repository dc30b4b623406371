use crate::error::RenameStatus;
use crate::planner::{PlannedRename, RenamePlan};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const TEMP_PREFIX: &str = ".seqrename_tmp_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileOutcome {
    pub original_name: String,
    pub target_name: String,
    pub status: RenameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub directory: PathBuf,
    pub dry_run: bool,
    pub outcomes: Vec<FileOutcome>,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    fn tally(&mut self) {
        let mut summary = RunSummary::default();
        for outcome in &self.outcomes {
            if outcome.status.is_failure() {
                summary.failed += 1;
            } else if outcome.status.is_skip() {
                summary.skipped += 1;
            } else {
                summary.renamed += 1;
            }
        }
        self.summary = summary;
    }
}

#[derive(Debug, Clone)]
struct StagedRename {
    index: usize,
    original_path: PathBuf,
    target_path: PathBuf,
    temp_path: PathBuf,
}

/// Applies `plan` in ascending sequence order and reports one outcome per entry.
///
/// Every moving file is first parked under a hidden temporary name, then moved to
/// its target. A target that is still held by another moving entry is therefore
/// free by the time it is claimed. Nothing is ever overwritten: a target occupied
/// by anything outside the plan, or by an entry that cannot move itself, is
/// reported as `failed-collision` and the file stays (or is put back) under its
/// original name. Dry-run and real runs share the same collision decisions.
pub fn execute_plan(plan: &RenamePlan, directory: &Path, dry_run: bool) -> RunReport {
    let moving: HashSet<&str> = plan
        .renames
        .iter()
        .filter(|r| !r.already_correct)
        .map(|r| r.entry.original_name.as_str())
        .collect();

    let mut report = RunReport {
        directory: directory.to_path_buf(),
        dry_run,
        outcomes: plan
            .renames
            .iter()
            .map(|r| FileOutcome {
                original_name: r.entry.original_name.clone(),
                target_name: r.target_name.clone(),
                status: RenameStatus::SkippedAlreadyCorrect,
                detail: None,
            })
            .collect(),
        summary: RunSummary::default(),
    };

    let blocked = blocked_entries(plan, &moving);

    let mut staged = Vec::<StagedRename>::new();
    for (index, rename) in plan.renames.iter().enumerate() {
        if rename.already_correct {
            tracing::debug!(name = %rename.entry.original_name, "already correct");
            continue;
        }

        if blocked[index] {
            tracing::warn!(
                original = %rename.entry.original_name,
                target = %rename.target_name,
                "target is held by a file that will not move"
            );
            report.outcomes[index].status = RenameStatus::FailedCollision;
            report.outcomes[index].detail =
                Some(format!("リネーム先が既に存在します: {}", rename.target_name));
            continue;
        }

        if dry_run {
            report.outcomes[index].status = RenameStatus::SkippedDryRun;
            continue;
        }

        let entry = StagedRename {
            index,
            original_path: rename.entry.path(),
            target_path: rename.target_path(),
            temp_path: temp_path_for(&rename.entry.directory, index, &rename.entry.original_name),
        };
        if occupied(&entry.temp_path) {
            let outcome = &mut report.outcomes[index];
            outcome.status = RenameStatus::FailedIo;
            outcome.detail = Some(format!(
                "一時ファイル名が既に存在します: {}",
                entry.temp_path.display()
            ));
            continue;
        }
        match fs::rename(&entry.original_path, &entry.temp_path) {
            Ok(()) => staged.push(entry),
            Err(err) => record_io_failure(&mut report.outcomes[index], "一時リネームに失敗しました", &err),
        }
    }

    for entry in &staged {
        finalize(entry, &mut report.outcomes[entry.index]);
    }

    report.tally();
    tracing::info!(
        renamed = report.summary.renamed,
        skipped = report.summary.skipped,
        failed = report.summary.failed,
        dry_run,
        "run finished"
    );
    report
}

fn finalize(entry: &StagedRename, outcome: &mut FileOutcome) {
    if occupied(&entry.target_path) {
        outcome.status = RenameStatus::FailedCollision;
        outcome.detail = Some(format!(
            "リネーム先が既に存在します: {}",
            entry.target_path.display()
        ));
        restore_original(entry, outcome);
        return;
    }

    match fs::rename(&entry.temp_path, &entry.target_path) {
        Ok(()) => {
            tracing::debug!(
                from = %entry.original_path.display(),
                to = %entry.target_path.display(),
                "renamed"
            );
            outcome.status = RenameStatus::Renamed;
        }
        Err(err) => {
            record_io_failure(outcome, "最終リネームに失敗しました", &err);
            restore_original(entry, outcome);
        }
    }
}

fn restore_original(entry: &StagedRename, outcome: &mut FileOutcome) {
    if occupied(&entry.original_path) {
        let note = format!(
            "元の名前が使用中のため一時ファイルのまま残しました: {}",
            entry.temp_path.display()
        );
        tracing::warn!(temp = %entry.temp_path.display(), "original name is taken");
        append_detail(outcome, note);
        return;
    }
    if let Err(err) = fs::rename(&entry.temp_path, &entry.original_path) {
        tracing::warn!(
            temp = %entry.temp_path.display(),
            error = %err,
            "could not restore original name"
        );
        let note = format!(
            "元の名前に戻せませんでした ({}): {}",
            entry.temp_path.display(),
            err
        );
        append_detail(outcome, note);
    }
}

fn append_detail(outcome: &mut FileOutcome, note: String) {
    outcome.detail = Some(match outcome.detail.take() {
        Some(detail) => format!("{detail}; {note}"),
        None => note,
    });
}

fn record_io_failure(outcome: &mut FileOutcome, context: &str, err: &io::Error) {
    tracing::warn!(name = %outcome.original_name, error = %err, "{context}");
    outcome.status = RenameStatus::from_io(err);
    outcome.detail = Some(format!("{context}: {err}"));
}

/// Marks entries that cannot reach their target: first those blocked by a
/// foreign occupant, then, until nothing changes, those whose target is the
/// original name of an already blocked entry (that file stays put).
fn blocked_entries(plan: &RenamePlan, moving: &HashSet<&str>) -> Vec<bool> {
    let mut blocked: Vec<bool> = plan
        .renames
        .iter()
        .map(|r| !r.already_correct && is_foreign_collision(r, moving))
        .collect();

    loop {
        let held: HashSet<&str> = plan
            .renames
            .iter()
            .zip(&blocked)
            .filter(|(_, blocked)| **blocked)
            .map(|(r, _)| r.entry.original_name.as_str())
            .collect();

        let mut changed = false;
        for (rename, blocked) in plan.renames.iter().zip(blocked.iter_mut()) {
            if rename.already_correct || *blocked {
                continue;
            }
            if held.contains(rename.target_name.as_str()) {
                *blocked = true;
                changed = true;
            }
        }
        if !changed {
            return blocked;
        }
    }
}

/// A case-only difference from the entry's own name is the same file on
/// case-insensitive filesystems.
fn is_foreign_collision(rename: &PlannedRename, moving: &HashSet<&str>) -> bool {
    if rename
        .target_name
        .eq_ignore_ascii_case(&rename.entry.original_name)
    {
        return false;
    }
    if moving.contains(rename.target_name.as_str()) {
        return false;
    }
    occupied(&rename.target_path())
}

fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn temp_path_for(directory: &Path, index: usize, original_name: &str) -> PathBuf {
    directory.join(format!(
        "{TEMP_PREFIX}{}_{index}_{original_name}",
        std::process::id()
    ))
}
