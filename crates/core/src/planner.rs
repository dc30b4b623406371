use crate::config::RunConfig;
use crate::error::PlanError;
use crate::scanner::FileEntry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longer stems cannot form a file name on common filesystems.
pub const MAX_PAD_WIDTH: usize = 240;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannedRename {
    pub entry: FileEntry,
    pub sequence: u64,
    pub target_name: String,
    pub already_correct: bool,
}

impl PlannedRename {
    pub fn target_path(&self) -> PathBuf {
        self.entry.directory.join(&self.target_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RenamePlan {
    pub start_number: u64,
    pub pad_width: usize,
    pub renames: Vec<PlannedRename>,
}

impl RenamePlan {
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    /// Entries that still need to move.
    pub fn pending(&self) -> usize {
        self.renames.iter().filter(|r| !r.already_correct).count()
    }
}

/// Sorts byte-wise by original name and numbers positionally from `start_number`.
/// Already-correct entries keep their slot, so later files are never shifted down.
pub fn build_plan(mut entries: Vec<FileEntry>, config: &RunConfig) -> Result<RenamePlan, PlanError> {
    if config.pad_width > MAX_PAD_WIDTH {
        return Err(PlanError::PadWidthTooLarge {
            requested: config.pad_width,
            max: MAX_PAD_WIDTH,
        });
    }

    entries.sort_by(|a, b| a.original_name.as_bytes().cmp(b.original_name.as_bytes()));

    let count = entries.len();
    let mut renames = Vec::with_capacity(count);
    for (index, entry) in entries.into_iter().enumerate() {
        let sequence = u64::try_from(index)
            .ok()
            .and_then(|i| config.start_number.checked_add(i))
            .ok_or(PlanError::SequenceOverflow {
                start: config.start_number,
                count,
            })?;
        let target_name = format_target(sequence, config.pad_width, &entry.extension);
        let already_correct = entry.original_name == target_name;
        tracing::debug!(
            original = %entry.original_name,
            target = %target_name,
            already_correct,
            "planned"
        );
        renames.push(PlannedRename {
            entry,
            sequence,
            target_name,
            already_correct,
        });
    }

    Ok(RenamePlan {
        start_number: config.start_number,
        pad_width: config.pad_width,
        renames,
    })
}

/// Numbers wider than `pad_width` are written in full.
pub fn format_target(sequence: u64, pad_width: usize, extension: &str) -> String {
    let digits = sequence.to_string();
    let zeros = "0".repeat(pad_width.saturating_sub(digits.len()));
    format!("{zeros}{digits}.{extension}")
}
