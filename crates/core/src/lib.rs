mod apply;
mod config;
mod error;
mod planner;
mod scanner;

use std::path::Path;

pub use apply::{execute_plan, FileOutcome, RunReport, RunSummary};
pub use config::{
    default_config_path, load_config, normalize_extensions, AppConfig, RunConfig,
    COMMON_EXTENSIONS, DEFAULT_PAD_WIDTH, DEFAULT_START_NUMBER, FULL_EXTENSIONS,
};
pub use error::{PlanError, RenameStatus, RunError, ScanError};
pub use planner::{build_plan, format_target, PlannedRename, RenamePlan, MAX_PAD_WIDTH};
pub use scanner::{extension_of, scan_directory, FileEntry, ScanResult, ScanStats};

/// Result of a full scan, plan and execute pass.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: ScanStats,
    pub plan: RenamePlan,
    pub report: RunReport,
}

/// Scans `dir`, builds the plan and applies it. Only directory-level problems
/// are returned as errors; per-file failures live in the report.
pub fn run(dir: &Path, config: &RunConfig) -> Result<RunOutput, RunError> {
    tracing::info!(
        directory = %dir.display(),
        start_number = config.start_number,
        dry_run = config.dry_run,
        "scanning"
    );
    let scanned = scan_directory(dir, config)?;
    let plan = build_plan(scanned.entries, config)?;
    let report = execute_plan(&plan, dir, config.dry_run);
    Ok(RunOutput {
        stats: scanned.stats,
        plan,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn run_reports_missing_directory_before_mutation() {
        let temp = tempdir().expect("tempdir");
        let err = run(&temp.path().join("missing"), &RunConfig::default())
            .expect_err("missing dir should fail");
        assert!(matches!(err, RunError::Scan(ScanError::DirectoryNotFound(_))));
    }

    #[test]
    fn run_wires_scan_plan_and_execute() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("b.jpg"), b"b").expect("write");
        fs::write(temp.path().join("a.txt"), b"a").expect("write");

        let output = run(temp.path(), &RunConfig::default()).expect("run");
        assert_eq!(output.stats.eligible, 1);
        assert_eq!(output.plan.len(), 1);
        assert_eq!(output.report.summary.renamed, 1);
        assert!(temp.path().join("0001.jpg").exists());
        assert!(temp.path().join("a.txt").exists());
    }
}
