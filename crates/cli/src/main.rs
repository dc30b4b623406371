use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use seqrename_core::{
    load_config, run, RunConfig, RunOutput, COMMON_EXTENSIONS, FULL_EXTENSIONS,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "seqrename-cli", version)]
#[command(about = "フォルダ内の画像ファイルを 0001.jpg 形式の連番に一括リネームします")]
struct Cli {
    /// 対象フォルダ
    directory: PathBuf,
    /// 実ファイルを変更せずに結果だけ表示します
    #[arg(short = 'n', long, default_value_t = false)]
    dry_run: bool,
    #[arg(long)]
    start_number: Option<u64>,
    #[arg(long)]
    pad_width: Option<usize>,
    /// 対象拡張子 (複数指定可)。指定するとプリセットと設定ファイルより優先されます
    #[arg(long = "ext")]
    extensions: Vec<String>,
    #[arg(long, value_enum)]
    preset: Option<Preset>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Full,
    Common,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli)?;
    if matches!(cli.output, OutputFormat::Table) {
        print_header(&cli, &config);
    }

    let output = run(&cli.directory, &config)?;

    match cli.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output.report)?),
        OutputFormat::Table => print_table(&output),
    }

    if output.report.has_failures() {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// CLI flags win over the preset, which wins over the config file.
fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let file = load_config(cli.config.as_deref())?;
    let mut config = file.to_run_config(cli.dry_run);

    if let Some(start) = cli.start_number {
        config.start_number = start;
    }
    if let Some(width) = cli.pad_width {
        config.pad_width = width;
    }
    config = match cli.preset {
        Some(Preset::Full) => config.with_extensions(FULL_EXTENSIONS),
        Some(Preset::Common) => config.with_extensions(COMMON_EXTENSIONS),
        None => config,
    };
    if !cli.extensions.is_empty() {
        config = config.with_extensions(&cli.extensions);
    }
    if config.allowed_extensions.is_empty() {
        anyhow::bail!("対象拡張子が空です。--ext または設定ファイルで指定してください。");
    }

    Ok(config)
}

fn print_header(cli: &Cli, config: &RunConfig) {
    let formats: Vec<&str> = config.allowed_extensions.iter().map(String::as_str).collect();
    println!("フォルダ: {}", cli.directory.display());
    println!("開始番号: {}", config.start_number);
    println!("対象拡張子: {}", formats.join(", "));
    println!("{}", "-".repeat(50));
}

fn print_table(output: &RunOutput) {
    let report = &output.report;
    if output.plan.is_empty() {
        println!("画像ファイルが見つかりません: {}", report.directory.display());
        return;
    }

    println!(
        "{}件の画像ファイルを検出しました ({}件は対象外)",
        output.stats.eligible, output.stats.skipped_unsupported
    );
    if report.dry_run {
        println!("dry-runモード: 実ファイルは変更しません");
    }

    for outcome in &report.outcomes {
        match &outcome.detail {
            Some(detail) => println!(
                "  [{}] {} -> {} ({})",
                outcome.status.label(),
                outcome.original_name,
                outcome.target_name,
                detail
            ),
            None => println!(
                "  [{}] {} -> {}",
                outcome.status.label(),
                outcome.original_name,
                outcome.target_name
            ),
        }
    }

    println!(
        "\n集計: renamed={} skipped={} failed={} (リネーム予定 {}件)",
        report.summary.renamed,
        report.summary.skipped,
        report.summary.failed,
        output.plan.pending()
    );
}
