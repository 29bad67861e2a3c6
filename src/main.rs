//! noemoji - Find and remove emoji from the text files of a directory tree.
//!
//! Usage:
//!   noemoji <TARGET>                 Scan, preview, confirm, then clean
//!   noemoji <TARGET> --dry-run       Preview only, never modify files
//!   noemoji <TARGET> --ext md txt    Only process .md and .txt files
//!   noemoji <TARGET> -x json         Skip .json files
//!   noemoji --help                   Show help

mod progress;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use noemoji_core::{CommitReport, CommitStatus, ScanConfig, ScanReport};
use noemoji_detect::{EmojiClassifier, default_classifier};
use noemoji_ops::{CommitEvent, Committer, start_commit};
use noemoji_scan::{CancellationToken, Scanner};

use crate::progress::ProgressDisplay;

#[derive(Parser)]
#[command(
    name = "noemoji",
    version,
    about = "Find and remove emoji from text files",
    long_about = "noemoji scans a directory tree for emoji in text files, shows what it \
                  found and, after confirmation, rewrites the files without them.\n\n\
                  Binary and media files are skipped, as are paths matched by \
                  .gitignore or .noemojiignore.",
    after_help = "Examples:\n  \
                  noemoji ./docs              Scan the docs directory\n  \
                  noemoji ./src --dry-run     Preview without modifying files\n  \
                  noemoji . --ext .md .txt    Only process .md and .txt files\n  \
                  noemoji . -x .md .json      Skip .md and .json files"
)]
struct Cli {
    /// Directory to scan
    target: PathBuf,

    /// Preview only, do not modify any file
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Only process files with these extensions
    #[arg(short = 'e', long = "ext", num_args = 1.., value_name = "EXT")]
    ext: Vec<String>,

    /// Skip files with these extensions
    #[arg(short = 'x', long = "exclude", num_args = 1.., value_name = "EXT")]
    exclude: Vec<String>,

    /// Remove without asking for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Process files one at a time
    #[arg(long)]
    no_parallel: bool,

    /// Number of worker threads (defaults to available parallelism)
    #[arg(short = 'j', long, value_name = "N")]
    jobs: Option<usize>,

    /// Do not read .gitignore / .noemojiignore
    #[arg(long)]
    no_ignore: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Log each file as it is processed
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(&cli)?;
    run(&cli, config)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_config(cli: &Cli) -> Result<ScanConfig> {
    ScanConfig::builder()
        .root(cli.target.clone())
        .whitelist(cli.ext.clone())
        .blacklist(cli.exclude.clone())
        .respect_ignore(!cli.no_ignore)
        .parallel(!cli.no_parallel)
        .threads(cli.jobs.unwrap_or(0))
        .build()
        .map_err(|e| eyre!("{e}"))
}

/// Exit code after an interrupt, as shells report SIGINT.
const INTERRUPTED_EXIT: u8 = 130;

fn run(cli: &Cli, config: ScanConfig) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    let text = cli.format == OutputFormat::Text;
    let interactive = text && io::stderr().is_terminal();
    let classifier = default_classifier();
    debug!(
        root = %config.root.display(),
        classifier = classifier.name(),
        threads = config.effective_threads(),
        "starting"
    );

    if text {
        print_header(cli, &config, classifier.as_ref());
    }

    let scanner = Scanner::new(config.clone(), Arc::clone(&classifier));
    let scan_token = scanner.cancellation_token();
    runtime.spawn(watch_interrupt(scan_token.clone()));

    let report = run_scan(&scanner, interactive);
    // scan phase over: another Ctrl-C exits right away
    scan_token.cancel();
    let report = report?;

    if text {
        print_report(&report);
    }

    if report.interrupted {
        if !text {
            print_json(&report, None)?;
        }
        return Ok(ExitCode::from(INTERRUPTED_EXIT));
    }

    if cli.dry_run || !report.has_matches() {
        if !text {
            print_json(&report, None)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    // JSON output never prompts; without --yes it is a preview.
    let confirmed = if cli.yes {
        true
    } else if text {
        confirm("Remove the emoji listed above? (yes/no): ")?
    } else {
        false
    };

    if !confirmed {
        if text {
            println!("Cancelled");
        } else {
            print_json(&report, None)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    if text {
        println!();
        println!("Removing emoji...");
    }
    let outcome = run_commit(&runtime, &config, classifier, report.clone(), interactive);

    if text {
        print_commit(&report.root, &outcome);
    } else {
        print_json(&report, Some(&outcome))?;
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Cancel the scan on the first Ctrl-C; exit on the next one or on any
/// Ctrl-C once the scan is done.
async fn watch_interrupt(scan_token: CancellationToken) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if scan_token.is_cancelled() {
            std::process::exit(i32::from(INTERRUPTED_EXIT));
        }
        eprintln!("Interrupted, finishing files in progress...");
        scan_token.cancel();
    }
}

fn run_scan(scanner: &Scanner, show_progress: bool) -> Result<ScanReport> {
    let display = ProgressDisplay::scan(show_progress);

    let report = scanner.scan_with(|progress| {
        let name = progress
            .current_path
            .file_name()
            .map(|n| truncate(&n.to_string_lossy(), 30))
            .unwrap_or_default();
        display.update(progress.completed, progress.total, name);
    });
    display.finish();

    report.context("Scan failed")
}

fn run_commit(
    runtime: &tokio::runtime::Runtime,
    config: &ScanConfig,
    classifier: Arc<dyn EmojiClassifier>,
    report: ScanReport,
    show_progress: bool,
) -> CommitReport {
    let committer = Committer::new(config, classifier);
    let display = ProgressDisplay::commit(show_progress);

    let outcome = runtime.block_on(async {
        let mut rx = start_commit(committer, report);
        let mut outcome = CommitReport::new();
        while let Some(event) = rx.recv().await {
            match event {
                CommitEvent::Progress(p) => {
                    display.update(p.files_completed, p.files_total, String::new());
                }
                CommitEvent::Complete(complete) => outcome = complete,
            }
        }
        outcome
    });
    display.finish();

    outcome
}

/// Ask a yes/no question on stdin. End of input counts as no.
fn confirm(question: &str) -> Result<bool> {
    println!();
    print!("{question}");
    io::stdout().flush()?;

    let mut answer = String::new();
    let read = io::stdin().lock().read_line(&mut answer)?;
    if read == 0 {
        println!();
        return Ok(false);
    }

    let answer = answer.trim().to_lowercase();
    Ok(answer == "yes" || answer == "y")
}

fn print_header(cli: &Cli, config: &ScanConfig, classifier: &dyn EmojiClassifier) {
    println!("Target: {}", config.root.display());
    if cli.dry_run {
        println!("Mode: preview (files are not modified)");
    }
    if !config.whitelist.is_empty() {
        println!("Include: {}", format_extensions(&config.whitelist));
    }
    if !config.blacklist.is_empty() {
        println!("Exclude: {}", format_extensions(&config.blacklist));
    }
    match classifier.name() {
        "pattern" => println!(
            "Classifier: pattern (build with --features emoji-db for the emoji database)"
        ),
        name => println!("Classifier: {name}"),
    }
}

fn print_report(report: &ScanReport) {
    println!();

    if !report.has_matches() {
        println!(
            "No emoji found in {} files ({})",
            report.files_scanned,
            format_size(report.bytes_scanned)
        );
    } else {
        println!("{}", "=".repeat(60));
        println!(" Preview");
        println!("{}", "=".repeat(60));

        for file in &report.files {
            println!("  {}", display_path(&report.root, &file.path));
            println!("    count: {}  emoji: {}", file.count, file.sample);
        }

        println!("{}", "=".repeat(60));
        println!(
            " {} files with emoji, {} emoji found",
            report.files.len(),
            report.total_emoji
        );
        println!(
            " Scanned {} files ({}) in {:.2}s",
            report.files_scanned,
            format_size(report.bytes_scanned),
            report.duration.as_secs_f64()
        );
    }

    if !report.skipped_extensions.is_empty() {
        let extensions: Vec<String> = report
            .skipped_extensions
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect();
        println!(" Skipped file types: {}", extensions.join(", "));
    }

    if !report.skipped.is_empty() {
        let counts: Vec<String> = report
            .skipped
            .iter()
            .map(|(reason, count)| format!("{count} {reason}"))
            .collect();
        println!(" Skipped: {}", counts.join(", "));
    }

    if !report.errors.is_empty() {
        println!();
        println!("{} file(s) could not be processed:", report.errors.len());
        for err in &report.errors {
            println!("  {err}");
        }
    }

    if report.interrupted {
        println!();
        println!("Scan was interrupted; results are partial.");
    }
}

fn print_commit(root: &Path, outcome: &CommitReport) {
    for item in &outcome.outcomes {
        match &item.status {
            CommitStatus::AlreadyClean => {
                println!("  {} (already clean)", display_path(root, &item.path));
            }
            CommitStatus::Failed(err) => eprintln!("  Failed: {err}"),
            CommitStatus::Cleaned { .. } => {}
        }
    }

    println!();
    println!("Done! {}", outcome.summary());
}

fn print_json(report: &ScanReport, commit: Option<&CommitReport>) -> Result<()> {
    let output = serde_json::json!({
        "scan": report,
        "commit": commit,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn format_extensions(extensions: &[String]) -> String {
    extensions
        .iter()
        .map(|ext| format!(".{}", noemoji_core::normalize_extension(ext)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Path relative to the scan root, for display.
fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_extension_lists() {
        let cli = Cli::try_parse_from(["noemoji", "docs", "--ext", ".md", "txt", "-n"]).unwrap();
        assert_eq!(cli.ext, vec![".md", "txt"]);
        assert!(cli.dry_run);
        assert_eq!(cli.format, OutputFormat::Text);

        let config = build_config(&cli).unwrap();
        assert_eq!(config.root, PathBuf::from("docs"));
        assert!(config.respect_ignore);
    }

    #[test]
    fn test_conflicting_filters_rejected() {
        let cli = Cli::try_parse_from(["noemoji", ".", "-e", "md", "-x", "txt"]).unwrap();
        let err = build_config(&cli).unwrap_err();
        assert!(err.to_string().contains("cannot be used together"));
    }

    #[test]
    fn test_jobs_and_parallel_flags() {
        let cli = Cli::try_parse_from(["noemoji", ".", "-j", "3", "--no-ignore"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.threads, 3);
        assert!(!config.respect_ignore);

        let cli = Cli::try_parse_from(["noemoji", ".", "--no-parallel"]).unwrap();
        assert!(!build_config(&cli).unwrap().parallel);
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_extensions(&["MD".into(), ".txt".into()]), ".md, .txt");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a_very_long_file_name.txt", 10), "a_very_...");
        assert_eq!(
            display_path(Path::new("/root"), Path::new("/root/docs/a.md")),
            "docs/a.md"
        );
    }
}
