use std::fs;
use std::path::Path;
use std::sync::Arc;

use noemoji_detect::PatternClassifier;
use noemoji_scan::{ScanConfig, ScanReport, Scanner, SkipReason};
use tempfile::TempDir;

fn create_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("src/nested")).unwrap();
    fs::create_dir_all(root.join("target")).unwrap();
    fs::write(root.join("README.md"), "# Project \u{1F680}\n\nDone \u{2705}\n").unwrap();
    fs::write(root.join("notes.txt"), "flag \u{1F1EF}\u{1F1F5} here\n").unwrap();
    fs::write(root.join("data.json"), "{\"mood\": \"\u{1F600}\"}").unwrap();
    fs::write(root.join("src/main.rs"), "// \u{1F41B} fix\nfn main() {}\n").unwrap();
    fs::write(root.join("src/nested/clean.rs"), "fn clean() {}\n").unwrap();
    fs::write(root.join("target/out.txt"), "\u{1F389}").unwrap();
    fs::write(root.join("image.jpg"), "\u{1F600}").unwrap();
    fs::write(root.join(".gitignore"), "target/\n").unwrap();

    dir
}

fn scan(config: ScanConfig) -> ScanReport {
    Scanner::new(config, Arc::new(PatternClassifier::new()))
        .scan()
        .unwrap()
}

fn file_names(report: &ScanReport) -> Vec<String> {
    report
        .files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_gitignore_is_respected() {
    let dir = create_project();
    let report = scan(ScanConfig::new(dir.path()));

    assert_eq!(report.skipped_for(SkipReason::Ignored), 1);
    assert!(!file_names(&report).contains(&"out.txt".to_string()));
    assert_eq!(report.skipped_for(SkipReason::DefaultSkipped), 1);
}

#[test]
fn test_no_ignore_scans_everything() {
    let dir = create_project();
    let mut config = ScanConfig::new(dir.path());
    config.respect_ignore = false;

    let report = scan(config);
    assert_eq!(report.skipped_for(SkipReason::Ignored), 0);
    assert!(file_names(&report).contains(&"out.txt".to_string()));
}

#[test]
fn test_whitelist() {
    let dir = create_project();
    let config = ScanConfig::builder()
        .root(dir.path())
        .whitelist(vec!["md".to_string(), ".RS".to_string()])
        .build()
        .unwrap();

    let report = scan(config);
    assert_eq!(file_names(&report), vec!["README.md", "main.rs"]);
    assert_eq!(report.total_emoji, 3);
    assert!(report.skipped_for(SkipReason::NotWhitelisted) >= 3);
    assert!(report.skipped_extensions.contains("json"));
    assert!(report.skipped_extensions.contains("txt"));
}

#[test]
fn test_blacklist() {
    let dir = create_project();
    let config = ScanConfig::builder()
        .root(dir.path())
        .blacklist(vec!["json".to_string()])
        .build()
        .unwrap();

    let report = scan(config);
    assert_eq!(report.skipped_for(SkipReason::Blacklisted), 1);
    assert!(!file_names(&report).contains(&"data.json".to_string()));
    assert!(file_names(&report).contains(&"notes.txt".to_string()));
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = create_project();
    for i in 0..40 {
        fs::write(
            dir.path().join(format!("src/gen_{i:02}.rs")),
            format!("// item {i} \u{2728}\n"),
        )
        .unwrap();
    }

    let mut sequential = ScanConfig::new(dir.path());
    sequential.parallel = false;
    let mut parallel = ScanConfig::new(dir.path());
    parallel.threads = 4;

    let a = scan(sequential);
    let b = scan(parallel);

    assert_eq!(a.files_scanned, b.files_scanned);
    assert_eq!(a.total_emoji, b.total_emoji);
    assert_eq!(a.skipped, b.skipped);
    let spans_a: Vec<_> = a.files.iter().map(|f| (&f.path, &f.spans)).collect();
    let spans_b: Vec<_> = b.files.iter().map(|f| (&f.path, &f.spans)).collect();
    assert_eq!(spans_a, spans_b);
}

#[test]
fn test_hidden_files_excluded_on_request() {
    let dir = create_project();
    fs::write(dir.path().join(".env.example"), "KEY=\u{1F511}\n").unwrap();

    let mut config = ScanConfig::new(dir.path());
    config.include_hidden = false;
    assert!(!file_names(&scan(config)).contains(&".env.example".to_string()));

    let report = scan(ScanConfig::new(dir.path()));
    assert!(file_names(&report).contains(&".env.example".to_string()));
}

#[test]
fn test_streaming_threshold_from_config() {
    let dir = create_project();
    let mut config = ScanConfig::new(dir.path());
    config.streaming_threshold = 8;
    config.chunk_size = 5;

    let report = scan(config);
    let readme = report
        .files
        .iter()
        .find(|f| f.path.ends_with(Path::new("README.md")))
        .unwrap();
    assert!(readme.streamed);
    assert_eq!(readme.count, 2);
}

#[test]
fn test_broadcast_progress() {
    let dir = create_project();
    let scanner = Scanner::new(ScanConfig::new(dir.path()), Arc::new(PatternClassifier::new()));
    let mut rx = scanner.subscribe();

    let report = scanner.scan().unwrap();

    let mut last = None;
    while let Ok(progress) = rx.try_recv() {
        last = Some(progress);
    }
    let last = last.unwrap();
    assert_eq!(last.completed as u64, report.files_scanned);
    assert_eq!(last.emoji_found, report.total_emoji);
    assert!(last.is_complete());
}

#[test]
fn test_binary_content_is_skipped() {
    let dir = create_project();
    fs::write(dir.path().join("blob.dat"), b"\x00\x01\x02\x03\xff\xfe").unwrap();

    let report = scan(ScanConfig::new(dir.path()));
    assert_eq!(report.skipped_for(SkipReason::Binary), 1);
    assert!(report.errors.is_empty());
}
