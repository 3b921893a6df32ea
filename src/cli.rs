//! CLI parsing and orchestration. Resolves settings, selects the input, runs the job, prints
//! per-entry diagnostics and the summary. Maps run-level errors to exit codes.

use crate::config;
use crate::fetch::{DmClient, FetchError, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use crate::input::{load_input, InputError, InputPaths};
use crate::job::{plan, run_job, EntryError, EntryOutcome, JobConfig, JobError};
use crate::model::{Entry, InputSource, Summary};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Run-level error carrying an exit code. Per-entry failures never end up here.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Input(#[from] InputError),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{0}")]
    Job(#[from] JobError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) | CliRunError::Input(_) => 1,
            CliRunError::Client(_) => 2,
            CliRunError::Job(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "dmfetch")]
#[command(about = "Download Missevan danmaku XML for every sound listed in link.json or link.txt")]
#[command(
    after_help = "link.json (a list of {\"title\", \"link\"} records) is used when present, otherwise link.txt (one URL per line). Config file keys (input_dir, output_dir, json_file, txt_file, endpoint, user_agent, timeout_secs) go in ./dmfetch.toml or the user config dir. CLI flags override config."
)]
pub struct Args {
    /// Directory containing link.json / link.txt. Default: current directory.
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// Directory for downloaded XML files. Default: <input-dir>/xml.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Download URL template; {id} is replaced with the sound id.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// HTTP User-Agent (overrides config; default Mozilla/5.0).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds (overrides config; default 15).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Do not re-download entries whose XML file already exists.
    #[arg(long)]
    pub skip_existing: bool,

    /// Print what would be downloaded and where, without fetching or writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress and per-entry lines (summary is still printed).
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and full error chains.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings after merging CLI flags, config file, and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub inputs: InputPaths,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub endpoint: String,
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
}

/// Merge flags over config over defaults. Rejects an endpoint without `{id}`.
pub fn resolve_settings(
    args: &Args,
    config: Option<&config::Config>,
) -> Result<Settings, CliRunError> {
    let input_dir = args
        .input_dir
        .clone()
        .or_else(|| config.and_then(|c| c.input_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("."));
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.and_then(|c| c.output_dir.clone()))
        .unwrap_or_else(|| input_dir.join("xml"));
    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| config.and_then(|c| c.endpoint.clone()))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    if !endpoint.contains("{id}") {
        return Err(CliRunError::InvalidInput(format!(
            "Invalid endpoint '{}': it must contain {{id}} where the sound id goes.",
            endpoint
        )));
    }
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| config.and_then(|c| c.user_agent.clone()));
    let timeout_secs = args
        .timeout
        .or_else(|| config.and_then(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let mut inputs = InputPaths::in_dir(&input_dir);
    if let Some(name) = config.and_then(|c| c.json_file.as_deref()) {
        inputs.json = input_dir.join(name);
    }
    if let Some(name) = config.and_then(|c| c.txt_file.as_deref()) {
        inputs.txt = input_dir.join(name);
    }

    Ok(Settings {
        inputs,
        input_dir,
        output_dir,
        endpoint,
        user_agent,
        timeout_secs,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Console line for one processed entry. None for plain successes.
pub fn describe_outcome(entry: &Entry, outcome: &EntryOutcome) -> Option<String> {
    match outcome {
        EntryOutcome::Saved { .. } => None,
        EntryOutcome::Exists { path } => Some(format!(
            "[exists] entry {}: {} already present, not downloaded",
            entry.position,
            path.display()
        )),
        EntryOutcome::Skipped => Some(format!(
            "[skip] entry {}: no sound id in {}",
            entry.position, entry.source_url
        )),
        EntryOutcome::Failed {
            url,
            error: EntryError::Fetch(FetchError::Http { status, .. }),
        } => Some(format!("[error HTTP] {} -> {}", url, status)),
        EntryOutcome::Failed {
            url,
            error: EntryError::Fetch(e),
        } => Some(format!("[error] download {} failed: {}", url, e)),
        EntryOutcome::Failed {
            url,
            error: e @ EntryError::Write { .. },
        } => Some(format!("[error] saving {} failed: {}", url, e)),
    }
}

/// Final line, naming the input file that was used.
pub fn summary_line(summary: &Summary, input_path: &Path) -> String {
    format!(
        "Read {} {} from {}; {} XML file(s) downloaded successfully.",
        summary.total,
        summary.source.item_noun(),
        file_name(input_path),
        summary.success
    )
}

fn progress_bar(total: usize) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new(total as u64);
    if let Ok(style) = indicatif::ProgressStyle::default_bar()
        .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
    {
        bar.set_style(
            style
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
    }
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Print a diagnostic line to stderr, clearing the bar around the write.
/// `ProgressBar::println` prints nothing while the bar is hidden (stderr not a terminal).
fn print_diagnostic(bar: Option<&indicatif::ProgressBar>, line: &str) {
    match bar {
        Some(pb) => pb.suspend(|| eprintln!("{}", line)),
        None => eprintln!("{}", line),
    }
}

/// Entry point for the CLI. "No input found" is a clean Ok(()); only setup failures are Err.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let settings = resolve_settings(args, config.as_ref())?;
    run_with_settings(args, &settings)
}

/// Everything after settings resolution: select input, run the job, report.
pub fn run_with_settings(args: &Args, settings: &Settings) -> Result<(), CliRunError> {
    let Some(input) = load_input(&settings.inputs)? else {
        println!(
            "Neither {} nor {} found in {}; nothing to do.",
            file_name(&settings.inputs.json),
            file_name(&settings.inputs.txt),
            settings.input_dir.display()
        );
        return Ok(());
    };

    let source_name = file_name(&input.path);
    match input.source {
        InputSource::Structured => {
            println!("Found {}; using it in preference to the text list.", source_name)
        }
        InputSource::PlainText => println!("Using {}.", source_name),
    }

    let job_config = JobConfig {
        output_dir: settings.output_dir.clone(),
        endpoint: settings.endpoint.clone(),
        skip_existing: args.skip_existing,
    };

    if args.dry_run {
        for planned in plan(&job_config, &input) {
            match planned.target {
                Some(t) => println!("{} -> {}", t.url, t.path.display()),
                None => {
                    if let Some(line) = describe_outcome(&planned.entry, &EntryOutcome::Skipped) {
                        println!("{}", line);
                    }
                }
            }
        }
        return Ok(());
    }

    let mut builder = DmClient::builder().timeout_secs(settings.timeout_secs);
    if let Some(ua) = settings.user_agent.clone() {
        builder = builder.user_agent(ua);
    }
    let mut client = builder.build().map_err(CliRunError::Client)?;

    let bar = (!args.quiet && !input.entries.is_empty())
        .then(|| progress_bar(input.entries.len()));
    let report = |entry: &Entry, outcome: &EntryOutcome| {
        if let Some(pb) = &bar {
            pb.inc(1);
            pb.set_message(format!("entry {}", entry.position));
        }
        if args.quiet {
            return;
        }
        if let Some(line) = describe_outcome(entry, outcome) {
            print_diagnostic(bar.as_ref(), &line);
        }
    };

    let on_entry: Option<&dyn Fn(&Entry, &EntryOutcome)> = Some(&report);
    let summary = run_job(&job_config, &input, &mut client, on_entry)?;

    if let Some(pb) = &bar {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    println!("{}", summary_line(&summary, &input.path));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["dmfetch"];
        full.extend_from_slice(argv);
        Args::parse_from(full)
    }

    #[test]
    fn defaults_without_config() -> Result<(), CliRunError> {
        let s = resolve_settings(&args(&[]), None)?;
        assert_eq!(s.input_dir, PathBuf::from("."));
        assert_eq!(s.output_dir, PathBuf::from(".").join("xml"));
        assert_eq!(s.inputs.json, PathBuf::from(".").join("link.json"));
        assert_eq!(s.inputs.txt, PathBuf::from(".").join("link.txt"));
        assert_eq!(s.inputs, InputPaths::in_dir(Path::new(".")));
        assert_eq!(s.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(s.user_agent, None);
        assert_eq!(s.timeout_secs, 15);
        Ok(())
    }

    #[test]
    fn output_dir_follows_input_dir() -> Result<(), CliRunError> {
        let s = resolve_settings(&args(&["--input-dir", "lists"]), None)?;
        assert_eq!(s.output_dir, PathBuf::from("lists").join("xml"));
        assert_eq!(s.inputs.json, PathBuf::from("lists").join("link.json"));
        Ok(())
    }

    #[test]
    fn flags_override_config() -> Result<(), CliRunError> {
        let config = config::Config {
            output_dir: Some(PathBuf::from("from-config")),
            user_agent: Some("Config/1.0".into()),
            timeout_secs: Some(60),
            json_file: Some("records.json".into()),
            ..Default::default()
        };
        let s = resolve_settings(
            &args(&["--output-dir", "from-flag", "--timeout", "3"]),
            Some(&config),
        )?;
        assert_eq!(s.output_dir, PathBuf::from("from-flag"));
        assert_eq!(s.timeout_secs, 3);
        assert_eq!(s.user_agent.as_deref(), Some("Config/1.0"));
        assert_eq!(s.inputs.json, PathBuf::from(".").join("records.json"));
        assert_eq!(s.inputs.txt, PathBuf::from(".").join("link.txt"));
        Ok(())
    }

    #[test]
    fn endpoint_without_placeholder_is_rejected() {
        let result = resolve_settings(&args(&["--endpoint", "https://x/getdm"]), None);
        match result {
            Err(e @ CliRunError::InvalidInput(_)) => assert_eq!(e.exit_code(), 1),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn describe_skip_names_position_and_url() {
        let entry = Entry::new(2, "B", "https://x/nomatch");
        let line = describe_outcome(&entry, &EntryOutcome::Skipped).unwrap();
        assert!(line.contains("entry 2"));
        assert!(line.contains("https://x/nomatch"));
    }

    #[test]
    fn describe_http_error_includes_status() {
        let entry = Entry::new(1, "A", "https://x/sound/1");
        let outcome = EntryOutcome::Failed {
            url: "https://dl/1".into(),
            error: EntryError::Fetch(FetchError::Http {
                status: 503,
                url: "https://dl/1".into(),
            }),
        };
        assert_eq!(
            describe_outcome(&entry, &outcome).as_deref(),
            Some("[error HTTP] https://dl/1 -> 503")
        );
    }

    #[test]
    fn describe_other_error_includes_message() {
        let entry = Entry::new(1, "A", "https://x/sound/1");
        let outcome = EntryOutcome::Failed {
            url: "https://dl/1".into(),
            error: EntryError::Fetch(FetchError::Other {
                url: "https://dl/1".into(),
                message: "connection reset".into(),
            }),
        };
        let line = describe_outcome(&entry, &outcome).unwrap();
        assert!(line.starts_with("[error] download https://dl/1 failed"));
        assert!(line.contains("connection reset"));
    }

    #[test]
    fn describe_saved_is_silent() {
        let entry = Entry::new(1, "A", "https://x/sound/1");
        let outcome = EntryOutcome::Saved {
            path: PathBuf::from("xml/A.xml"),
            bytes: 10,
        };
        assert!(describe_outcome(&entry, &outcome).is_none());
    }

    #[test]
    fn summary_names_source_and_counts() {
        let summary = Summary {
            source: InputSource::Structured,
            total: 2,
            success: 1,
        };
        assert_eq!(
            summary_line(&summary, Path::new("./link.json")),
            "Read 2 records from link.json; 1 XML file(s) downloaded successfully."
        );
        let summary = Summary {
            source: InputSource::PlainText,
            total: 3,
            success: 3,
        };
        assert!(summary_line(&summary, Path::new("link.txt"))
            .starts_with("Read 3 URLs from link.txt"));
    }

    #[test]
    fn cli_run_error_exit_codes() {
        assert_eq!(CliRunError::InvalidInput("x".into()).exit_code(), 1);
        assert_eq!(
            CliRunError::Input(InputError::Read {
                path: PathBuf::from("link.txt"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
            .exit_code(),
            1
        );
        assert_eq!(
            CliRunError::Job(JobError::OutputDir {
                path: PathBuf::from("xml"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
            .exit_code(),
            3
        );
    }

    #[test]
    fn run_without_any_input_is_ok() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let dir_str = dir.path().to_string_lossy().into_owned();
        let a = args(&["--input-dir", &dir_str, "--quiet"]);
        run_with_settings(&a, &resolve_settings(&a, None)?)?;
        assert!(!dir.path().join("xml").exists());
        Ok(())
    }

    #[test]
    fn dry_run_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("link.txt"), "https://x/sound/1\nhttps://x/none\n")?;
        let dir_str = dir.path().to_string_lossy().into_owned();
        let a = args(&["--input-dir", &dir_str, "--dry-run"]);
        run_with_settings(&a, &resolve_settings(&a, None)?)?;
        assert!(!dir.path().join("xml").exists());
        Ok(())
    }

    #[test]
    fn diagnostic_without_bar_does_not_panic() {
        print_diagnostic(None, "[skip] entry 1: no sound id in https://x/none");
    }

    #[test]
    fn diagnostic_with_hidden_bar_does_not_panic() {
        let bar = indicatif::ProgressBar::hidden();
        print_diagnostic(Some(&bar), "[skip] entry 1: no sound id in https://x/none");
    }

    #[test]
    fn run_with_unmatched_urls_creates_output_dir_only() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("link.txt"), "https://x/none
https://x/other
")?;
        let dir_str = dir.path().to_string_lossy().into_owned();
        let a = args(&["--input-dir", &dir_str]);
        run_with_settings(&a, &resolve_settings(&a, None)?)?;
        let out = dir.path().join("xml");
        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out)?.count(), 0);
        Ok(())
    }
}
