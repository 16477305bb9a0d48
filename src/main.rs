use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use citeaudit::{check, CiteAuditError, LinkCheckConfig, LinkValidator, ReportSession};

const CHAPTER_EXTENSIONS: [&str; 3] = ["md", "markdown", "txt"];

/// Audit citations, bibliographies and links of an updated report
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(flatten)]
    links: LinkArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Check citation markers against the bibliography of each chapter file
    Check {
        /// Chapter files, or directories to search for .md/.txt files
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Check that every link in a file is reachable
    Links {
        file: PathBuf,
    },
    /// Run every check on a session file and assemble the final report
    Audit {
        /// Session JSON with chapters and their research sources
        session: PathBuf,
        /// Output file for the assembled report (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Link check settings; each overrides its LINK_* environment variable
#[derive(ClapArgs)]
struct LinkArgs {
    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Maximum number of concurrent link checks
    #[arg(long, global = true)]
    concurrency: Option<usize>,
    /// Overall deadline for all link checks, in seconds
    #[arg(long, global = true)]
    deadline_secs: Option<u64>,
    /// How long transient failures are retried, in seconds
    #[arg(long, global = true)]
    retry_secs: Option<u64>,
}

impl LinkArgs {
    fn to_config(&self) -> LinkCheckConfig {
        let mut config = LinkCheckConfig::from_env();
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(n) = self.concurrency {
            config = config.with_concurrency(n);
        }
        if let Some(secs) = self.deadline_secs {
            config = config.with_deadline(Some(Duration::from_secs(secs)));
        }
        if let Some(secs) = self.retry_secs {
            config = config.with_retry_window(Duration::from_secs(secs));
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configure logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let validator = LinkValidator::new(args.links.to_config()).context("Failed to set up link checker")?;

    match &args.command {
        Command::Check { paths } => check_files(paths),
        Command::Links { file } => {
            let text = fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
            let report = validator.validate(&text).await;
            print!("{}", report);
            Ok(())
        }
        Command::Audit { session, output } => audit_session(session, output.as_deref(), &validator).await,
    }
}

fn check_files(paths: &[PathBuf]) -> Result<()> {
    let files = collect_chapter_files(paths);
    if files.is_empty() {
        anyhow::bail!("No chapter files found in the given paths.");
    }

    let mut missing = 0;
    for file in &files {
        let text = fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
        println!("== {}", file.display());
        match check(&text) {
            Ok(report) => print!("{}", report),
            Err(e @ CiteAuditError::MissingBibliography) => {
                println!("{}", e);
                missing += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("Checked {} files, {} without a bibliography section", files.len(), missing);
    if missing > 0 {
        anyhow::bail!("{} of {} files have no bibliography section", missing, files.len());
    }
    Ok(())
}

/// Expand directories into the chapter files they contain, sorted by path.
fn collect_chapter_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.path().is_file() && is_chapter_file(entry.path()))
                .map(|entry| entry.path().to_path_buf())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn is_chapter_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| CHAPTER_EXTENSIONS.contains(&ext))
}

async fn audit_session(path: &Path, output: Option<&Path>, validator: &LinkValidator) -> Result<()> {
    let session = ReportSession::load(path).with_context(|| format!("Failed to load session {:?}", path))?;
    info!("Auditing {} chapters from {:?}", session.chapters.len(), path);

    let outcome = session.audit(validator).await?;

    for chapter in &outcome.chapters {
        match &chapter.result {
            Ok(report) => {
                info!("Chapter {}: {}", chapter.index + 1, chapter.title);
                for line in report.to_string().lines() {
                    if chapter.passed() {
                        info!("  {}", line);
                    } else {
                        warn!("  {}", line);
                    }
                }
            }
            Err(e) => warn!("Chapter {}: {}: {}", chapter.index + 1, chapter.title, e),
        }
    }
    for line in outcome.links.to_string().lines() {
        info!("{}", line);
    }

    // Write output to file or stdout
    if let Some(output_file) = output {
        fs::write(output_file, &outcome.report_text)
            .with_context(|| format!("Failed to write output to {:?}", output_file))?;
        info!("Output written to {:?}", output_file);
    } else {
        println!("{}", outcome.report_text);
    }

    if outcome.missing_bibliographies() > 0 {
        anyhow::bail!(
            "{} chapters have no bibliography section",
            outcome.missing_bibliographies()
        );
    }
    Ok(())
}
