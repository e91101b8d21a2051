use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use degender::batch::{self, FileStats, RunStats};
use degender::config::Config;
use degender::discovery::{self, DiscoveryConfig};
use degender::session::PageRewriter;

#[derive(Parser, Debug)]
#[command(name = "degender")]
#[command(about = "Rewrites gendered pronouns in HTML pages into gender-neutral language")]
#[command(version)]
struct Args {
    /// HTML files or directories to scan for *.html / *.htm
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (only with a single input page; defaults to <stem>.neutral.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Host the pages were served from, checked against the exclusion list
    #[arg(long)]
    host: Option<String>,

    /// JSON config file overriding the built-in tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep contractions such as "he's" as written
    #[arg(long)]
    no_contractions: bool,

    /// Wrap each replacement in hidden <del>/<ins> markup
    #[arg(long)]
    mark_changes: bool,

    /// Abort on first error
    #[arg(long)]
    fail_fast: bool,

    /// Suppress console progress bars
    #[arg(long)]
    no_progress: bool,

    /// Stats output file path
    #[arg(long)]
    stats_out: Option<PathBuf>,

    /// Print each page's status report as JSON on stdout
    #[arg(long)]
    print_status: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: logs go to stderr as JSON so stdout carries only status reports
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();
    info!("Starting degender");
    info!(?args, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => Config::load(path).await?,
        None => Config::default(),
    };
    if args.no_contractions {
        config.expand_contractions = false;
    }
    if args.mark_changes {
        config.mark_changes = true;
    }
    // WHY: table and pattern errors surface here, before any file is touched
    let rewriter = PageRewriter::from_config(&config)?;

    let discovery_config = DiscoveryConfig {
        fail_fast: args.fail_fast,
    };
    let discovered = discovery::collect_discovered_files(&args.inputs, &discovery_config).await?;
    if args.output.is_some() && discovered.len() != 1 {
        anyhow::bail!(
            "--output needs exactly one input page, found {}",
            discovered.len()
        );
    }

    let progress = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(discovered.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let run_started = Instant::now();
    let mut run_stats = RunStats::new();

    for file in &discovered {
        progress.set_message(file.path.display().to_string());
        let file_started = Instant::now();

        let result = match &file.error {
            Some(error) => Err(anyhow::anyhow!(error.clone())),
            None => {
                let output = args
                    .output
                    .clone()
                    .unwrap_or_else(|| batch::generate_output_path(&file.path));
                batch::process_page_file(&rewriter, &file.path, &output, args.host.as_deref()).await
            }
        };

        match result {
            Ok(stats) => {
                if args.print_status {
                    print_status(&stats);
                }
                run_stats.record(stats);
            }
            Err(e) => {
                warn!("Failed to process {}: {:#}", file.path.display(), e);
                if args.fail_fast {
                    progress.abandon();
                    return Err(e);
                }
                let elapsed = file_started.elapsed().as_millis() as u64;
                run_stats.record(FileStats::failed(&file.path, &e, elapsed));
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("done");
    run_stats.finish(run_started);

    info!(
        "Run complete: {} rewritten, {} unchanged, {} failed",
        run_stats.files_rewritten, run_stats.files_unchanged, run_stats.files_failed
    );
    if let Some(stats_out) = &args.stats_out {
        batch::write_run_stats(&run_stats, stats_out).await?;
    }

    if run_stats.files_failed > 0 {
        anyhow::bail!("{} of {} pages failed", run_stats.files_failed, discovered.len());
    }
    Ok(())
}

/// One status report per line, keyed by page path
fn print_status(stats: &FileStats) {
    let line = serde_json::json!({
        "path": stats.path,
        "status": stats.status,
        "isToggled": false,
        "whyExcluded": stats.why_excluded,
    });
    println!("{line}");
}
