use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use onebrc::{
    aggregate_file, summarize, write_summaries, EngineConfig, LoadMode, MalformedPolicy,
    MergeStrategy, OutputStyle,
};
use tracing::{debug, trace, warn};
use tracing_subscriber::EnvFilter;

/// Per-key min/mean/max over a file of `key;value` lines
#[derive(Parser)]
#[command(name = "onebrc", version)]
#[command(about = "Compute per-key min/mean/max over a large `key;value` file", long_about = None)]
struct Cli {
    /// Input file, one `key;value` record per line
    path: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of workers (default: available parallelism)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Field delimiter (default: ';')
    #[arg(long)]
    delimiter: Option<char>,

    /// Drop malformed lines instead of failing
    #[arg(long)]
    skip_malformed: bool,

    /// Read the file into memory instead of mapping it
    #[arg(long)]
    buffered: bool,

    /// Merge chunk results one after another instead of pairwise
    #[arg(long)]
    sequential_merge: bool,

    /// Output layout
    #[arg(long, value_enum, default_value_t = OutputStyle::Lines)]
    style: OutputStyle,

    /// Enable verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .with_line_number(verbose >= 3)
        .init();

    debug!("onebrc started with verbosity level: {}", verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

fn build_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    if let Some(delimiter) = cli.delimiter {
        if !delimiter.is_ascii() {
            bail!("Delimiter must be a single ASCII character, got {delimiter:?}");
        }
        config = config.with_delimiter(delimiter as u8);
    }
    if cli.skip_malformed {
        config = config.with_malformed_policy(MalformedPolicy::Skip);
    }
    if cli.buffered {
        config = config.with_load_mode(LoadMode::Buffered);
    }
    if cli.sequential_merge {
        config = config.with_merge_strategy(MergeStrategy::Sequential);
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(&cli)?;
    debug!(?config, "Resolved configuration");

    let map = aggregate_file(&cli.path, &config)
        .await
        .with_context(|| format!("Failed to aggregate {}", cli.path.display()))?;

    if map.skipped() > 0 {
        warn!("Skipped {} malformed lines", map.skipped());
    }

    let summaries = summarize(map);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_summaries(&mut out, &summaries, cli.style)?;
    out.flush()?;
    Ok(())
}
