use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use biometrics::{
    logging, ChartLayout, ChartSink, ChartUpdater, Consumer, NullChart, SvgChart, Tail, TailError,
    TerminalChart, DEFAULT_DATA_FILE,
};
use biometrics_probe::{Generator, Probe, RecordKind};

const DEFAULT_CONSUMER_LOG: &str = "biometrics-consumer.log";
const MISSING_DATA_FILE: u8 = 1;

#[derive(Parser, Debug)]
#[command(version, about = "Live biometrics feed: random producer and charting consumer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append random biometric records to the data file, forever
    Produce(ProduceArgs),
    /// Follow the data file and chart new records as they arrive
    Consume(ConsumeArgs),
}

#[derive(Args, Debug)]
struct ProduceArgs {
    /// Data file to append to
    #[arg(long, env = "BIOMETRICS_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    file: PathBuf,
    /// Seconds between records
    #[arg(
        long,
        env = "BUZZ_INTERVAL_SECONDS",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,
    /// Record types to pick from, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    kinds: Vec<RecordKind>,
    /// Stop after this many records
    #[arg(long)]
    count: Option<u64>,
    /// Seed for a reproducible stream
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct ConsumeArgs {
    /// Data file to follow
    #[arg(long, env = "BIOMETRICS_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    file: PathBuf,
    /// Which metrics to chart
    #[arg(long, value_enum, default_value_t = LayoutChoice::Vitals)]
    layout: LayoutChoice,
    /// Where to draw the chart
    #[arg(long, value_enum, default_value_t = Surface::Terminal)]
    display: Surface,
    /// Snapshot written by `--display svg`
    #[arg(long, default_value = "data/biometrics_live.svg")]
    svg_path: PathBuf,
    /// Samples kept per metric, 0 keeps everything
    #[arg(long, default_value_t = 500)]
    retain: usize,
    /// Milliseconds to wait when no new line is available
    #[arg(long, default_value_t = 500)]
    poll_ms: u64,
    /// Log file (default: stderr, or biometrics-consumer.log with the terminal display)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutChoice {
    /// heart rate and steps, 1x2
    Vitals,
    /// every record type, 2x2
    Full,
}

impl LayoutChoice {
    fn chart_layout(self) -> ChartLayout {
        match self {
            LayoutChoice::Vitals => ChartLayout::vitals(),
            LayoutChoice::Full => ChartLayout::full(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Surface {
    Terminal,
    Svg,
    None,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Produce(args) => produce(args),
        Command::Consume(args) => consume(args),
    }
}

fn stop_on_ctrlc() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("install ctrl+c handler")?;
    Ok(stop)
}

fn produce(args: ProduceArgs) -> Result<ExitCode> {
    logging::init_stderr();
    tracing::info!("START producer, hit ctrl-c to close");
    tracing::info!(seconds = args.interval, "message interval");
    tracing::info!(path = %args.file.display(), "data file");

    let stop = stop_on_ctrlc()?;
    match run_producer(&args, &stop) {
        Ok(n) => tracing::info!(records = n, "producer done"),
        Err(e) => tracing::error!("unexpected error: {:#}", e),
    }
    if stop.load(Ordering::Relaxed) {
        tracing::warn!("producer interrupted by user");
    }
    tracing::info!("producer shutting down");
    Ok(ExitCode::SUCCESS)
}

fn run_producer(args: &ProduceArgs, stop: &AtomicBool) -> Result<u64> {
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let generator = if args.kinds.is_empty() {
        Generator::new(rng)
    } else {
        Generator::with_kinds(rng, &args.kinds)?
    };
    let probe = Probe::append(&args.file)?;
    let n = probe.run_heartbeat(
        Duration::from_secs(args.interval),
        generator,
        stop,
        args.count,
    )?;
    Ok(n)
}

/// Open the data file for tailing, or the exit code to stop with when it
/// does not exist. `echo` repeats the message on stderr when logs go to a file.
fn open_data_file(path: &Path, echo: bool) -> Result<std::result::Result<Tail, u8>> {
    match Tail::open(path) {
        Ok(tail) => Ok(Ok(tail)),
        Err(TailError::Missing(path)) => {
            tracing::error!(path = %path.display(), "data file does not exist, exiting");
            if echo {
                eprintln!("data file {} does not exist", path.display());
            }
            Ok(Err(MISSING_DATA_FILE))
        }
        Err(e) => Err(e.into()),
    }
}

fn consume(args: ConsumeArgs) -> Result<ExitCode> {
    let log_file = args.log_file.clone().or_else(|| {
        (args.display == Surface::Terminal).then(|| PathBuf::from(DEFAULT_CONSUMER_LOG))
    });
    match &log_file {
        Some(path) => {
            if let Err(e) = logging::init_file(path) {
                eprintln!("cannot log to {}: {}", path.display(), e);
            }
        }
        None => logging::init_stderr(),
    }
    tracing::info!("START consumer");
    tracing::info!(path = %args.file.display(), "data file");

    let tail = match open_data_file(&args.file, log_file.is_some())? {
        Ok(tail) => tail,
        Err(code) => return Ok(ExitCode::from(code)),
    };

    let stop = stop_on_ctrlc()?;
    let retain = Some(args.retain).filter(|r| *r > 0);
    let updater = ChartUpdater::new(args.layout.chart_layout(), retain);
    let sink: Box<dyn ChartSink> = match args.display {
        Surface::Terminal => Box::new(TerminalChart::stdout().context("take over terminal")?),
        Surface::Svg => {
            let chart = SvgChart::new(&args.svg_path, (1024, 768));
            tracing::info!(path = %chart.path().display(), "chart snapshot");
            Box::new(chart)
        }
        Surface::None => Box::new(NullChart),
    };

    let consumer = Consumer::new(tail, updater, sink, Duration::from_millis(args.poll_ms));
    match consumer.run(&stop) {
        Ok(stats) => tracing::info!(
            lines = stats.lines,
            charted = stats.charted,
            ignored = stats.ignored,
            rejected = stats.rejected,
            failed_draws = stats.failed_draws,
            "consumer closed"
        ),
        Err(e) => tracing::error!("consumer closed after error: {:#}", anyhow::Error::from(e)),
    }
    Ok(ExitCode::SUCCESS)
}
