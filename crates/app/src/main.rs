use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use spectra_app::runtime::{self, Backend, RunOptions, SinkKind};
use spectra_dft::KernelVariant;
use spectra_foundation::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "spectra")]
#[command(about = "Live two-channel one-sided power spectrum of an audio input")]
struct Cli {
    /// List active input endpoints and exit
    #[arg(long)]
    list_devices: bool,

    /// Input endpoint index (host default when omitted)
    #[arg(long)]
    device: Option<usize>,

    /// Frames per batch and transform length (even, >= 2)
    #[arg(long, default_value_t = 2048)]
    batch_size: usize,

    /// Capture duration in seconds
    #[arg(long, default_value_t = 10.0)]
    seconds: f32,

    /// Lowest reported spectrum bin
    #[arg(long, default_value_t = 0)]
    index_min: usize,

    /// Highest reported spectrum bin (inclusive)
    #[arg(long, default_value_t = 40)]
    index_max: usize,

    /// Where batch results go
    #[arg(long, value_enum, default_value = "console")]
    sink: SinkArg,

    /// Base directory for CSV archives
    #[arg(long, default_value = "spectra_data")]
    out_dir: PathBuf,

    /// A CSV row is skipped when both channels are below this power
    #[arg(long, default_value_t = 5.0e-7)]
    threshold: f32,

    /// Transform backend
    #[arg(long, value_enum, default_value = "gpu")]
    backend: BackendArg,

    /// Emit raw one-sided power instead of the normalized variant
    #[arg(long)]
    raw: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SinkArg {
    Console,
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Gpu,
    Cpu,
}

fn init_logging() {
    // Logs go to stderr so the console sink owns stdout.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    if cli.list_devices {
        runtime::list_devices();
        return Ok(());
    }

    let config = PipelineConfig {
        batch_size: cli.batch_size,
        capture_secs: cli.seconds,
        index_min: cli.index_min,
        index_max: cli.index_max,
        record_threshold: cli.threshold,
        ..Default::default()
    };

    runtime::run(RunOptions {
        device: cli.device,
        config,
        backend: match cli.backend {
            BackendArg::Gpu => Backend::Gpu,
            BackendArg::Cpu => Backend::Cpu,
        },
        sink: match cli.sink {
            SinkArg::Console => SinkKind::Console,
            SinkArg::Csv => SinkKind::Csv,
        },
        variant: if cli.raw {
            KernelVariant::Power
        } else {
            KernelVariant::NormalizedPower
        },
        out_dir: cli.out_dir,
    })
}
