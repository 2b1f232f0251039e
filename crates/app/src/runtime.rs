use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;

use spectra_audio::{CaptureThread, DeviceManager, FrameBuffer};
use spectra_dft::{CpuDft, DftCompute, GpuDft, KernelVariant};
use spectra_foundation::{ConfigError, PipelineConfig, SharedStatus};
use spectra_telemetry::PipelineMetrics;

use crate::pipeline::{PipelineContext, ProcessingThread};
use crate::sink::{ConsoleSink, CsvSink, SpectrumSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Gpu,
    Cpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Console,
    Csv,
}

pub struct RunOptions {
    pub device: Option<usize>,
    pub config: PipelineConfig,
    pub backend: Backend,
    pub sink: SinkKind,
    pub variant: KernelVariant,
    pub out_dir: PathBuf,
}

/// Prints the active input endpoints, marking the host default.
pub fn list_devices() {
    let manager = DeviceManager::new();
    let devices = manager.enumerate_devices();
    if devices.is_empty() {
        println!("No active input endpoints found.");
        return;
    }
    println!("Input endpoints (host: {:?}):", manager.host_id());
    for d in devices {
        let marker = if d.is_default { " (default)" } else { "" };
        println!("  [{}] {}{}", d.index, d.name, marker);
    }
}

/// Runs one capture/process cycle to completion.
///
/// Spawns the capture and processing threads, joins both, and reports the
/// first fatal error from either side.
pub fn run(opts: RunOptions) -> anyhow::Result<()> {
    opts.config.validate()?;

    let manager = DeviceManager::new();
    let input = manager
        .activate(opts.device)
        .context("failed to activate input endpoint")?;
    let sample_rate = input.sample_rate;
    if sample_rate < 1 {
        return Err(ConfigError::InvalidSampleRate { rate: sample_rate }.into());
    }

    let metrics = Arc::new(PipelineMetrics::default());
    let status = SharedStatus::new();
    let buffer = Arc::new(
        FrameBuffer::new(opts.config.batch_size, opts.config.high_water_frames)
            .with_metrics(Arc::clone(&metrics)),
    );

    let dft: Box<dyn DftCompute> = match opts.backend {
        Backend::Gpu => Box::new(
            GpuDft::new(opts.config.batch_size, opts.variant)
                .context("failed to prepare GPU transform session")?,
        ),
        Backend::Cpu => Box::new(CpuDft::new(opts.config.batch_size, opts.variant)?),
    };

    let sink: Box<dyn SpectrumSink> = match opts.sink {
        SinkKind::Console => Box::new(ConsoleSink::stdout()),
        SinkKind::Csv => Box::new(CsvSink::create(
            &opts.out_dir,
            opts.config.record_threshold,
        )?),
    };

    let capture = CaptureThread::spawn(
        input,
        opts.config.target_frames(sample_rate),
        Arc::clone(&buffer),
        status.clone(),
        Arc::clone(&metrics),
    )?;

    let processing = ProcessingThread::spawn(
        PipelineContext {
            buffer,
            status,
            metrics: Arc::clone(&metrics),
            sample_rate,
            index_min: opts.config.index_min,
            index_max: opts.config.index_max,
        },
        dft,
        sink,
    )?;

    let captured = capture.join();
    let processed = processing.join();

    let total_frames = captured.context("capture failed")?;
    let batches = processed.context("processing failed")?;

    tracing::info!(
        total_frames,
        batches,
        dropped_chunks = metrics.chunks_dropped.load(Ordering::Relaxed),
        buffer_high_water = metrics.buffer_high_water.load(Ordering::Relaxed),
        "Run complete"
    );
    Ok(())
}
