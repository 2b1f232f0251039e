use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use spectra_audio::FrameBuffer;
use spectra_dft::{DftCompute, DftError};
use spectra_foundation::SharedStatus;
use spectra_telemetry::{FpsTracker, PipelineMetrics};

use crate::sink::{SinkError, SpectrumBatch, SpectrumSink};

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("transform failed: {0}")]
    Dft(#[from] DftError),

    #[error("sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),
}

/// Everything the processing loop shares with the rest of the pipeline.
pub struct PipelineContext {
    pub buffer: Arc<FrameBuffer>,
    pub status: SharedStatus,
    pub metrics: Arc<PipelineMetrics>,
    pub sample_rate: u32,
    pub index_min: usize,
    pub index_max: usize,
}

/// A handle to the dedicated processing thread.
pub struct ProcessingThread {
    handle: JoinHandle<Result<u64, ProcessingError>>,
    shutdown: Arc<AtomicBool>,
}

impl ProcessingThread {
    pub fn spawn(
        ctx: PipelineContext,
        dft: Box<dyn DftCompute>,
        sink: Box<dyn SpectrumSink>,
    ) -> Result<Self, ProcessingError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("processing".to_string())
            .spawn(move || run_processing(ctx, dft, sink, shutdown_flag))
            .map_err(|e| ProcessingError::Fatal(format!("Failed to spawn processing thread: {e}")))?;

        Ok(Self { handle, shutdown })
    }

    /// Requests cancellation at the next retry boundary.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the thread and returns the number of batches processed.
    pub fn join(self) -> Result<u64, ProcessingError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(ProcessingError::Fatal(
                "processing thread panicked".to_string(),
            )),
        }
    }
}

/// Drains full batches from the frame buffer and forwards both channels'
/// spectra to the sink until the capture side reports `Finished` and fewer
/// than one batch of frames remains. A strictly partial remainder at
/// end-of-stream is discarded, never zero-padded.
pub fn run_processing(
    ctx: PipelineContext,
    mut dft: Box<dyn DftCompute>,
    mut sink: Box<dyn SpectrumSink>,
    shutdown: Arc<AtomicBool>,
) -> Result<u64, ProcessingError> {
    let batch_size = dft.batch_size();
    let oneside = dft.oneside_size();

    // Output window check, clamped into the spectrum.
    let index_max = ctx.index_max.min(oneside - 1);
    let index_min = ctx.index_min.min(index_max);

    let time_step = batch_size as f64 / ctx.sample_rate as f64;
    let frequency_step = ctx.sample_rate as f32 / batch_size as f32;

    // Spectrum buffers live for the whole run and are overwritten per batch.
    let mut power_a = vec![0.0f32; oneside];
    let mut power_b = vec![0.0f32; oneside];

    let mut batch_index: u64 = 0;
    let mut fps = FpsTracker::new();

    tracing::info!(batch_size, oneside, "Processing started");

    loop {
        if shutdown.load(Ordering::SeqCst) {
            tracing::info!(batch_index, "Processing cancelled");
            break;
        }

        match ctx.buffer.take_batch() {
            Some(batch) => {
                dft.execute(&batch.ch_a, &mut power_a)?;
                dft.execute(&batch.ch_b, &mut power_b)?;

                batch_index += 1;
                ctx.metrics.record_batch();
                if let Some(rate) = fps.tick() {
                    ctx.metrics.update_batch_fps(rate);
                }

                sink.write(&SpectrumBatch {
                    batch_index,
                    elapsed_secs: batch_index as f64 * time_step,
                    frequency_step,
                    index_min,
                    index_max,
                    frames_left: ctx.buffer.len(),
                    power_a: &power_a,
                    power_b: &power_b,
                })?;
            }
            None => {
                // Fewer than batch_size frames buffered. Once the capture
                // side is finished no more can arrive, so this is the end.
                if ctx.status.is_finished() {
                    break;
                }
                ctx.buffer.wait_for_batch(Duration::from_millis(100));
            }
        }
    }

    let leftover = ctx.buffer.take_first(batch_size).len();
    if leftover > 0 {
        ctx.metrics.record_discarded(leftover);
        tracing::debug!(leftover, "Discarded partial batch at end of stream");
    }

    sink.finish()?;
    tracing::info!(batch_index, "Processing finished");
    Ok(batch_index)
}
