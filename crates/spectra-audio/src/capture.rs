use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::{bounded, RecvTimeoutError};
use parking_lot::Mutex;

use spectra_foundation::{AudioError, PipelineStatus, SharedStatus, StatusGuard};
use spectra_telemetry::{FpsTracker, PipelineMetrics};

use crate::device::ActiveInput;
use crate::frame::AudioFrame;
use crate::frame_buffer::FrameBuffer;

/// Hardware chunks queued between the stream callback and the capture loop.
/// The callback must never block, so a full queue drops the chunk.
const CHUNK_QUEUE_DEPTH: usize = 64;

/// A handle to the dedicated capture thread.
///
/// The thread owns the cpal stream (streams are not `Send`), appends every
/// delivered chunk to the shared frame buffer, and stops once `target_frames`
/// have been observed. The pipeline status is forced to `Finished` on every
/// exit path, errors and panics included.
pub struct CaptureThread {
    handle: JoinHandle<Result<u64, AudioError>>,
    shutdown: Arc<AtomicBool>,
}

impl CaptureThread {
    pub fn spawn(
        input: ActiveInput,
        target_frames: u64,
        buffer: Arc<FrameBuffer>,
        status: SharedStatus,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self, AudioError> {
        if input.sample_rate < 1 {
            return Err(AudioError::Fatal(
                "sample rate of the audio endpoint < 1".to_string(),
            ));
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || capture_loop(input, target_frames, buffer, status, metrics, shutdown_flag))
            .map_err(|e| AudioError::Fatal(format!("Failed to spawn capture thread: {e}")))?;

        Ok(Self { handle, shutdown })
    }

    /// Requests cancellation at the next poll boundary.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the thread and returns the total frames captured.
    pub fn join(self) -> Result<u64, AudioError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(AudioError::Fatal("capture thread panicked".to_string())),
        }
    }
}

fn capture_loop(
    input: ActiveInput,
    target_frames: u64,
    buffer: Arc<FrameBuffer>,
    status: SharedStatus,
    metrics: Arc<PipelineMetrics>,
    shutdown: Arc<AtomicBool>,
) -> Result<u64, AudioError> {
    status.set(PipelineStatus::Capturing);
    let _guard = StatusGuard::new(status);

    let (chunk_tx, chunk_rx) = bounded::<Vec<AudioFrame>>(CHUNK_QUEUE_DEPTH);
    let stream_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    let callback_metrics = Arc::clone(&metrics);
    let data_cb = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        let frames = AudioFrame::from_interleaved(data);
        if frames.is_empty() {
            return;
        }
        if chunk_tx.try_send(frames).is_err() {
            callback_metrics.record_dropped_chunk();
        }
    };

    let error_slot = Arc::clone(&stream_error);
    let err_cb = move |err: cpal::StreamError| {
        tracing::error!("Audio stream error: {}", err);
        *error_slot.lock() = Some(err.to_string());
    };

    let stream = input
        .device
        .build_input_stream(&input.config, data_cb, err_cb, None)?;
    stream.play()?;

    tracing::info!(target_frames, "Capture started");

    let mut total: u64 = 0;
    let mut fps = FpsTracker::new();

    while total < target_frames {
        if shutdown.load(Ordering::SeqCst) {
            tracing::info!(total, "Capture cancelled");
            return Ok(total);
        }
        if let Some(msg) = stream_error.lock().take() {
            return Err(AudioError::StreamStopped(msg));
        }

        match chunk_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => {
                buffer.append(&chunk);
                total += chunk.len() as u64;
                metrics.record_chunk(chunk.len());
                if let Some(rate) = fps.tick() {
                    metrics.update_capture_fps(rate);
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(AudioError::StreamStopped(
                    "capture callback channel disconnected".to_string(),
                ));
            }
        }
    }

    tracing::info!(total, "Capture finished");
    Ok(total)
}
