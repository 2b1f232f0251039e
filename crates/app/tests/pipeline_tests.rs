//! End-to-end processing-loop tests driven by a synthetic capture thread.
//!
//! The CPU transform backend stands in for the GPU so these run anywhere.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use spectra_app::pipeline::{run_processing, PipelineContext};
use spectra_app::sink::{SinkError, SpectrumBatch, SpectrumSink};
use spectra_audio::{AudioFrame, FrameBuffer};
use spectra_dft::{CpuDft, KernelVariant};
use spectra_foundation::{PipelineStatus, SharedStatus, StatusGuard};
use spectra_telemetry::PipelineMetrics;

const BATCH: usize = 64;
const RATE: u32 = 640;

#[derive(Debug, Clone)]
struct CapturedBatch {
    batch_index: u64,
    elapsed_secs: f64,
    power_a: Vec<f32>,
    power_b: Vec<f32>,
}

/// Sink that records every batch it sees, for assertions after the run.
struct CollectSink {
    batches: Arc<Mutex<Vec<CapturedBatch>>>,
    finished: Arc<AtomicBool>,
}

impl CollectSink {
    fn new() -> (Self, Arc<Mutex<Vec<CapturedBatch>>>, Arc<AtomicBool>) {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let finished = Arc::new(AtomicBool::new(false));
        (
            Self {
                batches: Arc::clone(&batches),
                finished: Arc::clone(&finished),
            },
            batches,
            finished,
        )
    }
}

impl SpectrumSink for CollectSink {
    fn write(&mut self, batch: &SpectrumBatch<'_>) -> Result<(), SinkError> {
        self.batches.lock().unwrap().push(CapturedBatch {
            batch_index: batch.batch_index,
            elapsed_secs: batch.elapsed_secs,
            power_a: batch.power_a.to_vec(),
            power_b: batch.power_b.to_vec(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn context(buffer: Arc<FrameBuffer>, status: SharedStatus) -> PipelineContext {
    PipelineContext {
        buffer,
        status,
        metrics: Arc::new(PipelineMetrics::default()),
        sample_rate: RATE,
        index_min: 0,
        index_max: BATCH / 2,
    }
}

/// Spawns a thread that feeds `total` sine frames in uneven chunks and then
/// lets its status guard mark the stream finished.
fn spawn_producer(
    buffer: Arc<FrameBuffer>,
    status: SharedStatus,
    total: usize,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        status.set(PipelineStatus::Capturing);
        let _guard = StatusGuard::new(status);

        let mut frames = Vec::with_capacity(total);
        for i in 0..total {
            // Bin-2 sine on channel A within each batch, silence on B.
            let phase = std::f32::consts::TAU * 2.0 * (i % BATCH) as f32 / BATCH as f32;
            frames.push(AudioFrame::new(phase.sin(), 0.0));
        }

        let mut offset = 0;
        let mut chunk = 7;
        while offset < total {
            let end = (offset + chunk).min(total);
            buffer.append(&frames[offset..end]);
            offset = end;
            chunk = chunk % 50 + 13;
            thread::sleep(Duration::from_millis(1));
        }
    })
}

fn run_to_completion(total_frames: usize) -> (u64, Vec<CapturedBatch>, bool, Arc<PipelineMetrics>) {
    let buffer = Arc::new(FrameBuffer::new(BATCH, usize::MAX));
    let status = SharedStatus::new();
    let ctx = context(Arc::clone(&buffer), status.clone());
    let metrics = Arc::clone(&ctx.metrics);

    let producer = spawn_producer(buffer, status, total_frames);

    let dft = CpuDft::new(BATCH, KernelVariant::NormalizedPower).unwrap();
    let (sink, batches, finished) = CollectSink::new();
    let processed = run_processing(
        ctx,
        Box::new(dft),
        Box::new(sink),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    producer.join().unwrap();
    let batches = Arc::try_unwrap(batches).unwrap().into_inner().unwrap();
    (processed, batches, finished.load(Ordering::SeqCst), metrics)
}

#[test]
fn processes_every_full_batch_in_order() {
    let (processed, batches, finished, _) = run_to_completion(10 * BATCH);

    assert_eq!(processed, 10);
    assert_eq!(batches.len(), 10);
    assert!(finished, "sink finish() must run after the last batch");
    for (i, b) in batches.iter().enumerate() {
        assert_eq!(b.batch_index, i as u64 + 1);
    }
}

#[test]
fn partial_remainder_is_discarded_not_padded() {
    let (processed, batches, _, metrics) = run_to_completion(3 * BATCH + 17);

    assert_eq!(processed, 3);
    assert_eq!(batches.len(), 3);
    assert_eq!(metrics.frames_discarded.load(Ordering::Relaxed), 17);
}

#[test]
fn exact_multiple_leaves_nothing_behind() {
    let (processed, _, _, metrics) = run_to_completion(5 * BATCH);

    assert_eq!(processed, 5);
    assert_eq!(metrics.frames_discarded.load(Ordering::Relaxed), 0);
}

#[test]
fn elapsed_time_advances_by_one_batch_duration() {
    let (_, batches, _, _) = run_to_completion(4 * BATCH);

    let step = BATCH as f64 / RATE as f64;
    for (i, b) in batches.iter().enumerate() {
        let expected = (i as f64 + 1.0) * step;
        assert!((b.elapsed_secs - expected).abs() < 1e-12);
    }
}

#[test]
fn sine_input_peaks_at_its_bin_on_the_right_channel() {
    let (_, batches, _, _) = run_to_completion(2 * BATCH);

    for b in &batches {
        // Unit sine, normalized power: 0.5 at bin 2, nothing elsewhere.
        assert!((b.power_a[2] - 0.5).abs() < 1e-3, "bin 2 = {}", b.power_a[2]);
        for (k, &p) in b.power_a.iter().enumerate() {
            if k != 2 {
                assert!(p < 1e-4, "leak at bin {k}: {p}");
            }
        }
        for &p in &b.power_b {
            assert!(p < 1e-6, "silent channel must stay silent");
        }
    }
}

#[test]
fn shutdown_flag_stops_the_loop() {
    let buffer = Arc::new(FrameBuffer::new(BATCH, usize::MAX));
    let status = SharedStatus::new();
    status.set(PipelineStatus::Capturing);
    let ctx = context(Arc::clone(&buffer), status.clone());

    let shutdown = Arc::new(AtomicBool::new(false));
    let stopper = Arc::clone(&shutdown);
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        stopper.store(true, Ordering::SeqCst);
    });

    let dft = CpuDft::new(BATCH, KernelVariant::NormalizedPower).unwrap();
    let (sink, _, _) = CollectSink::new();
    // No producer and no Finished transition: only the flag can end this.
    let processed = run_processing(ctx, Box::new(dft), Box::new(sink), shutdown).unwrap();

    canceller.join().unwrap();
    assert_eq!(processed, 0);
}
