use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared metrics for cross-thread pipeline monitoring
#[derive(Clone, Default)]
pub struct PipelineMetrics {
    // Producer side
    pub frames_captured: Arc<AtomicU64>,
    pub chunks_received: Arc<AtomicU64>,
    pub chunks_dropped: Arc<AtomicU64>,
    pub last_chunk_time: Arc<RwLock<Option<Instant>>>,

    // Consumer side
    pub batches_processed: Arc<AtomicU64>,
    pub frames_discarded: Arc<AtomicU64>,

    // Buffer monitoring
    pub buffer_depth: Arc<AtomicUsize>,
    pub buffer_high_water: Arc<AtomicUsize>,

    // Rates (scaled by 10 for one decimal of precision)
    pub capture_fps: Arc<AtomicU64>,
    pub batch_fps: Arc<AtomicU64>,
}

impl PipelineMetrics {
    pub fn record_chunk(&self, frames: usize) {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
        self.frames_captured
            .fetch_add(frames as u64, Ordering::Relaxed);
        *self.last_chunk_time.write() = Some(Instant::now());
    }

    pub fn record_dropped_chunk(&self) {
        self.chunks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch(&self) {
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self, frames: usize) {
        self.frames_discarded
            .fetch_add(frames as u64, Ordering::Relaxed);
    }

    /// Publishes the current buffer depth and keeps the high-water mark.
    pub fn update_buffer_depth(&self, depth: usize) {
        self.buffer_depth.store(depth, Ordering::Relaxed);
        self.buffer_high_water
            .fetch_max(depth, Ordering::Relaxed);
    }

    pub fn update_capture_fps(&self, fps: f64) {
        self.capture_fps.store((fps * 10.0) as u64, Ordering::Relaxed);
    }

    pub fn update_batch_fps(&self, fps: f64) {
        self.batch_fps.store((fps * 10.0) as u64, Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub struct FpsTracker {
    last_update: Instant,
    frame_count: u64,
}

impl FpsTracker {
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    pub fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed >= Duration::from_secs(1) {
            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.last_update = Instant::now();
            self.frame_count = 0;
            Some(fps)
        } else {
            None
        }
    }
}

impl Default for FpsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_accounting() {
        let m = PipelineMetrics::default();
        m.record_chunk(480);
        m.record_chunk(512);
        assert_eq!(m.chunks_received.load(Ordering::Relaxed), 2);
        assert_eq!(m.frames_captured.load(Ordering::Relaxed), 992);
        assert!(m.last_chunk_time.read().is_some());
    }

    #[test]
    fn high_water_mark_never_decreases() {
        let m = PipelineMetrics::default();
        m.update_buffer_depth(100);
        m.update_buffer_depth(4096);
        m.update_buffer_depth(12);
        assert_eq!(m.buffer_depth.load(Ordering::Relaxed), 12);
        assert_eq!(m.buffer_high_water.load(Ordering::Relaxed), 4096);
    }
}
