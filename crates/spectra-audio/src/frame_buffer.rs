use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use spectra_telemetry::PipelineMetrics;

use crate::frame::AudioFrame;

/// One batch of frames split into its two channels, ready for the transform.
#[derive(Debug, Clone)]
pub struct BatchChannels {
    pub ch_a: Vec<f32>,
    pub ch_b: Vec<f32>,
}

/// Shared capture buffer between the capture and processing threads.
///
/// Grows by bulk append at the tail, shrinks by bulk removal from the front.
/// The lock is held only for the duration of an append or take, never across
/// a transform. Frames are never reordered.
pub struct FrameBuffer {
    inner: Mutex<VecDeque<AudioFrame>>,
    batch_ready: Condvar,
    batch_size: usize,
    high_water_frames: usize,
    high_water_warned: AtomicBool,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl FrameBuffer {
    pub fn new(batch_size: usize, high_water_frames: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(batch_size * 4)),
            batch_ready: Condvar::new(),
            batch_size,
            high_water_frames,
            high_water_warned: AtomicBool::new(false),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Appends captured frames at the tail and wakes the consumer once a
    /// full batch is available.
    pub fn append(&self, frames: &[AudioFrame]) {
        let depth = {
            let mut buf = self.inner.lock();
            buf.extend(frames.iter().copied());
            if buf.len() >= self.batch_size {
                self.batch_ready.notify_one();
            }
            buf.len()
        };

        if let Some(m) = &self.metrics {
            m.update_buffer_depth(depth);
        }
        if depth >= self.high_water_frames
            && !self.high_water_warned.swap(true, Ordering::Relaxed)
        {
            tracing::warn!(
                depth,
                high_water = self.high_water_frames,
                "frame buffer past high-water mark; processing is falling behind"
            );
        }
    }

    /// Removes and returns the first `n` frames in capture order.
    ///
    /// `n` is clamped to the current size, so the final partial drain of a
    /// run returns whatever is left.
    pub fn take_first(&self, n: usize) -> Vec<AudioFrame> {
        let (taken, depth) = {
            let mut buf = self.inner.lock();
            let n = n.min(buf.len());
            let taken: Vec<AudioFrame> = buf.drain(..n).collect();
            (taken, buf.len())
        };
        if let Some(m) = &self.metrics {
            m.update_buffer_depth(depth);
        }
        taken
    }

    /// Removes one full batch and splits it into channels.
    ///
    /// Returns `None` immediately when fewer than `batch_size` frames are
    /// buffered; under-fill is the normal "not enough data yet" case, not an
    /// error.
    pub fn take_batch(&self) -> Option<BatchChannels> {
        let (batch, depth) = {
            let mut buf = self.inner.lock();
            if buf.len() < self.batch_size {
                return None;
            }
            let mut ch_a = Vec::with_capacity(self.batch_size);
            let mut ch_b = Vec::with_capacity(self.batch_size);
            for frame in buf.drain(..self.batch_size) {
                ch_a.push(frame.ch_a);
                ch_b.push(frame.ch_b);
            }
            (BatchChannels { ch_a, ch_b }, buf.len())
        };
        if let Some(m) = &self.metrics {
            m.update_buffer_depth(depth);
        }
        Some(batch)
    }

    /// Blocks until a full batch may be available or the timeout elapses.
    ///
    /// A wakeup is only a hint; callers must still go through `take_batch`.
    pub fn wait_for_batch(&self, timeout: Duration) -> bool {
        let mut buf = self.inner.lock();
        if buf.len() >= self.batch_size {
            return true;
        }
        self.batch_ready.wait_for(&mut buf, timeout);
        buf.len() >= self.batch_size
    }
}
