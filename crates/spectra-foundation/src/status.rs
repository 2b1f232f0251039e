use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of one capture/process run.
///
/// Written only by the capture thread, observed by the processing thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineStatus {
    Idle = 0,
    Capturing = 1,
    Finished = 2,
}

impl PipelineStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => PipelineStatus::Capturing,
            2 => PipelineStatus::Finished,
            _ => PipelineStatus::Idle,
        }
    }
}

/// Atomic status flag shared between the capture and processing threads.
#[derive(Clone, Default)]
pub struct SharedStatus(Arc<AtomicU8>);

impl SharedStatus {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(PipelineStatus::Idle as u8)))
    }

    pub fn set(&self, status: PipelineStatus) {
        self.0.store(status as u8, Ordering::SeqCst);
    }

    pub fn get(&self) -> PipelineStatus {
        PipelineStatus::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn is_finished(&self) -> bool {
        self.get() == PipelineStatus::Finished
    }
}

/// Forces the status to `Finished` when dropped.
///
/// The capture thread holds one of these for its whole lifetime so the
/// processing thread can always exit, panics and hardware errors included.
pub struct StatusGuard {
    status: SharedStatus,
}

impl StatusGuard {
    pub fn new(status: SharedStatus) -> Self {
        Self { status }
    }
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        self.status.set(PipelineStatus::Finished);
    }
}
