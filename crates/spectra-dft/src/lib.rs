//! Spectral transform sessions for the capture pipeline.
//!
//! A session is prepared for a fixed transform length, executed once per
//! channel per batch, and releases its backend resources on drop. The GPU
//! backend is the production path; the CPU backend shares its numerical
//! convention and backs the test suite.

pub mod cpu;
pub mod error;
pub mod gpu;

pub use cpu::CpuDft;
pub use error::DftError;
pub use gpu::GpuDft;

/// Which kernel a session runs: raw or normalized one-sided power.
///
/// Both produce `power[k] = c_k (Re² + Im²)` with `c_k = 2` except at the DC
/// and Nyquist bins; the normalized variant divides by the squared transform
/// length, so a full-scale sine lands at 0.5 in its bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelVariant {
    Power,
    NormalizedPower,
}

/// A prepared spectral-transform session.
///
/// Implementations allocate all resources for a fixed `batch_size` at
/// construction and must be reusable for any number of `execute` calls with
/// inputs of that exact length.
pub trait DftCompute: Send {
    /// Runs the transform on one channel's samples.
    ///
    /// `input` must hold exactly `batch_size()` samples and `oneside_power`
    /// exactly `oneside_size()` slots; the output is overwritten in place.
    fn execute(&mut self, input: &[f32], oneside_power: &mut [f32]) -> Result<(), DftError>;

    fn batch_size(&self) -> usize;

    fn oneside_size(&self) -> usize;
}

/// One-sided spectrum length for an even transform length.
pub fn oneside_size(batch_size: usize) -> usize {
    batch_size / 2 + 1
}

pub(crate) fn validate_batch_size(batch_size: usize) -> Result<(), DftError> {
    if batch_size < 2 || batch_size % 2 != 0 {
        return Err(DftError::InvalidLength { size: batch_size });
    }
    Ok(())
}

pub(crate) fn validate_io(
    batch_size: usize,
    input: &[f32],
    output: &[f32],
) -> Result<(), DftError> {
    if input.len() != batch_size {
        return Err(DftError::InputLengthMismatch {
            got: input.len(),
            expected: batch_size,
        });
    }
    let oneside = oneside_size(batch_size);
    if output.len() != oneside {
        return Err(DftError::OutputLengthMismatch {
            got: output.len(),
            expected: oneside,
        });
    }
    Ok(())
}
