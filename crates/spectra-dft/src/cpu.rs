use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::{oneside_size, validate_batch_size, validate_io, DftCompute, DftError, KernelVariant};

/// CPU transform session with the same one-sided power convention as the GPU
/// kernel. Plan and scratch buffers are allocated once at construction.
pub struct CpuDft {
    fft: Arc<dyn Fft<f32>>,
    work: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    variant: KernelVariant,
    batch_size: usize,
    oneside: usize,
}

impl CpuDft {
    pub fn new(batch_size: usize, variant: KernelVariant) -> Result<Self, DftError> {
        validate_batch_size(batch_size)?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(batch_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Ok(Self {
            fft,
            work: vec![Complex::new(0.0, 0.0); batch_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            variant,
            batch_size,
            oneside: oneside_size(batch_size),
        })
    }
}

impl DftCompute for CpuDft {
    fn execute(&mut self, input: &[f32], oneside_power: &mut [f32]) -> Result<(), DftError> {
        validate_io(self.batch_size, input, oneside_power)?;

        for (slot, &sample) in self.work.iter_mut().zip(input) {
            *slot = Complex::new(sample, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.work, &mut self.scratch);

        let n = self.batch_size as f32;
        for (k, out) in oneside_power.iter_mut().enumerate() {
            let bin = self.work[k];
            // DC and Nyquist have no mirrored counterpart.
            let scale = if k == 0 || k == self.oneside - 1 {
                1.0
            } else {
                2.0
            };
            let mut power = scale * (bin.re * bin.re + bin.im * bin.im);
            if self.variant == KernelVariant::NormalizedPower {
                power /= n * n;
            }
            *out = power;
        }
        Ok(())
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn oneside_size(&self) -> usize {
        self.oneside
    }
}
