use thiserror::Error;

#[derive(Error, Debug)]
pub enum DftError {
    #[error("transform length must be even and >= 2, got {size}")]
    InvalidLength { size: usize },

    #[error("input holds {got} samples but the session was prepared for {expected}")]
    InputLengthMismatch { got: usize, expected: usize },

    #[error("output holds {got} slots but the one-sided spectrum needs {expected}")]
    OutputLengthMismatch { got: usize, expected: usize },

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("compute backend error: {description}")]
    Backend { description: String },
}

impl DftError {
    pub(crate) fn backend(description: impl Into<String>) -> Self {
        DftError::Backend {
            description: description.into(),
        }
    }
}
