use thiserror::Error;

/// Configuration problems detected before the pipeline starts.
///
/// All of these are fatal to the run and name the offending parameter.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("batch size must be even and >= 2, got {size}")]
    InvalidBatchSize { size: usize },

    #[error("frequency index range invalid: min {min} > max {max}")]
    InvalidIndexRange { min: usize, max: usize },

    #[error("sample rate of the audio endpoint must be >= 1, got {rate}")]
    InvalidSampleRate { rate: u32 },

    #[error("capture duration must be > 0, got {secs}")]
    InvalidDuration { secs: f32 },

    #[error("record threshold must be finite and >= 0, got {threshold}")]
    InvalidThreshold { threshold: f32 },
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Device not found: {name:?}")]
    DeviceNotFound { name: Option<String> },

    #[error("No input endpoint at index {index} ({count} available)")]
    EndpointIndexOutOfRange { index: usize, count: usize },

    #[error("Format not supported: {format}")]
    FormatNotSupported { format: String },

    #[error("Capture stream stopped: {0}")]
    StreamStopped(String),

    #[error("CPAL error: {0}")]
    Cpal(#[from] cpal::StreamError),

    #[error("Build stream error: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Play stream error: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Supported stream configs error: {0}")]
    SupportedStreamConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),
}
