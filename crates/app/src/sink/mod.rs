pub mod console;
pub mod csv;

pub use console::ConsoleSink;
pub use csv::CsvSink;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// One processed batch handed from the processing loop to a sink.
///
/// `power_a`/`power_b` are the full one-sided spectra; sinks report only the
/// `index_min..=index_max` window, which is already clamped to the spectrum.
pub struct SpectrumBatch<'a> {
    pub batch_index: u64,
    pub elapsed_secs: f64,
    pub frequency_step: f32,
    pub index_min: usize,
    pub index_max: usize,
    pub frames_left: usize,
    pub power_a: &'a [f32],
    pub power_b: &'a [f32],
}

/// Consumer of per-batch spectrum results.
///
/// Console and file implementations are interchangeable behind this
/// contract; the processing loop does not know which one it drives.
pub trait SpectrumSink: Send {
    fn write(&mut self, batch: &SpectrumBatch<'_>) -> Result<(), SinkError>;

    /// Called once after the last batch, on the success path.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
