pub mod pipeline;
pub mod runtime;
pub mod sink;

pub use pipeline::{PipelineContext, ProcessingError, ProcessingThread};
pub use sink::{SinkError, SpectrumBatch, SpectrumSink};
