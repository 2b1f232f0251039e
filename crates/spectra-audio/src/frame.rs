/// One sampling instant of the two-channel stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    pub ch_a: f32,
    pub ch_b: f32,
}

impl AudioFrame {
    pub fn new(ch_a: f32, ch_b: f32) -> Self {
        Self { ch_a, ch_b }
    }

    /// Packs an interleaved stereo slice into frames.
    ///
    /// A trailing half-frame, which cpal never delivers for a 2-channel
    /// stream, is ignored.
    pub fn from_interleaved(samples: &[f32]) -> Vec<AudioFrame> {
        samples
            .chunks_exact(2)
            .map(|pair| AudioFrame::new(pair[0], pair[1]))
            .collect()
    }
}
