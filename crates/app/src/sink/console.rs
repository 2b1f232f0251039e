use std::io::{self, Write};

use super::{SinkError, SpectrumBatch, SpectrumSink};

/// Renders both channels' spectra as an in-place console table.
///
/// The screen is cleared once, then every batch rewrites the same region by
/// homing the cursor, so a live run reads as a continuously updating table.
pub struct ConsoleSink<W: Write + Send = io::Stdout> {
    out: W,
    cleared: bool,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            cleared: false,
        }
    }
}

impl<W: Write + Send> SpectrumSink for ConsoleSink<W> {
    fn write(&mut self, batch: &SpectrumBatch<'_>) -> Result<(), SinkError> {
        if !self.cleared {
            write!(self.out, "\x1B[2J")?;
            self.cleared = true;
        }
        write!(self.out, "\x1B[H")?;

        writeln!(self.out)?;
        writeln!(
            self.out,
            "  One-Sided Power Spectrum after {:10.6} seconds (frames left: {:6})",
            batch.elapsed_secs, batch.frames_left
        )?;
        writeln!(self.out, "----------------------------------------------")?;
        writeln!(self.out, " Frequency | Index  |   Power A  |   Power B")?;
        writeln!(self.out, "----------------------------------------------")?;

        for j in batch.index_min..=batch.index_max {
            writeln!(
                self.out,
                "{:10.2} | {:6} | {:10.6} | {:10.6}",
                j as f32 * batch.frequency_step,
                j,
                batch.power_a[j],
                batch.power_b[j]
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}
