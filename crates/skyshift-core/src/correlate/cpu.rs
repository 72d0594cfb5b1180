use num_complex::Complex32;

use crate::buffer::{ensure_same_size, CorrelationResult, LumaImage8, LumaImageF32, PackedSpectrum};
use crate::config::CorrelationConfig;
use crate::consts::DEFAULT_DEGENERATE_EPSILON;
use crate::dft::{find_peak, DftEngine};
use crate::diagnostics::{sink_for, DebugSink, NoopSink};
use crate::error::{Result, SkyshiftError};

use super::SpectrumScan;

/// Phase correlation on the portable DFT engine.
///
/// Holds its engine between calls so consecutive frames of the same size
/// reuse FFT plans.
pub struct CpuCorrelator {
    engine: DftEngine,
    epsilon: f64,
    sink: Box<dyn DebugSink + Send>,
}

impl Default for CpuCorrelator {
    fn default() -> Self {
        Self::new(DEFAULT_DEGENERATE_EPSILON)
    }
}

impl CpuCorrelator {
    pub fn new(epsilon: f64) -> Self {
        Self {
            engine: DftEngine::new(),
            epsilon,
            sink: Box::new(NoopSink),
        }
    }

    pub fn from_config(config: &CorrelationConfig) -> Result<Self> {
        Ok(Self::new(config.degenerate_epsilon)
            .with_sink(sink_for(config.debug_dump_dir.as_deref())?))
    }

    pub fn with_sink(mut self, sink: Box<dyn DebugSink + Send>) -> Self {
        self.sink = sink;
        self
    }

    /// Displacement of `sample` relative to `reference`.
    pub fn correlate(
        &mut self,
        reference: &LumaImageF32,
        sample: &LumaImageF32,
    ) -> Result<CorrelationResult> {
        ensure_same_size(reference, sample)?;
        let (h, w) = reference.data.dim();

        let ref_spectrum = self.engine.forward_real(reference)?;
        let sample_spectrum = self.engine.forward_real(sample)?;
        let cross = cross_power_spectrum(&ref_spectrum, &sample_spectrum, self.epsilon)?;
        if let Err(e) = self.sink.complex("cross-power", &cross.data) {
            tracing::warn!("Debug dump of cross-power spectrum failed: {e}");
        }

        let surface = self.engine.inverse_real(&cross, w, h)?;
        if let Err(e) = self.sink.real("correlation", &surface.data) {
            tracing::warn!("Debug dump of correlation surface failed: {e}");
        }

        let peak = find_peak(&surface)?;
        let result = CorrelationResult::from_peak(peak.value, peak.x, peak.y, w, h);
        tracing::debug!(
            "CPU correlation {}x{}: peak={:.4} at ({}, {}) -> shift ({}, {})",
            w,
            h,
            result.peak,
            peak.x,
            peak.y,
            result.dx,
            result.dy
        );
        Ok(result)
    }

    /// Same as [`correlate`](Self::correlate) for 8-bit frames.
    pub fn correlate_u8(
        &mut self,
        reference: &LumaImage8,
        sample: &LumaImage8,
    ) -> Result<CorrelationResult> {
        ensure_same_size(reference, sample)?;
        self.correlate(&reference.to_f32()?, &sample.to_f32()?)
    }
}

/// One-shot CPU phase correlation with default settings.
pub fn correlate(reference: &LumaImageF32, sample: &LumaImageF32) -> Result<CorrelationResult> {
    CpuCorrelator::default().correlate(reference, sample)
}

/// Normalized cross-power spectrum `S * conj(R)`, bin by bin.
///
/// Bins lost in rounding noise, or weaker than `epsilon` times the strongest
/// non-DC bin, are zeroed; if that leaves nothing but DC the call fails with
/// `Degenerate`.
pub fn cross_power_spectrum(
    reference: &PackedSpectrum,
    sample: &PackedSpectrum,
    epsilon: f64,
) -> Result<PackedSpectrum> {
    if reference.data.dim() != sample.data.dim()
        || reference.image_width() != sample.image_width()
    {
        return Err(SkyshiftError::InvalidArgument(format!(
            "spectrum shapes differ: {:?} vs {:?}",
            reference.data.dim(),
            sample.data.dim()
        )));
    }
    let (h, w) = (reference.image_height(), reference.image_width());
    let mut out = PackedSpectrum::zeros(w, h)?;

    // Columns 1..ceil(w/2) stand for their conjugate mirror as well.
    let weight = |col: usize| if col == 0 || 2 * col == w { 1.0 } else { 2.0 };
    let mut scan = SpectrumScan::default();
    for (((row, col), r), s) in reference.data.indexed_iter().zip(sample.data.iter()) {
        scan.add(
            row == 0 && col == 0,
            weight(col),
            r.norm() as f64,
            s.norm() as f64,
        );
    }
    let mut tally = scan.tally(w * h, epsilon);

    for ((dst, r), s) in out
        .data
        .indexed_iter_mut()
        .zip(reference.data.iter())
        .zip(sample.data.iter())
    {
        let ((row, col), bin) = dst;
        let (rr, ri) = (r.re as f64, r.im as f64);
        let (sr, si) = (s.re as f64, s.im as f64);
        let cr = sr * rr - si * (-ri);
        let ci = sr * (-ri) + si * rr;
        let m = cr.hypot(ci);
        let (re, im) = tally.normalize(
            row == 0 && col == 0,
            rr.hypot(ri),
            sr.hypot(si),
            cr,
            ci,
            m,
        );
        *bin = Complex32::new(re, im);
    }

    tally.finish()?;
    Ok(out)
}
