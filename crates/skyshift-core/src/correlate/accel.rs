use ndarray::Array2;
use num_complex::Complex32;

use crate::accel::fft2d::inverse_transposed_half;
use crate::accel::{
    compute_forward_no_final_transpose, create_batch_backend, validate_accel_dims, ContextCache,
    ContextRole, FftContext,
};
use crate::buffer::{ensure_same_size, CorrelationResult, LumaImage8, LumaImageF32, Luminance};
use crate::config::CorrelationConfig;
use crate::consts::DEFAULT_DEGENERATE_EPSILON;
use crate::dft::scan_peak;
use crate::diagnostics::{sink_for, DebugSink, NoopSink};
use crate::error::Result;

use super::SpectrumScan;

/// Phase correlation of two square power-of-two images on the batched FFT
/// accelerator. Contexts are taken from `cache` and stay there.
///
/// The peak is normalized so that identical inputs read 1.0.
pub fn correlate_accel<L: Luminance + ?Sized>(
    cache: &mut ContextCache,
    reference: &L,
    sample: &L,
    epsilon: f64,
) -> Result<CorrelationResult> {
    correlate_into(cache, reference, sample, epsilon, &mut NoopSink)
}

fn correlate_into<L: Luminance + ?Sized>(
    cache: &mut ContextCache,
    reference: &L,
    sample: &L,
    epsilon: f64,
    sink: &mut dyn DebugSink,
) -> Result<CorrelationResult> {
    ensure_same_size(reference, sample)?;
    let n = validate_accel_dims(reference.width(), reference.height())?;

    compute_forward_no_final_transpose(cache, ContextRole::Reference, reference)?;
    compute_forward_no_final_transpose(cache, ContextRole::Sample, sample)?;
    cache.context(ContextRole::Inverse, n)?;

    let (ref_ctx, sample_ctx, inverse) = cache.correlation_contexts()?;
    write_cross_power(ref_ctx, sample_ctx, inverse, epsilon)?;
    inverse_transposed_half(inverse)?;

    // Only kx < n/2 was carried, so the real part is half the full surface
    // away from the DC and Nyquist ridges.
    let scale = 2.0 / (n * n) as f32;
    let surface = inverse.input().view();
    let peak = scan_peak(n, n, |row, col| surface.get(row, col).re);

    if sink.enabled() {
        let real = Array2::from_shape_fn((n, n), |(r, c)| surface.get(r, c).re * scale);
        if let Err(e) = sink.real("correlation", &real) {
            tracing::warn!("Debug dump of correlation surface failed: {e}");
        }
    }

    let result = CorrelationResult::from_peak(peak.value * scale, peak.x, peak.y, n, n);
    tracing::debug!(
        "Accelerated correlation {}x{}: peak={:.4} at ({}, {}) -> shift ({}, {})",
        n,
        n,
        result.peak,
        peak.x,
        peak.y,
        result.dx,
        result.dy
    );
    Ok(result)
}

/// Normalized cross-power of the two transposed half spectra into rows
/// `0..n/2` of the inverse context's `input`; rows `n/2..n` are zeroed.
fn write_cross_power(
    reference: &FftContext,
    sample: &FftContext,
    inverse: &mut FftContext,
    epsilon: f64,
) -> Result<()> {
    let n = inverse.side();
    let half = n / 2;
    let rv = reference.input().view().window(0, 0, n, half);
    let sv = sample.input().view().window(0, 0, n, half);

    let mut scan = SpectrumScan::default();
    for kx in 0..half {
        // Every carried column but DC also stands for its mirror.
        let weight = if kx == 0 { 1.0 } else { 2.0 };
        for ky in 0..n {
            scan.add(
                kx == 0 && ky == 0,
                weight,
                rv.get(kx, ky).norm() as f64,
                sv.get(kx, ky).norm() as f64,
            );
        }
    }
    let mut tally = scan.tally(n * n, epsilon);

    let dst = inverse.input_mut();
    for kx in 0..half {
        let row = dst.row_mut(kx);
        for (ky, bin) in row.iter_mut().enumerate() {
            // r: sample bin, s: reference bin, giving S * conj(R).
            let r = sv.get(kx, ky);
            let s = rv.get(kx, ky);
            let ac = r.re as f64 * s.re as f64;
            let bd = r.im as f64 * s.im as f64;
            let bc = r.im as f64 * s.re as f64;
            let ad = r.re as f64 * s.im as f64;
            let m = (ac - bd).hypot(bc + ad);
            let (re, im) = tally.normalize(
                kx == 0 && ky == 0,
                s.norm() as f64,
                r.norm() as f64,
                ac + bd,
                bc - ad,
                m,
            );
            *bin = Complex32::new(re, im);
        }
    }
    for kx in half..n {
        dst.row_mut(kx).fill(Complex32::new(0.0, 0.0));
    }

    tally.finish()
}

/// Accelerated phase correlation holding its own context cache.
pub struct AcceleratedCorrelator {
    cache: ContextCache,
    epsilon: f64,
    sink: Box<dyn DebugSink + Send>,
}

impl AcceleratedCorrelator {
    pub fn new(cache: ContextCache, epsilon: f64) -> Self {
        Self {
            cache,
            epsilon,
            sink: Box::new(NoopSink),
        }
    }

    /// Software batch FFT with default settings.
    pub fn software() -> Self {
        Self::new(ContextCache::software(), DEFAULT_DEGENERATE_EPSILON)
    }

    /// Build the configured batch backend. Fails with `HardwareUnavailable`
    /// if it cannot be reached.
    pub fn from_config(config: &CorrelationConfig) -> Result<Self> {
        let backend = create_batch_backend(&config.accelerator)?;
        Ok(Self::new(ContextCache::new(backend), config.degenerate_epsilon)
            .with_sink(sink_for(config.debug_dump_dir.as_deref())?))
    }

    pub fn with_sink(mut self, sink: Box<dyn DebugSink + Send>) -> Self {
        self.sink = sink;
        self
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ContextCache {
        &mut self.cache
    }

    /// Displacement of `sample` relative to `reference`.
    pub fn correlate(
        &mut self,
        reference: &LumaImageF32,
        sample: &LumaImageF32,
    ) -> Result<CorrelationResult> {
        correlate_into(
            &mut self.cache,
            reference,
            sample,
            self.epsilon,
            self.sink.as_mut(),
        )
    }

    /// 8-bit frames are read directly; no f32 copy is made.
    pub fn correlate_u8(
        &mut self,
        reference: &LumaImage8,
        sample: &LumaImage8,
    ) -> Result<CorrelationResult> {
        correlate_into(
            &mut self.cache,
            reference,
            sample,
            self.epsilon,
            self.sink.as_mut(),
        )
    }

    /// Release the cached contexts; later calls fail.
    pub fn teardown(&mut self) {
        self.cache.teardown();
    }
}
