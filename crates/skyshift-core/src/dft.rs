//! Portable 2D DFT on top of `realfft`/`rustfft`.
//!
//! Forward transforms produce the packed half spectrum (`width / 2 + 1` bins
//! per row). Both planners choose algorithms heuristically, without timing
//! candidate plans, so the first call for a new size stays cheap. Plans are
//! kept by the planners and reused by later calls on the same engine.

use num_complex::Complex32;
use realfft::RealFftPlanner;
use rustfft::FftPlanner;

use crate::buffer::{try_filled, LumaImageF32, PackedSpectrum};
use crate::error::{Result, SkyshiftError};

/// Maximum sample of a real surface and its first row-major location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub value: f32,
    pub x: usize,
    pub y: usize,
}

/// Reusable forward/inverse DFT engine with plan caches.
pub struct DftEngine {
    real_planner: RealFftPlanner<f32>,
    complex_planner: FftPlanner<f32>,
}

impl Default for DftEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DftEngine {
    pub fn new() -> Self {
        Self {
            real_planner: RealFftPlanner::new(),
            complex_planner: FftPlanner::new(),
        }
    }

    /// 2D real-to-complex DFT: row-wise r2c, then column-wise complex FFT
    /// over the `width / 2 + 1` retained bins. Unnormalized.
    pub fn forward_real(&mut self, image: &LumaImageF32) -> Result<PackedSpectrum> {
        let (h, w) = image.data.dim();
        if h == 0 || w == 0 {
            return Err(SkyshiftError::InvalidArgument(format!(
                "cannot transform empty {w}x{h} image"
            )));
        }

        let mut spectrum = PackedSpectrum::zeros(w, h)?;
        let bins = spectrum.bins_per_row();

        let r2c = self.real_planner.plan_fft_forward(w);
        let mut row_in = r2c.make_input_vec();
        let mut row_out = r2c.make_output_vec();
        let mut scratch = r2c.make_scratch_vec();
        for row in 0..h {
            for (dst, &src) in row_in.iter_mut().zip(image.data.row(row)) {
                *dst = src;
            }
            r2c.process_with_scratch(&mut row_in, &mut row_out, &mut scratch)
                .map_err(|e| SkyshiftError::Backend(format!("row r2c failed: {e}")))?;
            for (dst, src) in spectrum.data.row_mut(row).iter_mut().zip(row_out.iter()) {
                *dst = *src;
            }
        }

        let fft_col = self.complex_planner.plan_fft_forward(h);
        let mut col = vec![Complex32::new(0.0, 0.0); h];
        let mut col_scratch = vec![Complex32::new(0.0, 0.0); fft_col.get_inplace_scratch_len()];
        for c in 0..bins {
            for (r, v) in col.iter_mut().enumerate() {
                *v = spectrum.data[[r, c]];
            }
            fft_col.process_with_scratch(&mut col, &mut col_scratch);
            for (r, v) in col.iter().enumerate() {
                spectrum.data[[r, c]] = *v;
            }
        }

        Ok(spectrum)
    }

    /// 2D complex-to-real inverse DFT, every sample divided by
    /// `width * height`.
    pub fn inverse_real(
        &mut self,
        spectrum: &PackedSpectrum,
        width: usize,
        height: usize,
    ) -> Result<LumaImageF32> {
        if width == 0 || height == 0 {
            return Err(SkyshiftError::InvalidArgument(format!(
                "cannot inverse-transform to empty {width}x{height} image"
            )));
        }
        let bins = width / 2 + 1;
        if spectrum.image_height() != height || spectrum.bins_per_row() != bins {
            return Err(SkyshiftError::InvalidArgument(format!(
                "spectrum shape {}x{} does not match {width}x{height} (expected {bins} bins per row)",
                spectrum.bins_per_row(),
                spectrum.image_height()
            )));
        }

        let mut work = try_filled(height, bins, Complex32::new(0.0, 0.0))?;
        work.assign(&spectrum.data);

        let ifft_col = self.complex_planner.plan_fft_inverse(height);
        let mut col = vec![Complex32::new(0.0, 0.0); height];
        let mut col_scratch =
            vec![Complex32::new(0.0, 0.0); ifft_col.get_inplace_scratch_len()];
        for c in 0..bins {
            for (r, v) in col.iter_mut().enumerate() {
                *v = work[[r, c]];
            }
            ifft_col.process_with_scratch(&mut col, &mut col_scratch);
            for (r, v) in col.iter().enumerate() {
                work[[r, c]] = *v;
            }
        }

        let mut image = LumaImageF32::zeros(width, height)?;
        let c2r = self.real_planner.plan_fft_inverse(width);
        let mut row_in = c2r.make_input_vec();
        let mut row_out = c2r.make_output_vec();
        let mut scratch = c2r.make_scratch_vec();
        let scale = 1.0 / (width as f32 * height as f32);
        for row in 0..height {
            for (dst, src) in row_in.iter_mut().zip(work.row(row)) {
                *dst = *src;
            }
            // DC and (for even widths) Nyquist bins of a real signal are
            // real; rounding leaves a residue that c2r rejects.
            row_in[0].im = 0.0;
            if width % 2 == 0 {
                row_in[bins - 1].im = 0.0;
            }
            c2r.process_with_scratch(&mut row_in, &mut row_out, &mut scratch)
                .map_err(|e| SkyshiftError::Backend(format!("row c2r failed: {e}")))?;
            for (dst, &src) in image.data.row_mut(row).iter_mut().zip(row_out.iter()) {
                *dst = src * scale;
            }
        }

        Ok(image)
    }
}

/// One-shot forward transform with a throwaway engine.
pub fn forward_real_dft(image: &LumaImageF32) -> Result<PackedSpectrum> {
    DftEngine::new().forward_real(image)
}

/// One-shot normalized inverse transform with a throwaway engine.
pub fn inverse_real_dft(
    spectrum: &PackedSpectrum,
    width: usize,
    height: usize,
) -> Result<LumaImageF32> {
    DftEngine::new().inverse_real(spectrum, width, height)
}

/// Largest sample and its location; ties keep the first row-major hit.
pub fn find_peak(image: &LumaImageF32) -> Result<Peak> {
    let (h, w) = image.data.dim();
    if h == 0 || w == 0 {
        return Err(SkyshiftError::InvalidArgument(
            "cannot search peak of empty image".into(),
        ));
    }
    Ok(scan_peak(w, h, |row, col| image.data[[row, col]]))
}

/// Row-major maximum search over any `width x height` surface.
pub(crate) fn scan_peak<F>(width: usize, height: usize, sample: F) -> Peak
where
    F: Fn(usize, usize) -> f32,
{
    let mut best = Peak {
        value: f32::NEG_INFINITY,
        x: 0,
        y: 0,
    };
    for row in 0..height {
        for col in 0..width {
            let v = sample(row, col);
            if v > best.value {
                best = Peak {
                    value: v,
                    x: col,
                    y: row,
                };
            }
        }
    }
    best
}
