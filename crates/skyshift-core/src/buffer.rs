use ndarray::Array2;
use num_complex::Complex32;

use crate::error::{Result, SkyshiftError};

/// Allocate a `height x width` array filled with `fill`, reporting allocation
/// failure as an error instead of aborting.
pub(crate) fn try_filled<T: Clone>(height: usize, width: usize, fill: T) -> Result<Array2<T>> {
    let len = height.checked_mul(width).ok_or_else(|| {
        SkyshiftError::ResourceExhausted(format!("{width}x{height} overflows usize"))
    })?;
    let mut storage = Vec::new();
    storage.try_reserve_exact(len).map_err(|e| {
        SkyshiftError::ResourceExhausted(format!("cannot allocate {width}x{height}: {e}"))
    })?;
    storage.resize(len, fill);
    Array2::from_shape_vec((height, width), storage)
        .map_err(|e| SkyshiftError::InvalidArgument(e.to_string()))
}

/// Anything that can be read as a single-channel luminance grid.
pub trait Luminance {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Sample value at `(row, col)` as f32. Panics when out of range.
    fn value_at(&self, row: usize, col: usize) -> f32;

    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// 8-bit grayscale image, row-major, shape = (height, width).
#[derive(Clone, Debug, PartialEq)]
pub struct LumaImage8 {
    pub data: Array2<u8>,
}

impl LumaImage8 {
    pub fn new(data: Array2<u8>) -> Self {
        Self { data }
    }

    pub fn zeros(width: usize, height: usize) -> Result<Self> {
        Ok(Self::new(try_filled(height, width, 0u8)?))
    }

    /// Wrap a row-major byte buffer without padding.
    pub fn from_raw(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        let data = Array2::from_shape_vec((height, width), pixels).map_err(|e| {
            SkyshiftError::InvalidArgument(format!("{width}x{height} buffer: {e}"))
        })?;
        Ok(Self::new(data))
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Element-wise cast to f32, no scaling.
    pub fn to_f32(&self) -> Result<LumaImageF32> {
        let mut out = try_filled(self.height(), self.width(), 0.0f32)?;
        out.zip_mut_with(&self.data, |dst, &src| *dst = src as f32);
        Ok(LumaImageF32::new(out))
    }
}

impl Luminance for LumaImage8 {
    fn width(&self) -> usize {
        self.data.ncols()
    }

    fn height(&self) -> usize {
        self.data.nrows()
    }

    fn value_at(&self, row: usize, col: usize) -> f32 {
        self.data[[row, col]] as f32
    }
}

/// Floating-point grayscale image, row-major, shape = (height, width).
/// Values are raw sample intensities, not normalized to [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct LumaImageF32 {
    pub data: Array2<f32>,
}

impl LumaImageF32 {
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(width: usize, height: usize) -> Result<Self> {
        Ok(Self::new(try_filled(height, width, 0.0f32)?))
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Convert back to 8-bit: clamp to [0, 255], round half up.
    /// Negative values and NaN map to 0.
    pub fn to_u8(&self) -> Result<LumaImage8> {
        let mut out = try_filled(self.height(), self.width(), 0u8)?;
        out.zip_mut_with(&self.data, |dst, &src| *dst = quantize(src));
        Ok(LumaImage8::new(out))
    }
}

impl Luminance for LumaImageF32 {
    fn width(&self) -> usize {
        self.data.ncols()
    }

    fn height(&self) -> usize {
        self.data.nrows()
    }

    fn value_at(&self, row: usize, col: usize) -> f32 {
        self.data[[row, col]]
    }
}

fn quantize(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 255.0) + 0.5).floor().min(255.0) as u8
}

/// Conjugate-symmetric half spectrum of a real `width x height` image:
/// `height` rows of `width / 2 + 1` complex bins.
#[derive(Clone, Debug)]
pub struct PackedSpectrum {
    pub data: Array2<Complex32>,
    image_width: usize,
}

impl PackedSpectrum {
    pub fn zeros(image_width: usize, image_height: usize) -> Result<Self> {
        let data = try_filled(image_height, image_width / 2 + 1, Complex32::new(0.0, 0.0))?;
        Ok(Self { data, image_width })
    }

    /// Wrap existing bins. `data` must have shape `(h, image_width / 2 + 1)`.
    pub fn from_array(data: Array2<Complex32>, image_width: usize) -> Result<Self> {
        if data.ncols() != image_width / 2 + 1 {
            return Err(SkyshiftError::InvalidArgument(format!(
                "packed spectrum has {} columns, expected {} for width {image_width}",
                data.ncols(),
                image_width / 2 + 1
            )));
        }
        Ok(Self { data, image_width })
    }

    pub fn image_width(&self) -> usize {
        self.image_width
    }

    pub fn image_height(&self) -> usize {
        self.data.nrows()
    }

    /// Number of stored bins per row (`width / 2 + 1`).
    pub fn bins_per_row(&self) -> usize {
        self.data.ncols()
    }
}

/// Outcome of one phase correlation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CorrelationResult {
    /// Correlation peak height; 1.0 for a perfect match.
    pub peak: f32,
    /// Horizontal displacement of the sample relative to the reference,
    /// in [-width/2, width/2).
    pub dx: i32,
    /// Vertical displacement, in [-height/2, height/2).
    pub dy: i32,
}

impl CorrelationResult {
    /// Build a result from a raw peak location in the correlation surface,
    /// folding indices past the half-size into negative displacements.
    pub fn from_peak(peak: f32, x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            peak,
            dx: fold_index(x, width),
            dy: fold_index(y, height),
        }
    }
}

/// Map a transform-domain index to a signed displacement.
pub fn fold_index(index: usize, dim: usize) -> i32 {
    if index >= dim / 2 {
        index as i32 - dim as i32
    } else {
        index as i32
    }
}

/// Both images must share width and height and be non-empty.
pub(crate) fn ensure_same_size<A, B>(reference: &A, sample: &B) -> Result<()>
where
    A: Luminance + ?Sized,
    B: Luminance + ?Sized,
{
    if reference.is_empty() || sample.is_empty() {
        return Err(SkyshiftError::InvalidArgument(format!(
            "empty image ({}x{} vs {}x{})",
            reference.width(),
            reference.height(),
            sample.width(),
            sample.height()
        )));
    }
    if reference.width() != sample.width() || reference.height() != sample.height() {
        return Err(SkyshiftError::InvalidArgument(format!(
            "image size mismatch: {}x{} vs {}x{}",
            reference.width(),
            reference.height(),
            sample.width(),
            sample.height()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_rounds_half_up() {
        assert_eq!(quantize(0.5), 1);
        assert_eq!(quantize(1.49), 1);
        assert_eq!(quantize(254.5), 255);
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize(-3.0), 0);
        assert_eq!(quantize(300.0), 255);
        assert_eq!(quantize(f32::NAN), 0);
        assert_eq!(quantize(f32::INFINITY), 255);
    }

    #[test]
    fn test_fold_index() {
        assert_eq!(fold_index(0, 64), 0);
        assert_eq!(fold_index(31, 64), 31);
        assert_eq!(fold_index(32, 64), -32);
        assert_eq!(fold_index(63, 64), -1);
        // Odd sizes fold at floor(dim / 2).
        assert_eq!(fold_index(2, 5), -3);
        assert_eq!(fold_index(1, 5), 1);
    }
}
