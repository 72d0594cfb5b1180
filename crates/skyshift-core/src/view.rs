//! Strided 2D buffers and bounds-checked views over them.
//!
//! Accelerator buffers are laid out with a row stride (`step`) that can exceed
//! the logical row width. All element access goes through a view that knows
//! the logical extent, so a row walk can never spill into the padding or the
//! next row.

use ndarray::Array2;
use num_complex::Complex32;

use crate::error::{Result, SkyshiftError};

/// Owned complex buffer of `height` rows, each `step` elements long, of which
/// the first `width` are meaningful.
#[derive(Clone, Debug)]
pub struct StridedBuffer {
    data: Vec<Complex32>,
    width: usize,
    height: usize,
    step: usize,
}

impl StridedBuffer {
    pub fn zeros(width: usize, height: usize, step: usize) -> Result<Self> {
        if step < width {
            return Err(SkyshiftError::InvalidArgument(format!(
                "row step {step} is smaller than width {width}"
            )));
        }
        let len = step.checked_mul(height).ok_or_else(|| {
            SkyshiftError::ResourceExhausted(format!("{step}x{height} overflows usize"))
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            SkyshiftError::ResourceExhausted(format!("strided buffer {step}x{height}: {e}"))
        })?;
        data.resize(len, Complex32::new(0.0, 0.0));
        Ok(Self {
            data,
            width,
            height,
            step,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Whole physical storage, padding included.
    pub fn as_slice(&self) -> &[Complex32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Complex32] {
        &mut self.data
    }

    /// Logical part of row `row`.
    pub fn row(&self, row: usize) -> &[Complex32] {
        assert!(row < self.height, "row {row} out of range ({})", self.height);
        let start = row * self.step;
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [Complex32] {
        assert!(row < self.height, "row {row} out of range ({})", self.height);
        let start = row * self.step;
        &mut self.data[start..start + self.width]
    }

    pub fn fill_zero(&mut self) {
        self.data.fill(Complex32::new(0.0, 0.0));
    }

    pub fn view(&self) -> StridedView<'_, Complex32> {
        StridedView::new(&self.data, 0, self.width, self.height, self.step)
    }

    pub fn view_mut(&mut self) -> StridedViewMut<'_, Complex32> {
        StridedViewMut::new(&mut self.data, 0, self.width, self.height, self.step)
    }

    /// Copy the logical `height x width` region into a dense array.
    pub fn to_array(&self) -> Array2<Complex32> {
        Array2::from_shape_fn((self.height, self.width), |(r, c)| {
            self.data[r * self.step + c]
        })
    }
}

fn checked_extent(len: usize, offset: usize, width: usize, height: usize, stride: usize) {
    assert!(stride >= width, "stride {stride} < width {width}");
    if height > 0 && width > 0 {
        let last = offset + (height - 1) * stride + width;
        assert!(last <= len, "view end {last} past buffer length {len}");
    }
}

/// Read-only window of `height x width` elements starting at `offset`, rows
/// `stride` elements apart.
#[derive(Clone, Copy, Debug)]
pub struct StridedView<'a, T> {
    data: &'a [T],
    offset: usize,
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T: Copy> StridedView<'a, T> {
    pub fn new(data: &'a [T], offset: usize, width: usize, height: usize, stride: usize) -> Self {
        checked_extent(data.len(), offset, width, height, stride);
        Self {
            data,
            offset,
            width,
            height,
            stride,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[self.index(row, col)]
    }

    pub fn try_get(&self, row: usize, col: usize) -> Option<T> {
        (row < self.height && col < self.width)
            .then(|| self.data[self.offset + row * self.stride + col])
    }

    /// Sub-window `height x width` whose top-left corner is `(row, col)`.
    pub fn window(&self, row: usize, col: usize, width: usize, height: usize) -> StridedView<'a, T> {
        assert!(
            row + height <= self.height && col + width <= self.width,
            "window {width}x{height}+{col}+{row} exceeds {}x{}",
            self.width,
            self.height
        );
        StridedView::new(
            self.data,
            self.offset + row * self.stride + col,
            width,
            height,
            self.stride,
        )
    }

    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.height && col < self.width,
            "({row}, {col}) outside {}x{} view",
            self.width,
            self.height
        );
        self.offset + row * self.stride + col
    }
}

/// Mutable counterpart of [`StridedView`].
#[derive(Debug)]
pub struct StridedViewMut<'a, T> {
    data: &'a mut [T],
    offset: usize,
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T: Copy> StridedViewMut<'a, T> {
    pub fn new(
        data: &'a mut [T],
        offset: usize,
        width: usize,
        height: usize,
        stride: usize,
    ) -> Self {
        checked_extent(data.len(), offset, width, height, stride);
        Self {
            data,
            offset,
            width,
            height,
            stride,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        let i = self.index(row, col);
        self.data[i] = value;
    }

    /// Exchange two elements of the view.
    pub fn swap(&mut self, a: (usize, usize), b: (usize, usize)) {
        let ia = self.index(a.0, a.1);
        let ib = self.index(b.0, b.1);
        self.data.swap(ia, ib);
    }

    /// Set every element of the `height x width` block at `(row, col)`.
    pub fn fill_block(&mut self, row: usize, col: usize, width: usize, height: usize, value: T) {
        for r in row..row + height {
            for c in col..col + width {
                self.set(r, c, value);
            }
        }
    }

    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView::new(self.data, self.offset, self.width, self.height, self.stride)
    }

    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.height && col < self.width,
            "({row}, {col}) outside {}x{} view",
            self.width,
            self.height
        );
        self.offset + row * self.stride + col
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_excludes_padding() {
        let mut buf = StridedBuffer::zeros(3, 2, 5).unwrap();
        buf.as_mut_slice()[3] = Complex32::new(9.0, 0.0);
        assert_eq!(buf.row(0).len(), 3);
        assert!(buf.row(0).iter().all(|v| v.re == 0.0));
    }

    #[test]
    fn test_window_addresses_parent() {
        let data: Vec<u32> = (0..20).collect();
        let view = StridedView::new(&data, 0, 4, 4, 5);
        let win = view.window(1, 2, 2, 2);
        assert_eq!(win.get(0, 0), 7);
        assert_eq!(win.get(1, 1), 13);
        assert_eq!(win.try_get(2, 0), None);
    }

    #[test]
    #[should_panic]
    fn test_get_past_width_panics() {
        let data = vec![0u8; 12];
        let view = StridedView::new(&data, 0, 3, 3, 4);
        view.get(0, 3);
    }

    #[test]
    fn test_step_smaller_than_width_rejected() {
        assert!(StridedBuffer::zeros(8, 8, 4).is_err());
    }
}
