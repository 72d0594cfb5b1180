use std::sync::Arc;

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use crate::config::{AcceleratorConfig, AcceleratorKind};
use crate::consts::MAX_SOFTWARE_LOG2_N;
use crate::error::{Result, SkyshiftError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FftDirection {
    Forward,
    Inverse,
}

/// A batch of `batch` independent 1D transforms of length `2^log2_n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchShape {
    pub log2_n: u32,
    pub batch: usize,
    pub direction: FftDirection,
}

impl BatchShape {
    pub fn len(&self) -> usize {
        1usize << self.log2_n
    }

    pub fn is_empty(&self) -> bool {
        self.batch == 0
    }
}

/// A prepared batched 1D FFT.
///
/// Row `b` of a batch starts at element `b * step()` of both buffers. Each
/// call transforms the first `rows` rows of `input` into the matching rows
/// of `output`, unnormalized in both directions. Padding elements between
/// `len()` and `step()` are neither read nor written.
pub trait BatchFftKernel: Send {
    fn shape(&self) -> BatchShape;
    fn step(&self) -> usize;
    fn execute(&mut self, input: &[Complex32], output: &mut [Complex32], rows: usize)
        -> Result<()>;
}

/// Source of batched FFT kernels: the accelerator boundary.
pub trait BatchFftBackend: Send {
    fn name(&self) -> &str;

    fn is_hardware(&self) -> bool {
        false
    }

    /// Acquire whatever the accelerator needs for `shape`. Fails with
    /// `HardwareUnavailable` when the size is unsupported or the device
    /// cannot be reached.
    fn prepare(&self, shape: BatchShape) -> Result<Box<dyn BatchFftKernel>>;
}

/// Validate the slices handed to a kernel.
pub(crate) fn check_batch_buffers(
    shape: BatchShape,
    step: usize,
    input: &[Complex32],
    output: &[Complex32],
    rows: usize,
) -> Result<()> {
    if rows > shape.batch {
        return Err(SkyshiftError::InvalidArgument(format!(
            "{rows} rows requested from a batch of {}",
            shape.batch
        )));
    }
    let needed = step * rows;
    if input.len() < needed || output.len() < needed {
        return Err(SkyshiftError::InvalidArgument(format!(
            "batch buffers hold {}/{} elements, need {needed}",
            input.len(),
            output.len()
        )));
    }
    Ok(())
}

/// Batched FFT emulated with rustfft, with the same buffer contract as a
/// hardware kernel.
#[derive(Clone, Debug, Default)]
pub struct SoftwareBatchFft {
    row_padding: usize,
}

impl SoftwareBatchFft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows are `len + row_padding` elements apart.
    pub fn with_row_padding(row_padding: usize) -> Self {
        Self { row_padding }
    }
}

impl BatchFftBackend for SoftwareBatchFft {
    fn name(&self) -> &str {
        "Software/rustfft"
    }

    fn prepare(&self, shape: BatchShape) -> Result<Box<dyn BatchFftKernel>> {
        if shape.log2_n > MAX_SOFTWARE_LOG2_N {
            return Err(SkyshiftError::HardwareUnavailable(format!(
                "log2_n={} not supported, try at most {MAX_SOFTWARE_LOG2_N}",
                shape.log2_n
            )));
        }
        let mut planner = FftPlanner::new();
        let fft = match shape.direction {
            FftDirection::Forward => planner.plan_fft_forward(shape.len()),
            FftDirection::Inverse => planner.plan_fft_inverse(shape.len()),
        };
        let scratch = vec![Complex32::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Ok(Box::new(SoftwareKernel {
            fft,
            shape,
            step: shape.len() + self.row_padding,
            scratch,
        }))
    }
}

struct SoftwareKernel {
    fft: Arc<dyn Fft<f32>>,
    shape: BatchShape,
    step: usize,
    scratch: Vec<Complex32>,
}

impl BatchFftKernel for SoftwareKernel {
    fn shape(&self) -> BatchShape {
        self.shape
    }

    fn step(&self) -> usize {
        self.step
    }

    fn execute(
        &mut self,
        input: &[Complex32],
        output: &mut [Complex32],
        rows: usize,
    ) -> Result<()> {
        check_batch_buffers(self.shape, self.step, input, output, rows)?;
        let n = self.shape.len();
        for b in 0..rows {
            let start = b * self.step;
            let dst = &mut output[start..start + n];
            dst.copy_from_slice(&input[start..start + n]);
            self.fft.process_with_scratch(dst, &mut self.scratch);
        }
        Ok(())
    }
}

/// Backend selected by configuration.
pub fn create_batch_backend(config: &AcceleratorConfig) -> Result<Box<dyn BatchFftBackend>> {
    match config.kind {
        AcceleratorKind::Software => {
            Ok(Box::new(SoftwareBatchFft::with_row_padding(config.row_padding)))
        }
        #[cfg(feature = "gpu")]
        AcceleratorKind::Gpu => Ok(Box::new(super::wgpu_backend::WgpuBatchFft::new()?)),
        #[cfg(not(feature = "gpu"))]
        AcceleratorKind::Gpu => Err(SkyshiftError::HardwareUnavailable(
            "built without the `gpu` feature".into(),
        )),
    }
}
