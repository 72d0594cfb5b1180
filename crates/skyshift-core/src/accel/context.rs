//! One prepared batched FFT plus its two buffers.
//!
//! Buffer contract:
//! * [`FftContext::execute_rows`] reads `input` and writes `output`; `input`
//!   is left untouched.
//! * [`FftContext::promote_output`] swaps the two, so the latest result
//!   becomes the `input` of the next pass and the old input becomes scratch.
//!
//! Every pipeline in this crate ends with a promote, so after it returns the
//! valid data is always in `input`.

use num_complex::Complex32;

use crate::buffer::Luminance;
use crate::error::{Result, SkyshiftError};
use crate::view::StridedBuffer;

use super::backend::{BatchFftBackend, BatchFftKernel, BatchShape, FftDirection};

pub struct FftContext {
    kernel: Box<dyn BatchFftKernel>,
    input: StridedBuffer,
    output: StridedBuffer,
    executions: u64,
}

impl FftContext {
    /// Prepare a `side x side` context: `side` transforms of length `side`.
    /// `side` must be a power of two.
    pub fn new(backend: &dyn BatchFftBackend, side: usize, direction: FftDirection) -> Result<Self> {
        if side == 0 || !side.is_power_of_two() {
            return Err(SkyshiftError::InvalidArgument(format!(
                "context side {side} is not a power of two"
            )));
        }
        let shape = BatchShape {
            log2_n: side.trailing_zeros(),
            batch: side,
            direction,
        };
        let kernel = backend.prepare(shape)?;
        let step = kernel.step();
        let input = StridedBuffer::zeros(side, side, step)?;
        let output = StridedBuffer::zeros(side, side, step)?;
        Ok(Self {
            kernel,
            input,
            output,
            executions: 0,
        })
    }

    pub fn side(&self) -> usize {
        self.kernel.shape().len()
    }

    pub fn direction(&self) -> FftDirection {
        self.kernel.shape().direction
    }

    pub fn step(&self) -> usize {
        self.kernel.step()
    }

    /// Number of execute calls since creation.
    pub fn executions(&self) -> u64 {
        self.executions
    }

    pub fn input(&self) -> &StridedBuffer {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut StridedBuffer {
        &mut self.input
    }

    pub fn output(&self) -> &StridedBuffer {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut StridedBuffer {
        &mut self.output
    }

    /// Fill `input` with `image`: real part = sample, imaginary part = 0.
    pub fn load<L: Luminance + ?Sized>(&mut self, image: &L) -> Result<()> {
        let side = self.side();
        if image.width() != side || image.height() != side {
            return Err(SkyshiftError::InvalidArgument(format!(
                "{}x{} image does not fit a {side}x{side} context",
                image.width(),
                image.height()
            )));
        }
        for row in 0..side {
            for (col, bin) in self.input.row_mut(row).iter_mut().enumerate() {
                *bin = Complex32::new(image.value_at(row, col), 0.0);
            }
        }
        Ok(())
    }

    /// Transform every row of `input` into `output`.
    pub fn execute(&mut self) -> Result<()> {
        self.execute_rows(self.side())
    }

    /// Transform the first `rows` rows of `input` into `output`; the
    /// remaining output rows are zeroed.
    pub fn execute_rows(&mut self, rows: usize) -> Result<()> {
        let side = self.side();
        self.kernel
            .execute(self.input.as_slice(), self.output.as_mut_slice(), rows)?;
        for row in rows.min(side)..side {
            self.output.row_mut(row).fill(Complex32::new(0.0, 0.0));
        }
        self.executions += 1;
        Ok(())
    }

    pub fn promote_output(&mut self) {
        std::mem::swap(&mut self.input, &mut self.output);
    }
}

impl std::fmt::Debug for FftContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftContext")
            .field("shape", &self.kernel.shape())
            .field("step", &self.kernel.step())
            .field("executions", &self.executions)
            .finish()
    }
}
