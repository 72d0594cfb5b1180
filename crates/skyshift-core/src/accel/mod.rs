//! Accelerated 2D FFT built on a batched 1D FFT primitive.

pub mod backend;
pub mod cache;
pub mod context;
pub mod fft2d;
pub mod transpose;
#[cfg(feature = "gpu")]
pub mod wgpu_backend;

pub use backend::{
    create_batch_backend, BatchFftBackend, BatchFftKernel, BatchShape, FftDirection,
    SoftwareBatchFft,
};
pub use cache::{CacheState, ContextCache, ContextRole};
pub use context::FftContext;
pub use fft2d::{compute_forward, compute_forward_no_final_transpose, validate_accel_dims};
pub use transpose::{transpose_square_left_half_up, transpose_square_upper_half_back};
#[cfg(feature = "gpu")]
pub use wgpu_backend::WgpuBatchFft;
