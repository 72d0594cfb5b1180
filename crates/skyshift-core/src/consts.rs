/// Cross-power bins weaker than this fraction of the strongest non-DC bin
/// carry no usable phase and are zeroed instead of normalized.
pub const DEFAULT_DEGENERATE_EPSILON: f64 = 1e-10;

/// Multiple of `f32::EPSILON * |x|_2 * log2(points)` below which a spectrum
/// bin is treated as rounding noise.
pub const NOISE_FLOOR_SCALE: f64 = 4.0;

/// Smallest side length accepted by the accelerated path. Below this the
/// Nyquist ridge of the half-spectrum inverse is as tall as the true peak.
pub const MIN_ACCEL_SIDE: usize = 4;

/// Largest log2 transform length the software batch FFT will prepare.
pub const MAX_SOFTWARE_LOG2_N: u32 = 16;

/// Default extra complex elements appended to each row by the software
/// batch FFT. Zero means `step == width`.
pub const DEFAULT_SOFTWARE_ROW_PADDING: usize = 0;

/// Workgroup size of the Stockham FFT compute shader.
pub const GPU_FFT_WORKGROUP_SIZE: u32 = 256;
