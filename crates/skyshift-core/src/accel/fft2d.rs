//! 2D FFT assembled from the batched row primitive.
//!
//! Forward: rows, then a left-half-up transpose so the column pass runs as a
//! row pass over `n/2` rows. The result stays transposed unless
//! [`compute_forward`] is asked to turn it back.

use crate::buffer::Luminance;
use crate::consts::MIN_ACCEL_SIDE;
use crate::error::{Result, SkyshiftError};

use super::cache::{ContextCache, ContextRole};
use super::context::FftContext;
use super::transpose::{transpose_square_left_half_up, transpose_square_upper_half_back};

/// Side length of a `width x height` image the accelerated path can take:
/// square, a power of two, at least [`MIN_ACCEL_SIDE`].
pub fn validate_accel_dims(width: usize, height: usize) -> Result<usize> {
    if width != height {
        return Err(SkyshiftError::InvalidArgument(format!(
            "accelerated path needs a square image, got {width}x{height}"
        )));
    }
    if width < MIN_ACCEL_SIDE || !width.is_power_of_two() {
        return Err(SkyshiftError::InvalidArgument(format!(
            "accelerated path needs a power-of-two side >= {MIN_ACCEL_SIDE}, got {width}"
        )));
    }
    Ok(width)
}

fn forward_context<'a, L: Luminance + ?Sized>(
    cache: &'a mut ContextCache,
    role: ContextRole,
    image: &L,
) -> Result<&'a mut FftContext> {
    if role == ContextRole::Inverse {
        return Err(SkyshiftError::InvalidArgument(
            "the inverse context cannot run a forward transform".into(),
        ));
    }
    let side = validate_accel_dims(image.width(), image.height())?;
    let ctx = cache.context(role, side)?;
    let half = side / 2;

    ctx.load(image)?;
    ctx.execute()?;
    transpose_square_left_half_up(&mut ctx.output_mut().view_mut());
    ctx.promote_output();
    ctx.execute_rows(half)?;
    ctx.promote_output();
    Ok(ctx)
}

/// Forward 2D FFT of `image` in the context bound to `role`, left transposed.
///
/// Afterwards row `kx` of the context's `input`, for `kx < n/2`, holds
/// spectrum column `kx`: element `ky` is `F[ky][kx]`. Rows `n/2..n` are zero.
pub fn compute_forward_no_final_transpose<'a, L: Luminance + ?Sized>(
    cache: &'a mut ContextCache,
    role: ContextRole,
    image: &L,
) -> Result<&'a FftContext> {
    let ctx: &'a FftContext = forward_context(cache, role, image)?;
    Ok(ctx)
}

/// Forward 2D FFT in natural orientation: columns `0..n/2` of the context's
/// `input` hold the left half of the spectrum, columns `n/2..n` are zero.
pub fn compute_forward<'a, L: Luminance + ?Sized>(
    cache: &'a mut ContextCache,
    role: ContextRole,
    image: &L,
) -> Result<&'a FftContext> {
    let ctx = forward_context(cache, role, image)?;
    transpose_square_upper_half_back(&mut ctx.input_mut().view_mut());
    let ctx: &'a FftContext = ctx;
    Ok(ctx)
}

/// Inverse of the transposed cross-power half spectrum sitting in the
/// inverse context's `input`: column pass, transpose back, row pass. The
/// complex surface ends in `input`.
pub(crate) fn inverse_transposed_half(ctx: &mut FftContext) -> Result<()> {
    let half = ctx.side() / 2;
    ctx.execute_rows(half)?;
    transpose_square_upper_half_back(&mut ctx.output_mut().view_mut());
    ctx.promote_output();
    ctx.execute()?;
    ctx.promote_output();
    Ok(())
}
