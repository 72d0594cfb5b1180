#![allow(dead_code)]

use ndarray::Array2;
use skyshift_core::buffer::{LumaImage8, LumaImageF32};

/// Deterministic pseudo-random texture in [0, 255], no two seeds alike.
pub fn texture(width: usize, height: usize, seed: u64) -> LumaImageF32 {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    LumaImageF32::new(Array2::from_shape_fn((height, width), |_| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) % 256) as f32
    }))
}

/// Circular shift: pixel `(x, y)` moves to `(x + dx, y + dy)` modulo size.
pub fn toroidal_shift(image: &LumaImageF32, dx: i32, dy: i32) -> LumaImageF32 {
    let (h, w) = image.data.dim();
    let mut out = Array2::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let tx = (x as i32 + dx).rem_euclid(w as i32) as usize;
            let ty = (y as i32 + dy).rem_euclid(h as i32) as usize;
            out[[ty, tx]] = image.data[[y, x]];
        }
    }
    LumaImageF32::new(out)
}

/// Black image with one pixel set at column `x`, row `y`.
pub fn point_image(width: usize, height: usize, x: usize, y: usize, value: f32) -> LumaImageF32 {
    let mut data = Array2::zeros((height, width));
    data[[y, x]] = value;
    LumaImageF32::new(data)
}

pub fn flat_image(width: usize, height: usize, value: f32) -> LumaImageF32 {
    LumaImageF32::new(Array2::from_elem((height, width), value))
}

pub fn to_u8(image: &LumaImageF32) -> LumaImage8 {
    image.to_u8().unwrap()
}

/// Flat `background` with a 3x3 star of extra brightness `amplitude`
/// centred on column `x`, row `y` (wrapping at the edges).
pub fn star_on_background(
    width: usize,
    height: usize,
    background: f32,
    amplitude: f32,
    x: usize,
    y: usize,
) -> LumaImageF32 {
    let mut data = Array2::from_elem((height, width), background);
    for oy in 0..3 {
        for ox in 0..3 {
            let row = (y + height + oy - 1) % height;
            let col = (x + width + ox - 1) % width;
            data[[row, col]] += amplitude;
        }
    }
    LumaImageF32::new(data)
}
