mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use num_complex::Complex32;
use skyshift_core::buffer::{LumaImageF32, PackedSpectrum};
use skyshift_core::dft::{find_peak, forward_real_dft, inverse_real_dft, DftEngine};
use skyshift_core::error::SkyshiftError;

use common::{flat_image, point_image, texture};

fn assert_images_close(a: &LumaImageF32, b: &LumaImageF32, tol: f32) {
    assert_eq!(a.data.dim(), b.data.dim());
    for ((r, c), &v) in a.data.indexed_iter() {
        let w = b.data[[r, c]];
        assert!((v - w).abs() < tol, "mismatch at ({r},{c}): {v} vs {w}");
    }
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn test_round_trip_power_of_two() {
    let image = texture(32, 32, 1);
    let spectrum = forward_real_dft(&image).unwrap();
    let back = inverse_real_dft(&spectrum, 32, 32).unwrap();
    assert_images_close(&image, &back, 1e-2);
}

#[test]
fn test_round_trip_odd_sizes() {
    for &(w, h) in &[(15, 9), (33, 20), (7, 1), (1, 5)] {
        let image = texture(w, h, (w * h) as u64);
        let spectrum = forward_real_dft(&image).unwrap();
        assert_eq!(spectrum.bins_per_row(), w / 2 + 1);
        assert_eq!(spectrum.image_height(), h);
        let back = inverse_real_dft(&spectrum, w, h).unwrap();
        assert_images_close(&image, &back, 1e-2);
    }
}

#[test]
fn test_engine_reuse_across_sizes() {
    let mut engine = DftEngine::new();
    for &(w, h) in &[(16, 16), (24, 10), (16, 16)] {
        let image = texture(w, h, 7);
        let spectrum = engine.forward_real(&image).unwrap();
        let back = engine.inverse_real(&spectrum, w, h).unwrap();
        assert_images_close(&image, &back, 1e-2);
    }
}

// ---------------------------------------------------------------------------
// Spectrum contents
// ---------------------------------------------------------------------------

#[test]
fn test_dc_bin_is_sum() {
    let image = flat_image(8, 4, 2.0);
    let spectrum = forward_real_dft(&image).unwrap();
    assert_abs_diff_eq!(spectrum.data[[0, 0]].re, 64.0, epsilon = 1e-3);
    assert_abs_diff_eq!(spectrum.data[[0, 0]].im, 0.0, epsilon = 1e-3);
    for ((r, c), v) in spectrum.data.indexed_iter() {
        if (r, c) != (0, 0) {
            assert!(v.norm() < 1e-3, "bin ({r},{c}) = {v}");
        }
    }
}

#[test]
fn test_impulse_has_flat_magnitude() {
    let image = point_image(16, 8, 3, 5, 1.0);
    let spectrum = forward_real_dft(&image).unwrap();
    for v in spectrum.data.iter() {
        assert_abs_diff_eq!(v.norm(), 1.0, epsilon = 1e-5);
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn test_forward_empty_image_rejected() {
    let image = LumaImageF32::new(Array2::zeros((0, 4)));
    assert!(matches!(
        forward_real_dft(&image),
        Err(SkyshiftError::InvalidArgument(_))
    ));
}

#[test]
fn test_inverse_shape_mismatch_rejected() {
    let spectrum = PackedSpectrum::zeros(16, 8).unwrap();
    assert!(matches!(
        inverse_real_dft(&spectrum, 16, 9),
        Err(SkyshiftError::InvalidArgument(_))
    ));
    assert!(matches!(
        inverse_real_dft(&spectrum, 20, 8),
        Err(SkyshiftError::InvalidArgument(_))
    ));
}

#[test]
fn test_packed_spectrum_column_check() {
    let data = Array2::from_elem((4, 3), Complex32::new(0.0, 0.0));
    assert!(PackedSpectrum::from_array(data.clone(), 4).is_ok());
    assert!(PackedSpectrum::from_array(data.clone(), 5).is_ok());
    assert!(PackedSpectrum::from_array(data, 8).is_err());
}

// ---------------------------------------------------------------------------
// Peak search
// ---------------------------------------------------------------------------

#[test]
fn test_find_peak_location() {
    let image = point_image(10, 6, 7, 4, 9.0);
    let peak = find_peak(&image).unwrap();
    assert_eq!((peak.x, peak.y), (7, 4));
    assert_eq!(peak.value, 9.0);
}

#[test]
fn test_find_peak_first_occurrence_wins() {
    let mut data = Array2::zeros((4, 4));
    data[[2, 1]] = 5.0;
    data[[1, 3]] = 5.0;
    data[[3, 0]] = 5.0;
    let peak = find_peak(&LumaImageF32::new(data)).unwrap();
    assert_eq!((peak.x, peak.y), (3, 1));
}

#[test]
fn test_find_peak_all_negative() {
    let image = flat_image(3, 3, -2.0);
    let peak = find_peak(&image).unwrap();
    assert_eq!((peak.x, peak.y, peak.value), (0, 0, -2.0));
}

#[test]
fn test_find_peak_empty_rejected() {
    let image = LumaImageF32::new(Array2::zeros((3, 0)));
    assert!(matches!(
        find_peak(&image),
        Err(SkyshiftError::InvalidArgument(_))
    ));
}
