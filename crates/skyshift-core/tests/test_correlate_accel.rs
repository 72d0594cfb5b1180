mod common;

use approx::assert_abs_diff_eq;
use skyshift_core::accel::{ContextCache, SoftwareBatchFft};
use skyshift_core::config::CorrelationConfig;
use skyshift_core::correlate::{correlate, correlate_accel, AcceleratedCorrelator};
use skyshift_core::error::SkyshiftError;

use common::{flat_image, point_image, star_on_background, texture, to_u8, toroidal_shift};

const EPS: f64 = 1e-10;

#[test]
fn test_identity_peak_at_origin() {
    let mut cache = ContextCache::software();
    let image = texture(32, 32, 3);
    let result = correlate_accel(&mut cache, &image, &image, EPS).unwrap();
    assert_eq!((result.dx, result.dy), (0, 0));
    assert_abs_diff_eq!(result.peak, 1.0, epsilon = 1e-3);
}

#[test]
fn test_shift_recovered() {
    let mut cache = ContextCache::software();
    let reference = texture(64, 64, 11);
    for &(dx, dy) in &[(3, 5), (-7, 2), (0, -9), (12, -12), (31, 0)] {
        let sample = toroidal_shift(&reference, dx, dy);
        let result = correlate_accel(&mut cache, &reference, &sample, EPS).unwrap();
        assert_eq!((result.dx, result.dy), (dx, dy));
        assert_abs_diff_eq!(result.peak, 1.0, epsilon = 1e-3);
    }
}

#[test]
fn test_wraparound_reports_negative() {
    let mut cache = ContextCache::software();
    let reference = texture(16, 16, 2);
    let sample = toroidal_shift(&reference, 15, 15);
    let result = correlate_accel(&mut cache, &reference, &sample, EPS).unwrap();
    assert_eq!((result.dx, result.dy), (-1, -1));
}

#[test]
fn test_swapping_inputs_negates_shift() {
    let mut cache = ContextCache::software();
    let reference = texture(32, 32, 9);
    let sample = toroidal_shift(&reference, 5, -3);
    let forward = correlate_accel(&mut cache, &reference, &sample, EPS).unwrap();
    let backward = correlate_accel(&mut cache, &sample, &reference, EPS).unwrap();
    assert_eq!((forward.dx, forward.dy), (5, -3));
    assert_eq!((backward.dx, backward.dy), (-5, 3));
    assert_abs_diff_eq!(forward.peak, backward.peak, epsilon = 1e-3);
}

#[test]
fn test_single_pixel_scenario() {
    let mut cache = ContextCache::software();
    let reference = point_image(64, 64, 10, 10, 255.0);
    let sample = point_image(64, 64, 14, 17, 255.0);
    let result = correlate_accel(&mut cache, &reference, &sample, EPS).unwrap();
    assert_eq!((result.dx, result.dy), (4, 7));
    assert!(result.peak > 0.9, "peak {}", result.peak);
}

#[test]
fn test_smallest_side() {
    let mut cache = ContextCache::software();
    let reference = texture(4, 4, 6);
    let sample = toroidal_shift(&reference, 1, -1);
    let result = correlate_accel(&mut cache, &reference, &sample, EPS).unwrap();
    assert_eq!((result.dx, result.dy), (1, -1));
}

#[test]
fn test_agrees_with_cpu_path() {
    let mut cache = ContextCache::software();
    for seed in 0..4u64 {
        let reference = texture(32, 32, seed + 40);
        let dx = (seed as i32 * 7) % 16 - 8;
        let dy = 6 - (seed as i32 * 5) % 13;
        let sample = toroidal_shift(&reference, dx, dy);
        let cpu = correlate(&reference, &sample).unwrap();
        let accel = correlate_accel(&mut cache, &reference, &sample, EPS).unwrap();
        assert_eq!((accel.dx, accel.dy), (cpu.dx, cpu.dy));
        assert_abs_diff_eq!(accel.peak, cpu.peak, epsilon = 1e-3);
    }
}

#[test]
fn test_padded_rows_give_same_result() {
    let mut plain = ContextCache::software();
    let mut padded = ContextCache::new(Box::new(SoftwareBatchFft::with_row_padding(5)));
    let reference = texture(32, 32, 17);
    let sample = toroidal_shift(&reference, -6, 9);
    let a = correlate_accel(&mut plain, &reference, &sample, EPS).unwrap();
    let b = correlate_accel(&mut padded, &reference, &sample, EPS).unwrap();
    assert_eq!((a.dx, a.dy), (b.dx, b.dy));
    assert_abs_diff_eq!(a.peak, b.peak, epsilon = 1e-5);
}

#[test]
fn test_non_square_rejected() {
    let mut cache = ContextCache::software();
    let image = texture(64, 32, 1);
    assert!(matches!(
        correlate_accel(&mut cache, &image, &image, EPS),
        Err(SkyshiftError::InvalidArgument(_))
    ));
}

#[test]
fn test_non_power_of_two_rejected() {
    let mut cache = ContextCache::software();
    let image = texture(48, 48, 1);
    assert!(matches!(
        correlate_accel(&mut cache, &image, &image, EPS),
        Err(SkyshiftError::InvalidArgument(_))
    ));
}

#[test]
fn test_dimension_mismatch_rejected() {
    let mut cache = ContextCache::software();
    let a = texture(32, 32, 1);
    let b = texture(16, 16, 1);
    assert!(matches!(
        correlate_accel(&mut cache, &a, &b, EPS),
        Err(SkyshiftError::InvalidArgument(_))
    ));
}

#[test]
fn test_flat_images_are_degenerate() {
    let mut cache = ContextCache::software();
    let a = flat_image(16, 16, 100.0);
    let b = flat_image(16, 16, 30.0);
    assert!(matches!(
        correlate_accel(&mut cache, &a, &b, EPS),
        Err(SkyshiftError::Degenerate(_))
    ));
}

#[test]
fn test_black_images_are_degenerate() {
    let mut cache = ContextCache::software();
    let a = flat_image(8, 8, 0.0);
    assert!(matches!(
        correlate_accel(&mut cache, &a, &a, EPS),
        Err(SkyshiftError::Degenerate(_))
    ));
}

#[test]
fn test_faint_star_on_bright_background() {
    let mut cache = ContextCache::software();
    let reference = star_on_background(256, 256, 200.0, 20.0, 100, 80);
    let sample = star_on_background(256, 256, 200.0, 20.0, 103, 82);
    let result = correlate_accel(&mut cache, &reference, &sample, EPS).unwrap();
    assert_eq!((result.dx, result.dy), (3, 2));
    assert!(result.peak > 0.9, "peak {}", result.peak);

    let cpu = correlate(&reference, &sample).unwrap();
    assert_abs_diff_eq!(result.peak, cpu.peak, epsilon = 0.05);
}

#[test]
fn test_correlator_u8_and_teardown() {
    let mut correlator = AcceleratedCorrelator::software();
    let reference = texture(32, 32, 8);
    let sample = toroidal_shift(&reference, 2, 11);
    let result = correlator
        .correlate_u8(&to_u8(&reference), &to_u8(&sample))
        .unwrap();
    assert_eq!((result.dx, result.dy), (2, 11));

    correlator.teardown();
    assert!(matches!(
        correlator.correlate(&reference, &sample),
        Err(SkyshiftError::InvalidArgument(_))
    ));
}

#[test]
fn test_correlator_from_default_config() {
    let mut correlator = AcceleratedCorrelator::from_config(&CorrelationConfig::default()).unwrap();
    assert_eq!(correlator.cache().backend_name(), "Software/rustfft");
    let reference = texture(16, 16, 1);
    let sample = toroidal_shift(&reference, -4, 3);
    let result = correlator.correlate(&reference, &sample).unwrap();
    assert_eq!((result.dx, result.dy), (-4, 3));
}
