mod common;

use ndarray::{array, Array2};
use num_complex::Complex32;
use skyshift_core::correlate::{AcceleratedCorrelator, CpuCorrelator};
use skyshift_core::diagnostics::{
    render_complex, render_real, save_png, sink_for, DebugSink, NoopSink, PngDumpSink,
    SpectrumComponent,
};

use common::{texture, toroidal_shift};

#[test]
fn test_render_real_stretches_to_max() {
    let data = array![[0.0f32, 1.0], [2.0, 4.0]];
    let img = render_real(&data);
    assert_eq!(img.data, array![[0u8, 63], [127, 255]]);
}

#[test]
fn test_render_real_clamps_negatives() {
    let data = array![[-3.0f32, 2.0]];
    assert_eq!(render_real(&data).data, array![[0u8, 255]]);
}

#[test]
fn test_render_real_non_positive_is_black() {
    let data = Array2::from_elem((3, 3), -1.0f32);
    assert!(render_real(&data).data.iter().all(|&v| v == 0));
}

#[test]
fn test_render_complex_components() {
    let data = array![[Complex32::new(3.0, -4.0), Complex32::new(0.0, 2.0)]];
    assert_eq!(
        render_complex(&data, SpectrumComponent::Magnitude).data,
        array![[255u8, 102]]
    );
    assert_eq!(
        render_complex(&data, SpectrumComponent::Imaginary).data,
        array![[0u8, 255]]
    );

    let phase = array![[Complex32::new(-1.0, -1e-9), Complex32::new(1.0, 0.0)]];
    let rendered = render_complex(&phase, SpectrumComponent::Phase).data;
    assert_eq!(rendered[[0, 0]], 0);
    assert_eq!(rendered[[0, 1]], 127);
}

#[test]
fn test_save_png_round_trips_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.png");
    let img = render_real(&Array2::from_shape_fn((4, 8), |(r, c)| (r * 8 + c) as f32));
    save_png(&img, &path).unwrap();

    let loaded = image::open(&path).unwrap().to_luma8();
    assert_eq!(loaded.dimensions(), (8, 4));
    assert_eq!(loaded.into_raw(), img.data.iter().copied().collect::<Vec<_>>());
}

#[test]
fn test_png_sink_names_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = PngDumpSink::new(dir.path().join("nested"))
        .unwrap()
        .with_components(vec![SpectrumComponent::Magnitude, SpectrumComponent::Phase]);
    assert!(sink.enabled());

    sink.real("surface", &Array2::from_elem((2, 2), 1.0)).unwrap();
    sink.complex("spectrum", &Array2::from_elem((2, 2), Complex32::new(1.0, 1.0)))
        .unwrap();
    let nested = dir.path().join("nested");
    assert!(nested.join("surface.png").exists());
    assert!(nested.join("spectrum-mag.png").exists());
    assert!(nested.join("spectrum-phase.png").exists());
    assert!(!nested.join("spectrum-re.png").exists());
}

#[test]
fn test_sink_for_without_dir_is_disabled() {
    assert!(!sink_for(None).unwrap().enabled());
    assert!(!NoopSink.enabled());
}

#[test]
fn test_cpu_correlator_dumps_intermediates() {
    let dir = tempfile::tempdir().unwrap();
    let mut correlator =
        CpuCorrelator::default().with_sink(sink_for(Some(dir.path())).unwrap());
    let reference = texture(16, 16, 1);
    let sample = toroidal_shift(&reference, 2, 1);
    let result = correlator.correlate(&reference, &sample).unwrap();
    assert_eq!((result.dx, result.dy), (2, 1));

    assert!(dir.path().join("correlation.png").exists());
    assert!(dir.path().join("cross-power-re.png").exists());
    assert!(dir.path().join("cross-power-im.png").exists());
}

#[test]
fn test_accelerated_correlator_dumps_surface() {
    let dir = tempfile::tempdir().unwrap();
    let mut correlator =
        AcceleratedCorrelator::software().with_sink(sink_for(Some(dir.path())).unwrap());
    let reference = texture(16, 16, 1);
    let sample = toroidal_shift(&reference, -2, 3);
    correlator.correlate(&reference, &sample).unwrap();

    let surface = image::open(dir.path().join("correlation.png"))
        .unwrap()
        .to_luma8();
    assert_eq!(surface.dimensions(), (16, 16));
    // Shift (-2, 3) peaks at column 14, row 3.
    assert_eq!(surface.get_pixel(14, 3).0[0], 255);
}
