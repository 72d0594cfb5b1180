use std::path::{Path, PathBuf};

use console::Style;
use skyshift_core::buffer::CorrelationResult;
use skyshift_core::estimator::SequenceTrack;

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    method: Style,
    failed: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            failed: Style::new().red(),
            path: Style::new().underlined(),
        }
    }
}

fn shift_text(result: &CorrelationResult) -> String {
    format!("({:+}, {:+})", result.dx, result.dy)
}

pub fn print_correlation(
    reference: &Path,
    sample: &Path,
    backend: &str,
    result: &CorrelationResult,
) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Phase Correlation"));
    println!();
    println!(
        "  {:<12}{}",
        s.label.apply_to("Reference"),
        s.path.apply_to(reference.display())
    );
    println!(
        "  {:<12}{}",
        s.label.apply_to("Sample"),
        s.path.apply_to(sample.display())
    );
    println!("  {:<12}{}", s.label.apply_to("Backend"), s.method.apply_to(backend));
    println!(
        "  {:<12}{}",
        s.label.apply_to("Shift"),
        s.value.apply_to(shift_text(result))
    );
    println!(
        "  {:<12}{}",
        s.label.apply_to("Peak"),
        s.value.apply_to(format!("{:.4}", result.peak))
    );
    println!();
}

pub fn print_track(frames: &[PathBuf], backend: &str, track: &SequenceTrack) {
    let s = Styles::new();
    let positions = track.positions();

    println!();
    println!(
        "  {} {}",
        s.title.apply_to("Sequence Tracking"),
        s.method.apply_to(format!("[{backend}]"))
    );
    println!();
    for pair in &track.pairs {
        let name = frames
            .get(pair.index + 1)
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match &pair.outcome {
            Ok(result) => {
                let (x, y) = positions[pair.index + 1];
                println!(
                    "  {:>4}  {:<24}{:<14}{}  {}",
                    pair.index + 1,
                    s.path.apply_to(name),
                    s.value.apply_to(shift_text(result)),
                    s.label.apply_to(format!("peak {:.3}", result.peak)),
                    s.label.apply_to(format!("at ({x:+}, {y:+})")),
                );
            }
            Err(e) => println!(
                "  {:>4}  {:<24}{}",
                pair.index + 1,
                s.path.apply_to(name),
                s.failed.apply_to(format!("failed: {e}"))
            ),
        }
    }

    let (dx, dy) = track.drift();
    println!();
    println!(
        "  {:<12}{}",
        s.label.apply_to("Drift"),
        s.value.apply_to(format!("({dx:+}, {dy:+})"))
    );
    if track.failures() > 0 {
        println!(
            "  {:<12}{}",
            s.label.apply_to("Failed"),
            s.failed.apply_to(track.failures())
        );
    }
    println!();
}
