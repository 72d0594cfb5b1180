//! Backend-independent shift estimation and frame-sequence tracking.

use crate::accel::validate_accel_dims;
use crate::buffer::{CorrelationResult, LumaImageF32};
use crate::config::{BackendPreference, CorrelationConfig};
use crate::correlate::{AcceleratedCorrelator, CpuCorrelator};
use crate::error::{Result, SkyshiftError};

/// Estimates the translation of `sample` relative to `reference`.
pub trait ShiftEstimator: Send {
    fn name(&self) -> &str;

    fn estimate(
        &mut self,
        reference: &LumaImageF32,
        sample: &LumaImageF32,
    ) -> Result<CorrelationResult>;
}

impl ShiftEstimator for CpuCorrelator {
    fn name(&self) -> &str {
        "CPU"
    }

    fn estimate(
        &mut self,
        reference: &LumaImageF32,
        sample: &LumaImageF32,
    ) -> Result<CorrelationResult> {
        self.correlate(reference, sample)
    }
}

impl ShiftEstimator for AcceleratedCorrelator {
    fn name(&self) -> &str {
        self.cache().backend_name()
    }

    fn estimate(
        &mut self,
        reference: &LumaImageF32,
        sample: &LumaImageF32,
    ) -> Result<CorrelationResult> {
        self.correlate(reference, sample)
    }
}

/// Accelerated correlation where the frame shape allows it, CPU otherwise.
///
/// A frame the accelerator turns away at `prepare` (`HardwareUnavailable`,
/// e.g. over a device buffer limit) also goes to the CPU.
pub fn estimate_with_fallback(
    accel: &mut AcceleratedCorrelator,
    cpu: &mut CpuCorrelator,
    reference: &LumaImageF32,
    sample: &LumaImageF32,
) -> Result<CorrelationResult> {
    if let Err(e) = validate_accel_dims(reference.width(), reference.height()) {
        tracing::debug!("Falling back to CPU correlation: {e}");
        return cpu.correlate(reference, sample);
    }
    match accel.correlate(reference, sample) {
        Err(SkyshiftError::HardwareUnavailable(msg)) => {
            tracing::warn!("Accelerator rejected frame ({msg}), using CPU");
            cpu.correlate(reference, sample)
        }
        other => other,
    }
}

/// Estimator behind [`BackendPreference::Auto`].
pub struct AutoEstimator {
    accel: AcceleratedCorrelator,
    cpu: CpuCorrelator,
}

impl AutoEstimator {
    pub fn new(accel: AcceleratedCorrelator, cpu: CpuCorrelator) -> Self {
        Self { accel, cpu }
    }
}

impl ShiftEstimator for AutoEstimator {
    fn name(&self) -> &str {
        "Auto"
    }

    fn estimate(
        &mut self,
        reference: &LumaImageF32,
        sample: &LumaImageF32,
    ) -> Result<CorrelationResult> {
        estimate_with_fallback(&mut self.accel, &mut self.cpu, reference, sample)
    }
}

/// Estimator for the configured backend.
///
/// `Auto` uses the CPU alone when the accelerator cannot be brought up;
/// `Accelerated` reports that as an error.
pub fn create_estimator(config: &CorrelationConfig) -> Result<Box<dyn ShiftEstimator>> {
    match config.backend {
        BackendPreference::Cpu => Ok(Box::new(CpuCorrelator::from_config(config)?)),
        BackendPreference::Accelerated => {
            Ok(Box::new(AcceleratedCorrelator::from_config(config)?))
        }
        BackendPreference::Auto => match AcceleratedCorrelator::from_config(config) {
            Ok(accel) => Ok(Box::new(AutoEstimator::new(
                accel,
                CpuCorrelator::from_config(config)?,
            ))),
            Err(SkyshiftError::HardwareUnavailable(msg)) => {
                tracing::warn!(
                    "{} accelerator unavailable ({msg}), using CPU",
                    config.accelerator.kind
                );
                Ok(Box::new(CpuCorrelator::from_config(config)?))
            }
            Err(e) => Err(e),
        },
    }
}

/// Shift between frame `index` and frame `index + 1`.
#[derive(Debug)]
pub struct PairShift {
    pub index: usize,
    pub outcome: Result<CorrelationResult>,
}

/// Per-pair shifts of a frame sequence.
#[derive(Debug, Default)]
pub struct SequenceTrack {
    pub pairs: Vec<PairShift>,
}

impl SequenceTrack {
    /// Pairs in any order; they are sorted by index.
    pub fn from_pairs(mut pairs: Vec<PairShift>) -> Self {
        pairs.sort_by_key(|p| p.index);
        Self { pairs }
    }

    /// Sum of all successful pair shifts.
    pub fn drift(&self) -> (i32, i32) {
        self.successes()
            .fold((0, 0), |(x, y), r| (x + r.dx, y + r.dy))
    }

    /// Position of every frame relative to the first. A failed pair
    /// contributes no motion.
    pub fn positions(&self) -> Vec<(i32, i32)> {
        let mut pos = (0, 0);
        let mut out = Vec::with_capacity(self.pairs.len() + 1);
        out.push(pos);
        for pair in &self.pairs {
            if let Ok(r) = &pair.outcome {
                pos = (pos.0 + r.dx, pos.1 + r.dy);
            }
            out.push(pos);
        }
        out
    }

    pub fn failures(&self) -> usize {
        self.pairs.iter().filter(|p| p.outcome.is_err()).count()
    }

    fn successes(&self) -> impl Iterator<Item = &CorrelationResult> {
        self.pairs.iter().filter_map(|p| p.outcome.as_ref().ok())
    }
}

/// Correlate each consecutive pair of `frames`. A failing pair is recorded
/// and tracking continues.
pub fn track_sequence(
    estimator: &mut dyn ShiftEstimator,
    frames: &[LumaImageF32],
) -> SequenceTrack {
    track_sequence_with_progress(estimator, frames, |_, _| {})
}

/// [`track_sequence`] reporting `(pairs_done, pairs_total)` after each pair.
pub fn track_sequence_with_progress<F>(
    estimator: &mut dyn ShiftEstimator,
    frames: &[LumaImageF32],
    mut on_pair: F,
) -> SequenceTrack
where
    F: FnMut(usize, usize),
{
    let total = frames.len().saturating_sub(1);
    let pairs: Vec<PairShift> = frames
        .windows(2)
        .enumerate()
        .map(|(index, pair)| {
            let outcome = estimator.estimate(&pair[0], &pair[1]);
            if let Err(e) = &outcome {
                tracing::warn!("Frame pair {}-{} failed: {e}", index, index + 1);
            }
            on_pair(index + 1, total);
            PairShift { index, outcome }
        })
        .collect();

    let track = SequenceTrack::from_pairs(pairs);
    tracing::debug!(
        "Tracked {} frames with {}: drift {:?}, {} failed pairs",
        frames.len(),
        estimator.name(),
        track.drift(),
        track.failures()
    );
    track
}
