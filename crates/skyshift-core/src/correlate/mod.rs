pub mod accel;
pub mod cpu;

pub use accel::{correlate_accel, AcceleratedCorrelator};
pub use cpu::{correlate, cross_power_spectrum, CpuCorrelator};

use crate::consts::NOISE_FLOOR_SCALE;
use crate::error::{Result, SkyshiftError};

/// First pass over a pair of spectra, collecting what [`CrossPowerTally`]
/// needs to tell usable bins from rounding noise.
#[derive(Debug, Default)]
pub(crate) struct SpectrumScan {
    reference_energy: f64,
    sample_energy: f64,
    strongest_ac: f64,
}

impl SpectrumScan {
    /// `weight` is how many bins of the full spectrum this packed bin stands
    /// for (1 or 2 in a half spectrum). `r` and `s` are the bin magnitudes.
    pub(crate) fn add(&mut self, is_dc: bool, weight: f64, r: f64, s: f64) {
        self.reference_energy += weight * r * r;
        self.sample_energy += weight * s * s;
        if !is_dc {
            self.strongest_ac = self.strongest_ac.max(r * s);
        }
    }

    /// Tally for a transform over `points` samples.
    pub(crate) fn tally(&self, points: usize, epsilon: f64) -> CrossPowerTally {
        CrossPowerTally {
            reference_floor: noise_floor(self.reference_energy, points),
            sample_floor: noise_floor(self.sample_energy, points),
            threshold: self.strongest_ac * epsilon,
            ac_bins: 0,
            ac_usable: 0,
            dropped: 0,
        }
    }
}

/// Rounding noise an unnormalized f32 DFT over `points` samples can leave in
/// any bin. `energy` is the sum of |X|^2 over the full spectrum, so
/// `sqrt(energy / points)` is the L2 norm of the input.
fn noise_floor(energy: f64, points: usize) -> f64 {
    if points == 0 {
        return 0.0;
    }
    let norm = (energy / points as f64).sqrt();
    let log2n = (points as f64).log2().max(1.0);
    NOISE_FLOOR_SCALE * f32::EPSILON as f64 * norm * log2n
}

/// Tracks which cross-power bins could be normalized.
///
/// A bin is dropped (written as zero) when either spectrum's magnitude there
/// is within its rounding noise floor, or when the product falls below
/// `epsilon` times the strongest non-DC product. The floor scales with the
/// input norm, not the DC term, so faint detail on a bright background
/// survives. When every bin but DC is dropped the inputs were flat and no
/// displacement can be recovered.
pub(crate) struct CrossPowerTally {
    reference_floor: f64,
    sample_floor: f64,
    threshold: f64,
    ac_bins: usize,
    ac_usable: usize,
    dropped: usize,
}

impl CrossPowerTally {
    /// Normalize `(re, im)` to unit magnitude, or return zero for a
    /// degenerate bin. `r` and `s` are the reference and sample bin
    /// magnitudes, `m` the magnitude of `(re, im)`.
    pub(crate) fn normalize(
        &mut self,
        is_dc: bool,
        r: f64,
        s: f64,
        re: f64,
        im: f64,
        m: f64,
    ) -> (f32, f32) {
        let usable = r > self.reference_floor
            && s > self.sample_floor
            && m > self.threshold
            && m > 0.0
            && m.is_finite();
        if !is_dc {
            self.ac_bins += 1;
            if usable {
                self.ac_usable += 1;
            }
        }
        if usable {
            ((re / m) as f32, (im / m) as f32)
        } else {
            self.dropped += 1;
            (0.0, 0.0)
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        if self.ac_bins > 0 && self.ac_usable == 0 {
            return Err(SkyshiftError::Degenerate(format!(
                "all {} non-DC bins are within rounding noise (flat input?)",
                self.ac_bins
            )));
        }
        if self.dropped > 0 {
            tracing::warn!(
                "Dropped {} degenerate cross-power bins ({} of {} non-DC bins usable)",
                self.dropped,
                self.ac_usable,
                self.ac_bins
            );
        }
        Ok(())
    }
}
