use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_DEGENERATE_EPSILON, DEFAULT_SOFTWARE_ROW_PADDING};
use crate::error::Result;

/// Which correlation path estimates the shift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendPreference {
    /// Accelerated path where the image shape allows it, CPU otherwise.
    #[default]
    Auto,
    Cpu,
    Accelerated,
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Cpu => write!(f, "CPU"),
            Self::Accelerated => write!(f, "Accelerated"),
        }
    }
}

/// Batched 1D FFT implementation behind the accelerated path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceleratorKind {
    /// rustfft emulation of the batched primitive, always available.
    #[default]
    Software,
    /// wgpu compute shaders (requires the `gpu` feature).
    Gpu,
}

impl fmt::Display for AcceleratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Software => write!(f, "Software"),
            Self::Gpu => write!(f, "GPU"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorConfig {
    #[serde(default)]
    pub kind: AcceleratorKind,
    /// Extra complex elements per buffer row for the software backend, so
    /// that its row step exceeds the transform length.
    #[serde(default = "default_row_padding")]
    pub row_padding: usize,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            kind: AcceleratorKind::default(),
            row_padding: DEFAULT_SOFTWARE_ROW_PADDING,
        }
    }
}

fn default_row_padding() -> usize {
    DEFAULT_SOFTWARE_ROW_PADDING
}

fn default_epsilon() -> f64 {
    DEFAULT_DEGENERATE_EPSILON
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    #[serde(default)]
    pub backend: BackendPreference,
    #[serde(default)]
    pub accelerator: AcceleratorConfig,
    /// Cross-power bins weaker than this fraction of the strongest bin are
    /// zeroed instead of normalized.
    #[serde(default = "default_epsilon")]
    pub degenerate_epsilon: f64,
    /// Directory receiving PNG dumps of intermediate arrays.
    #[serde(default)]
    pub debug_dump_dir: Option<PathBuf>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::default(),
            accelerator: AcceleratorConfig::default(),
            degenerate_epsilon: DEFAULT_DEGENERATE_EPSILON,
            debug_dump_dir: None,
        }
    }
}

impl CorrelationConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
