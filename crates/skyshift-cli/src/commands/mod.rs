pub mod config;
pub mod correlate;
pub mod track;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use skyshift_core::buffer::{LumaImage8, LumaImageF32};
use skyshift_core::config::{BackendPreference, CorrelationConfig};

/// Flags shared by every subcommand.
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub backend: Option<BackendPreference>,
}

impl GlobalOptions {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn resolve(&self) -> Result<CorrelationConfig> {
        let mut config = match &self.config {
            Some(path) => CorrelationConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => CorrelationConfig::default(),
        };
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        Ok(config)
    }
}

/// Read any image format the `image` crate knows as 8-bit grayscale.
pub fn load_frame(path: &Path) -> Result<LumaImageF32> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .to_luma8();
    let (w, h) = img.dimensions();
    let frame = LumaImage8::from_raw(w as usize, h as usize, img.into_raw())?;
    Ok(frame.to_f32()?)
}
