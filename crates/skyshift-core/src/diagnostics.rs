//! Grayscale renderings of intermediate arrays for debugging.
//!
//! Nothing here affects a correlation result; sinks only observe.

use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat};
use ndarray::Array2;
use num_complex::Complex32;

use crate::buffer::LumaImage8;
use crate::error::{Result, SkyshiftError};

/// Which scalar to extract from a complex bin when rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpectrumComponent {
    Real,
    Imaginary,
    Magnitude,
    Phase,
}

impl SpectrumComponent {
    fn suffix(self) -> &'static str {
        match self {
            Self::Real => "re",
            Self::Imaginary => "im",
            Self::Magnitude => "mag",
            Self::Phase => "phase",
        }
    }
}

/// Stretch `[0, max]` to `[0, 255]`. Negative samples render black, as does
/// a surface with no positive sample.
pub fn render_real(data: &Array2<f32>) -> LumaImage8 {
    let max = data
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0f32, f32::max);
    if max <= 0.0 {
        return LumaImage8::new(Array2::zeros(data.dim()));
    }
    LumaImage8::new(data.mapv(|v| (v / max * 255.0).clamp(0.0, 255.0) as u8))
}

/// Render one component of a complex array. Phase maps `[-pi, pi]` onto the
/// full byte range; the other components are stretched like
/// [`render_real`].
pub fn render_complex(data: &Array2<Complex32>, component: SpectrumComponent) -> LumaImage8 {
    match component {
        SpectrumComponent::Real => render_real(&data.mapv(|c| c.re)),
        SpectrumComponent::Imaginary => render_real(&data.mapv(|c| c.im)),
        SpectrumComponent::Magnitude => render_real(&data.mapv(|c| c.norm())),
        SpectrumComponent::Phase => LumaImage8::new(data.mapv(|c| {
            let t = (c.arg() + std::f32::consts::PI) / std::f32::consts::TAU;
            (t * 255.0).clamp(0.0, 255.0) as u8
        })),
    }
}

/// Save an 8-bit image as grayscale PNG.
pub fn save_png(image: &LumaImage8, path: &Path) -> Result<()> {
    let (h, w) = image.data.dim();
    let pixels: Vec<u8> = image.data.iter().copied().collect();
    let img = GrayImage::from_raw(w as u32, h as u32, pixels).ok_or_else(|| {
        SkyshiftError::InvalidArgument(format!("{w}x{h} pixel buffer has the wrong length"))
    })?;
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Receives named intermediate arrays while a correlation runs.
pub trait DebugSink {
    /// Whether the sink records anything. Callers may skip building arrays
    /// for a disabled sink.
    fn enabled(&self) -> bool {
        true
    }

    fn real(&mut self, name: &str, data: &Array2<f32>) -> Result<()>;
    fn complex(&mut self, name: &str, data: &Array2<Complex32>) -> Result<()>;
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn real(&mut self, _name: &str, _data: &Array2<f32>) -> Result<()> {
        Ok(())
    }

    fn complex(&mut self, _name: &str, _data: &Array2<Complex32>) -> Result<()> {
        Ok(())
    }
}

/// Writes `<dir>/<name>.png` for real arrays and `<dir>/<name>-<component>.png`
/// for complex ones.
#[derive(Clone, Debug)]
pub struct PngDumpSink {
    dir: PathBuf,
    components: Vec<SpectrumComponent>,
}

impl PngDumpSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            components: vec![SpectrumComponent::Real, SpectrumComponent::Imaginary],
        })
    }

    pub fn with_components(mut self, components: Vec<SpectrumComponent>) -> Self {
        self.components = components;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DebugSink for PngDumpSink {
    fn real(&mut self, name: &str, data: &Array2<f32>) -> Result<()> {
        let path = self.dir.join(format!("{name}.png"));
        tracing::debug!("Dumping {} to {}", name, path.display());
        save_png(&render_real(data), &path)
    }

    fn complex(&mut self, name: &str, data: &Array2<Complex32>) -> Result<()> {
        for &component in &self.components {
            let path = self.dir.join(format!("{name}-{}.png", component.suffix()));
            tracing::debug!("Dumping {} to {}", name, path.display());
            save_png(&render_complex(data, component), &path)?;
        }
        Ok(())
    }
}

/// Sink configured by an optional dump directory.
pub fn sink_for(dir: Option<&Path>) -> Result<Box<dyn DebugSink + Send>> {
    match dir {
        Some(dir) => Ok(Box::new(PngDumpSink::new(dir)?)),
        None => Ok(Box::new(NoopSink)),
    }
}
