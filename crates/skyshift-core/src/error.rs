use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkyshiftError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Hardware unavailable: {0}")]
    HardwareUnavailable(String),

    #[error("Degenerate cross-power spectrum: {0}")]
    Degenerate(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SkyshiftError>;
