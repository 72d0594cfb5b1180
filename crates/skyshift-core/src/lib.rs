pub mod accel;
pub mod buffer;
pub mod config;
pub mod consts;
pub mod correlate;
pub mod dft;
pub mod diagnostics;
pub mod error;
pub mod estimator;
pub mod view;
