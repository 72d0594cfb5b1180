use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use skyshift_core::estimator::create_estimator;

use super::{load_frame, GlobalOptions};
use crate::summary::print_correlation;

#[derive(Args)]
pub struct CorrelateArgs {
    /// Reference image
    pub reference: PathBuf,

    /// Image whose shift is measured against the reference
    pub sample: PathBuf,
}

pub fn run(args: &CorrelateArgs, options: &GlobalOptions) -> Result<()> {
    let config = options.resolve()?;
    let reference = load_frame(&args.reference)?;
    let sample = load_frame(&args.sample)?;

    let mut estimator = create_estimator(&config)?;
    let result = estimator.estimate(&reference, &sample).with_context(|| {
        format!(
            "Correlating {} against {}",
            args.sample.display(),
            args.reference.display()
        )
    })?;

    print_correlation(&args.reference, &args.sample, estimator.name(), &result);
    Ok(())
}
