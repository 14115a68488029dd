//! Models command

use crate::app::OutputFormat;
use crate::output;
use anyhow::Result;
use campusqa_core::Config;

pub fn run(config: &Config, format: OutputFormat) -> Result<()> {
    print!("{}", output::format_models(&config.registry, &config.models, format));
    Ok(())
}
