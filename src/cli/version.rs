use anyhow::{Context, Result};
use clap::Args;

use crate::upgrade::BuildInfo;

/// Print the version and build metadata compiled into this binary.
#[derive(Args, Debug)]
pub struct VersionCommand {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

impl VersionCommand {
    pub fn execute(self) -> Result<()> {
        println!("{}", self.render(&BuildInfo::current())?);
        Ok(())
    }

    fn render(&self, info: &BuildInfo) -> Result<String> {
        if self.json {
            serde_json::to_string_pretty(info).context("Failed to serialize build info")
        } else {
            Ok(info.to_string())
        }
    }
}
