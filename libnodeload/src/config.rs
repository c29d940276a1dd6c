use std::fs;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Annotation key prefix marking a node annotation as a load metric.
pub const ANNOTATION_PREFIX: &str = "caih.com/scheduler_";

/// Arguments of the real node load plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RealNodeLoadArgs {
    // Keys starting with this prefix are load metrics, the rest is ignored.
    pub annotation_prefix: String,
}

impl Default for RealNodeLoadArgs {
    fn default() -> Self {
        Self {
            annotation_prefix: ANNOTATION_PREFIX.to_string(),
        }
    }
}

impl RealNodeLoadArgs {
    pub fn validate(&self) -> Result<()> {
        if self.annotation_prefix.is_empty() {
            bail!("annotation_prefix must not be empty");
        }
        Ok(())
    }
}

impl FromStr for RealNodeLoadArgs {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let args: RealNodeLoadArgs =
            serde_yaml::from_str(s).context("Failed to parse YAML plugin args")?;
        args.validate()?;
        Ok(args)
    }
}

pub fn load_args(path: &str) -> Result<RealNodeLoadArgs> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read plugin args from {path}"))?;
    content.parse()
}
