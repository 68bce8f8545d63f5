use anyhow::Context;
use serde::Deserialize;
use shared_kernel::configuration::config;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct PreviewSettings {
    pub snapshot_path: PathBuf,
    pub claims_path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub preview: PreviewSettings,
}

impl Settings {
    pub fn parse() -> anyhow::Result<Settings> {
        config::<Settings>().context("Failed to deserialize settings to selector_preview settings")
    }
}
