use anyhow::Context;
use secrecy::Secret;
use serde::Deserialize;
use shared_kernel::configuration::config;

#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    /// Base url the operation name is appended to.
    pub host: String,
    pub api_token: Option<Secret<String>>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub remote_procedures: GatewaySettings,
}

impl Settings {
    pub fn parse() -> anyhow::Result<Settings> {
        config::<Settings>().context("Failed to deserialize settings to remote_procedures settings")
    }
}
