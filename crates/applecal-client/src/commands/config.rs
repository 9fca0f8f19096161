//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

const REDACTED: &str = "<redacted>";

/// Renders the configuration as TOML, with a plain-text password hidden.
pub fn render(config: &ClientConfig) -> ClientResult<String> {
    let mut shown = config.clone();
    if let Some(ref password) = shown.account.password
        && !password.starts_with("pass::")
        && !password.starts_with("env::")
    {
        shown.account.password = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))
}

/// Renders the configuration under a header naming the file it came from.
pub fn render_with_header(config: &ClientConfig, path: &Path) -> ClientResult<String> {
    Ok(format!("# config.toml ({})\n{}", path.display(), render(config)?))
}

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    println!("{}", render_with_header(config, path)?);
    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    let provider = config.to_provider_config()?;
    if !provider.has_credentials() {
        println!("warning: no credentials configured, requests will be anonymous");
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}
