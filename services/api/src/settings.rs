//! Service settings for the API
//!
//! Values come from built-in defaults overridden by `HARAS_`-prefixed
//! environment variables.

use anyhow::Result;
use serde::Deserialize;

/// API service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Socket address the HTTP server binds to (`HARAS_BIND_ADDR`)
    pub bind_addr: String,
    /// RS256 public key, PEM inline or a path to a PEM file (`HARAS_JWT_PUBLIC_KEY`)
    pub jwt_public_key: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:3001")?
            .add_source(config::Environment::with_prefix("HARAS"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// The public key as PEM text, reading it from disk when given a path.
    pub fn public_key_pem(&self) -> Result<String> {
        read_pem(&self.jwt_public_key)
    }
}

/// Accept inline PEM, or a file path tried from the working directory and then
/// from the crate root.
fn read_pem(value: &str) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    let pem = std::fs::read_to_string(value)
        .or_else(|_| {
            let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push(value);
            std::fs::read_to_string(path)
        })
        .map_err(|e| anyhow::anyhow!("Failed to read public key file {}: {}", value, e))?;

    Ok(pem.trim().to_string())
}
