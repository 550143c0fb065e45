//! Configuration for Gatehouse
//!
//! CLI arguments and environment variable handling using clap.
//! Values are read once at startup (after `.env` is loaded) and never
//! re-read per request.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use zeroize::Zeroizing;

use crate::types::{GatehouseError, Result};

/// Default Turnkey API endpoint
pub const DEFAULT_TURNKEY_API_BASE_URL: &str = "https://api.turnkey.com";

/// Gatehouse - Google sign-in gateway for Turnkey sub-organizations
#[derive(Parser, Debug, Clone)]
#[command(name = "gatehouse")]
#[command(about = "Binds browser-held keys to Turnkey sessions using Google ID tokens")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Turnkey API private key (hex encoded P-256 scalar)
    #[arg(long, env = "TURNKEY_PRIVATE_KEY", hide_env_values = true)]
    pub turnkey_private_key: Option<String>,

    /// Turnkey API public key (hex encoded, compressed)
    #[arg(long, env = "TURNKEY_PUBLIC_KEY")]
    pub turnkey_public_key: Option<String>,

    /// Root organization under which sub-organizations are created
    #[arg(long, env = "TURNKEY_ORG_ID")]
    pub turnkey_org_id: Option<String>,

    /// Turnkey API base URL
    #[arg(long, env = "TURNKEY_API_BASE_URL", default_value = DEFAULT_TURNKEY_API_BASE_URL)]
    pub turnkey_api_base_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Timeout for each upstream Turnkey call in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,
}

/// Immutable Turnkey credentials extracted from [`Args`].
#[derive(Clone)]
pub struct ProviderCredentials {
    pub api_private_key: Zeroizing<String>,
    pub api_public_key: String,
    pub organization_id: String,
    pub api_base_url: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_private_key", &"<redacted>")
            .field("api_public_key", &self.api_public_key)
            .field("organization_id", &self.organization_id)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Args {
    /// Names of the Turnkey credential variables that are unset or blank
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.turnkey_private_key) {
            missing.push("TURNKEY_PRIVATE_KEY");
        }
        if is_blank(&self.turnkey_public_key) {
            missing.push("TURNKEY_PUBLIC_KEY");
        }
        if is_blank(&self.turnkey_org_id) {
            missing.push("TURNKEY_ORG_ID");
        }
        missing
    }

    /// Extract the Turnkey credentials, or None if any of them is unset
    pub fn credentials(&self) -> Option<ProviderCredentials> {
        let private_key = non_blank(&self.turnkey_private_key)?;
        let public_key = non_blank(&self.turnkey_public_key)?;
        let org_id = non_blank(&self.turnkey_org_id)?;

        Some(ProviderCredentials {
            api_private_key: Zeroizing::new(private_key.to_string()),
            api_public_key: public_key.to_string(),
            organization_id: org_id.to_string(),
            api_base_url: self.turnkey_api_base_url.trim_end_matches('/').to_string(),
            request_timeout: self.request_timeout(),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == 0 {
            return Err(GatehouseError::Config(
                "REQUEST_TIMEOUT_MS must be greater than zero".into(),
            ));
        }

        if !self.turnkey_api_base_url.starts_with("http://")
            && !self.turnkey_api_base_url.starts_with("https://")
        {
            return Err(GatehouseError::Config(
                "TURNKEY_API_BASE_URL must be an http(s) URL".into(),
            ));
        }

        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn is_blank(value: &Option<String>) -> bool {
    non_blank(value).is_none()
}
