//! Turnkey credential bootstrap
//!
//! Builds the process-wide provider client from configuration. Missing
//! credentials are not fatal: the client is simply absent and every login
//! fails fast without touching the network.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Args;
use crate::turnkey::{CustodyProvider, TurnkeyClient};

/// Build the Turnkey client, or None if credentials are missing or unusable.
pub fn acquire_client(args: &Args) -> Option<Arc<dyn CustodyProvider>> {
    let Some(credentials) = args.credentials() else {
        warn!(
            missing = ?args.missing_credentials(),
            "Turnkey credentials are not set"
        );
        return None;
    };

    match TurnkeyClient::new(&credentials) {
        Ok(client) => {
            info!(
                base_url = %client.base_url(),
                organization_id = %client.organization_id(),
                "Turnkey client configured"
            );
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("Turnkey credentials are unusable: {}", e);
            None
        }
    }
}
