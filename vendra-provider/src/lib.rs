use std::collections::HashMap;
use std::sync::Arc;

use vendra_core::retry::{RetryPolicy, Retrying};
use vendra_core::{ProviderCredentials, ProviderRegistry};

pub mod alibaba;
pub mod client;
pub mod signing;

pub use alibaba::AlibabaProvider;
pub use client::SignedClient;
pub use signing::{HmacSigner, RequestSigner};

/// Build the process-wide registry from configured credentials.
///
/// Only providers with credentials get an adapter; everything else is left
/// unregistered so callers hit `ProviderError::Unconfigured` and fall back.
/// Every adapter is wrapped in the shared retry decorator.
pub fn build_registry(
    credentials: &HashMap<String, ProviderCredentials>,
    policy: RetryPolicy,
) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    for (name, creds) in credentials {
        match name.as_str() {
            "alibaba" => {
                let adapter = AlibabaProvider::new(creds.clone());
                registry.register(Arc::new(Retrying::new(adapter, policy.clone())));
            }
            other => {
                tracing::warn!("Ignoring credentials for unknown provider: {}", other);
            }
        }
    }

    registry
}
