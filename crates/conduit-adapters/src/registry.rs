//! Provider identifier to adapter mapping.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::Client;

use crate::adapter::ProviderAdapter;
use crate::providers::{
    AustraliaPostAdapter, SendGridAdapter, SlackAdapter, StripeAdapter, XeroAdapter, auspost,
    sendgrid, slack, stripe, xero,
};

/// The providers compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Stripe,
    SendGrid,
    Slack,
    AustraliaPost,
    Xero,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::Stripe,
        Provider::SendGrid,
        Provider::Slack,
        Provider::AustraliaPost,
        Provider::Xero,
    ];

    /// Catalog identifier, as stored on connector instances.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Stripe => stripe::PROVIDER_ID,
            Self::SendGrid => sendgrid::PROVIDER_ID,
            Self::Slack => slack::PROVIDER_ID,
            Self::AustraliaPost => auspost::PROVIDER_ID,
            Self::Xero => xero::PROVIDER_ID,
        }
    }

    fn adapter(&self, client: Client, base_url: Option<&String>) -> Arc<dyn ProviderAdapter> {
        macro_rules! build {
            ($adapter:ident) => {{
                let adapter = $adapter::new(client);
                match base_url {
                    Some(url) => Arc::new(adapter.with_base_url(url.clone())),
                    None => Arc::new(adapter),
                }
            }};
        }

        match self {
            Self::Stripe => build!(StripeAdapter),
            Self::SendGrid => build!(SendGridAdapter),
            Self::Slack => build!(SlackAdapter),
            Self::AustraliaPost => build!(AustraliaPostAdapter),
            Self::Xero => build!(XeroAdapter),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = String;

    /// Case-sensitive, matching the catalog.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| format!("unknown provider: {}", s))
    }
}

/// Immutable provider-id to adapter map, shared across dispatches.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Arc<HashMap<String, Arc<dyn ProviderAdapter>>>,
}

impl AdapterRegistry {
    pub fn builder() -> AdapterRegistryBuilder {
        AdapterRegistryBuilder::default()
    }

    /// Every compiled-in provider over one shared client, with optional
    /// per-provider base URL overrides keyed by provider id.
    pub fn builtin(client: Client, base_urls: &HashMap<String, String>) -> Self {
        for id in base_urls.keys() {
            if Provider::from_str(id).is_err() {
                tracing::warn!(provider = %id, "Base URL override for unknown provider");
            }
        }

        Provider::ALL
            .into_iter()
            .fold(Self::builder(), |builder, provider| {
                builder.register(provider.adapter(client.clone(), base_urls.get(provider.id())))
            })
            .build()
    }

    /// Adapter for a provider id (case-sensitive).
    pub fn resolve(&self, provider_id: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(provider_id).cloned()
    }

    /// Registered provider ids, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.adapters.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

#[derive(Default)]
pub struct AdapterRegistryBuilder {
    adapters: BTreeMap<String, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistryBuilder {
    /// Register an adapter under its own provider id. A later registration
    /// for the same id replaces the earlier one.
    pub fn register(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters
            .insert(adapter.provider_id().to_string(), adapter);
        self
    }

    pub fn build(self) -> AdapterRegistry {
        AdapterRegistry {
            adapters: Arc::new(self.adapters.into_iter().collect()),
        }
    }
}
