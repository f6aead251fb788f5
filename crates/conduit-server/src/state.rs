use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use conduit_adapters::{AdapterRegistry, CredentialCipher, build_client};
use conduit_audit::{AuditStore, create_storage};
use conduit_core::{ConduitConfig, InMemoryInstanceStore, InstanceStore, StorageBackend};
use conduit_metrics::MetricsAggregator;
use conduit_runtime::{Dispatcher, RetryPolicy};
use conduit_store_pg::PgStore;

use crate::config::load_instances;

/// Shared application state.
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub metrics: MetricsAggregator,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, metrics: MetricsAggregator) -> Self {
        Self {
            dispatcher,
            metrics,
        }
    }

    /// Wire stores, adapters and the credential codec from configuration.
    pub async fn init(cfg: &ConduitConfig) -> anyhow::Result<Self> {
        let (instances, audit) = open_stores(cfg).await?;

        let master_key = cfg.credentials.resolve_master_key()?;
        let codec = CredentialCipher::from_base64(&master_key)?;

        let client = build_client(&cfg.http)?;
        let registry = AdapterRegistry::builtin(client, &cfg.providers.base_urls);
        tracing::info!(providers = ?registry.providers(), "Provider adapters registered");

        let dispatcher = Dispatcher::new(instances.clone(), audit.clone(), registry, Arc::new(codec))
            .with_retry_policy(RetryPolicy::from(&cfg.dispatch))
            .with_default_timeout(cfg.dispatch.timeout);
        let metrics = MetricsAggregator::new(instances, audit);

        Ok(Self::new(dispatcher, metrics))
    }
}

async fn open_stores(
    cfg: &ConduitConfig,
) -> anyhow::Result<(Arc<dyn InstanceStore>, Arc<dyn AuditStore>)> {
    let instances: Arc<dyn InstanceStore>;
    let audit: Arc<dyn AuditStore>;

    match cfg.storage.backend {
        StorageBackend::Postgres => {
            let url = cfg.storage.database_url().with_context(|| {
                format!("{} is not set", cfg.storage.database_url_env)
            })?;
            let store = Arc::new(PgStore::connect(&url, cfg.storage.max_connections).await?);
            store.ensure_schema().await?;
            instances = store.clone();
            audit = store;
        }
        StorageBackend::Memory | StorageBackend::File => {
            let store = InMemoryInstanceStore::new();
            if let Some(ref path) = cfg.storage.instances_path {
                let seeded = load_instances(Path::new(path))?;
                tracing::info!(path = %path, count = seeded.len(), "Seeded connector instances");
                for instance in seeded {
                    store.insert(instance)?;
                }
            }
            instances = Arc::new(store);
            audit = create_storage(&cfg.storage).await?;
        }
    }

    tracing::info!(backend = ?cfg.storage.backend, "Stores ready");
    Ok((instances, audit))
}
