use anyhow::Context;
use conduit_core::{ConduitConfig, ConnectorInstance};
use std::fs;
use std::path::Path;

/// Load `conduit.toml`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> anyhow::Result<ConduitConfig> {
    let exists = path.exists();
    let cfg = ConduitConfig::load_or_default(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        from_file = exists,
        backend = ?cfg.storage.backend,
        "Configuration loaded"
    );
    Ok(cfg)
}

/// Read a JSON array of connector instances for seeding the memory store.
pub fn load_instances(path: &Path) -> anyhow::Result<Vec<ConnectorInstance>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read instances from {}", path.display()))?;
    let instances: Vec<ConnectorInstance> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid instances file {}", path.display()))?;
    Ok(instances)
}
