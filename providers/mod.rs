// Provider package / 数据源包
pub mod classroom;

use crate::config::ClassroomConfig;
use crate::provider::ProviderBox;
use std::sync::Arc;

/// Build the configured provider, if credentials are present / 根据配置创建数据源
///
/// Returns `Ok(None)` when no credentials are configured; searches then
/// fail with "provider not initialized" until one is set.
pub fn build_provider(config: &ClassroomConfig) -> anyhow::Result<Option<ProviderBox>> {
    if !config.has_credentials() {
        tracing::warn!("Classroom credentials not configured, search provider left uninitialized");
        return Ok(None);
    }
    let provider = classroom::ClassroomProvider::new(config.clone())?;
    tracing::info!("Classroom provider initialized: {}", config.base_url);
    Ok(Some(Arc::new(provider)))
}
