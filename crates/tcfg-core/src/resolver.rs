//! Cached entry point consumers call to read tenant configuration.

use std::sync::Arc;

use tcfg_model::{ConfigTree, IntegrationStatus, TenantId};
use tracing::debug;

use crate::cache::ResolutionCache;
use crate::error::ResolveError;
use crate::settings::EngineSettings;
use crate::store::{FlagStore, RecordStore};
use crate::synthesizer::ConfigSynthesizer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Skip the cache read and re-synthesize, replacing any cached entry.
    pub force_refresh: bool,
}

impl ResolveOptions {
    pub fn refresh() -> Self {
        Self {
            force_refresh: true,
        }
    }
}

/// Synthesizer fronted by a [`ResolutionCache`].
///
/// Failed resolutions are not cached. Two concurrent misses for the same
/// tenant both synthesize; whichever inserts last is kept.
pub struct ConfigResolver {
    synthesizer: ConfigSynthesizer,
    cache: ResolutionCache,
}

impl ConfigResolver {
    pub fn new(synthesizer: ConfigSynthesizer, cache: ResolutionCache) -> Self {
        Self { synthesizer, cache }
    }

    pub fn from_settings(
        records: Arc<dyn RecordStore>,
        flags: Arc<dyn FlagStore>,
        settings: &EngineSettings,
    ) -> Self {
        Self::new(
            ConfigSynthesizer::new(records, flags),
            ResolutionCache::new(settings.cache_ttl()),
        )
    }

    pub fn synthesizer(&self) -> &ConfigSynthesizer {
        &self.synthesizer
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn resolve(&self, tenant: &TenantId) -> Result<Arc<ConfigTree>, ResolveError> {
        self.resolve_with(tenant, ResolveOptions::default())
    }

    pub fn resolve_with(
        &self,
        tenant: &TenantId,
        options: ResolveOptions,
    ) -> Result<Arc<ConfigTree>, ResolveError> {
        if !options.force_refresh
            && let Some(config) = self.cache.get(tenant)
        {
            debug!(tenant = %tenant, "serving cached configuration");
            return Ok(config);
        }
        let config = Arc::new(self.synthesizer.resolve(tenant)?);
        self.cache.insert(tenant.clone(), Arc::clone(&config));
        Ok(config)
    }

    /// Drops any cached tree for `tenant` so the next resolve hits the store.
    pub fn invalidate_config(&self, tenant: &TenantId) {
        if self.cache.invalidate(tenant) {
            debug!(tenant = %tenant, "invalidated cached configuration");
        }
    }

    pub fn feature_enabled(&self, tenant: &TenantId, name: &str) -> Result<bool, ResolveError> {
        Ok(self.resolve(tenant)?.feature_enabled(name))
    }

    pub fn integration_status(
        &self,
        tenant: &TenantId,
        name: &str,
    ) -> Result<IntegrationStatus, ResolveError> {
        Ok(self.resolve(tenant)?.integration_status(name))
    }
}
