use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use flotilla_metadata::dto::AccessKeyRequest;
use flotilla_types::ProviderName;

use crate::{CloudProvider, ProviderError};

/// Resolves a provider adapter bound to an access key
pub trait CloudProviderFactory: Send + Sync {
    fn provider(
        &self,
        name: &str,
        access_key: &AccessKeyRequest,
    ) -> Result<Arc<dyn CloudProvider>, ProviderError>;
}

pub type ProviderBuilder =
    Box<dyn Fn(&AccessKeyRequest) -> Result<Arc<dyn CloudProvider>, ProviderError> + Send + Sync>;

/// Factory over a fixed set of builders registered by provider name
#[derive(Default)]
pub struct StaticProviderFactory {
    builders: HashMap<ProviderName, ProviderBuilder>,
}

impl fmt::Debug for StaticProviderFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticProviderFactory")
            .field("providers", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StaticProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, name: impl Into<ProviderName>, builder: F) -> Self
    where
        F: Fn(&AccessKeyRequest) -> Result<Arc<dyn CloudProvider>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        self.builders.insert(name.into(), Box::new(builder));
        self
    }
}

impl CloudProviderFactory for StaticProviderFactory {
    fn provider(
        &self,
        name: &str,
        access_key: &AccessKeyRequest,
    ) -> Result<Arc<dyn CloudProvider>, ProviderError> {
        let builder = self
            .builders
            .get(name)
            .ok_or_else(|| ProviderError::UnknownProvider(name.to_owned()))?;
        debug!(provider = name, "resolved cloud provider");
        builder(access_key)
    }
}
