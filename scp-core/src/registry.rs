//! Registry - collects resource and data-source descriptors
//!
//! Handlers are registered by a single assembly function at startup. The
//! first [`Registry::snapshot`] seals the registry; the maps handed to the
//! engine never change afterwards.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use crate::provider::{DataSourceDescriptor, ProviderError, ResourceDescriptor};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("resource type '{0}' is already registered")]
    DuplicateResource(String),

    #[error("data source '{0}' is already registered")]
    DuplicateDataSource(String),

    #[error("registry is sealed, cannot register '{0}'")]
    Sealed(String),
}

impl From<RegistryError> for ProviderError {
    fn from(err: RegistryError) -> Self {
        ProviderError::new(err.to_string()).with_cause(err)
    }
}

/// Immutable view of everything registered
pub struct Snapshot<M> {
    pub resources: HashMap<String, ResourceDescriptor<M>>,
    pub data_sources: HashMap<String, DataSourceDescriptor<M>>,
}

struct Inner<M> {
    resources: HashMap<String, ResourceDescriptor<M>>,
    data_sources: HashMap<String, DataSourceDescriptor<M>>,
    sealed: bool,
}

pub struct Registry<M> {
    inner: Mutex<Inner<M>>,
}

impl<M> Default for Registry<M> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                resources: HashMap::new(),
                data_sources: HashMap::new(),
                sealed: false,
            }),
        }
    }
}

impl<M> Registry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<M>> {
        // A panic while holding the lock leaves the maps intact
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register_resource(
        &self,
        key: impl Into<String>,
        descriptor: ResourceDescriptor<M>,
    ) -> Result<(), RegistryError> {
        let key = key.into();
        let mut inner = self.lock();
        if inner.sealed {
            return Err(RegistryError::Sealed(key));
        }
        if inner.resources.contains_key(&key) {
            return Err(RegistryError::DuplicateResource(key));
        }
        log::debug!("registered resource {}", key);
        inner.resources.insert(key, descriptor);
        Ok(())
    }

    pub fn register_data_source(
        &self,
        key: impl Into<String>,
        descriptor: DataSourceDescriptor<M>,
    ) -> Result<(), RegistryError> {
        let key = key.into();
        let mut inner = self.lock();
        if inner.sealed {
            return Err(RegistryError::Sealed(key));
        }
        if inner.data_sources.contains_key(&key) {
            return Err(RegistryError::DuplicateDataSource(key));
        }
        log::debug!("registered data source {}", key);
        inner.data_sources.insert(key, descriptor);
        Ok(())
    }

    /// Seal the registry and return both maps
    pub fn snapshot(&self) -> Snapshot<M> {
        let mut inner = self.lock();
        inner.sealed = true;
        Snapshot {
            resources: inner.resources.clone(),
            data_sources: inner.data_sources.clone(),
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }
}
