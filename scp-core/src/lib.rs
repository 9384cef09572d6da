//! SCP Core
//!
//! Reconciliation runtime shared by every SCP resource handler: the attribute
//! store, the type registry, the state waiter, the marshaller and the list
//! filter engine.

pub mod case_convert;
pub mod composite_id;
pub mod context;
pub mod filter;
pub mod marshal;
pub mod provider;
pub mod registry;
pub mod resource;
pub mod schema;
pub mod waiter;

pub use composite_id::CompositeId;
pub use context::{CancelHandle, OperationContext};
pub use provider::{ErrorKind, ProviderError, ProviderResult};
pub use registry::{Registry, RegistryError};
pub use resource::{Attributes, ResourceData, Value};
