//! Provider - Handler traits and the descriptor handed to the host engine
//!
//! Each resource type implements [`ResourceHandler`] (create, read, update,
//! delete); each data source implements [`DataSourceHandler`]. Descriptors
//! wrap handlers with their schema and per-operation timeouts, and the
//! [`ProviderDescriptor`] bundles both maps with the configure callback.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::context::OperationContext;
use crate::resource::{Attributes, ResourceData};
use crate::schema::{ResourceSchema, TypeError};

/// Category of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any REST call; carries the attribute path
    Validation,
    /// Pre-flight probe found a duplicate name, overlapping CIDR or quota
    Conflict,
    /// 5xx or transport failure
    Transient,
    /// Permanent 4xx other than not-found
    Api,
    /// The remote object no longer exists
    Gone,
    /// The remote object entered a state outside pending and target
    Convergence,
    /// The operation deadline passed
    Timeout,
    /// The operation was cancelled by the engine
    Cancelled,
    Internal,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    /// Resource key or identifier the error concerns
    pub resource: Option<String>,
    /// Attribute path for validation errors
    pub attribute: Option<String>,
    /// HTTP status code of the failing REST call, if any
    pub status: Option<u16>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref resource) = self.resource {
            write!(f, "[{}] ", resource)?;
        }
        if let Some(ref attribute) = self.attribute {
            write!(f, "{}: ", attribute)?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
            resource: None,
            attribute: None,
            status: None,
            cause: None,
        }
    }

    pub fn validation(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new(message).with_kind(ErrorKind::Validation);
        err.attribute = Some(attribute.into());
        err
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Conflict)
    }

    pub fn gone(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Gone)
    }

    pub fn convergence(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Convergence)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Timeout)
    }

    pub fn cancelled() -> Self {
        Self::new("operation cancelled").with_kind(ErrorKind::Cancelled)
    }

    /// Error for a failed REST call, classified by status code
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        let kind = match status {
            Some(404) | Some(403) => ErrorKind::Gone,
            Some(s) if s >= 500 => ErrorKind::Transient,
            None => ErrorKind::Transient,
            Some(_) => ErrorKind::Api,
        };
        let mut err = Self::new(message).with_kind(kind);
        err.status = status;
        err
    }

    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn for_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Prefix the message with what the handler was doing
    pub fn context(mut self, what: impl std::fmt::Display) -> Self {
        self.message = format!("{}: {}", what, self.message);
        self
    }

    pub fn is_gone(&self) -> bool {
        self.kind == ErrorKind::Gone
    }
}

impl From<TypeError> for ProviderError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::Attribute { name, inner } => {
                ProviderError::validation(name, inner.to_string())
            }
            TypeError::MissingRequired { name } => {
                ProviderError::validation(name, "attribute is required")
            }
            other => ProviderError::new(other.to_string()).with_kind(ErrorKind::Validation),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-operation deadlines for a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(40 * 60),
            read: Duration::from_secs(20 * 60),
            update: Duration::from_secs(80 * 60),
            delete: Duration::from_secs(60 * 60),
        }
    }
}

/// Lifecycle callbacks of one resource type
///
/// `M` is the Meta container produced by the configure callback.
#[async_trait]
pub trait ResourceHandler<M>: Send + Sync {
    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &M,
    ) -> ProviderResult<()>;

    async fn read(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &M,
    ) -> ProviderResult<()>;

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &M,
    ) -> ProviderResult<()>;

    async fn delete(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &M,
    ) -> ProviderResult<()>;
}

/// Read callback of one data source
#[async_trait]
pub trait DataSourceHandler<M>: Send + Sync {
    fn schema(&self) -> ResourceSchema;

    async fn read(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &M,
    ) -> ProviderResult<()>;
}

/// Registered resource type
pub struct ResourceDescriptor<M> {
    pub schema: ResourceSchema,
    pub timeouts: Timeouts,
    pub handler: Arc<dyn ResourceHandler<M>>,
}

impl<M> Clone for ResourceDescriptor<M> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            timeouts: self.timeouts,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<M: Send + Sync + 'static> ResourceDescriptor<M> {
    pub fn new(handler: impl ResourceHandler<M> + 'static) -> Self {
        Self {
            schema: handler.schema(),
            timeouts: handler.timeouts(),
            handler: Arc::new(handler),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &M,
    ) -> ProviderResult<()> {
        rd.apply_defaults(&self.schema);
        self.schema.validate(rd.state()).map_err(first_type_error)?;
        let ctx = ctx.with_timeout(self.timeouts.create);
        let result = self.handler.create(&ctx, rd, meta).await;
        result.map_err(|e| label(e, &self.schema))
    }

    pub async fn read(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &M,
    ) -> ProviderResult<()> {
        let ctx = ctx.with_timeout(self.timeouts.read);
        let result = self.handler.read(&ctx, rd, meta).await;
        result.map_err(|e| label(e, &self.schema))
    }

    pub async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &M,
    ) -> ProviderResult<()> {
        rd.apply_defaults(&self.schema);
        self.schema.validate(rd.state()).map_err(first_type_error)?;
        let ctx = ctx.with_timeout(self.timeouts.update);
        let result = self.handler.update(&ctx, rd, meta).await;
        result.map_err(|e| label(e, &self.schema))
    }

    pub async fn delete(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &M,
    ) -> ProviderResult<()> {
        let ctx = ctx.with_timeout(self.timeouts.delete);
        let result = self.handler.delete(&ctx, rd, meta).await;
        result.map_err(|e| label(e, &self.schema))
    }
}

/// Registered data source
pub struct DataSourceDescriptor<M> {
    pub schema: ResourceSchema,
    pub handler: Arc<dyn DataSourceHandler<M>>,
}

impl<M> Clone for DataSourceDescriptor<M> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<M: Send + Sync + 'static> DataSourceDescriptor<M> {
    pub fn new(handler: impl DataSourceHandler<M> + 'static) -> Self {
        Self {
            schema: handler.schema(),
            handler: Arc::new(handler),
        }
    }

    pub async fn read(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &M,
    ) -> ProviderResult<()> {
        rd.apply_defaults(&self.schema);
        self.schema.validate(rd.state()).map_err(first_type_error)?;
        let ctx = ctx.with_timeout(Timeouts::default().read);
        let result = self.handler.read(&ctx, rd, meta).await;
        result.map_err(|e| label(e, &self.schema))
    }
}

/// Attach the resource type to errors a handler left unlabelled
fn label(err: ProviderError, schema: &ResourceSchema) -> ProviderError {
    if err.resource.is_some() {
        err
    } else {
        err.for_resource(schema.resource_type.clone())
    }
}

fn first_type_error(errors: Vec<TypeError>) -> ProviderError {
    errors
        .into_iter()
        .next()
        .map(ProviderError::from)
        .unwrap_or_else(|| ProviderError::new("validation failed"))
}

/// Builds the Meta container from the provider block
pub type ConfigureFn<M> =
    Arc<dyn Fn(Attributes) -> BoxFuture<'static, ProviderResult<M>> + Send + Sync>;

/// Everything the host engine needs from this plugin
pub struct ProviderDescriptor<M> {
    /// Schema of the provider configuration block
    pub schema: ResourceSchema,
    pub resources: HashMap<String, ResourceDescriptor<M>>,
    pub data_sources: HashMap<String, DataSourceDescriptor<M>>,
    pub configure: ConfigureFn<M>,
}

impl<M: Send + Sync + 'static> ProviderDescriptor<M> {
    /// Validate the provider block and build the Meta container
    pub async fn configure(&self, config: Attributes) -> ProviderResult<M> {
        self.schema.validate(&config).map_err(first_type_error)?;
        (self.configure)(config).await
    }

    pub fn resource(&self, key: &str) -> ProviderResult<&ResourceDescriptor<M>> {
        self.resources
            .get(key)
            .ok_or_else(|| ProviderError::new(format!("Unknown resource type: {}", key)))
    }

    pub fn data_source(&self, key: &str) -> ProviderResult<&DataSourceDescriptor<M>> {
        self.data_sources
            .get(key)
            .ok_or_else(|| ProviderError::new(format!("Unknown data source: {}", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Value;
    use crate::schema::{AttributeSchema, AttributeType};

    // Mock handler for testing
    struct MockResource;

    #[async_trait]
    impl ResourceHandler<()> for MockResource {
        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new("mock_resource")
                .attribute(AttributeSchema::new("name", AttributeType::String).required())
        }

        async fn create(
            &self,
            _ctx: &OperationContext,
            rd: &mut ResourceData,
            _meta: &(),
        ) -> ProviderResult<()> {
            rd.set_id("mock-id-123");
            Ok(())
        }

        async fn read(
            &self,
            _ctx: &OperationContext,
            _rd: &mut ResourceData,
            _meta: &(),
        ) -> ProviderResult<()> {
            Ok(())
        }

        async fn update(
            &self,
            _ctx: &OperationContext,
            _rd: &mut ResourceData,
            _meta: &(),
        ) -> ProviderResult<()> {
            Ok(())
        }

        async fn delete(
            &self,
            _ctx: &OperationContext,
            rd: &mut ResourceData,
            _meta: &(),
        ) -> ProviderResult<()> {
            rd.set_id("");
            Ok(())
        }
    }

    #[tokio::test]
    async fn descriptor_create_sets_id() {
        let descriptor = ResourceDescriptor::new(MockResource);
        let mut config = Attributes::new();
        config.insert("name".to_string(), Value::from("example"));
        let mut rd = ResourceData::new(config);

        descriptor
            .create(&OperationContext::background(), &mut rd, &())
            .await
            .unwrap();
        assert_eq!(rd.id(), "mock-id-123");
    }

    #[tokio::test]
    async fn descriptor_create_validates_schema_first() {
        let descriptor = ResourceDescriptor::new(MockResource);
        let mut rd = ResourceData::new(Attributes::new());

        let err = descriptor
            .create(&OperationContext::background(), &mut rd, &())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.attribute.as_deref(), Some("name"));
        assert_eq!(rd.id(), "");
    }

    #[test]
    fn api_errors_are_classified_by_status() {
        assert_eq!(ProviderError::api(Some(404), "x").kind, ErrorKind::Gone);
        assert_eq!(ProviderError::api(Some(403), "x").kind, ErrorKind::Gone);
        assert_eq!(ProviderError::api(Some(503), "x").kind, ErrorKind::Transient);
        assert_eq!(ProviderError::api(Some(400), "x").kind, ErrorKind::Api);
    }

    #[test]
    fn display_includes_resource_and_attribute() {
        let err = ProviderError::validation("min_server_count", "must not exceed desired")
            .for_resource("scp_auto_scaling_group");
        assert_eq!(
            err.to_string(),
            "[scp_auto_scaling_group] min_server_count: must not exceed desired"
        );
    }
}
