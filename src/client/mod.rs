//! Admin API client
//!
//! [`AdminClient`] bundles a transport with the page size used for
//! exhaustive listing and hands out one [`EntityService`] per entity type.
//! It holds no per-call state, so one client can be cloned and used from many
//! tasks at once.

use crate::collection::{self, Collection, ListOpt};
use crate::config::{ClientConfig, DEFAULT_PAGE_SIZE};
use crate::entities::{Acl, BasicAuth, Consumer, HmacAuth, Jwt, KeyAuth, LimitKeyQuota, Route, Service};
use crate::entity_service::EntityService;
use crate::error::TransportError;
use crate::metrics::ClientMetrics;
use crate::resource::{Entity, ResourceKind};
use crate::transport::{HttpTransport, RequestContext, Transport};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Typed client for the admin API
#[derive(Clone)]
pub struct AdminClient {
    transport: Arc<dyn Transport>,
    page_size: usize,
    metrics: Option<Arc<ClientMetrics>>,
}

impl AdminClient {
    /// Create a client on top of an existing transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            page_size: DEFAULT_PAGE_SIZE,
            metrics: None,
        }
    }

    /// Create an HTTP client from configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut transport = HttpTransport::from_config(config)?;
        let metrics = if config.metrics.enabled {
            let metrics = ClientMetrics::new()
                .map(Arc::new)
                .map_err(|e| TransportError::InvalidRequest(format!("metrics: {}", e)))?;
            transport = transport.with_metrics(metrics.clone());
            Some(metrics)
        } else {
            None
        };

        info!(
            url = config.admin_url(),
            page_size = config.admin.page_size,
            "admin client configured"
        );

        Ok(Self {
            transport: Arc::new(transport),
            page_size: config.admin.page_size,
            metrics,
        })
    }

    /// Override the page size used by `list_all` operations
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Request metrics, when enabled in configuration
    pub fn metrics(&self) -> Option<&ClientMetrics> {
        self.metrics.as_deref()
    }

    /// Untyped access to one resource kind
    pub fn collection(&self, kind: ResourceKind) -> Collection<'_> {
        Collection::new(self.transport.as_ref(), kind, self.page_size)
    }

    /// Typed access to entities of type `E`
    pub fn entities<E: Entity>(&self) -> EntityService<'_, E> {
        EntityService::new(self.collection(E::KIND), self.page_size)
    }

    /// One page of an arbitrary collection path
    pub async fn list(
        &self,
        ctx: &RequestContext,
        path: &str,
        opt: Option<&ListOpt>,
    ) -> crate::Result<(Vec<Value>, Option<ListOpt>)> {
        collection::list(self.transport.as_ref(), ctx, path, opt).await
    }

    pub fn services(&self) -> EntityService<'_, Service> {
        self.entities()
    }

    pub fn routes(&self) -> EntityService<'_, Route> {
        self.entities()
    }

    pub fn consumers(&self) -> EntityService<'_, Consumer> {
        self.entities()
    }

    pub fn key_auths(&self) -> EntityService<'_, KeyAuth> {
        self.entities()
    }

    pub fn basic_auths(&self) -> EntityService<'_, BasicAuth> {
        self.entities()
    }

    pub fn hmac_auths(&self) -> EntityService<'_, HmacAuth> {
        self.entities()
    }

    pub fn jwts(&self) -> EntityService<'_, Jwt> {
        self.entities()
    }

    pub fn acls(&self) -> EntityService<'_, Acl> {
        self.entities()
    }

    pub fn limit_key_quotas(&self) -> EntityService<'_, LimitKeyQuota> {
        self.entities()
    }
}
