//! Generic collection access
//!
//! [`list`] fetches one page of any collection path and [`list_all`] follows
//! cursors until the server reports no further pages. [`Collection`] builds
//! on both to offer untyped create/get/update/delete/list for one
//! [`ResourceKind`], flat or scoped under a parent entity.

use crate::error::{Error, Operation, Result, TransportError};
use crate::resource::ResourceKind;
use crate::transport::{Method, RequestContext, Transport};
use serde_json::Value;
use std::future::Future;
use tracing::debug;

/// Pagination cursor.
///
/// `offset` is an opaque token issued by the server and is only valid for the
/// next request against the same collection path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOpt {
    /// Requested page size; 0 leaves the choice to the server
    pub size: usize,
    pub offset: Option<String>,
}

impl ListOpt {
    /// First page of the given size
    pub fn with_size(size: usize) -> Self {
        Self { size, offset: None }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(2);
        if self.size > 0 {
            query.push(("size", self.size.to_string()));
        }
        if let Some(offset) = &self.offset {
            query.push(("offset", offset.clone()));
        }
        query
    }
}

/// Fetch one page of `path`.
///
/// Without `opt` the first page is requested at the server's default size.
/// The returned cursor is `None` once the server stops issuing an offset.
pub async fn list(
    transport: &dyn Transport,
    ctx: &RequestContext,
    path: &str,
    opt: Option<&ListOpt>,
) -> Result<(Vec<Value>, Option<ListOpt>)> {
    let query = opt.map(ListOpt::query).unwrap_or_default();
    let body = transport
        .request(ctx, Method::GET, path, &query, None)
        .await
        .map_err(|source| Error::Transport {
            op: Operation::List,
            path: path.to_string(),
            source,
        })?;

    let (items, offset) = parse_page(body).map_err(|source| Error::Transport {
        op: Operation::List,
        path: path.to_string(),
        source,
    })?;

    let next = offset.map(|offset| ListOpt {
        size: opt.map(|o| o.size).unwrap_or_default(),
        offset: Some(offset),
    });
    Ok((items, next))
}

/// Collect every page produced by `fetch`, starting at a first page of
/// `page_size`.
///
/// Pages are requested one after another since each cursor comes from the
/// previous response. The first failing page aborts the whole listing.
pub async fn list_all<T, F, Fut>(page_size: usize, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(ListOpt) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<ListOpt>)>>,
{
    let mut items = Vec::new();
    let mut opt = Some(ListOpt::with_size(page_size));
    let mut pages = 0usize;

    while let Some(current) = opt {
        let (page, next) = fetch(current).await?;
        pages += 1;
        debug!(page = pages, items = page.len(), more = next.is_some(), "fetched page");
        items.extend(page);
        opt = next;
    }

    Ok(items)
}

/// Split a list envelope into its items and continuation offset.
///
/// An empty collection may come back as `"data": {}`; that and a missing
/// `data` field are both treated as an empty page.
fn parse_page(body: Option<Value>) -> std::result::Result<(Vec<Value>, Option<String>), TransportError> {
    let mut envelope = match body {
        None | Some(Value::Null) => return Ok((Vec::new(), None)),
        Some(Value::Object(map)) => map,
        Some(other) => return Err(malformed(format!("expected a list envelope, got {}", kind_of(&other)))),
    };

    let items = match envelope.remove("data") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(Value::Object(map)) if map.is_empty() => Vec::new(),
        Some(other) => return Err(malformed(format!("expected \"data\" to be an array, got {}", kind_of(&other)))),
    };

    let offset = match envelope.remove("offset") {
        None | Some(Value::Null) => None,
        Some(Value::String(offset)) => Some(offset).filter(|o| !o.is_empty()),
        Some(other) => return Err(malformed(format!("expected \"offset\" to be a string, got {}", kind_of(&other)))),
    };

    Ok((items, offset))
}

fn malformed(msg: String) -> TransportError {
    TransportError::Body(serde::de::Error::custom(msg))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Untyped operations on the collection of one resource kind
#[derive(Clone, Copy)]
pub struct Collection<'a> {
    transport: &'a dyn Transport,
    kind: ResourceKind,
    page_size: usize,
}

impl<'a> Collection<'a> {
    pub fn new(transport: &'a dyn Transport, kind: ResourceKind, page_size: usize) -> Self {
        Self {
            transport,
            kind,
            page_size,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Create an entity, returning the server's representation
    pub async fn create(
        &self,
        ctx: &RequestContext,
        parent: Option<&str>,
        body: &Value,
    ) -> Result<Value> {
        let path = self.collection_path(Operation::Create, parent)?;
        self.send(ctx, Operation::Create, Method::POST, &path, Some(body))
            .await
    }

    /// Fetch an entity by id or natural key
    pub async fn get(
        &self,
        ctx: &RequestContext,
        parent: Option<&str>,
        id_or_key: &str,
    ) -> Result<Value> {
        let path = self.entity_path(Operation::Get, parent, id_or_key)?;
        self.send(ctx, Operation::Get, Method::GET, &path, None).await
    }

    /// Replace the entity `id` with `body`
    pub async fn update(
        &self,
        ctx: &RequestContext,
        parent: Option<&str>,
        id: &str,
        body: &Value,
    ) -> Result<Value> {
        let path = self.entity_path(Operation::Update, parent, id)?;
        self.send(ctx, Operation::Update, Method::PUT, &path, Some(body))
            .await
    }

    /// Delete an entity. A missing entity is reported as not found.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        parent: Option<&str>,
        id_or_key: &str,
    ) -> Result<()> {
        let path = self.entity_path(Operation::Delete, parent, id_or_key)?;
        self.send(ctx, Operation::Delete, Method::DELETE, &path, None)
            .await?;
        Ok(())
    }

    /// One page of the top-level collection
    pub async fn list(
        &self,
        ctx: &RequestContext,
        opt: Option<&ListOpt>,
    ) -> Result<(Vec<Value>, Option<ListOpt>)> {
        let path = self.collection_path(Operation::List, None)?;
        list(self.transport, ctx, &path, opt).await
    }

    /// One page of the collection scoped under `parent`
    pub async fn list_for_parent(
        &self,
        ctx: &RequestContext,
        parent: &str,
        opt: Option<&ListOpt>,
    ) -> Result<(Vec<Value>, Option<ListOpt>)> {
        let path = self.collection_path(Operation::List, Some(parent))?;
        list(self.transport, ctx, &path, opt).await
    }

    /// Every entity of the top-level collection
    pub async fn list_all(&self, ctx: &RequestContext) -> Result<Vec<Value>> {
        let path = self.collection_path(Operation::List, None)?;
        self.list_all_at(ctx, &path).await
    }

    /// Every entity scoped under `parent`
    pub async fn list_all_for_parent(&self, ctx: &RequestContext, parent: &str) -> Result<Vec<Value>> {
        let path = self.collection_path(Operation::List, Some(parent))?;
        self.list_all_at(ctx, &path).await
    }

    async fn list_all_at(&self, ctx: &RequestContext, path: &str) -> Result<Vec<Value>> {
        let transport = self.transport;
        list_all(self.page_size, |opt| async move {
            list(transport, ctx, path, Some(&opt)).await
        })
        .await
    }

    pub(crate) fn collection_path(&self, op: Operation, parent: Option<&str>) -> Result<String> {
        self.kind
            .collection_path(parent)
            .map_err(|reason| self.invalid(op, reason))
    }

    pub(crate) fn entity_path(
        &self,
        op: Operation,
        parent: Option<&str>,
        id_or_key: &str,
    ) -> Result<String> {
        self.kind
            .entity_path(parent, id_or_key)
            .map_err(|reason| self.invalid(op, reason))
    }

    pub(crate) fn invalid(&self, op: Operation, reason: &'static str) -> Error {
        Error::InvalidArgument {
            op,
            kind: self.kind,
            reason,
        }
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        op: Operation,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        debug!(%op, kind = %self.kind, path, "admin operation");
        let response = self
            .transport
            .request(ctx, method, path, &[], body)
            .await
            .map_err(|source| Error::Transport {
                op,
                path: path.to_string(),
                source,
            })?;
        Ok(response.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transport serving list envelopes for tests

    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves paged `GET` requests from fixed item lists, keyed by path.
    /// Offsets are decimal indexes, opaque to the code under test.
    #[derive(Default)]
    pub struct PagedTransport {
        pub collections: HashMap<String, Vec<Value>>,
        pub default_size: usize,
        /// Index of the page request that should fail with HTTP 500
        pub fail_on_request: Option<usize>,
        pub requests: Mutex<Vec<(Method, String, Vec<(String, String)>)>>,
    }

    impl PagedTransport {
        pub fn with_items(path: &str, items: Vec<Value>) -> Self {
            let mut collections = HashMap::new();
            collections.insert(path.to_string(), items);
            Self {
                collections,
                default_size: 100,
                ..Default::default()
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for PagedTransport {
        async fn request(
            &self,
            _ctx: &RequestContext,
            method: Method,
            path: &str,
            query: &[(&str, String)],
            _body: Option<&Value>,
        ) -> std::result::Result<Option<Value>, TransportError> {
            let index = {
                let mut requests = self.requests.lock().unwrap();
                requests.push((
                    method.clone(),
                    path.to_string(),
                    query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                ));
                requests.len() - 1
            };
            if self.fail_on_request == Some(index) {
                return Err(TransportError::Status {
                    status: 500,
                    message: "An unexpected error occurred".to_string(),
                });
            }

            let items = self
                .collections
                .get(path)
                .ok_or_else(|| TransportError::NotFound {
                    message: "Not found".to_string(),
                })?;

            let param = |name: &str| {
                query
                    .iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| v.clone())
            };
            let size = param("size")
                .and_then(|s| s.parse().ok())
                .unwrap_or(self.default_size);
            let start: usize = param("offset").and_then(|s| s.parse().ok()).unwrap_or(0);
            let end = (start + size).min(items.len());
            let page: Vec<Value> = items[start.min(end)..end].to_vec();

            let mut envelope = serde_json::json!({ "data": page, "next": null });
            if end < items.len() {
                envelope["offset"] = Value::String(end.to_string());
                envelope["next"] = Value::String(format!("{}?offset={}", path, end));
            }
            Ok(Some(envelope))
        }
    }
}
