//! Typed CRUD and listing for one entity type
//!
//! [`EntityService`] encodes entities into request bodies and decodes server
//! responses, delegating every request to the untyped [`Collection`] engine
//! selected by the entity's [`ResourceKind`](crate::resource::ResourceKind).
//!
//! Local validation ([`Entity::validate`]) is never applied here; callers
//! decide whether to check it before submitting.

use crate::collection::{list_all, Collection, ListOpt};
use crate::error::{Error, Operation, Result};
use crate::resource::Entity;
use crate::transport::RequestContext;
use serde_json::Value;
use std::marker::PhantomData;

/// CRUD operations for entities of type `E`
pub struct EntityService<'a, E> {
    collection: Collection<'a>,
    page_size: usize,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> EntityService<'a, E> {
    pub fn new(collection: Collection<'a>, page_size: usize) -> Self {
        Self {
            collection,
            page_size,
            _entity: PhantomData,
        }
    }

    /// Create `entity`, optionally under `parent`.
    ///
    /// The server assigns an identifier when none is set. Returns the
    /// server's representation, which may include computed fields.
    pub async fn create(&self, ctx: &RequestContext, parent: Option<&str>, entity: &E) -> Result<E> {
        let path = self.collection.collection_path(Operation::Create, parent)?;
        let body = encode(Operation::Create, &path, entity)?;
        let created = self.collection.create(ctx, parent, &body).await?;
        decode(Operation::Create, &path, created)
    }

    /// Fetch by identifier or natural key (username, name, key, ...)
    pub async fn get(&self, ctx: &RequestContext, parent: Option<&str>, id_or_key: &str) -> Result<E> {
        let path = self.collection.entity_path(Operation::Get, parent, id_or_key)?;
        let found = self.collection.get(ctx, parent, id_or_key).await?;
        decode(Operation::Get, &path, found)
    }

    /// Replace the stored entity with `entity`, which must carry an identifier
    pub async fn update(&self, ctx: &RequestContext, parent: Option<&str>, entity: &E) -> Result<E> {
        let id = match entity.id() {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(self
                    .collection
                    .invalid(Operation::Update, "entity has no identifier"))
            }
        };
        let path = self.collection.entity_path(Operation::Update, parent, id)?;
        let body = encode(Operation::Update, &path, entity)?;
        let updated = self.collection.update(ctx, parent, id, &body).await?;
        decode(Operation::Update, &path, updated)
    }

    /// Delete by identifier or natural key.
    ///
    /// Deleting something that does not exist fails with a not-found error;
    /// use [`Error::is_not_found`] to treat that as success.
    pub async fn delete(&self, ctx: &RequestContext, parent: Option<&str>, id_or_key: &str) -> Result<()> {
        self.collection.delete(ctx, parent, id_or_key).await
    }

    /// One page of the top-level collection
    pub async fn list(&self, ctx: &RequestContext, opt: Option<&ListOpt>) -> Result<(Vec<E>, Option<ListOpt>)> {
        let path = self.collection.collection_path(Operation::List, None)?;
        let (items, next) = self.collection.list(ctx, opt).await?;
        Ok((decode_page(&path, items)?, next))
    }

    /// One page of the entities owned by `parent`
    pub async fn list_for_parent(
        &self,
        ctx: &RequestContext,
        parent: &str,
        opt: Option<&ListOpt>,
    ) -> Result<(Vec<E>, Option<ListOpt>)> {
        let path = self.collection.collection_path(Operation::List, Some(parent))?;
        let (items, next) = self.collection.list_for_parent(ctx, parent, opt).await?;
        Ok((decode_page(&path, items)?, next))
    }

    /// Every entity of the top-level collection.
    /// This can take a while when the collection is large.
    pub async fn list_all(&self, ctx: &RequestContext) -> Result<Vec<E>> {
        list_all(self.page_size, |opt| async move { self.list(ctx, Some(&opt)).await }).await
    }

    /// Every entity owned by `parent`
    pub async fn list_all_for_parent(&self, ctx: &RequestContext, parent: &str) -> Result<Vec<E>> {
        list_all(self.page_size, |opt| async move {
            self.list_for_parent(ctx, parent, Some(&opt)).await
        })
        .await
    }
}

fn encode<E: Entity>(op: Operation, path: &str, entity: &E) -> Result<Value> {
    serde_json::to_value(entity).map_err(|source| Error::Encoding {
        op,
        kind: E::KIND,
        path: path.to_string(),
        source,
    })
}

fn decode<E: Entity>(op: Operation, path: &str, value: Value) -> Result<E> {
    serde_json::from_value(value).map_err(|source| Error::Encoding {
        op,
        kind: E::KIND,
        path: path.to_string(),
        source,
    })
}

/// Decode every item; one bad item fails the whole page
fn decode_page<E: Entity>(path: &str, items: Vec<Value>) -> Result<Vec<E>> {
    items
        .into_iter()
        .map(|item| decode(Operation::List, path, item))
        .collect()
}
