//! Resource kinds and the entity contract
//!
//! Every admin resource is described by a [`ResourceKind`] variant that knows
//! its collection path, its parent kind (if it can be scoped under one) and
//! the path segment used when it is nested under that parent.
//!
//! Typed records implement [`Entity`], which ties the record type to its kind
//! so the generic engine can encode and decode it.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters escaped inside a single path segment.
/// Unreserved characters from RFC 3986 are left as-is.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Resource kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Service,
    Route,
    Consumer,
    KeyAuth,
    BasicAuth,
    HmacAuth,
    Jwt,
    Acl,
    LimitKeyQuota,
}

impl ResourceKind {
    /// All known kinds, in a stable order
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Service,
        ResourceKind::Route,
        ResourceKind::Consumer,
        ResourceKind::KeyAuth,
        ResourceKind::BasicAuth,
        ResourceKind::HmacAuth,
        ResourceKind::Jwt,
        ResourceKind::Acl,
        ResourceKind::LimitKeyQuota,
    ];

    /// Discriminator name, as used by the admin API for plugin-backed kinds
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Service => "service",
            ResourceKind::Route => "route",
            ResourceKind::Consumer => "consumer",
            ResourceKind::KeyAuth => "key-auth",
            ResourceKind::BasicAuth => "basic-auth",
            ResourceKind::HmacAuth => "hmac-auth",
            ResourceKind::Jwt => "jwt",
            ResourceKind::Acl => "acl",
            ResourceKind::LimitKeyQuota => "limit-key-quota",
        }
    }

    /// Top-level collection segment (e.g. `key-auths` for `/key-auths`)
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Service => "services",
            ResourceKind::Route => "routes",
            ResourceKind::Consumer => "consumers",
            ResourceKind::KeyAuth => "key-auths",
            ResourceKind::BasicAuth => "basic-auths",
            ResourceKind::HmacAuth => "hmac-auths",
            ResourceKind::Jwt => "jwts",
            ResourceKind::Acl => "acls",
            ResourceKind::LimitKeyQuota => "limit-key-quotas",
        }
    }

    /// Kind this resource can be scoped under, if any
    pub fn parent(&self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Service | ResourceKind::Consumer => None,
            ResourceKind::Route => Some(ResourceKind::Service),
            ResourceKind::KeyAuth
            | ResourceKind::BasicAuth
            | ResourceKind::HmacAuth
            | ResourceKind::Jwt
            | ResourceKind::Acl
            | ResourceKind::LimitKeyQuota => Some(ResourceKind::Consumer),
        }
    }

    /// Segment used below the parent entity.
    ///
    /// Credentials are nested under their singular plugin name
    /// (`/consumers/{c}/key-auth`) while routes and ACLs keep the plural.
    pub fn nested_segment(&self) -> &'static str {
        match self {
            ResourceKind::Route => "routes",
            ResourceKind::Acl => "acls",
            ResourceKind::KeyAuth
            | ResourceKind::BasicAuth
            | ResourceKind::HmacAuth
            | ResourceKind::Jwt
            | ResourceKind::LimitKeyQuota => self.name(),
            ResourceKind::Service | ResourceKind::Consumer => self.collection(),
        }
    }

    /// Collection path, optionally scoped under a parent id or key.
    ///
    /// Fails when a parent is given for a kind that has none, or when the
    /// parent reference is empty.
    pub fn collection_path(&self, parent: Option<&str>) -> Result<String, &'static str> {
        match parent {
            None => Ok(format!("/{}", self.collection())),
            Some("") => Err("parent reference must not be empty"),
            Some(parent_ref) => {
                let parent_kind = self
                    .parent()
                    .ok_or("resource kind cannot be scoped under a parent")?;
                Ok(format!(
                    "/{}/{}/{}",
                    parent_kind.collection(),
                    encode_segment(parent_ref),
                    self.nested_segment()
                ))
            }
        }
    }

    /// Path of a single entity, optionally scoped under a parent
    pub fn entity_path(&self, parent: Option<&str>, id_or_key: &str) -> Result<String, &'static str> {
        if id_or_key.is_empty() {
            return Err("identifier must not be empty");
        }
        let base = self.collection_path(parent)?;
        Ok(format!("{}/{}", base, encode_segment(id_or_key)))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    /// Accepts either the discriminator name or the collection segment
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted || kind.collection() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = ResourceKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown resource kind '{}' (known: {})", s, known.join(", "))
            })
    }
}

/// Percent-encode one path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Reference to another entity by identifier.
///
/// Used for back-references such as a route's service or a credential's
/// consumer. Serialized as `{"id": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl EntityRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Result of a failed local validity check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {reason}")]
pub struct ValidationFailure {
    pub kind: ResourceKind,
    pub reason: String,
}

impl ValidationFailure {
    pub fn new(kind: ResourceKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// A typed admin resource record.
///
/// `validate` is a local, advisory pre-check. Service operations never call
/// it; the admin API remains the final authority.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Kind that selects the collection paths for this record type
    const KIND: ResourceKind;

    /// Server-assigned identifier, if known
    fn id(&self) -> Option<&str>;

    fn validate(&self) -> Result<(), ValidationFailure> {
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
