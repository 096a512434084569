//! Credentials owned by a consumer
//!
//! Each credential kind lives under `/consumers/{consumer}/{kind}` and is also
//! listable across all consumers from its top-level collection.

use crate::resource::{Entity, EntityRef, ResourceKind};
use serde::{Deserialize, Serialize};

/// `key-auth` API key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Generated by the server when absent on create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<EntityRef>,
}

/// `basic-auth` username/password pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Returned hashed by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<EntityRef>,
}

/// `hmac-auth` signing credential
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HmacAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<EntityRef>,
}

/// `jwt` verification credential
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Jwt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Value matched against the token's `iss` claim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsa_public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<EntityRef>,
}

/// ACL group membership
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Acl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<EntityRef>,
}

/// `limit-key-quota` credential: an API key with a request quota
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitKeyQuota {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<EntityRef>,
}

macro_rules! consumer_credential {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: ResourceKind = $kind;

                fn id(&self) -> Option<&str> {
                    self.id.as_deref()
                }
            }

            impl $ty {
                /// Identifier of the owning consumer
                pub fn consumer_id(&self) -> Option<&str> {
                    self.consumer.as_ref().and_then(EntityRef::id)
                }
            }
        )*
    };
}

consumer_credential! {
    KeyAuth => ResourceKind::KeyAuth,
    BasicAuth => ResourceKind::BasicAuth,
    HmacAuth => ResourceKind::HmacAuth,
    Jwt => ResourceKind::Jwt,
    Acl => ResourceKind::Acl,
    LimitKeyQuota => ResourceKind::LimitKeyQuota,
}
