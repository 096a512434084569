use crate::resource::{Entity, ResourceKind, ValidationFailure};
use serde::{Deserialize, Serialize};

/// An API consumer; owner of credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

impl Consumer {
    pub fn with_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }
}

impl Entity for Consumer {
    const KIND: ResourceKind = ResourceKind::Consumer;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn validate(&self) -> Result<(), ValidationFailure> {
        let set = |v: &Option<String>| v.as_deref().map(|s| !s.is_empty()).unwrap_or(false);
        if !set(&self.username) && !set(&self.custom_id) {
            return Err(ValidationFailure::new(
                Self::KIND,
                "at least one of username or custom_id must be set",
            ));
        }
        Ok(())
    }
}
