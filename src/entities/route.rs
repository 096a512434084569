use crate::resource::{Entity, EntityRef, ResourceKind, ValidationFailure};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A route: the matching rules that send requests to a service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_host: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_path: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_priority: Option<i64>,
    /// Service this route forwards to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<EntityRef>,
}

impl Route {
    pub fn service_id(&self) -> Option<&str> {
        self.service.as_ref().and_then(EntityRef::id)
    }
}

fn is_empty(values: &Option<Vec<String>>) -> bool {
    values.as_ref().map(Vec::is_empty).unwrap_or(true)
}

impl Entity for Route {
    const KIND: ResourceKind = ResourceKind::Route;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// A route needs at least one of methods, paths or hosts to match on
    fn validate(&self) -> Result<(), ValidationFailure> {
        if is_empty(&self.methods) && is_empty(&self.paths) && is_empty(&self.hosts) {
            return Err(ValidationFailure::new(
                Self::KIND,
                "at least one of methods, paths or hosts must be set",
            ));
        }
        Ok(())
    }
}

/// One-line summary: `[ id methods hosts paths preserve_host strip_path regex_priority service ]`
impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "nil".to_string())
        }
        fn list(values: &Option<Vec<String>>) -> String {
            match values {
                Some(values) => format!("[ {} ]", values.join(", ")),
                None => "nil".to_string(),
            }
        }

        write!(
            f,
            "[ {} {} {} {} {} {} {} {} ]",
            self.id.as_deref().unwrap_or("nil"),
            list(&self.methods),
            list(&self.hosts),
            list(&self.paths),
            opt(&self.preserve_host),
            opt(&self.strip_path),
            opt(&self.regex_priority),
            self.service_id().unwrap_or("nil"),
        )
    }
}
