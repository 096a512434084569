//! In-process fake of the admin API used by the integration tests.
//!
//! Supports flat and parent-scoped collections, cursor pagination with
//! opaque offsets, and the error bodies the real API returns.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use kong_admin::transport::HttpTransport;
use kong_admin::AdminClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Nested segment -> (parent collection, flat collection, parent field)
const NESTED: &[(&str, &str, &str, &str)] = &[
    ("services", "routes", "routes", "service"),
    ("consumers", "key-auth", "key-auths", "consumer"),
    ("consumers", "basic-auth", "basic-auths", "consumer"),
    ("consumers", "hmac-auth", "hmac-auths", "consumer"),
    ("consumers", "jwt", "jwts", "consumer"),
    ("consumers", "acls", "acls", "consumer"),
    ("consumers", "limit-key-quota", "limit-key-quotas", "consumer"),
];

const COLLECTIONS: &[&str] = &[
    "services",
    "routes",
    "consumers",
    "key-auths",
    "basic-auths",
    "hmac-auths",
    "jwts",
    "acls",
    "limit-key-quotas",
];

#[derive(Default)]
struct Store {
    collections: HashMap<String, Vec<Value>>,
    next_id: u64,
}

#[derive(Default)]
struct Shared {
    store: Mutex<Store>,
    list_requests: AtomicUsize,
    stall_after: Mutex<Option<usize>>,
}

/// A running fake admin API
pub struct FakeAdmin {
    pub addr: SocketAddr,
    shared: Arc<Shared>,
}

impl FakeAdmin {
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let app = Router::new().fallback(handle).with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, shared }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> AdminClient {
        let transport = HttpTransport::new(&self.url(), Duration::from_secs(5), &[]).unwrap();
        AdminClient::new(Arc::new(transport))
    }

    /// Insert items into a flat collection, in order
    pub fn seed(&self, collection: &str, items: Vec<Value>) {
        let mut store = self.shared.store.lock().unwrap();
        store
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(items);
    }

    /// Hang every list request after the first `served` ones
    pub fn stall_lists_after(&self, served: usize) {
        *self.shared.stall_after.lock().unwrap() = Some(served);
    }

    /// Number of list requests served so far
    pub fn list_requests(&self) -> usize {
        self.shared.list_requests.load(Ordering::SeqCst)
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" }))).into_response()
}

fn matches_key(item: &Value, key: &str) -> bool {
    ["id", "username", "name", "key"]
        .iter()
        .any(|field| item.get(*field).and_then(Value::as_str) == Some(key))
}

fn belongs_to(item: &Value, parent_field: &str, parent_id: &str) -> bool {
    item.get(parent_field)
        .and_then(|p| p.get("id"))
        .and_then(Value::as_str)
        == Some(parent_id)
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let segments: Vec<&str> = uri
        .path()
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        ["slow"] => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            return Json(json!({ "data": [] })).into_response();
        }
        ["broken"] => return (StatusCode::OK, "<html>not json</html>").into_response(),
        _ => {}
    }

    // Resolve (flat collection, parent filter, entity key)
    let (collection, parent, key) = match segments.as_slice() {
        [coll] if COLLECTIONS.contains(coll) => (coll.to_string(), None, None),
        [coll, key] if COLLECTIONS.contains(coll) => (coll.to_string(), None, Some(key.to_string())),
        [pcoll, pkey, seg] | [pcoll, pkey, seg, _] => {
            let Some((_, _, flat, field)) = NESTED
                .iter()
                .find(|(p, s, _, _)| p == pcoll && s == seg)
            else {
                return not_found();
            };
            let store = shared.store.lock().unwrap();
            let parent_id = store
                .collections
                .get(*pcoll)
                .and_then(|items| items.iter().find(|i| matches_key(i, pkey)))
                .and_then(|i| i["id"].as_str().map(str::to_string));
            let Some(parent_id) = parent_id else {
                return not_found();
            };
            let key = segments.get(3).map(|k| k.to_string());
            (flat.to_string(), Some((field.to_string(), parent_id)), key)
        }
        _ => return not_found(),
    };

    if method == Method::GET && key.is_none() {
        let served = shared.list_requests.fetch_add(1, Ordering::SeqCst) + 1;
        let stall_after = *shared.stall_after.lock().unwrap();
        if stall_after.is_some_and(|limit| served > limit) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
    }

    let mut store = shared.store.lock().unwrap();
    let visible = |item: &Value| match &parent {
        Some((field, id)) => belongs_to(item, field, id),
        None => true,
    };

    match (method, key) {
        (Method::GET, None) => {
            let items: Vec<Value> = store
                .collections
                .get(&collection)
                .map(|items| items.iter().filter(|i| visible(i)).cloned().collect())
                .unwrap_or_default();
            let size: usize = params
                .get("size")
                .and_then(|s| s.parse().ok())
                .unwrap_or(100);
            let start: usize = match params.get("offset") {
                Some(offset) => match offset.strip_prefix("cursor-").and_then(|s| s.parse().ok()) {
                    Some(start) => start,
                    None => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "message": "invalid offset" })),
                        )
                            .into_response()
                    }
                },
                None => 0,
            };
            let end = (start + size).min(items.len());
            let page = &items[start.min(end)..end];

            // Empty collections are encoded as an object, like older servers do
            let mut envelope = if page.is_empty() {
                json!({ "data": {}, "next": null })
            } else {
                json!({ "data": page, "next": null })
            };
            if end < items.len() {
                let offset = format!("cursor-{}", end);
                envelope["next"] = json!(format!("{}?offset={}", uri.path(), offset));
                envelope["offset"] = json!(offset);
            }
            Json(envelope).into_response()
        }
        (Method::POST, None) => {
            let Ok(Value::Object(mut entity)) = serde_json::from_slice::<Value>(&body) else {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": "Cannot parse JSON body" })),
                )
                    .into_response();
            };
            let items = store.collections.entry(collection.clone()).or_default();
            if collection == "consumers" {
                if let Some(Value::String(username)) = entity.get("username") {
                    if items.iter().any(|i| i["username"].as_str() == Some(username.as_str())) {
                        let message = format!("UNIQUE violation detected on '{{username=\"{}\"}}'", username);
                        return (StatusCode::CONFLICT, Json(json!({ "message": message })))
                            .into_response();
                    }
                }
            }
            store.next_id += 1;
            let generated = format!("fake-{}", store.next_id);
            entity.entry("id").or_insert(json!(generated));
            entity.insert("created_at".to_string(), json!(1_700_000_000));
            if let Some((field, id)) = &parent {
                entity.insert(field.clone(), json!({ "id": id }));
            }
            let entity = Value::Object(entity);
            store
                .collections
                .entry(collection)
                .or_default()
                .push(entity.clone());
            (StatusCode::CREATED, Json(entity)).into_response()
        }
        (method, Some(key)) => {
            let items = store.collections.entry(collection).or_default();
            let position = items.iter().position(|i| visible(i) && matches_key(i, &key));
            match (method, position) {
                (Method::GET, Some(pos)) => Json(items[pos].clone()).into_response(),
                (Method::DELETE, Some(pos)) => {
                    items.remove(pos);
                    StatusCode::NO_CONTENT.into_response()
                }
                (Method::PUT, Some(pos)) => {
                    let Ok(Value::Object(mut entity)) = serde_json::from_slice::<Value>(&body) else {
                        return StatusCode::BAD_REQUEST.into_response();
                    };
                    entity.insert("id".to_string(), items[pos]["id"].clone());
                    entity.insert("created_at".to_string(), items[pos]["created_at"].clone());
                    entity.insert("updated_at".to_string(), json!(1_700_000_100));
                    if let Some((field, id)) = &parent {
                        entity.insert(field.clone(), json!({ "id": id }));
                    }
                    items[pos] = Value::Object(entity);
                    Json(items[pos].clone()).into_response()
                }
                _ => not_found(),
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}
