//! Kong Admin - typed client for the gateway admin API
//!
//! This crate provides:
//! - Typed CRUD for services, routes, consumers and consumer credentials
//! - Cursor-based paginated listing, one page at a time or exhaustively
//! - A pluggable transport with a `reqwest` implementation
//! - TOML configuration and Prometheus request metrics

pub mod client;
pub mod collection;
pub mod config;
pub mod entities;
pub mod entity_service;
pub mod error;
pub mod metrics;
pub mod resource;
pub mod transport;

pub use client::AdminClient;
pub use collection::ListOpt;
pub use config::ClientConfig;
pub use error::{Error, Result, TransportError};
pub use resource::{Entity, EntityRef, ResourceKind, ValidationFailure};
pub use transport::RequestContext;
