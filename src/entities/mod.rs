//! Typed admin resources
//!
//! Every field is optional so that "not set" is distinguishable from a zero
//! or empty value; unset fields are left out of request bodies.

mod consumer;
mod credential;
mod route;
mod service;

pub use consumer::Consumer;
pub use credential::{Acl, BasicAuth, HmacAuth, Jwt, KeyAuth, LimitKeyQuota};
pub use route::Route;
pub use service::Service;
