//! Shared request-handling primitives for the xcali drawing service.
//!
//! This crate owns the session negotiation protocol, the inbound event model,
//! and the response envelope contract. It intentionally excludes AWS SDK and
//! Lambda runtime concerns; those live in `xcali_lambda`.

pub mod content_type;
pub mod cookie;
pub mod envelope;
pub mod event;
pub mod invocation;
pub mod session;
pub mod storage_keys;
pub mod store;
