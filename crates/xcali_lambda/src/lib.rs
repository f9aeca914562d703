//! AWS-oriented adapters and handlers for the xcali drawing service.
//!
//! This crate owns runtime integration details (Lambda entry points, S3
//! storage, configuration and log setup) on top of the protocol primitives in
//! `xcali_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod runtime;
pub mod telemetry;
