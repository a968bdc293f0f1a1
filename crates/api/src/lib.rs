//! r2-api: REST API adapter for the r2 CLI
//!
//! This crate provides the implementation of the ObjectStore trait over
//! the account-scoped HTTP API. It is the only crate that talks HTTP.

pub mod client;
pub mod envelope;

pub use client::{Credentials, JURISDICTION_HEADER, RemoteClient};
