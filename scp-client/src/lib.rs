//! SCP Client
//!
//! Typed REST client for the SCP control plane. [`ScpClient`] groups one
//! sub-client per service; every call returns a [`ClientResult`] whose error
//! carries the HTTP status code.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod page;
pub mod services;

pub use client::ScpClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, is_deleted};
pub use page::{AsyncResponse, ListResponse, PageRequest, Query};
pub use scp_core::composite_id::CompositeId;
