//! Async API client core for the English Assistant service.
//!
//! # Overview
//! Every call the view layer makes to the remote service goes through
//! `ApiClient`, which deduplicates identical in-flight requests, caches
//! successful GET responses for a fixed TTL, enforces a per-request deadline
//! and folds every failure into one `ClientError` taxonomy.
//!
//! # Design
//! - `ApiClient` is constructed explicitly from a `ClientConfig`; there is
//!   no process-wide instance, so tests build isolated clients.
//! - The network sits behind the `Transport` trait (`http` module); the
//!   reqwest implementation is the default and tests script their own.
//! - Domain wrappers (`api` module) only shape paths and bodies and return
//!   the typed DTOs from `types`.
//! - `debounce` keeps search-as-you-type inputs from issuing one request per
//!   keystroke.

mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod debounce;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod query;
pub mod types;

pub use cache::fingerprint;
pub use client::{ApiClient, ApiResponse, ClientResult, RequestOptions};
pub use config::{ClientConfig, ErrorMessages};
pub use debounce::{debounce, Debounced};
pub use endpoint::Endpoint;
pub use error::{ClientError, ConfigError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
pub use query::{FilterValue, Filters};
pub use types::*;
