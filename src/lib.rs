//! # unifetch
//!
//! A cross-environment, fetch-style HTTP request library.
//!
//! `unifetch` normalizes loosely-typed request options (method casing and
//! validation, header coercion, JSON and form-data body encoding, timeout
//! cancellation, TLS verification toggles, cookie-jar integration) and
//! dispatches through a platform HTTP client. It implements no protocol,
//! no connection management, and no retries: transport, TLS, and cookie
//! persistence are delegated to the underlying client.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use unifetch::{post, FetchInit};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), unifetch::FetchError> {
//!     let response = post("https://example.com/api", FetchInit {
//!         json: Some(json!({ "n": 1 }).into()),
//!         timeout: Some(std::time::Duration::from_secs(5)),
//!         ..Default::default()
//!     })
//!     .await?;
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`init`] - Option types and the normalization pipeline
//! - [`params`] - URL-encoded form parameters
//! - [`native`] - Server-side dispatcher with agents and cookie jars
//! - [`web`] - Browser-profile dispatcher
//! - [`error`] - Error taxonomy
//!
//! The native dispatcher and its shorthands are re-exported at the crate
//! root; the web profile lives under [`web`].

mod deadline;

pub mod error;
pub mod init;
pub mod native;
pub mod params;
pub mod web;

pub use error::FetchError;
pub use init::{
    normalize, Body, FetchInit, FormPayload, HeaderInput, JsonPayload, NormalizedInit, METHODS,
};
pub use native::{connect, delete, fetch, get, head, options, patch, post, put, trace, Agent};
pub use params::{encode, UrlEncodedParams};

// Collaborator types, re-exported so callers need not depend on the
// underlying crates directly.
pub use cookie::Cookie;
pub use http::HeaderMap;
pub use reqwest::cookie::Jar as CookieJar;
pub use reqwest::Response;
