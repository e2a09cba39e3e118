//! # condnet
//!
//! An HTTP client layer that makes every request a conditional GET and
//! negotiates gzip transparently.
//!
//! - **Conditional GET**: the `ETag` and `Last-Modified` of each successful
//!   response are kept in an in-memory [`ResponseCache`](http::ResponseCache)
//!   together with the decoded body. The next request for the same method and
//!   URL carries `If-None-Match` / `If-Modified-Since`, and a `304 Not
//!   Modified` is handed to the caller as `200 OK` with the stored body.
//! - **Gzip**: `Accept-Encoding: gzip` is sent unless the caller set the
//!   header, and gzip entities are decoded as they stream in.
//! - **HTTP/1.1 transport**: hyper over tokio, TLS via BoringSSL. The
//!   [`Transport`](http::Transport) trait lets tests and embedders swap it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use condnet::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), condnet::FetchError> {
//!     let client = Client::new();
//!     let body = client.get_text("https://example.com/feed.xml").await?;
//!     println!("{}", body);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error types and exchange states
//! - [`http`] - Requests, responses, cache, interceptors, transports
//! - [`socket`] - TCP/TLS connection setup

pub mod base;
pub mod client;
pub mod http;
pub mod socket;

pub use base::error::FetchError;
pub use base::neterror::NetError;
pub use client::{Client, ClientBuilder, ClientConfig};
