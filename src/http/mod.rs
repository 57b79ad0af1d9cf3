//! HTTP protocol implementation.
//!
//! This module implements a single-request HTTP/1.1 server for static files.
//! Each connection carries exactly one request and is closed afterwards.
//!
//! # Architecture
//!
//! - **`status`**: Status code table (numeric code, string form, reason phrase)
//! - **`request`**: Borrowed request representation and recognized headers
//! - **`parser`**: Request head parsing and percent-decoding
//! - **`path`**: Root-confined resolution of request targets
//! - **`response`**: Header accumulation and the send-ordering state machine
//! - **`writer`**: Transports and zero-copy body transfer
//! - **`files`**: Regular file responses, including conditional GET
//! - **`listing`**: HTML directory listings
//! - **`connection`**: Per-connection orchestration and the access record
//!
//! # Request flow
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Fill the receive buffer up to the blank line
//!        └──────┬──────┘
//!               │ Request head parsed (431/400 otherwise)
//!               ▼
//!        ┌──────────────────┐
//!        │    Resolving     │ ← Canonicalize inside the server root
//!        └──────┬───────────┘
//!               │ File, directory, redirect or error
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Status line + headers, then body
//!        └──────┬───────────┘
//!               │ Access record logged
//!               └─ Close
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use staticd::http::connection::{Connection, Site};
//! use staticd::http::path::ServerRoot;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let site = Arc::new(Site::new(ServerRoot::new(".")?));
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let site = site.clone();
//!         tokio::spawn(async move {
//!             Connection::new(socket, peer, site).run().await;
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod files;
pub mod listing;
pub mod parser;
pub mod path;
pub mod request;
pub mod response;
pub mod status;
pub mod writer;
