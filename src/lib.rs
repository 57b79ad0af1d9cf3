//! staticd - static file server
//!
//! Core library: HTTP request parsing, root-confined path resolution and
//! response generation for files and directory listings.

pub mod config;
pub mod http;
pub mod server;
