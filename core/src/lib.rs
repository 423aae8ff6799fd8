//! Minimal blocking HTTP/1.1 client.
//!
//! # Overview
//! Sends `GET`, `POST`, `PUT`, `PATCH` and `DELETE` requests with JSON
//! bodies over plain TCP or TLS and parses the raw byte stream back into a
//! status code, headers and body. One connection per host is kept open and
//! reused for later requests to that host.
//!
//! # Design
//! - `url` decomposes a URL string into an `Endpoint` (scheme, host, path).
//! - `connection` opens streams through the `Connector` trait and keeps the
//!   host-keyed table of idle connections.
//! - `codec` frames requests and reads responses from any `Read`/`Write`.
//!   Bodies are delimited by `Content-Length` only.
//! - `client` wires the three together behind the verb methods.
//!
//! ```no_run
//! use httpfast_core::HttpFastClient;
//!
//! let mut client = HttpFastClient::new();
//! let response = client.post("http://httpbin.org/post", &serde_json::json!({"k": "v"}))?;
//! println!("{} {}", response.status, response.text()?);
//! # Ok::<(), httpfast_core::HttpError>(())
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod http;
pub mod url;

#[cfg(test)]
pub(crate) mod testing;

pub use client::HttpFastClient;
pub use config::ClientConfig;
pub use connection::{Connection, ConnectionManager, Connector, TcpConnector, Transport};
pub use error::HttpError;
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse};
pub use url::{Endpoint, Scheme};
