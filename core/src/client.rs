//! Blocking HTTP/1.1 client with per-host connection reuse.
//!
//! # Design
//! `HttpFastClient` ties the three pieces together: the URL is decomposed
//! into an `Endpoint`, the `ConnectionManager` supplies a stream for its
//! host, and the codec writes the request and reads the response. Every
//! method takes `&mut self`, so one client runs one request at a time and a
//! connection is never shared by two in-flight requests.
//!
//! A reused connection may have been closed by the peer while it sat idle.
//! When an exchange on a reused connection fails at the transport level, the
//! connection is dropped and the request is sent once more on a fresh one.
//! Fresh connections are never retried.

use log::warn;
use serde::Serialize;

use crate::codec;
use crate::config::ClientConfig;
use crate::connection::{close_quietly, ConnectionManager, Connector, TcpConnector};
use crate::error::HttpError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::url::Endpoint;

/// HTTP client owning one connection per host.
///
/// Connections are closed by [`close`](Self::close) or when the client is
/// dropped.
pub struct HttpFastClient<C: Connector = TcpConnector> {
    connections: ConnectionManager<C>,
    config: ClientConfig,
}

impl HttpFastClient<TcpConnector> {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_connector(TcpConnector::new(), config)
    }
}

impl Default for HttpFastClient<TcpConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> HttpFastClient<C> {
    pub fn with_connector(connector: C, config: ClientConfig) -> Self {
        Self {
            connections: ConnectionManager::new(connector),
            config,
        }
    }

    pub fn get(&mut self, url: &str) -> Result<HttpResponse, HttpError> {
        self.send(&HttpRequest::new(HttpMethod::Get, Endpoint::parse(url)?))
    }

    pub fn post<T: Serialize + ?Sized>(&mut self, url: &str, data: &T) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Post, url, Some(data))
    }

    pub fn put<T: Serialize + ?Sized>(&mut self, url: &str, data: &T) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Put, url, Some(data))
    }

    pub fn patch<T: Serialize + ?Sized>(&mut self, url: &str, data: &T) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Patch, url, Some(data))
    }

    pub fn delete<T: Serialize + ?Sized>(&mut self, url: &str, data: &T) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Delete, url, Some(data))
    }

    /// Send `method` to `url` with an optional JSON payload.
    pub fn request<T: Serialize + ?Sized>(
        &mut self,
        method: HttpMethod,
        url: &str,
        data: Option<&T>,
    ) -> Result<HttpResponse, HttpError> {
        let mut request = HttpRequest::new(method, Endpoint::parse(url)?);
        if let Some(data) = data {
            request = request.with_json(data)?;
        }
        self.send(&request)
    }

    /// Send a prepared request and read its response.
    pub fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let endpoint = &request.endpoint;
        let wire = codec::encode_request(request);

        let lease = self.connections.acquire(endpoint)?;
        let mut stream = lease.stream;
        let response = match self.exchange(&mut stream, &wire) {
            Ok(response) => response,
            Err(err)
                if lease.reused
                    && err.is_connection_error()
                    && self.config.retry_stale_connections =>
            {
                warn!(
                    "reused connection to {} failed ({err}), retrying on a new connection",
                    endpoint.host()
                );
                close_quietly(endpoint.host(), stream);
                stream = self.connections.open(endpoint)?;
                self.exchange(&mut stream, &wire)?
            }
            Err(err) => return Err(err),
        };

        self.connections.retain(endpoint, stream);
        Ok(response)
    }

    fn exchange(&self, stream: &mut C::Stream, wire: &[u8]) -> Result<HttpResponse, HttpError> {
        codec::write_request(stream, wire)?;
        codec::read_response(stream, self.config.read_chunk_size)
    }

    /// Close every connection the client holds. Later requests reconnect.
    pub fn close(&mut self) {
        self.connections.close_all();
    }

    pub fn connections(&self) -> &ConnectionManager<C> {
        &self.connections
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
