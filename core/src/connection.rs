//! Connection establishment and the per-host connection table.
//!
//! # Design
//! `ConnectionManager` owns every idle connection, keyed by the URL's host
//! segment. A connection is taken out of the table while a request is using
//! it and handed back with `retain` once the exchange succeeded, so two
//! requests can never interleave on one stream. Nothing checks whether an
//! idle connection is still alive; the client notices a dead one when the
//! next exchange fails.
//!
//! Opening streams goes through the `Connector` trait. `TcpConnector` is the
//! real thing (TCP, optionally wrapped in rustls); tests plug in fakes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, OnceLock};

use log::debug;
use rustls::pki_types::ServerName;
use rustls::{ClientConnection, RootCertStore, StreamOwned};

use crate::error::HttpError;
use crate::url::{Endpoint, Scheme};

/// A bidirectional byte stream that can be shut down deliberately.
pub trait Transport: Read + Write {
    /// Orderly shutdown. Dropping the stream releases it too, this just lets
    /// the peer know sooner.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Opens a new stream for an endpoint.
pub trait Connector {
    type Stream: Transport;

    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Stream, HttpError>;
}

/// An open connection: plain TCP, or TCP inside a TLS session.
pub enum Connection {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Plain(stream) => f.debug_tuple("Plain").field(stream).finish(),
            Connection::Tls(stream) => f.debug_tuple("Tls").field(&stream.sock).finish(),
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Connection::Plain(stream) => stream.read(buf),
            Connection::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Connection::Plain(stream) => stream.write(buf),
            Connection::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Connection::Plain(stream) => stream.flush(),
            Connection::Tls(stream) => stream.flush(),
        }
    }
}

impl Transport for Connection {
    fn close(&mut self) -> io::Result<()> {
        match self {
            Connection::Plain(stream) => stream.shutdown(Shutdown::Both),
            Connection::Tls(stream) => {
                stream.conn.send_close_notify();
                stream.flush()?;
                stream.sock.shutdown(Shutdown::Both)
            }
        }
    }
}

/// Connects over TCP and, for `https`, completes a TLS handshake against the
/// hostname using the webpki root store.
#[derive(Debug, Default)]
pub struct TcpConnector {
    tls: OnceLock<Arc<rustls::ClientConfig>>,
}

impl TcpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn tls_config(&self) -> Result<Arc<rustls::ClientConfig>, HttpError> {
        if let Some(config) = self.tls.get() {
            return Ok(config.clone());
        }
        let config = build_tls_config()?;
        Ok(self.tls.get_or_init(|| config).clone())
    }

    fn handshake(&self, endpoint: &Endpoint, mut tcp: TcpStream) -> Result<Connection, HttpError> {
        let host = endpoint.hostname();
        let tls_error = |reason: String| HttpError::TlsHandshake {
            host: host.to_string(),
            reason,
        };

        let server_name =
            ServerName::try_from(host.to_string()).map_err(|e| tls_error(e.to_string()))?;
        let mut conn = ClientConnection::new(self.tls_config()?, server_name)
            .map_err(|e| tls_error(e.to_string()))?;
        while conn.is_handshaking() {
            conn.complete_io(&mut tcp).map_err(|e| tls_error(e.to_string()))?;
        }
        debug!("TLS session with {host} established");
        Ok(Connection::Tls(Box::new(StreamOwned::new(conn, tcp))))
    }
}

impl Connector for TcpConnector {
    type Stream = Connection;

    fn connect(&self, endpoint: &Endpoint) -> Result<Connection, HttpError> {
        let (host, port) = (endpoint.hostname(), endpoint.port());
        let tcp = TcpStream::connect((host, port)).map_err(|e| {
            HttpError::Connection(io::Error::new(e.kind(), format!("connect to {host}:{port}: {e}")))
        })?;
        debug!("connected to {host}:{port}");

        match endpoint.scheme() {
            Scheme::Http => Ok(Connection::Plain(tcp)),
            Scheme::Https => self.handshake(endpoint, tcp),
        }
    }
}

fn build_tls_config() -> Result<Arc<rustls::ClientConfig>, HttpError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| HttpError::TlsHandshake {
            host: String::new(),
            reason: format!("TLS configuration: {e}"),
        })?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

/// A connection handed out by [`ConnectionManager::acquire`].
pub struct Lease<S> {
    pub stream: S,
    /// True when the stream came from the table rather than a fresh connect.
    pub reused: bool,
}

/// Host-keyed table of idle connections.
///
/// Every held connection is closed by [`close_all`](Self::close_all) or when
/// the manager is dropped.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    table: HashMap<String, C::Stream>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            table: HashMap::new(),
        }
    }

    /// Hand out the idle connection for `endpoint`'s host, or open one.
    ///
    /// A cached connection is returned as-is, without a liveness check.
    pub fn acquire(&mut self, endpoint: &Endpoint) -> Result<Lease<C::Stream>, HttpError> {
        if let Some(stream) = self.table.remove(endpoint.host()) {
            debug!("reusing connection to {}", endpoint.host());
            return Ok(Lease {
                stream,
                reused: true,
            });
        }
        let stream = self.open(endpoint)?;
        Ok(Lease {
            stream,
            reused: false,
        })
    }

    /// Open a fresh connection, bypassing the table.
    pub fn open(&self, endpoint: &Endpoint) -> Result<C::Stream, HttpError> {
        debug!("opening connection to {endpoint}");
        self.connector.connect(endpoint)
    }

    /// Keep `stream` for later requests to `endpoint`'s host. If the host
    /// already has a connection, that one stays and `stream` is closed.
    pub fn retain(&mut self, endpoint: &Endpoint, stream: C::Stream) {
        match self.table.entry(endpoint.host().to_string()) {
            Entry::Vacant(slot) => {
                debug!("retaining connection to {}", endpoint.host());
                slot.insert(stream);
            }
            Entry::Occupied(slot) => close_quietly(slot.key(), stream),
        }
    }

    /// Close and forget the connection held for `host`.
    pub fn evict(&mut self, host: &str) -> bool {
        match self.table.remove(host) {
            Some(stream) => {
                debug!("evicting connection to {host}");
                close_quietly(host, stream);
                true
            }
            None => false,
        }
    }

    /// Close every held connection.
    pub fn close_all(&mut self) {
        for (host, stream) in self.table.drain() {
            close_quietly(&host, stream);
        }
    }

    pub fn contains(&self, host: &str) -> bool {
        self.table.contains_key(host)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

impl<C: Connector> Drop for ConnectionManager<C> {
    fn drop(&mut self) {
        self.close_all();
    }
}

/// Close `stream`, logging rather than returning any error.
pub(crate) fn close_quietly<S: Transport>(host: &str, mut stream: S) {
    if let Err(e) = stream.close() {
        debug!("closing connection to {host}: {e}");
    }
}
