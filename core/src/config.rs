//! Client configuration.

use std::env;

use crate::codec::READ_CHUNK_SIZE;
use crate::error::HttpError;

pub const ENV_READ_CHUNK_SIZE: &str = "HTTPFAST_READ_CHUNK_SIZE";
pub const ENV_RETRY_STALE: &str = "HTTPFAST_RETRY_STALE";

/// Tunables for an [`HttpFastClient`](crate::HttpFastClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Largest single read from a connection.
    pub read_chunk_size: usize,
    /// Evict a reused connection that fails mid-request and retry once on a
    /// fresh one.
    pub retry_stale_connections: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: READ_CHUNK_SIZE,
            retry_stale_connections: true,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `HTTPFAST_READ_CHUNK_SIZE` and
    /// `HTTPFAST_RETRY_STALE` when they are set.
    pub fn from_env() -> Result<Self, HttpError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HttpError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_READ_CHUNK_SIZE) {
            let size = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| HttpError::Config(format!("{ENV_READ_CHUNK_SIZE}=`{raw}` is not a size")))?;
            config = config.read_chunk_size(size)?;
        }
        if let Some(raw) = lookup(ENV_RETRY_STALE) {
            config.retry_stale_connections = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(HttpError::Config(format!(
                        "{ENV_RETRY_STALE}=`{raw}` is not a boolean"
                    )))
                }
            };
        }
        Ok(config)
    }

    pub fn read_chunk_size(mut self, size: usize) -> Result<Self, HttpError> {
        if size == 0 {
            return Err(HttpError::Config("read chunk size must be positive".to_string()));
        }
        self.read_chunk_size = size;
        Ok(self)
    }

    pub fn retry_stale_connections(mut self, retry: bool) -> Self {
        self.retry_stale_connections = retry;
        self
    }
}
