//! Endpoint reference parsing.
//!
//! `EndpointRef::parse("127.0.0.1:9090", "Geo.Locate")` -> host, port, service, method.
//! Both inputs must split into exactly two non-empty parts.

use std::fmt;

use super::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRef {
    pub host: String,
    pub port: u16,
    pub service: String,
    pub method: String,
}

impl EndpointRef {
    pub fn parse(conn: &str, endpoint: &str) -> Result<Self> {
        let conn = conn.trim();
        let endpoint = endpoint.trim();

        let (host, port_raw) = split_pair(conn, ':')
            .ok_or_else(|| Error::format("connection string", conn, "expected HOST:PORT"))?;
        let port = port_raw
            .parse::<u16>()
            .map_err(|_| Error::format("connection string", conn, "port must be 0-65535"))?;

        let (service, method) = split_pair(endpoint, '.')
            .ok_or_else(|| Error::format("endpoint", endpoint, "expected SERVICE.METHOD"))?;

        Ok(Self {
            host: host.to_string(),
            port,
            service: service.to_string(),
            method: method.to_string(),
        })
    }

    /// `host:port`
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `service.method`
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.service, self.method)
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} @ {}:{}", self.service, self.method, self.host, self.port)
    }
}

fn split_pair(raw: &str, sep: char) -> Option<(&str, &str)> {
    let mut parts = raw.split(sep);
    let first = parts.next()?;
    let second = parts.next()?;
    if parts.next().is_some() || first.is_empty() || second.is_empty() {
        return None;
    }
    Some((first, second))
}
