// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tonic::transport::{Channel, Endpoint};
use tracing::info;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(300);

/// Where to find a service host. Transport is always plain HTTP/2,
/// hosts never terminate TLS themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub addr: String,
    pub port: u16,
    pub connect_timeout: Duration,
}

impl EndpointConfig {
    #[must_use]
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_connect_timeout(self, connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            ..self
        }
    }

    #[must_use]
    pub fn url(&self) -> String {
        // Bare IPv6 literals have to be bracketed inside URL
        if self.addr.contains(':') && !self.addr.starts_with('[') {
            format!("http://[{}]:{}", self.addr, self.port)
        } else {
            format!("http://{}:{}", self.addr, self.port)
        }
    }

    /// # Errors
    /// Fails if url is malformed or host is unreachable
    pub async fn connect(&self) -> anyhow::Result<Channel> {
        let url = self.url();
        info!("Connecting to {url}");
        let channel = Endpoint::try_from(url.clone())?
            .connect_timeout(self.connect_timeout)
            .connect()
            .await
            .with_context(|| format!("Connecting TCP {url}"))?;
        Ok(channel)
    }
}

impl From<SocketAddr> for EndpointConfig {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_brackets_ipv6() {
        assert_eq!(
            EndpointConfig::new("127.0.0.1", 50053).url(),
            "http://127.0.0.1:50053"
        );
        assert_eq!(EndpointConfig::new("::1", 50052).url(), "http://[::1]:50052");
        let from_sock: EndpointConfig = "[::1]:9000".parse::<SocketAddr>().unwrap().into();
        assert_eq!(from_sock.url(), "http://[::1]:9000");
    }
}
