// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::num::ParseIntError;
use std::time::Duration;

use clap::Args;

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub bind_address: IpAddr,
    pub port: u16,
    /// Maximum number of calls executing simultaneously
    pub workers: usize,
    /// Grace period used when shutdown is triggered by a signal
    pub grace_period: Duration,
}

impl HostConfig {
    /// Listen on all interfaces, with default pool and grace period
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self {
            bind_address: IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            port,
            workers: DEFAULT_WORKERS,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    #[must_use]
    pub fn with_bind_address(self, bind_address: IpAddr) -> Self {
        Self {
            bind_address,
            ..self
        }
    }

    #[must_use]
    pub fn with_workers(self, workers: usize) -> Self {
        Self { workers, ..self }
    }

    #[must_use]
    pub fn with_grace_period(self, grace_period: Duration) -> Self {
        Self {
            grace_period,
            ..self
        }
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

fn parse_seconds(arg: &str) -> Result<Duration, ParseIntError> {
    arg.parse().map(Duration::from_secs)
}

/// Command line options common to every host binary
#[derive(Debug, Clone, Args)]
pub struct HostArgs {
    #[arg(long, env = "LINGO_LISTEN_ADDRESS", default_value = "::")]
    pub listen_address: IpAddr,

    /// Port to listen on, binary specific default if omitted
    #[arg(long, env = "LINGO_PORT")]
    pub port: Option<u16>,

    /// Size of worker pool
    #[arg(long, env = "LINGO_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Seconds allowed for in-flight calls on shutdown
    #[arg(long, env = "LINGO_GRACE_PERIOD", default_value = "5", value_parser = parse_seconds)]
    pub grace_period: Duration,
}

impl HostArgs {
    #[must_use]
    pub fn into_config(self, default_port: u16) -> HostConfig {
        HostConfig::new(self.port.unwrap_or(default_port))
            .with_bind_address(self.listen_address)
            .with_workers(self.workers)
            .with_grace_period(self.grace_period)
    }
}
