// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

mod probe;

pub use probe::{Probe, ProbeServiceServer, hold};

use std::net::{Ipv4Addr, SocketAddr};

use lingo_client::endpoint::EndpointConfig;
use lingo_common::pb::probe::probe_service_client::ProbeServiceClient;
use tonic::transport::Channel;

use super::ServiceHost;
use crate::config::HostConfig;

/// Host on ephemeral loopback port
pub fn make_test_host(workers: usize) -> ServiceHost {
    ServiceHost::new(
        HostConfig::new(0)
            .with_bind_address(Ipv4Addr::LOCALHOST.into())
            .with_workers(workers),
    )
}

/// Started host serving a fresh probe
pub async fn start_probe_host(workers: usize) -> (ServiceHost, Probe, SocketAddr) {
    let host = make_test_host(workers);
    let probe = Probe::default();
    host.register(ProbeServiceServer::new(probe.clone())).unwrap();
    let addr = host.start().await.unwrap();
    (host, probe, addr)
}

pub async fn channel(addr: SocketAddr) -> Channel {
    EndpointConfig::from(addr).connect().await.unwrap()
}

pub async fn probe_client(addr: SocketAddr) -> ProbeServiceClient<Channel> {
    ProbeServiceClient::new(channel(addr).await)
}
