// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

//! Handlers for services shipped as standalone processes.
//! Only diagnostic `Ping` is defined for both; business methods don't exist yet.

use anyhow::{Context, ensure};
use lingo_common::pb::diag::{PingReply, PingRequest};
use lingo_common::pb::reflection::LINGO_DESCRIPTOR;
use lingo_common::types::ServiceKind;
use tracing::info;

use crate::config::{HostArgs, HostConfig};
use crate::host::{HostError, ServiceHost};

mod test;
mod user;

pub use test::{TestHandler, TestServiceServer};
pub use user::{UserHandler, UserServiceServer};

const MAX_PING_MESSAGE: usize = 1024;

fn pong(service: &str, req: PingRequest) -> anyhow::Result<PingReply> {
    ensure!(
        req.message.len() <= MAX_PING_MESSAGE,
        "ping message is {} bytes, limit is {MAX_PING_MESSAGE}",
        req.message.len()
    );
    let message = if req.message.is_empty() {
        "pong".to_owned()
    } else {
        req.message
    };
    Ok(PingReply {
        service: service.to_owned(),
        message,
    })
}

/// Register handler for `kind` on `host`
/// # Errors
/// Fails if host refuses registration
pub fn register(host: &ServiceHost, kind: ServiceKind) -> Result<(), HostError> {
    match kind {
        ServiceKind::Test => host.register(TestServiceServer::new(TestHandler::new())),
        ServiceKind::User => host.register(UserServiceServer::new(UserHandler::new())),
    }
}

/// Serve gRPC reflection for services registered on `host` so far
/// # Errors
/// Fails if descriptor set is malformed or host refuses registration
pub fn register_reflection(host: &ServiceHost) -> anyhow::Result<()> {
    let reflect = host
        .services()
        .into_iter()
        .fold(
            tonic_reflection::server::Builder::configure()
                .register_encoded_file_descriptor_set(LINGO_DESCRIPTOR),
            |builder, entry| builder.with_service_name(entry.name),
        )
        .build_v1()
        .context("Building reflection service")?;
    host.register(reflect)?;
    Ok(())
}

/// Set up and start host serving `kind` with reflection
/// # Errors
/// Fails if host can't be set up or bound
pub async fn launch(kind: ServiceKind, config: HostConfig) -> anyhow::Result<ServiceHost> {
    let host = ServiceHost::new(config);
    register(&host, kind)?;
    register_reflection(&host)?;
    host.start()
        .await
        .with_context(|| format!("Starting {kind} service"))?;
    Ok(host)
}

/// Host a single service until SIGINT/SIGTERM, then drain and return
/// # Errors
/// Fails if host can't be set up or bound, or serving loop dies
pub async fn run(kind: ServiceKind, args: HostArgs) -> anyhow::Result<()> {
    let host = launch(kind, args.into_config(kind.default_port())).await?;
    let _signals = host.shutdown_on_signal();
    host.await_termination().await?;
    info!("{kind} service terminated");
    Ok(())
}
