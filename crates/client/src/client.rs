// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use tonic::transport::Channel;
use tracing::debug;

use lingo_common::pb;
pub use lingo_common::pb::diag::PingReply;
use lingo_common::types::ServiceKind;

use crate::endpoint::EndpointConfig;
use crate::error::StatusWrapExt;

type TestClient = pb::test::test_service_client::TestServiceClient<Channel>;
type UserClient = pb::user::user_service_client::UserServiceClient<Channel>;

#[derive(Debug, Clone)]
pub struct LingoClient {
    endpoint: EndpointConfig,
}

impl LingoClient {
    #[must_use]
    pub fn new(addr: String, port: u16) -> Self {
        Self::from_endpoint(EndpointConfig::new(addr, port))
    }

    #[must_use]
    pub fn from_endpoint(endpoint: EndpointConfig) -> Self {
        Self { endpoint }
    }

    #[must_use]
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Ping one of hosted services
    /// # Errors
    /// Fails if unable to connect, or if the service answers with error status
    pub async fn ping(&self, kind: ServiceKind, message: String) -> anyhow::Result<PingReply> {
        let channel = self.endpoint.connect().await?;
        let request = pb::diag::PingRequest { message };
        debug!("Pinging {kind} with {request:?}");
        let response = match kind {
            ServiceKind::Test => TestClient::new(channel).ping(request).await,
            ServiceKind::User => UserClient::new(channel).ping(request).await,
        }
        .rewrap_err()?;
        Ok(response.into_inner())
    }
}
