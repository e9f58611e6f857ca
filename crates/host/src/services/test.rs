// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use lingo_common::pb;
use lingo_common::types::ServiceKind;
use tonic::{Request, Response, Status};

use crate::utils::tonic::escalate;

pub use pb::test::test_service_server::TestServiceServer;

#[derive(Debug, Clone, Default)]
pub struct TestHandler {}

impl TestHandler {
    #[must_use]
    pub fn new() -> Self {
        TestHandler::default()
    }
}

#[tonic::async_trait]
impl pb::test::test_service_server::TestService for TestHandler {
    async fn ping(
        &self,
        request: Request<pb::diag::PingRequest>,
    ) -> Result<Response<pb::diag::PingReply>, Status> {
        escalate(request, |req| async move {
            super::pong(ServiceKind::Test.service_name(), req)
        })
        .await
    }
}
