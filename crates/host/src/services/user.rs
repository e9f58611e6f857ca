// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use lingo_common::pb;
use lingo_common::types::ServiceKind;
use tonic::{Request, Response, Status};

use crate::utils::tonic::escalate;

pub use pb::user::user_service_server::UserServiceServer;

#[derive(Debug, Clone, Default)]
pub struct UserHandler {}

impl UserHandler {
    #[must_use]
    pub fn new() -> Self {
        UserHandler::default()
    }
}

#[tonic::async_trait]
impl pb::user::user_service_server::UserService for UserHandler {
    async fn ping(
        &self,
        request: Request<pb::diag::PingRequest>,
    ) -> Result<Response<pb::diag::PingReply>, Status> {
        escalate(request, |req| async move {
            super::pong(ServiceKind::User.service_name(), req)
        })
        .await
    }
}
