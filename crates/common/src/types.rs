// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use strum::{Display, EnumString};

/// Services shipped as standalone host processes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ServiceKind {
    Test,
    User,
}

impl ServiceKind {
    /// Fully qualified gRPC service name, as routed by the host
    #[must_use]
    pub fn service_name(self) -> &'static str {
        match self {
            Self::Test => "siriuslingo.test.TestService",
            Self::User => "siriuslingo.user.UserService",
        }
    }

    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::Test => 50053,
            Self::User => 50052,
        }
    }
}
