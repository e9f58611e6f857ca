// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tonic::Status;

use super::HostState;

/// Programmer errors detected while setting up a host
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("service {0} is already registered")]
    DuplicateService(String),

    #[error("registration is closed, host is {0}")]
    RegistrationClosed(HostState),

    #[error("can't start, host is {0}")]
    AlreadyStarted(HostState),

    #[error("worker pool size must be at least 1")]
    NoWorkers,
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("can't bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("serving loop failed")]
    Serve(#[source] Arc<tonic::transport::Error>),
}

/// Failures of a single call, reported to its caller only
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallError {
    #[error("handler panicked")]
    Panicked,

    #[error("call cancelled by host shutdown")]
    Cancelled,
}

impl From<CallError> for Status {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Panicked => Status::internal(err.to_string()),
            CallError::Cancelled => Status::cancelled(err.to_string()),
        }
    }
}
