// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

pub mod dispatch;
pub mod error;
pub mod registry;
pub mod server;
pub mod signal;
pub mod state;

#[cfg(test)]
mod test;

pub use dispatch::PoolStats;
pub use error::{CallError, ConfigurationError, HostError};
pub use registry::HandlerRegistration;
pub use server::{CLEANUP_BOUND, ServiceHost, ShutdownOutcome};
pub use state::HostState;
