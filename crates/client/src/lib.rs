// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

pub mod client;
pub mod endpoint;
pub mod error;
pub use crate::client::LingoClient;
