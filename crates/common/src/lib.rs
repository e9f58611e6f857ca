// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

pub mod types;

pub mod pb {
    // Suppress clippy on generated code
    #![allow(clippy::all)]
    #![allow(clippy::missing_errors_doc)]
    #![allow(clippy::default_trait_access)]
    #![allow(clippy::too_many_lines)]
    #![allow(clippy::must_use_candidate)]
    #![allow(clippy::doc_markdown)]

    // Packages are siblings here, as generated code refers to `super::diag`
    pub mod diag {
        tonic::include_proto!("siriuslingo.diag");
    }
    pub mod test {
        tonic::include_proto!("siriuslingo.test");
    }
    pub mod user {
        tonic::include_proto!("siriuslingo.user");
    }
    /// Worker-holding service used to exercise hosts in tests
    #[cfg(feature = "probe")]
    pub mod probe {
        tonic::include_proto!("siriuslingo.probe");
    }
    pub mod reflection {
        pub const LINGO_DESCRIPTOR: &[u8] =
            tonic::include_file_descriptor_set!("lingo_descriptor");
    }
}
