// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Error;
use tonic::Status;
use tonic_types::StatusExt;

/// Convert `tonic::Status` back to `anyhow::Error`, restoring the context chain
/// packed by host side as `DebugInfo` details
pub(crate) fn rewrap_error(status: &Status) -> Error {
    let details = status.get_error_details();
    match details.debug_info() {
        Some(debug_info) => debug_info
            .stack_entries
            .iter()
            .rev()
            .fold(Error::msg(debug_info.detail.clone()), |err, each| {
                err.context(each.clone())
            })
            .context(format!("{}: {}", status.code(), status.message())),
        None => Error::msg(format!("{}: {}", status.code(), status.message())),
    }
}

pub trait StatusWrapExt<T> {
    /// # Errors
    /// Return `Err(anyhow::Error)` if `tonic::Status` contains error
    fn rewrap_err(self) -> Result<T, Error>;
}

impl<T> StatusWrapExt<T> for Result<T, Status> {
    fn rewrap_err(self) -> Result<T, Error> {
        self.map_err(|status| rewrap_error(&status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;
    use tonic_types::ErrorDetails;

    #[test]
    fn test_rewrap_keeps_chain() {
        let details = ErrorDetails::with_debug_info(
            vec!["While pinging".to_string()],
            "message too long",
        );
        let status =
            Status::with_error_details(Code::InvalidArgument, "invalid arguments", details);
        let err = rewrap_error(&status);
        let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
        assert_eq!(chain.len(), 3);
        assert!(chain[0].contains("invalid arguments"));
        assert_eq!(chain[1], "While pinging");
        assert_eq!(err.root_cause().to_string(), "message too long");
    }

    #[test]
    fn test_rewrap_plain_status() {
        let err: Result<(), _> = Err(Status::unimplemented("no such service"));
        let err = err.rewrap_err().unwrap_err();
        assert!(err.to_string().contains("no such service"));
    }
}
