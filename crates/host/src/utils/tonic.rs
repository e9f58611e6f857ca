// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;

use tonic::{Code, Response, Status};
use tonic_types::{ErrorDetails, StatusExt};
use tracing::error;

// Kludge: wrap_error have .into() semantic, so should be destructive
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn wrap_error(any_err: anyhow::Error) -> Status {
    // Context chain, outermost first, without root cause
    let mut chain: Vec<String> = any_err.chain().map(ToString::to_string).collect();
    let cause = chain.pop().unwrap_or_default();

    error!("Local error cause is {cause}");
    for each in &chain {
        error!("Local reasons is {each}");
    }

    let err_details = ErrorDetails::with_debug_info(chain, cause);
    Status::with_error_details(
        Code::InvalidArgument,
        "request contains invalid arguments",
        err_details,
    )
}

/// Unwrap incoming `tonic::Request<T>` for `fun`, and convert its `anyhow`
/// result back into `tonic` response
/// # Errors
/// Return `Err(tonic::Status)` if inner function fails
pub async fn escalate<T, R, F, Fut>(req: tonic::Request<T>, fun: F) -> Result<Response<R>, Status>
where
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = anyhow::Result<R>>,
{
    match fun(req.into_inner()).await {
        Ok(res) => Ok(Response::new(res)),
        Err(any_err) => {
            error!("error handling GRPC request: {any_err}");
            Err(wrap_error(any_err))
        }
    }
}
