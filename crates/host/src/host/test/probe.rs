// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lingo_common::pb::probe::{ProbeReply, ProbeRequest, probe_service_server::ProbeService};
use tonic::{Request, Response, Status};

pub use lingo_common::pb::probe::probe_service_server::ProbeServiceServer;

pub fn hold(tag: &str, hold_ms: u64) -> ProbeRequest {
    ProbeRequest {
        tag: tag.to_owned(),
        hold_ms,
        ..ProbeRequest::default()
    }
}

/// Records order in which calls reached the handler, and how many ran at once
#[derive(Debug, Clone, Default)]
pub struct Probe {
    started: Arc<Mutex<Vec<String>>>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Probe {
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }
}

struct Running<'a>(&'a AtomicUsize);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[tonic::async_trait]
impl ProbeService for Probe {
    async fn hold(&self, request: Request<ProbeRequest>) -> Result<Response<ProbeReply>, Status> {
        let req = request.into_inner();
        self.started.lock().unwrap().push(req.tag.clone());

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _running = Running(&self.running);

        tokio::time::sleep(Duration::from_millis(req.hold_ms)).await;

        if req.panic {
            panic!("probe {} asked to panic", req.tag);
        }
        if req.fail {
            return Err(Status::failed_precondition(format!(
                "probe {} asked to fail",
                req.tag
            )));
        }
        Ok(Response::new(ProbeReply { tag: req.tag }))
    }
}
