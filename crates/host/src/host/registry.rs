// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::collections::btree_map::{BTreeMap, Entry};
use std::convert::Infallible;

use tonic::body::Body;
use tonic::server::NamedService;
use tonic::service::{Routes, RoutesBuilder};
use tower::Service;
use tracing::{debug, info};

use super::error::ConfigurationError;

/// Service name paired with its handler. Handler itself lives inside
/// routing table, here we keep only what is needed for bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRegistration {
    pub name: String,
    /// Position in registration sequence, starting from 0
    pub order: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: BTreeMap<String, HandlerRegistration>,
    routes: RoutesBuilder,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register<S>(&mut self, service: S) -> Result<(), ConfigurationError>
    where
        S: Service<http::Request<Body>, Response = http::Response<Body>, Error = Infallible>
            + NamedService
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let name = S::NAME;
        if name.trim().is_empty() {
            return Err(ConfigurationError::EmptyServiceName);
        }
        let order = self.entries.len();
        match self.entries.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(ConfigurationError::DuplicateService(name.to_owned())),
            Entry::Vacant(slot) => {
                info!("Registering service {name}");
                slot.insert(HandlerRegistration {
                    name: name.to_owned(),
                    order,
                });
                self.routes.add_service(service);
                Ok(())
            }
        }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered services, in order of registration
    pub(crate) fn contents(&self) -> Vec<HandlerRegistration> {
        let mut list: Vec<_> = self.entries.values().cloned().collect();
        list.sort_by_key(|entry| entry.order);
        list
    }

    /// Hand routing table over to the server. Bookkeeping entries stay,
    /// so `contents()` keeps working after start.
    pub(crate) fn seal(&mut self) -> Routes {
        debug!("Sealing registry with {} services", self.entries.len());
        std::mem::take(&mut self.routes).routes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{TestHandler, TestServiceServer, UserHandler, UserServiceServer};
    use std::future::{Ready, ready};
    use std::task::{Context, Poll};
    use tonic::Status;

    #[derive(Clone)]
    struct Nameless;

    impl NamedService for Nameless {
        const NAME: &'static str = "";
    }

    impl Service<http::Request<Body>> for Nameless {
        type Response = http::Response<Body>;
        type Error = Infallible;
        type Future = Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: http::Request<Body>) -> Self::Future {
            ready(Ok(Status::unimplemented("nameless").into_http()))
        }
    }

    #[test]
    fn test_register_unique() -> anyhow::Result<()> {
        let mut r = Registry::new();
        r.register(TestServiceServer::new(TestHandler::new()))?;
        r.register(UserServiceServer::new(UserHandler::new()))?;

        assert!(r.contains("siriuslingo.test.TestService"));
        assert!(r.contains("siriuslingo.user.UserService"));

        let names: Vec<_> = r.contents().into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec!["siriuslingo.test.TestService", "siriuslingo.user.UserService"]
        );
        Ok(())
    }

    #[test]
    fn test_register_duplicate() -> anyhow::Result<()> {
        let mut r = Registry::new();
        r.register(TestServiceServer::new(TestHandler::new()))?;

        let err = r
            .register(TestServiceServer::new(TestHandler::new()))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateService("siriuslingo.test.TestService".into())
        );
        assert_eq!(r.contents().len(), 1);
        Ok(())
    }

    #[test]
    fn test_register_empty_name() {
        let mut r = Registry::new();
        assert_eq!(
            r.register(Nameless).unwrap_err(),
            ConfigurationError::EmptyServiceName
        );
        assert!(r.contents().is_empty());
    }

    #[test]
    fn test_seal_keeps_contents() -> anyhow::Result<()> {
        let mut r = Registry::new();
        r.register(UserServiceServer::new(UserHandler::new()))?;
        let _routes = r.seal();
        assert!(r.contains("siriuslingo.user.UserService"));
        Ok(())
    }
}
