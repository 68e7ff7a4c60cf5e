// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! Module for building route tables for http requests.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use hyper::body::Incoming;
use hyper::{Method, Request};
use tracing::debug;

use crate::errors::RpcError;
use crate::responses::{method_not_allowed, not_found, Resp};

/// The type of a service handler that will be executed
/// once a request has been routed to that service.
/// It is an asynchronous function that takes in input a copy of the
/// server state, as well as the whole request to be processed.
pub type Service<S> = dyn Fn(S, Request<Incoming>) -> Pin<Box<dyn Future<Output = Result<Resp, RpcError>> + Send + 'static>>
    + Send
    + Sync
    + 'static;

/// Auxiliary builder factory for building routers.
pub struct RouterBuilder<S> {
    routes: HashMap<(Method, String), Box<Service<S>>>,
}

impl<S> RouterBuilder<S> {
    fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Binds a route to a service handler. The result is a [RouterBuilder] that
    /// can be used to append more routes
    pub fn with_route<F>(mut self, path: &str, method: Method, handler: F) -> Self
    where
        F: Fn(S, Request<Incoming>) -> Pin<Box<dyn Send + Future<Output = Result<Resp, RpcError>>>>
            + Send
            + Sync
            + 'static,
    {
        self.routes
            .insert((method, path.to_string()), Box::new(handler));
        self
    }

    pub fn build(self) -> Router<S> {
        Router {
            routes: self.routes,
        }
    }
}

pub struct Router<S> {
    routes: HashMap<(Method, String), Box<Service<S>>>,
}

impl<S: Clone> Router<S> {
    /// Handles a http request received by an external client. The handler is
    /// looked up by request method and path. A known path requested with
    /// another method is answered with `405`, an unknown path with `404`.
    pub(crate) async fn handle_request(
        &self,
        state: &S,
        req: Request<Incoming>,
    ) -> Result<Resp, RpcError> {
        let path = req.uri().path().to_string();
        debug!("Received Request {:?} {:?} - Resolving route", req.method(), path);
        if let Some(handler) = self.routes.get(&(req.method().clone(), path.clone())) {
            return handler(state.clone(), req).await;
        }
        if self.routes.keys().any(|(_, route)| *route == path) {
            debug!("Method not allowed");
            return method_not_allowed();
        }
        debug!("Route not found");
        not_found()
    }

    /// Returns a new [RouterBuilder].
    pub fn builder() -> RouterBuilder<S> {
        RouterBuilder::<S>::new()
    }
}
