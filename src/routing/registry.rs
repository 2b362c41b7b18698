//! Route registration and storage.
//!
//! # Responsibilities
//! - Decompose declared templates and store them in declaration order
//! - Keep the exact `(method, literal key)` → handler binding map
//! - Support removal and introspection of registered routes
//!
//! # Design Decisions
//! - Populated once at startup, read-only afterwards (shared via `Arc`, no locks)
//! - The ordered scan list and the binding map are always updated together,
//!   so a scan hit always has a binding
//! - Re-declaring an existing `(method, literal key)` is an error, not an overwrite

use std::collections::HashMap;
use std::fmt;
use std::panic::Location;

use axum::http::Method;

use crate::routing::error::RouteError;
use crate::routing::handler::{HandlerBinding, HandlerFactory, HttpRoute};
use crate::routing::pattern::decompose;

/// A `(method, path)` key used to declare and to query routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePath {
    pub method: Method,
    pub path: String,
}

impl RoutePath {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// One entry of the ordered scan list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRoute {
    pub method: Method,
    /// `/`-joined literal segments of the declared template.
    pub literal_key: String,
    /// Declared variable names, in order.
    pub variables: Vec<String>,
}

/// Registry of declared routes, generic over the callback type it stores.
pub struct RouteRegistry<C> {
    pub(super) routes: Vec<RegisteredRoute>,
    pub(super) bindings: HashMap<RoutePath, HandlerBinding<C>>,
}

impl<C: Clone> RouteRegistry<C> {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            bindings: HashMap::new(),
        }
    }

    /// Declare a route whose handler is built by the default factory.
    #[track_caller]
    pub fn declare(&mut self, route: RoutePath, callback: C) -> Result<(), RouteError> {
        self.declare_with_factory(route, HttpRoute::new, callback)
    }

    /// Declare a route with an explicit handler factory.
    ///
    /// Errors carry the source location of the declaring call.
    #[track_caller]
    pub fn declare_with_factory(
        &mut self,
        route: RoutePath,
        factory: HandlerFactory<C>,
        callback: C,
    ) -> Result<(), RouteError> {
        let caller = Location::caller();
        let template = decompose(&route.path).map_err(|mut e| {
            e.declared_at = Some(caller);
            tracing::error!(error = %e, "Rejected route template");
            e
        })?;
        let key = RoutePath::new(route.method.clone(), template.literal_key());

        if self.bindings.contains_key(&key) {
            tracing::error!(route = %key, declared_at = %caller, "Route already declared");
            return Err(RouteError::DuplicateRoute {
                method: key.method,
                key: key.path,
                declared_at: caller,
            });
        }

        if template.literals.is_empty() {
            tracing::warn!(
                method = %route.method,
                template = %route.path,
                "Route has no literal segments and can never match"
            );
        }

        tracing::info!(
            method = %key.method,
            route = %key.path,
            variables = ?template.variables,
            "Declared route"
        );

        self.routes.push(RegisteredRoute {
            method: key.method.clone(),
            literal_key: key.path.clone(),
            variables: template.variables,
        });
        self.bindings.insert(key, HandlerBinding::new(factory, callback));
        Ok(())
    }

    /// Declare a `GET` route.
    #[track_caller]
    pub fn get(&mut self, template: &str, callback: C) -> Result<(), RouteError> {
        self.declare(RoutePath::new(Method::GET, template), callback)
    }

    /// Declare a `PUT` route.
    #[track_caller]
    pub fn put(&mut self, template: &str, callback: C) -> Result<(), RouteError> {
        self.declare(RoutePath::new(Method::PUT, template), callback)
    }

    /// Declare a `POST` route.
    #[track_caller]
    pub fn post(&mut self, template: &str, callback: C) -> Result<(), RouteError> {
        self.declare(RoutePath::new(Method::POST, template), callback)
    }

    /// Declare a `DELETE` route.
    #[track_caller]
    pub fn delete(&mut self, template: &str, callback: C) -> Result<(), RouteError> {
        self.declare(RoutePath::new(Method::DELETE, template), callback)
    }

    /// Remove a route from both the scan list and the binding map.
    ///
    /// `route.path` may be the declared template or its literal key.
    /// Returns `true` if a route was removed.
    pub fn unregister(&mut self, route: &RoutePath) -> bool {
        let literal_key = decompose(&route.path)
            .map(|template| template.literal_key())
            .unwrap_or_else(|_| route.path.clone());
        let key = RoutePath::new(route.method.clone(), literal_key);

        if self.bindings.remove(&key).is_none() {
            return false;
        }
        self.routes
            .retain(|r| !(r.method == key.method && r.literal_key == key.path));
        tracing::info!(method = %key.method, route = %key.path, "Unregistered route");
        true
    }

    /// All registered `(method, literal key)` pairs, in declaration order.
    pub fn registered_ids(&self) -> Vec<RoutePath> {
        self.routes
            .iter()
            .map(|r| RoutePath::new(r.method.clone(), r.literal_key.clone()))
            .collect()
    }

    /// The ordered scan list.
    pub fn routes(&self) -> &[RegisteredRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<C: Clone> Default for RouteRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for RouteRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}
