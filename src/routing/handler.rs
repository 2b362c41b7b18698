//! Handler instantiation and callback binding.
//!
//! A route stores a factory and a callback. Each successful match builds a
//! fresh `HttpRoute` from the factory and attaches the callback to it; the
//! caller owns that instance and invokes it exactly once.

use std::fmt;

/// Builds an empty handler instance.
pub type HandlerFactory<C> = fn() -> HttpRoute<C>;

/// Per-request handler instance.
///
/// A handler built without a callback is valid; the transport decides what
/// an unbound handler answers.
#[derive(Debug)]
pub struct HttpRoute<C> {
    callback: Option<C>,
}

impl<C> HttpRoute<C> {
    pub fn new() -> Self {
        Self { callback: None }
    }

    /// Attach (or replace) the callback this handler runs.
    pub fn register_callback(&mut self, callback: C) {
        self.callback = Some(callback);
    }

    pub fn callback(&self) -> Option<&C> {
        self.callback.as_ref()
    }

    pub fn into_callback(self) -> Option<C> {
        self.callback
    }
}

impl<C> Default for HttpRoute<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory and callback stored for one `(method, literal key)`.
#[derive(Clone)]
pub struct HandlerBinding<C> {
    factory: HandlerFactory<C>,
    callback: C,
}

impl<C: Clone> HandlerBinding<C> {
    pub fn new(factory: HandlerFactory<C>, callback: C) -> Self {
        Self { factory, callback }
    }

    /// Build a handler and attach this binding's callback to it.
    pub fn materialize(&self) -> HttpRoute<C> {
        let mut route = (self.factory)();
        route.register_callback(self.callback.clone());
        route
    }
}

impl<C> fmt::Debug for HandlerBinding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding").finish_non_exhaustive()
    }
}
