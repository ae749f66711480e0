use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use gatekeeper_auth::{HandlerName, Role};

use crate::DispatchContext;

/// Role-specific work performed once a request is authorized.
///
/// Implementations are opaque to the router: they may call a model backend, a
/// rules engine, or nothing at all. Failures must be returned as `Err`; the
/// dispatcher turns them (and panics) into data.
#[async_trait]
pub trait RoleHandler: Send + Sync {
    async fn handle(&self, role: Role, context: DispatchContext) -> anyhow::Result<JsonValue>;
}

/// Handler implementations keyed by handler name.
///
/// Built once at startup, read-only afterwards.
#[derive(Default, Clone)]
pub struct HandlerSet {
    handlers: HashMap<HandlerName, Arc<dyn RoleHandler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set where every handler name acknowledges requests without doing work.
    pub fn acknowledging() -> Self {
        HandlerName::ALL
            .into_iter()
            .fold(Self::new(), |set, name| {
                set.with(name, AcknowledgeHandler::new(name))
            })
    }

    pub fn with(mut self, name: HandlerName, handler: impl RoleHandler + 'static) -> Self {
        self.register(name, Arc::new(handler));
        self
    }

    /// Register (or replace) the implementation for `name`.
    pub fn register(&mut self, name: HandlerName, handler: Arc<dyn RoleHandler>) {
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: HandlerName) -> Option<Arc<dyn RoleHandler>> {
        self.handlers.get(&name).cloned()
    }

    pub fn names(&self) -> Vec<HandlerName> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort();
        names
    }
}

impl core::fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandlerSet")
            .field("handlers", &self.names())
            .finish()
    }
}

/// Canned handler that reports what it received.
///
/// Stands in for real role handlers in development and tests.
#[derive(Debug, Clone, Copy)]
pub struct AcknowledgeHandler {
    name: HandlerName,
}

impl AcknowledgeHandler {
    pub fn new(name: HandlerName) -> Self {
        Self { name }
    }
}

#[async_trait]
impl RoleHandler for AcknowledgeHandler {
    async fn handle(&self, role: Role, context: DispatchContext) -> anyhow::Result<JsonValue> {
        tracing::debug!(handler = %self.name, user_id = %context.user_id, "acknowledging request");

        Ok(json!({
            "handler": self.name.as_str(),
            "summary": format!(
                "{} acknowledged {} request from {}",
                self.name,
                role,
                context.user_id
            ),
            "granted_permissions": context.permissions,
        }))
    }
}
