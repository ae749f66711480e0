//! Handler dispatch.
//!
//! ```text
//! (handler name, payload)
//!   ↓
//! 1. Build DispatchContext
//!   ↓
//! 2. Resolve the registered RoleHandler
//!   ↓
//! 3. Run it on its own task (bounded by the optional timeout)
//!   ↓
//! DispatchResult (handler output or DispatchError)
//! ```
//!
//! Nothing a handler does escapes as a fault: errors, panics and timeouts all
//! become a [`DispatchError`] inside the result.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::task::JoinError;

use gatekeeper_auth::{AuthPayload, HandlerName, Role};

use crate::{DispatchContext, HandlerSet};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The handler returned an error.
    #[error("handler {handler} failed: {message}")]
    Handler { handler: HandlerName, message: String },

    /// The handler did not finish within the configured bound.
    #[error("handler {handler} timed out after {after:?}")]
    Timeout { handler: HandlerName, after: Duration },

    /// The handler task panicked (or was cancelled).
    #[error("handler {handler} panicked: {message}")]
    Panicked { handler: HandlerName, message: String },

    /// No implementation is registered for the handler name.
    #[error("no handler registered for {0}")]
    Unregistered(HandlerName),
}

/// Coarse, caller-safe classification of a [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchErrorKind {
    HandlerFailed,
    Timeout,
    Panicked,
    Unregistered,
}

impl DispatchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HandlerFailed => "handler_failed",
            Self::Timeout => "timeout",
            Self::Panicked => "panicked",
            Self::Unregistered => "unregistered",
        }
    }
}

impl DispatchError {
    pub fn kind(&self) -> DispatchErrorKind {
        match self {
            Self::Handler { .. } => DispatchErrorKind::HandlerFailed,
            Self::Timeout { .. } => DispatchErrorKind::Timeout,
            Self::Panicked { .. } => DispatchErrorKind::Panicked,
            Self::Unregistered(_) => DispatchErrorKind::Unregistered,
        }
    }
}

/// Result of one dispatch: the context that was sent and what came back.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    pub handler: HandlerName,
    pub context: DispatchContext,
    pub outcome: Result<JsonValue, DispatchError>,
}

impl DispatchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Invokes the handler registered for an authorized request.
///
/// Holds no per-request state; one instance serves all concurrent requests.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    handlers: Arc<HandlerSet>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(handlers: HandlerSet) -> Self {
        Self {
            handlers: Arc::new(handlers),
            timeout: None,
        }
    }

    /// Bound every handler call; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Dispatch an authorized payload to `handler`.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn dispatch(&self, handler: HandlerName, payload: &AuthPayload) -> DispatchResult {
        let context = DispatchContext::from_payload(payload);
        let outcome = self.invoke(handler, payload.role, context.clone()).await;

        if let Err(err) = &outcome {
            tracing::warn!(
                handler = %handler,
                kind = err.kind().as_str(),
                error = %err,
                "handler dispatch failed"
            );
        }

        DispatchResult {
            handler,
            context,
            outcome,
        }
    }

    async fn invoke(
        &self,
        name: HandlerName,
        role: Role,
        context: DispatchContext,
    ) -> Result<JsonValue, DispatchError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or(DispatchError::Unregistered(name))?;

        let mut task = tokio::spawn(async move { handler.handle(role, context).await });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_elapsed) => {
                    task.abort();
                    return Err(DispatchError::Timeout {
                        handler: name,
                        after: limit,
                    });
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(DispatchError::Handler {
                handler: name,
                message: format!("{err:#}"),
            }),
            Err(join_err) => Err(DispatchError::Panicked {
                handler: name,
                message: panic_message(join_err),
            }),
        }
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return "handler task was cancelled".to_string();
    }

    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
