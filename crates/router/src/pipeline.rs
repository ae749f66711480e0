//! Request pipeline.
//!
//! ```text
//! Received → Validated → Authorized → Dispatched → Responded
//!     ↓           ↓                        ↓
//! Rejected(Validation)  Rejected(Authorization)  Failed(Dispatch)
//! ```
//!
//! Each request runs once, start to finish; nothing is retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{field, Instrument};
use uuid::Uuid;

use gatekeeper_auth::{authorize, validate_payload, AuthzError, RoleRegistry};
use gatekeeper_core::ValidationError;

use crate::{Disclosure, Dispatcher, GatekeeperResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    Validation,
    Authorization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    Dispatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Received,
    Validated,
    Authorized,
    Dispatched,
    Responded,
    Rejected(Rejection),
    Failed(Failure),
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Responded | Self::Rejected(_) | Self::Failed(_)
        )
    }
}

/// Terminal state of a request plus the envelope for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub state: RequestState,
    pub response: GatekeeperResponse,
}

/// Source of the current instant.
pub type Clock = fn() -> DateTime<Utc>;

/// The routing core: registry + dispatcher.
///
/// Cheap to clone; all shared parts are read-only.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    registry: Arc<RoleRegistry>,
    dispatcher: Arc<Dispatcher>,
    disclosure: Disclosure,
    clock: Clock,
}

impl Gatekeeper {
    pub fn new(registry: Arc<RoleRegistry>, dispatcher: Dispatcher) -> Self {
        Self {
            registry,
            dispatcher: Arc::new(dispatcher),
            disclosure: Disclosure::default(),
            clock: Utc::now,
        }
    }

    /// Replace the clock that stamps responses and defaults payload timestamps.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_disclosure(mut self, disclosure: Disclosure) -> Self {
        self.disclosure = disclosure;
        self
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Route a raw callback body.
    pub async fn route(&self, raw: &JsonValue) -> Routed {
        self.route_at(raw, (self.clock)()).await
    }

    /// Route a raw callback body received at `now`.
    ///
    /// `now` stands in for a missing payload timestamp. Responses are stamped
    /// by the clock when they are built.
    pub async fn route_at(&self, raw: &JsonValue, now: DateTime<Utc>) -> Routed {
        let span = tracing::info_span!(
            "gatekeeper.route",
            request_id = %Uuid::now_v7(),
            user_id = field::Empty,
            role = field::Empty,
        );

        self.run(raw, now).instrument(span).await
    }

    async fn run(&self, raw: &JsonValue, now: DateTime<Utc>) -> Routed {
        let mut state = RequestState::Received;

        let payload = match validate_payload(raw, now) {
            Ok(payload) => payload,
            Err(err) => {
                match &err {
                    ValidationError::UnknownRole(raw_role) => {
                        tracing::warn!(role = %raw_role, "unknown role rejected");
                    }
                    other => {
                        tracing::warn!(field = other.field(), error = %other, "payload rejected");
                    }
                }
                return Routed {
                    state: RequestState::Rejected(Rejection::Validation),
                    response: GatekeeperResponse::validation(&err, echo_user_id(raw), (self.clock)()),
                };
            }
        };

        let span = tracing::Span::current();
        span.record("user_id", payload.user_id.as_str());
        span.record("role", payload.role.as_str());
        advance(&mut state, RequestState::Validated);

        let authorization = match authorize(&self.registry, &payload) {
            Ok(authorization) => authorization,
            Err(err) => {
                let AuthzError::Forbidden { denied, .. } = &err;
                let denied: Vec<&str> = denied.iter().map(|p| p.as_str()).collect();
                tracing::warn!(?denied, "permissions rejected");
                return Routed {
                    state: RequestState::Rejected(Rejection::Authorization),
                    response: GatekeeperResponse::forbidden(&err, &payload, (self.clock)()),
                };
            }
        };
        advance(&mut state, RequestState::Authorized);

        let result = self.dispatcher.dispatch(authorization.handler, &payload).await;
        advance(&mut state, RequestState::Dispatched);

        let state = if result.is_success() {
            tracing::info!(handler = %authorization.handler, "request routed");
            RequestState::Responded
        } else {
            RequestState::Failed(Failure::Dispatch)
        };

        let response =
            GatekeeperResponse::from_dispatch(result, &payload, self.disclosure, (self.clock)());
        Routed { state, response }
    }
}

fn advance(state: &mut RequestState, next: RequestState) {
    tracing::debug!(from = ?state, to = ?next, "request state");
    *state = next;
}

/// Best-effort `user_id` echo for payloads that failed validation.
fn echo_user_id(raw: &JsonValue) -> Option<String> {
    raw.get("user_id")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use gatekeeper_auth::{HandlerName, Role};
    use serde_json::json;

    use super::*;
    use crate::{DispatchContext, HandlerSet, ResponseStatus, RoleHandler};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap()
    }

    fn gatekeeper(handlers: HandlerSet) -> Gatekeeper {
        Gatekeeper::new(Arc::new(RoleRegistry::standard()), Dispatcher::new(handlers)).with_clock(now)
    }

    /// Counts calls so tests can assert that no dispatch happened.
    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl RoleHandler for Counting {
        async fn handle(&self, role: Role, context: DispatchContext) -> anyhow::Result<JsonValue> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "role": role, "user": context.user_id }))
        }
    }

    struct Broken;

    #[async_trait]
    impl RoleHandler for Broken {
        async fn handle(&self, _role: Role, _context: DispatchContext) -> anyhow::Result<JsonValue> {
            anyhow::bail!("finance backend offline")
        }
    }

    fn counting_set() -> (HandlerSet, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let set = HandlerName::ALL.into_iter().fold(HandlerSet::new(), |set, name| {
            set.with(name, Counting(calls.clone()))
        });
        (set, calls)
    }

    #[tokio::test]
    async fn admin_callback_is_routed_to_admin_agent() {
        let gk = gatekeeper(HandlerSet::acknowledging());
        let routed = gk
            .route_at(
                &json!({ "user_id": "admin_001", "role": "admin", "permissions": ["read:all", "write:all"] }),
                now(),
            )
            .await;

        assert_eq!(routed.state, RequestState::Responded);
        assert!(routed.state.is_terminal());
        let resp = routed.response;
        assert_eq!(resp.status, ResponseStatus::Success);
        assert_eq!(resp.handler_name.as_deref(), Some("admin_agent"));
        assert_eq!(resp.user_id.as_deref(), Some("admin_001"));
        assert_eq!(resp.timestamp, now());
        assert_eq!(resp.data.unwrap()["context"]["timestamp"], "2025-04-02T10:00:00.000Z");
    }

    #[tokio::test]
    async fn operator_with_financial_permission_is_forbidden_without_dispatch() {
        let (set, calls) = counting_set();
        let gk = gatekeeper(set);

        let routed = gk
            .route_at(
                &json!({ "user_id": "op_1", "role": "operator", "permissions": ["read:financial"] }),
                now(),
            )
            .await;

        assert_eq!(routed.state, RequestState::Rejected(Rejection::Authorization));
        assert_eq!(routed.response.status, ResponseStatus::Forbidden);
        assert_eq!(routed.response.message, "permissions not compatible with role");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_user_id_stops_before_authorization() {
        let (set, calls) = counting_set();
        let gk = gatekeeper(set);

        let routed = gk.route_at(&json!({ "user_id": "", "role": "admin" }), now()).await;

        assert_eq!(routed.state, RequestState::Rejected(Rejection::Validation));
        assert_eq!(routed.response.status, ResponseStatus::Error);
        assert!(routed.response.user_id.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_role_is_a_validation_error() {
        let (set, calls) = counting_set();
        let gk = gatekeeper(set);

        for role in ["ghost", "ADMIN", "root", ""] {
            let routed = gk.route_at(&json!({ "user_id": "x", "role": role }), now()).await;
            assert_eq!(routed.state, RequestState::Rejected(Rejection::Validation));
            assert_eq!(routed.response.user_id.as_deref(), Some("x"));
            assert_eq!(routed.response.data.unwrap()["field"], "role");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn operator_and_logistics_reach_the_same_handler() {
        let gk = gatekeeper(HandlerSet::acknowledging());

        for _ in 0..3 {
            let op = gk.route_at(&json!({ "user_id": "o", "role": "operator" }), now()).await;
            let lg = gk.route_at(&json!({ "user_id": "l", "role": "logistics" }), now()).await;
            assert_eq!(op.response.handler_name.as_deref(), Some("logistics_agent"));
            assert_eq!(op.response.handler_name, lg.response.handler_name);
        }
    }

    #[tokio::test]
    async fn handler_failure_is_a_well_formed_error() {
        let set = HandlerSet::acknowledging().with(HandlerName::FinanceAgent, Broken);
        let gk = gatekeeper(set);

        let routed = gk
            .route_at(&json!({ "user_id": "fin", "role": "finance", "permissions": ["read:invoice"] }), now())
            .await;

        assert_eq!(routed.state, RequestState::Failed(Failure::Dispatch));
        assert_eq!(routed.response.status, ResponseStatus::Error);
        assert_eq!(routed.response.user_id.as_deref(), Some("fin"));
        let data = routed.response.data.unwrap();
        assert_eq!(data["error_kind"], "handler_failed");
        assert!(data.get("error").is_none());
    }

    #[tokio::test]
    async fn verbose_disclosure_surfaces_handler_error() {
        let set = HandlerSet::acknowledging().with(HandlerName::FinanceAgent, Broken);
        let gk = gatekeeper(set).with_disclosure(Disclosure::Verbose);

        let routed = gk.route_at(&json!({ "user_id": "fin", "role": "finance" }), now()).await;
        let data = routed.response.data.unwrap();
        assert_eq!(data["error"], "handler finance_agent failed: finance backend offline");
    }

    #[tokio::test]
    async fn failing_handler_does_not_affect_concurrent_requests() {
        let set = HandlerSet::acknowledging().with(HandlerName::FinanceAgent, Broken);
        let gk = gatekeeper(set);

        let mut tasks = Vec::new();
        for i in 0..16 {
            let gk = gk.clone();
            let role = if i % 2 == 0 { "finance" } else { "logistics" };
            tasks.push(tokio::spawn(async move {
                let body = json!({ "user_id": format!("user_{i}"), "role": role });
                (role, gk.route(&body).await)
            }));
        }

        for task in tasks {
            let (role, routed) = task.await.unwrap();
            match role {
                "finance" => assert_eq!(routed.state, RequestState::Failed(Failure::Dispatch)),
                _ => assert_eq!(routed.state, RequestState::Responded),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_reported_as_dispatch_failure() {
        struct Hanging;

        #[async_trait]
        impl RoleHandler for Hanging {
            async fn handle(&self, _role: Role, _context: DispatchContext) -> anyhow::Result<JsonValue> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(JsonValue::Null)
            }
        }

        let set = HandlerSet::acknowledging().with(HandlerName::AdminAgent, Hanging);
        let dispatcher = Dispatcher::new(set).with_timeout(Some(Duration::from_secs(2)));
        let gk = Gatekeeper::new(Arc::new(RoleRegistry::standard()), dispatcher);

        let routed = gk.route_at(&json!({ "user_id": "a", "role": "admin" }), now()).await;
        assert_eq!(routed.state, RequestState::Failed(Failure::Dispatch));
        assert_eq!(routed.response.data.unwrap()["error_kind"], "timeout");
    }

    #[tokio::test]
    async fn response_is_stamped_after_a_slow_handler_finishes() {
        struct Slow;

        #[async_trait]
        impl RoleHandler for Slow {
            async fn handle(&self, _role: Role, _context: DispatchContext) -> anyhow::Result<JsonValue> {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(json!({ "finished_at": Utc::now() }))
            }
        }

        let set = HandlerSet::acknowledging().with(HandlerName::AdminAgent, Slow);
        let gk = Gatekeeper::new(Arc::new(RoleRegistry::standard()), Dispatcher::new(set));

        let received = Utc::now();
        let routed = gk.route(&json!({ "user_id": "a", "role": "admin" })).await;

        let data = routed.response.data.unwrap();
        let finished: DateTime<Utc> = serde_json::from_value(data["result"]["finished_at"].clone()).unwrap();
        assert!(routed.response.timestamp >= finished);
        assert!(routed.response.timestamp - received >= chrono::Duration::milliseconds(50));
    }

    #[tokio::test]
    async fn route_at_only_defaults_the_payload_timestamp() {
        let gk = Gatekeeper::new(
            Arc::new(RoleRegistry::standard()),
            Dispatcher::new(HandlerSet::acknowledging()),
        );
        let received = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let routed = gk.route_at(&json!({ "user_id": "a", "role": "admin" }), received).await;

        assert!(routed.response.timestamp > received);
        assert_eq!(routed.response.data.unwrap()["context"]["timestamp"], "2020-01-01T00:00:00.000Z");
    }
}
