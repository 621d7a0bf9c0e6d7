// crates/contract-gate-core/tests/execution.rs
// ============================================================================
// Module: Execution Pipeline Tests
// Description: Tests for the ordered operation execution guard chain.
// ============================================================================
//! ## Overview
//! Validates the fixed pipeline order: input validation before policy and
//! handler, policy and rate limiting fail closed, undeclared emissions never
//! reach the publisher, telemetry fails open, and output validation runs
//! last.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use contract_gate_core::CallContext;
use contract_gate_core::EmittedEvent;
use contract_gate_core::EventEnvelope;
use contract_gate_core::EventPublisher;
use contract_gate_core::EventRegistry;
use contract_gate_core::EventSpec;
use contract_gate_core::ExecuteError;
use contract_gate_core::ExecuteRequest;
use contract_gate_core::FieldMap;
use contract_gate_core::FieldSnapshot;
use contract_gate_core::FieldType;
use contract_gate_core::HandlerError;
use contract_gate_core::OperationHandler;
use contract_gate_core::OperationIo;
use contract_gate_core::OperationRegistry;
use contract_gate_core::OperationRuntime;
use contract_gate_core::OperationSpec;
use contract_gate_core::OutputShape;
use contract_gate_core::PolicyDecider;
use contract_gate_core::PolicyDecision;
use contract_gate_core::PolicyEffect;
use contract_gate_core::PolicyError;
use contract_gate_core::PolicyRequest;
use contract_gate_core::PublishError;
use contract_gate_core::RateLimitError;
use contract_gate_core::RateLimitHint;
use contract_gate_core::RateLimiter;
use contract_gate_core::RuntimeConfig;
use contract_gate_core::SideEffectSpec;
use contract_gate_core::SpecKey;
use contract_gate_core::SpecMeta;
use contract_gate_core::SpecVersion;
use contract_gate_core::Stability;
use contract_gate_core::TelemetryError;
use contract_gate_core::TelemetryEvent;
use contract_gate_core::TelemetryTracker;
use contract_gate_core::TelemetryTriggers;
use contract_gate_core::VariantContext;
use contract_gate_core::VariantResolver;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn field(name: &str, field_type: FieldType, required: bool) -> FieldSnapshot {
    FieldSnapshot {
        name: name.to_string(),
        field_type,
        required,
        nullable: false,
        enum_values: None,
        literal: None,
        items: None,
        properties: None,
        union_types: None,
    }
}

fn fields(entries: Vec<FieldSnapshot>) -> FieldMap {
    entries.into_iter().map(|entry| (entry.name.clone(), entry)).collect()
}

fn meta(key: &str, version: &str) -> SpecMeta {
    SpecMeta {
        key: SpecKey::new(key),
        version: SpecVersion::new(version),
        stability: Stability::Stable,
        owners: Vec::new(),
        tags: Vec::new(),
        description: None,
    }
}

/// `users.create` operation: requires an email in, an id out, and declares
/// the `user.created` emission.
fn users_create() -> OperationSpec {
    OperationSpec {
        meta: meta("users.create", "1.0.0"),
        io: OperationIo {
            input: fields(vec![field("email", FieldType::String, true)]),
            output: OutputShape::Fields {
                fields: fields(vec![field("id", FieldType::String, true)]),
            },
        },
        http: None,
        auth_level: None,
        side_effects: SideEffectSpec {
            emits: vec![EmittedEvent::Resolved {
                key: SpecKey::new("user.created"),
                version: SpecVersion::new("1.0.0"),
            }],
        },
        telemetry: Some(TelemetryTriggers {
            success: Some("user_created".to_string()),
            failure: Some("user_create_failed".to_string()),
        }),
        capability: None,
    }
}

fn user_created_event() -> EventSpec {
    EventSpec {
        meta: meta("user.created", "1.0.0"),
        payload: fields(vec![field("id", FieldType::String, true)]),
        capability: None,
    }
}

fn registries() -> (OperationRegistry, EventRegistry) {
    let mut operations = OperationRegistry::new();
    operations.register(users_create()).unwrap();
    let mut events = EventRegistry::new();
    events.register(user_created_event()).unwrap();
    (operations, events)
}

fn runtime() -> OperationRuntime {
    let (operations, events) = registries();
    OperationRuntime::new(
        RuntimeConfig {
            service: "identity".to_string(),
        },
        operations,
        events,
    )
}

fn request(input: Value) -> ExecuteRequest {
    ExecuteRequest::new("users.create", "1.0.0", input)
}

// ============================================================================
// SECTION: Test Doubles
// ============================================================================

/// Handler returning a fixed output and counting invocations.
struct FixedHandler {
    output: Value,
    calls: Arc<AtomicUsize>,
}

impl FixedHandler {
    fn new(output: Value) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            output,
            calls: Arc::clone(&calls),
        });
        (handler, calls)
    }
}

#[async_trait]
impl OperationHandler for FixedHandler {
    async fn handle(&self, _input: Value, _ctx: &CallContext<'_>) -> Result<Value, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Handler emitting one event before returning.
struct EmittingHandler {
    event_key: String,
    payload: Value,
}

#[async_trait]
impl OperationHandler for EmittingHandler {
    async fn handle(&self, _input: Value, ctx: &CallContext<'_>) -> Result<Value, HandlerError> {
        ctx.emitter.emit(&self.event_key, "1.0.0", self.payload.clone())?;
        Ok(json!({"id": "u-1"}))
    }
}

/// Publisher capturing every envelope it receives.
#[derive(Default)]
struct CapturingPublisher {
    published: Arc<Mutex<Vec<EventEnvelope>>>,
}

impl CapturingPublisher {
    fn capture(&self) -> Arc<Mutex<Vec<EventEnvelope>>> {
        Arc::clone(&self.published)
    }
}

impl EventPublisher for CapturingPublisher {
    fn publish(&self, envelope: &EventEnvelope) -> Result<(), PublishError> {
        self.published.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

/// Policy decider with a fixed decision.
struct FixedPolicy {
    decision: Result<PolicyDecision, String>,
}

impl PolicyDecider for FixedPolicy {
    fn decide(&self, _request: &PolicyRequest) -> Result<PolicyDecision, PolicyError> {
        self.decision.clone().map_err(PolicyError::DecisionFailed)
    }
}

/// Rate limiter that always rejects.
struct SaturatedLimiter;

impl RateLimiter for SaturatedLimiter {
    fn check(&self, hint: &RateLimitHint, _request: &PolicyRequest) -> Result<(), RateLimitError> {
        Err(RateLimitError::Exceeded(hint.key.clone()))
    }
}

/// Tracker recording triggers, optionally failing every call.
struct RecordingTracker {
    tracked: Arc<Mutex<Vec<TelemetryEvent>>>,
    fail: bool,
}

impl TelemetryTracker for RecordingTracker {
    fn track(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        self.tracked.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(TelemetryError::Tracker("sink unavailable".to_string()));
        }
        Ok(())
    }
}

/// Resolver substituting a fixed version for every call.
struct FixedVariant {
    version: String,
}

impl VariantResolver for FixedVariant {
    fn resolve(&self, _context: &VariantContext) -> Option<SpecVersion> {
        Some(SpecVersion::new(&self.version))
    }
}

// ============================================================================
// SECTION: Happy Path
// ============================================================================

/// Tests a valid call flows through every stage and returns the output.
#[tokio::test]
async fn valid_call_succeeds() {
    let mut runtime = runtime();
    let (handler, calls) = FixedHandler::new(json!({"id": "u-1"}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    let output = runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap();
    assert_eq!(output, json!({"id": "u-1"}));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Tests an unknown operation fails before anything else runs.
#[tokio::test]
async fn unknown_operation_fails() {
    let runtime = runtime();
    let err = runtime
        .execute(ExecuteRequest::new("users.remove", "1.0.0", json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::SpecNotFound(composite) if composite == "users.remove.v1.0.0"));
}

/// Tests a registered operation without a bound handler fails.
#[tokio::test]
async fn unbound_handler_fails() {
    let runtime = runtime();
    let err = runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap_err();
    assert!(matches!(err, ExecuteError::HandlerNotBound(_)));
}

/// Tests binding a handler to an unregistered operation is rejected.
#[test]
fn binding_requires_registered_spec() {
    let mut runtime = runtime();
    let (handler, _) = FixedHandler::new(json!({}));
    assert!(runtime.bind_handler("users.remove", "1.0.0", handler).is_err());
}

// ============================================================================
// SECTION: Input & Output Validation
// ============================================================================

/// Tests invalid input aborts before the handler runs.
#[tokio::test]
async fn invalid_input_never_reaches_handler() {
    let mut runtime = runtime();
    let (handler, calls) = FixedHandler::new(json!({"id": "u-1"}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    let err = runtime.execute(request(json!({"email": 42}))).await.unwrap_err();
    assert!(matches!(err, ExecuteError::InvalidInput(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Tests handler output violating the contract is rejected.
#[tokio::test]
async fn invalid_output_is_rejected() {
    let mut runtime = runtime();
    let (handler, _) = FixedHandler::new(json!({"id": 42}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    let err = runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap_err();
    assert!(matches!(err, ExecuteError::InvalidOutput(_)));
}

/// Tests resource-reference outputs skip output validation.
#[tokio::test]
async fn resource_ref_output_skips_validation() {
    let mut operations = OperationRegistry::new();
    let mut spec = users_create();
    spec.io.output = OutputShape::ResourceRef {
        resource: "user".to_string(),
    };
    operations.register(spec).unwrap();

    let mut runtime = OperationRuntime::new(
        RuntimeConfig {
            service: "identity".to_string(),
        },
        operations,
        EventRegistry::new(),
    );
    let (handler, _) = FixedHandler::new(json!({"arbitrary": true}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    let output = runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap();
    assert_eq!(output, json!({"arbitrary": true}));
}

// ============================================================================
// SECTION: Policy & Rate Limiting
// ============================================================================

/// Tests a deny decision fails closed.
#[tokio::test]
async fn policy_deny_fails_closed() {
    let mut runtime = runtime().with_policy(Box::new(FixedPolicy {
        decision: Ok(PolicyDecision {
            effect: PolicyEffect::Deny,
            rate_limit: None,
            escalation: None,
        }),
    }));
    let (handler, calls) = FixedHandler::new(json!({"id": "u-1"}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    let err = runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap_err();
    assert!(matches!(err, ExecuteError::PolicyDenied(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Tests policy evaluation failure fails closed.
#[tokio::test]
async fn policy_error_fails_closed() {
    let mut runtime = runtime().with_policy(Box::new(FixedPolicy {
        decision: Err("engine offline".to_string()),
    }));
    let (handler, _) = FixedHandler::new(json!({"id": "u-1"}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    let err = runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap_err();
    assert!(matches!(err, ExecuteError::Policy(_)));
}

/// Tests an allow decision carrying a hint invokes the limiter.
#[tokio::test]
async fn rate_limit_hint_is_enforced() {
    let mut runtime = runtime()
        .with_policy(Box::new(FixedPolicy {
            decision: Ok(PolicyDecision {
                effect: PolicyEffect::Allow,
                rate_limit: Some(RateLimitHint {
                    key: "users.create:org-1".to_string(),
                    limit: 10,
                    window_ms: 60_000,
                }),
                escalation: None,
            }),
        }))
        .with_rate_limiter(Box::new(SaturatedLimiter));
    let (handler, calls) = FixedHandler::new(json!({"id": "u-1"}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    let err = runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap_err();
    assert!(matches!(err, ExecuteError::RateLimited(RateLimitError::Exceeded(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// SECTION: Emission Guard
// ============================================================================

/// Tests a declared emission is validated and published.
#[tokio::test]
async fn declared_emission_is_published() {
    let publisher = CapturingPublisher::default();
    let published = publisher.capture();
    let mut runtime = runtime().with_publisher(Box::new(publisher));
    runtime
        .bind_handler(
            "users.create",
            "1.0.0",
            Arc::new(EmittingHandler {
                event_key: "user.created".to_string(),
                payload: json!({"id": "u-1"}),
            }),
        )
        .unwrap();

    runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap();

    let published = published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].key.as_str(), "user.created");
}

/// Tests an undeclared emission fails the call and never reaches the publisher.
#[tokio::test]
async fn undeclared_emission_is_blocked() {
    let publisher = CapturingPublisher::default();
    let published = publisher.capture();
    let mut runtime = runtime().with_publisher(Box::new(publisher));
    runtime
        .bind_handler(
            "users.create",
            "1.0.0",
            Arc::new(EmittingHandler {
                event_key: "user.deleted".to_string(),
                payload: json!({"id": "u-1"}),
            }),
        )
        .unwrap();

    let err = runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap_err();
    assert!(
        matches!(err, ExecuteError::UndeclaredEvent(reference) if reference == "user.deleted@1.0.0")
    );
    assert!(published.lock().unwrap().is_empty());
}

/// Tests an invalid event payload is rejected before publication.
#[tokio::test]
async fn invalid_event_payload_is_blocked() {
    let publisher = CapturingPublisher::default();
    let published = publisher.capture();
    let mut runtime = runtime().with_publisher(Box::new(publisher));
    runtime
        .bind_handler(
            "users.create",
            "1.0.0",
            Arc::new(EmittingHandler {
                event_key: "user.created".to_string(),
                payload: json!({"id": 42}),
            }),
        )
        .unwrap();

    let err = runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap_err();
    assert!(matches!(err, ExecuteError::Emit(_)));
    assert!(published.lock().unwrap().is_empty());
}

// ============================================================================
// SECTION: Telemetry
// ============================================================================

/// Tests the success trigger is tracked with the call outcome.
#[tokio::test]
async fn success_trigger_is_tracked() {
    let tracked = Arc::new(Mutex::new(Vec::new()));
    let mut runtime = runtime().with_telemetry(Box::new(RecordingTracker {
        tracked: Arc::clone(&tracked),
        fail: false,
    }));
    let (handler, _) = FixedHandler::new(json!({"id": "u-1"}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap();

    let tracked = tracked.lock().unwrap();
    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0].trigger, "user_created");
}

/// Tests tracker failure never affects the call outcome.
#[tokio::test]
async fn telemetry_fails_open() {
    let tracked = Arc::new(Mutex::new(Vec::new()));
    let mut runtime = runtime().with_telemetry(Box::new(RecordingTracker {
        tracked: Arc::clone(&tracked),
        fail: true,
    }));
    let (handler, _) = FixedHandler::new(json!({"id": "u-1"}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    let output = runtime.execute(request(json!({"email": "a@b.c"}))).await.unwrap();
    assert_eq!(output, json!({"id": "u-1"}));
    assert_eq!(tracked.lock().unwrap().len(), 1);
}

// ============================================================================
// SECTION: Variants
// ============================================================================

/// Tests the resolver substitutes a registered variant for one call.
#[tokio::test]
async fn variant_substitutes_registered_version() {
    let (mut operations, events) = registries();
    let mut variant = users_create();
    variant.meta.version = SpecVersion::new("1.1.0");
    variant.io.input = fields(vec![field("email", FieldType::String, false)]);
    operations.register(variant).unwrap();

    let mut runtime = OperationRuntime::new(
        RuntimeConfig {
            service: "identity".to_string(),
        },
        operations,
        events,
    )
    .with_variants(Box::new(FixedVariant {
        version: "1.1.0".to_string(),
    }));
    let (handler, _) = FixedHandler::new(json!({"id": "u-1"}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    // Valid only under the variant's relaxed input contract.
    let output = runtime.execute(request(json!({}))).await.unwrap();
    assert_eq!(output, json!({"id": "u-1"}));
}

/// Tests an unregistered variant falls back to the base spec.
#[tokio::test]
async fn unregistered_variant_falls_back() {
    let mut runtime = runtime().with_variants(Box::new(FixedVariant {
        version: "9.9.9".to_string(),
    }));
    let (handler, _) = FixedHandler::new(json!({"id": "u-1"}));
    runtime.bind_handler("users.create", "1.0.0", handler).unwrap();

    let err = runtime.execute(request(json!({}))).await.unwrap_err();
    assert!(matches!(err, ExecuteError::InvalidInput(_)));
}
