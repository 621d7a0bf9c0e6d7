// crates/contract-gate-core/src/runtime/executor.rs
// ============================================================================
// Module: Contract Gate Execution Pipeline
// Description: Ordered runtime enforcement of operation contracts.
// Purpose: Validate input, enforce policy, guard emissions, and validate output.
// Dependencies: crate::{core, interfaces, runtime}, async-trait, serde_json
// ============================================================================

//! ## Overview
//! The operation runtime enforces the declared contract live, per call, in a
//! strict order with no parallel branches: resolve, validate input, policy,
//! emit guard, invoke, telemetry, validate output. Unvalidated input never
//! reaches a handler; undeclared events never reach the publisher; policy and
//! rate-limit failures fail closed; telemetry failures fail open.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::descriptor::EmittedEvent;
use crate::core::descriptor::OperationSpec;
use crate::core::descriptor::OutputShape;
use crate::core::identifiers::CompositeKey;
use crate::core::identifiers::SpecKey;
use crate::core::identifiers::SpecVersion;
use crate::core::registry::EventRegistry;
use crate::core::registry::OperationRegistry;
use crate::core::registry::RegistryError;
use crate::interfaces::EventEnvelope;
use crate::interfaces::EventPublisher;
use crate::interfaces::HandlerError;
use crate::interfaces::OperationHandler;
use crate::interfaces::PolicyDecider;
use crate::interfaces::PolicyEffect;
use crate::interfaces::PolicyError;
use crate::interfaces::PolicyRequest;
use crate::interfaces::PublishError;
use crate::interfaces::RateLimitError;
use crate::interfaces::RateLimiter;
use crate::interfaces::SecretProvider;
use crate::interfaces::TelemetryEvent;
use crate::interfaces::TelemetryOutcome;
use crate::interfaces::TelemetryTracker;
use crate::interfaces::VariantContext;
use crate::interfaces::VariantResolver;
use crate::runtime::validation::ValidationError;
use crate::runtime::validation::validate_object;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the emit guard.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The emission is not declared in the operation's side effects.
    #[error("undeclared event emission: {0}")]
    Undeclared(String),
    /// The declared event has no registered spec.
    #[error("emitted event has no registered spec: {0}")]
    UnknownEvent(String),
    /// The event payload failed schema validation.
    #[error("event payload validation failed: {0}")]
    InvalidPayload(#[source] ValidationError),
    /// The publisher failed to deliver the event.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Errors raised by the execution pipeline.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// No operation spec exists for the requested key and version.
    #[error("operation spec not found: {0}")]
    SpecNotFound(String),
    /// No handler is bound for the operation.
    #[error("no handler bound for operation: {0}")]
    HandlerNotBound(String),
    /// Input failed validation against the declared input schema.
    #[error("input validation failed: {0}")]
    InvalidInput(#[source] ValidationError),
    /// Handler output failed validation against the declared output schema.
    #[error("output validation failed: {0}")]
    InvalidOutput(#[source] ValidationError),
    /// Policy denied the call.
    #[error("policy denied call to {0}")]
    PolicyDenied(String),
    /// Policy evaluation failed; the call fails closed.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// The rate limiter aborted the call.
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
    /// The handler attempted an undeclared event emission.
    #[error("undeclared event emission: {0}")]
    UndeclaredEvent(String),
    /// Event emission failed after passing the declaration check.
    #[error(transparent)]
    Emit(EmitError),
    /// The handler failed.
    #[error("handler failed: {0}")]
    Handler(String),
}

// ============================================================================
// SECTION: Emit Guard
// ============================================================================

/// Call-scoped publisher wrapper enforcing declared emissions.
///
/// # Invariants
/// - Only `(key, version)` pairs present as resolved declarations in the
///   operation's side effects are accepted; everything else fails with
///   [`EmitError::Undeclared`] and is never forwarded to the publisher.
/// - Accepted payloads are schema-validated before dispatch.
#[derive(Clone, Copy)]
pub struct EmitGuard<'a> {
    /// Declared emissions of the operation under execution.
    declared: &'a [EmittedEvent],
    /// Event registry used for payload validation.
    events: &'a EventRegistry,
    /// Publisher port; emissions are dropped after validation when absent.
    publisher: Option<&'a dyn EventPublisher>,
}

impl EmitGuard<'_> {
    /// Emits a declared event after schema validation.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] when the emission is undeclared, the event spec
    /// is unknown, the payload is invalid, or delivery fails.
    pub fn emit(&self, key: &str, version: &str, payload: Value) -> Result<(), EmitError> {
        let reference = format!("{key}@{version}");
        let declared = self.declared.iter().any(|emit| {
            matches!(
                emit,
                EmittedEvent::Resolved {
                    key: declared_key,
                    version: declared_version,
                } if declared_key.as_str() == key && declared_version.as_str() == version
            )
        });
        if !declared {
            return Err(EmitError::Undeclared(reference));
        }

        let Some(spec) = self.events.get(key, version) else {
            return Err(EmitError::UnknownEvent(reference));
        };
        validate_object(&spec.payload, &payload).map_err(EmitError::InvalidPayload)?;

        if let Some(publisher) = self.publisher {
            publisher.publish(&EventEnvelope {
                key: SpecKey::new(key),
                version: SpecVersion::new(version),
                payload,
            })?;
        }
        Ok(())
    }
}

/// Context passed to handlers for one call.
pub struct CallContext<'a> {
    /// Operation spec under execution (variant-resolved).
    pub operation: &'a OperationSpec,
    /// Emit guard restricting event publication.
    pub emitter: EmitGuard<'a>,
    /// Secret provider port, when configured.
    pub secrets: Option<&'a dyn SecretProvider>,
}

// ============================================================================
// SECTION: Execute Request
// ============================================================================

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Host service name carried into policy requests.
    pub service: String,
}

/// One operation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteRequest {
    /// Operation key.
    pub operation: String,
    /// Exact operation version.
    pub version: String,
    /// Raw input payload.
    pub input: Value,
    /// Calling actor, when known.
    pub actor: Option<String>,
    /// Calling channel, when known.
    pub channel: Option<String>,
    /// Roles held by the caller.
    pub roles: Vec<String>,
    /// Organization scope, when known.
    pub org_id: Option<String>,
    /// User scope, when known.
    pub user_id: Option<String>,
}

impl ExecuteRequest {
    /// Creates a request with no caller attribution.
    #[must_use]
    pub fn new(operation: impl Into<String>, version: impl Into<String>, input: Value) -> Self {
        Self {
            operation: operation.into(),
            version: version.into(),
            input,
            actor: None,
            channel: None,
            roles: Vec::new(),
            org_id: None,
            user_id: None,
        }
    }
}

// ============================================================================
// SECTION: Operation Runtime
// ============================================================================

/// Operation runtime enforcing the execution contract per call.
pub struct OperationRuntime {
    /// Runtime configuration.
    config: RuntimeConfig,
    /// Operation spec registry.
    operations: OperationRegistry,
    /// Event spec registry used by the emit guard.
    events: EventRegistry,
    /// Bound handlers keyed by operation composite key.
    handlers: BTreeMap<String, Arc<dyn OperationHandler>>,
    /// Policy decider port.
    policy: Option<Box<dyn PolicyDecider>>,
    /// Rate limiter port.
    limiter: Option<Box<dyn RateLimiter>>,
    /// Telemetry tracker port.
    telemetry: Option<Box<dyn TelemetryTracker>>,
    /// Event publisher port.
    publisher: Option<Box<dyn EventPublisher>>,
    /// Secret provider port.
    secrets: Option<Box<dyn SecretProvider>>,
    /// Per-call variant resolver port.
    variants: Option<Box<dyn VariantResolver>>,
}

impl OperationRuntime {
    /// Creates a runtime over the given registries.
    #[must_use]
    pub fn new(config: RuntimeConfig, operations: OperationRegistry, events: EventRegistry) -> Self {
        Self {
            config,
            operations,
            events,
            handlers: BTreeMap::new(),
            policy: None,
            limiter: None,
            telemetry: None,
            publisher: None,
            secrets: None,
            variants: None,
        }
    }

    /// Configures the policy decider port.
    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn PolicyDecider>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Configures the rate limiter port.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Box<dyn RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Configures the telemetry tracker port.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Box<dyn TelemetryTracker>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Configures the event publisher port.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Box<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Configures the secret provider port.
    #[must_use]
    pub fn with_secrets(mut self, secrets: Box<dyn SecretProvider>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// Configures the per-call variant resolver port.
    #[must_use]
    pub fn with_variants(mut self, variants: Box<dyn VariantResolver>) -> Self {
        self.variants = Some(variants);
        self
    }

    /// Binds a handler to a registered operation version.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SpecNotFound`] when no matching operation
    /// spec is registered.
    pub fn bind_handler(
        &mut self,
        key: &str,
        version: &str,
        handler: Arc<dyn OperationHandler>,
    ) -> Result<(), RegistryError> {
        self.operations.require(key, version)?;
        self.handlers.insert(CompositeKey::from_parts(key, version).to_string(), handler);
        Ok(())
    }

    /// Executes one operation call through the full contract pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ExecuteError`] when any fail-closed stage rejects the call.
    pub async fn execute(&self, request: ExecuteRequest) -> Result<Value, ExecuteError> {
        // Stage 1: resolve the spec, with optional per-call variant substitution.
        let base_composite =
            CompositeKey::from_parts(&request.operation, &request.version).to_string();
        let base_spec = self
            .operations
            .get(&request.operation, &request.version)
            .ok_or_else(|| ExecuteError::SpecNotFound(base_composite.clone()))?;

        let (spec, spec_composite) = self.resolve_variant(&request, base_spec, &base_composite);

        let handler = self
            .handlers
            .get(&spec_composite)
            .or_else(|| self.handlers.get(&base_composite))
            .ok_or_else(|| ExecuteError::HandlerNotBound(base_composite.clone()))?;

        // Stage 2: input validation aborts before anything else runs.
        validate_object(&spec.io.input, &request.input).map_err(ExecuteError::InvalidInput)?;

        // Stage 3: policy and rate limiting, fail closed.
        self.enforce_policy(&request, spec)?;

        // Stage 4: call-scoped emit guard.
        let context = CallContext {
            operation: spec,
            emitter: EmitGuard {
                declared: &spec.side_effects.emits,
                events: &self.events,
                publisher: self.publisher.as_deref(),
            },
            secrets: self.secrets.as_deref(),
        };

        // Stage 5: invoke the handler with validated input.
        let outcome = handler.handle(request.input.clone(), &context).await;

        // Stage 6: best-effort telemetry; tracker errors are swallowed.
        self.track(spec, &outcome);

        let output = outcome.map_err(map_handler_error)?;

        // Stage 7: output validation; resource references skip it.
        match &spec.io.output {
            OutputShape::Fields { fields } => {
                validate_object(fields, &output).map_err(ExecuteError::InvalidOutput)?;
            }
            OutputShape::ResourceRef { .. } => {}
        }

        Ok(output)
    }

    /// Resolves an optional per-call variant, falling back to the base spec.
    fn resolve_variant<'a>(
        &'a self,
        request: &ExecuteRequest,
        base_spec: &'a OperationSpec,
        base_composite: &str,
    ) -> (&'a OperationSpec, String) {
        let Some(resolver) = &self.variants else {
            return (base_spec, base_composite.to_string());
        };
        let context = VariantContext {
            operation: SpecKey::new(&request.operation),
            base_version: SpecVersion::new(&request.version),
            actor: request.actor.clone(),
            channel: request.channel.clone(),
        };
        let Some(variant_version) = resolver.resolve(&context) else {
            return (base_spec, base_composite.to_string());
        };
        match self.operations.get(&request.operation, variant_version.as_str()) {
            Some(variant_spec) => {
                let composite =
                    CompositeKey::from_parts(&request.operation, variant_version.as_str());
                (variant_spec, composite.to_string())
            }
            None => (base_spec, base_composite.to_string()),
        }
    }

    /// Enforces policy and the rate limiter, fail closed.
    fn enforce_policy(
        &self,
        request: &ExecuteRequest,
        spec: &OperationSpec,
    ) -> Result<(), ExecuteError> {
        let Some(policy) = &self.policy else {
            return Ok(());
        };
        let policy_request = PolicyRequest {
            service: self.config.service.clone(),
            operation: request.operation.clone(),
            version: spec.meta.version.to_string(),
            actor: request.actor.clone(),
            channel: request.channel.clone(),
            roles: request.roles.clone(),
            org_id: request.org_id.clone(),
            user_id: request.user_id.clone(),
        };
        let decision = policy.decide(&policy_request)?;
        match decision.effect {
            PolicyEffect::Deny => Err(ExecuteError::PolicyDenied(
                CompositeKey::from_parts(&request.operation, &request.version).to_string(),
            )),
            PolicyEffect::Allow => {
                if let (Some(hint), Some(limiter)) = (&decision.rate_limit, &self.limiter) {
                    limiter.check(hint, &policy_request)?;
                }
                Ok(())
            }
        }
    }

    /// Tracks the declared telemetry trigger for the call outcome.
    fn track(&self, spec: &OperationSpec, outcome: &Result<Value, HandlerError>) {
        let Some(tracker) = &self.telemetry else {
            return;
        };
        let Some(triggers) = &spec.telemetry else {
            return;
        };
        let (trigger, result) = match outcome {
            Ok(_) => (&triggers.success, TelemetryOutcome::Success),
            Err(_) => (&triggers.failure, TelemetryOutcome::Failure),
        };
        let Some(trigger) = trigger else {
            return;
        };
        let event = TelemetryEvent {
            trigger: trigger.clone(),
            operation: spec.meta.key.to_string(),
            version: spec.meta.version.to_string(),
            outcome: result,
        };
        // Fire and forget: tracker errors never affect the call.
        let _ = tracker.track(&event);
    }
}

/// Maps handler errors into execution errors, surfacing guard rejections.
fn map_handler_error(err: HandlerError) -> ExecuteError {
    match err {
        HandlerError::Emit(EmitError::Undeclared(reference)) => {
            ExecuteError::UndeclaredEvent(reference)
        }
        HandlerError::Emit(other) => ExecuteError::Emit(other),
        HandlerError::Failed(message) => ExecuteError::Handler(message),
    }
}
