// crates/contract-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Contract Gate Interfaces
// Description: Host-supplied ports for policy, limits, telemetry, and events.
// Purpose: Define the callback surfaces consumed by the execution pipeline.
// Dependencies: crate::{core, runtime}, async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the execution pipeline integrates with host systems
//! without embedding backend-specific details. Policy and rate-limit ports
//! fail closed; the telemetry port fails open. Concrete implementations are
//! external collaborators, not part of this core.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::SpecKey;
use crate::core::identifiers::SpecVersion;
use crate::runtime::CallContext;

// ============================================================================
// SECTION: Policy Decider
// ============================================================================

/// Decision request built by the executor for every policy-checked call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRequest {
    /// Host service name.
    pub service: String,
    /// Operation key under execution.
    pub operation: String,
    /// Operation version under execution.
    pub version: String,
    /// Calling actor, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Calling channel, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Roles held by the caller.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Organization scope, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    /// User scope, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Policy decision effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEffect {
    /// Permit the call.
    Allow,
    /// Deny the call.
    Deny,
}

/// Rate-limit hint attached to an allow decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitHint {
    /// Limiter bucket key.
    pub key: String,
    /// Maximum calls per window.
    pub limit: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

/// Policy decision returned by the decider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Decision effect.
    pub effect: PolicyEffect,
    /// Rate limit to enforce on allow, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitHint>,
    /// Advisory escalation hint; never enforced by the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation: Option<String>,
}

/// Policy decision errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Policy engine reported an error.
    #[error("policy decision error: {0}")]
    DecisionFailed(String),
}

/// Policy decider for operation execution.
pub trait PolicyDecider: Send + Sync {
    /// Evaluates whether a call may proceed.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when policy evaluation fails; the executor
    /// treats evaluation failure as fail-closed.
    fn decide(&self, request: &PolicyRequest) -> Result<PolicyDecision, PolicyError>;
}

// ============================================================================
// SECTION: Rate Limiter
// ============================================================================

/// Rate limiter errors.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// The limiter rejected the call.
    #[error("rate limit exceeded: {0}")]
    Exceeded(String),
    /// The limiter itself failed.
    #[error("rate limiter error: {0}")]
    Limiter(String),
}

/// External rate limiter invoked on allow decisions carrying a hint.
pub trait RateLimiter: Send + Sync {
    /// Checks the call against the hinted bucket.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] when the call must be aborted.
    fn check(&self, hint: &RateLimitHint, request: &PolicyRequest) -> Result<(), RateLimitError>;
}

// ============================================================================
// SECTION: Telemetry Tracker
// ============================================================================

/// Call outcome recorded in telemetry events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryOutcome {
    /// The handler returned a value.
    Success,
    /// The handler returned an error.
    Failure,
}

/// Telemetry event tracked against a declared trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Declared trigger name.
    pub trigger: String,
    /// Operation key.
    pub operation: String,
    /// Operation version.
    pub version: String,
    /// Call outcome.
    pub outcome: TelemetryOutcome,
}

/// Telemetry tracker errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Tracker reported an error.
    #[error("telemetry tracker error: {0}")]
    Tracker(String),
}

/// Best-effort telemetry tracker.
///
/// # Invariants
/// - Tracker errors never affect a call's outcome; the executor swallows
///   them unconditionally.
pub trait TelemetryTracker: Send + Sync {
    /// Tracks a telemetry event.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError`] when tracking fails; callers ignore it.
    fn track(&self, event: &TelemetryEvent) -> Result<(), TelemetryError>;
}

// ============================================================================
// SECTION: Event Publisher
// ============================================================================

/// Event envelope delivered to the publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event key.
    pub key: SpecKey,
    /// Event version.
    pub version: SpecVersion,
    /// Schema-validated event payload.
    pub payload: Value,
}

/// Event publisher errors.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Publisher reported an error.
    #[error("event publish error: {0}")]
    Publisher(String),
}

/// Event publisher receiving guard-approved emissions.
pub trait EventPublisher: Send + Sync {
    /// Publishes a validated event.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when delivery fails.
    fn publish(&self, envelope: &EventEnvelope) -> Result<(), PublishError>;
}

// ============================================================================
// SECTION: Secret Provider
// ============================================================================

/// Secret provider errors.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Provider reported an error.
    #[error("secret provider error: {0}")]
    Provider(String),
}

/// Secret provider exposed to handlers through the call context.
pub trait SecretProvider: Send + Sync {
    /// Resolves a named secret, when present.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError`] when resolution fails.
    fn secret(&self, name: &str) -> Result<Option<String>, SecretError>;
}

// ============================================================================
// SECTION: Variant Resolver
// ============================================================================

/// Context handed to the variant resolver for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantContext {
    /// Operation key under execution.
    pub operation: SpecKey,
    /// Base version requested by the caller.
    pub base_version: SpecVersion,
    /// Calling actor, when known.
    pub actor: Option<String>,
    /// Calling channel, when known.
    pub channel: Option<String>,
}

/// Per-call spec variant resolver (for example, experiments).
pub trait VariantResolver: Send + Sync {
    /// Returns a substitute version for this call only, when one applies.
    fn resolve(&self, context: &VariantContext) -> Option<SpecVersion>;
}

// ============================================================================
// SECTION: Operation Handler
// ============================================================================

/// Handler errors.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Handler business logic failed.
    #[error("handler failed: {0}")]
    Failed(String),
    /// Event emission was rejected by the guard.
    #[error(transparent)]
    Emit(#[from] crate::runtime::EmitError),
}

/// Bound operation handler invoked with validated input.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Handles one validated call.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the call fails; emission-guard
    /// rejections should be propagated unchanged so the executor can
    /// classify them.
    async fn handle(&self, input: Value, ctx: &CallContext<'_>) -> Result<Value, HandlerError>;
}
