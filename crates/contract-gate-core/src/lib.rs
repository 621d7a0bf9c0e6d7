// crates/contract-gate-core/src/lib.rs
// ============================================================================
// Module: Contract Gate Core Library
// Description: Contract governance engine for declared service surfaces.
// Purpose: Expose snapshots, diffing, impact analysis, capability machinery,
//          and the runtime execution pipeline.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Contract Gate turns declared service contracts into enforced ones. Spec
//! descriptors for operations, events, presentations, and capabilities feed
//! four pillars:
//!
//! - **Snapshots**: canonical, content-hashed corpus captures whose hashes
//!   are stable under input reordering.
//! - **Diff and impact**: structural field-level diffs between snapshots,
//!   classified by an ordered rule chain into breaking, non-breaking, and
//!   informational impact.
//! - **Capabilities**: a versioned registry with inheritance, effective
//!   contracts, and bidirectional consistency validation against the
//!   registered surfaces.
//! - **Runtime enforcement**: an execution pipeline that validates input,
//!   consults policy, guards event emissions against declarations, and
//!   validates output, in a fixed fail-closed order.
//!
//! The governance algorithms are pure and deterministic; host integration
//! happens only through the ports in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;
pub use interfaces::EventEnvelope;
pub use interfaces::EventPublisher;
pub use interfaces::HandlerError;
pub use interfaces::OperationHandler;
pub use interfaces::PolicyDecider;
pub use interfaces::PolicyDecision;
pub use interfaces::PolicyEffect;
pub use interfaces::PolicyError;
pub use interfaces::PolicyRequest;
pub use interfaces::PublishError;
pub use interfaces::RateLimitError;
pub use interfaces::RateLimitHint;
pub use interfaces::RateLimiter;
pub use interfaces::SecretError;
pub use interfaces::SecretProvider;
pub use interfaces::TelemetryError;
pub use interfaces::TelemetryEvent;
pub use interfaces::TelemetryOutcome;
pub use interfaces::TelemetryTracker;
pub use interfaces::VariantContext;
pub use interfaces::VariantResolver;
pub use runtime::CallContext;
pub use runtime::EmitError;
pub use runtime::EmitGuard;
pub use runtime::ExecuteError;
pub use runtime::ExecuteRequest;
pub use runtime::OperationRuntime;
pub use runtime::RuntimeConfig;
pub use runtime::ValidationError;
pub use runtime::ValidationIssue;
pub use runtime::validate_object;
