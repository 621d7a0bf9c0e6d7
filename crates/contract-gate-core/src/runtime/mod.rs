// crates/contract-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Contract Gate Runtime
// Description: Live contract enforcement for operation execution.
// Purpose: Group schema validation and the execution pipeline.
// Dependencies: crate::runtime submodules
// ============================================================================

//! ## Overview
//! The runtime enforces declared contracts per call: schema validation of
//! inputs, outputs, and event payloads, plus the ordered execution pipeline
//! wiring policy, rate limiting, emission guarding, and telemetry around a
//! bound handler.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod executor;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use executor::CallContext;
pub use executor::EmitError;
pub use executor::EmitGuard;
pub use executor::ExecuteError;
pub use executor::ExecuteRequest;
pub use executor::OperationRuntime;
pub use executor::RuntimeConfig;
pub use validation::ValidationError;
pub use validation::ValidationIssue;
pub use validation::validate_object;
