// crates/contract-gate-core/tests/consistency.rs
// ============================================================================
// Module: Consistency Validator Tests
// Description: Tests for bidirectional capability/surface validation.
// ============================================================================
//! ## Overview
//! Validates both directions of the capability contract: provides entries
//! must resolve to registered specs, spec back-references must resolve to
//! providing capabilities, and emission hygiene surfaces as warnings.

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

use std::collections::BTreeMap;

use contract_gate_core::CapabilityRef;
use contract_gate_core::CapabilityRegistry;
use contract_gate_core::CapabilitySpec;
use contract_gate_core::ConsistencyValidator;
use contract_gate_core::EmittedEvent;
use contract_gate_core::EventRegistry;
use contract_gate_core::EventSpec;
use contract_gate_core::FindingKind;
use contract_gate_core::OperationIo;
use contract_gate_core::OperationRegistry;
use contract_gate_core::OperationSpec;
use contract_gate_core::OutputShape;
use contract_gate_core::SideEffectSpec;
use contract_gate_core::SpecKey;
use contract_gate_core::SpecMeta;
use contract_gate_core::SpecVersion;
use contract_gate_core::Stability;
use contract_gate_core::SurfaceKind;
use contract_gate_core::SurfaceRef;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

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

fn capability_ref(key: &str, version: &str) -> CapabilityRef {
    CapabilityRef {
        key: SpecKey::new(key),
        version: SpecVersion::new(version),
    }
}

fn operation(key: &str, capability: Option<CapabilityRef>) -> OperationSpec {
    OperationSpec {
        meta: meta(key, "1.0.0"),
        io: OperationIo {
            input: BTreeMap::new(),
            output: OutputShape::Fields {
                fields: BTreeMap::new(),
            },
        },
        http: None,
        auth_level: None,
        side_effects: SideEffectSpec::default(),
        telemetry: None,
        capability,
    }
}

fn event(key: &str, capability: Option<CapabilityRef>) -> EventSpec {
    EventSpec {
        meta: meta(key, "1.0.0"),
        payload: BTreeMap::new(),
        capability,
    }
}

fn capability(key: &str, provides: Vec<SurfaceRef>) -> CapabilitySpec {
    CapabilitySpec {
        meta: meta(key, "1.0.0"),
        provides,
        requires: Vec::new(),
        extends: None,
    }
}

fn surface(kind: SurfaceKind, key: &str) -> SurfaceRef {
    SurfaceRef {
        surface: kind,
        key: SpecKey::new(key),
        version: None,
        description: None,
    }
}

/// Consistent payments fixture: one capability providing one operation and
/// one event, both registered with matching back-references.
fn payments_world() -> (CapabilityRegistry, OperationRegistry, EventRegistry) {
    let mut capabilities = CapabilityRegistry::new();
    capabilities
        .register(capability(
            "payments",
            vec![
                surface(SurfaceKind::Operation, "payments.charge"),
                surface(SurfaceKind::Event, "payment.captured"),
            ],
        ))
        .unwrap();

    let mut operations = OperationRegistry::new();
    operations
        .register(operation("payments.charge", Some(capability_ref("payments", "1.0.0"))))
        .unwrap();

    let mut events = EventRegistry::new();
    events
        .register(event("payment.captured", Some(capability_ref("payments", "1.0.0"))))
        .unwrap();

    (capabilities, operations, events)
}

// ============================================================================
// SECTION: Bidirectional Validation
// ============================================================================

/// Tests a fully consistent corpus validates cleanly.
#[test]
fn consistent_corpus_is_valid() {
    let (capabilities, operations, events) = payments_world();
    let report = ConsistencyValidator::new(&capabilities)
        .with_operations(&operations)
        .with_events(&events)
        .validate();

    assert!(report.valid);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
}

/// Tests a provides entry without a registered spec is a forward error.
#[test]
fn missing_surface_spec_is_error() {
    let mut capabilities = CapabilityRegistry::new();
    capabilities
        .register(capability(
            "payments",
            vec![surface(SurfaceKind::Operation, "payments.refund")],
        ))
        .unwrap();
    let operations = OperationRegistry::new();

    let report =
        ConsistencyValidator::new(&capabilities).with_operations(&operations).validate();

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, FindingKind::MissingSurfaceSpec);
    assert_eq!(report.errors[0].spec_key.as_deref(), Some("payments.refund"));
}

/// Tests a registry that was not supplied passes forward checks permissively.
#[test]
fn absent_registry_is_permissive() {
    let mut capabilities = CapabilityRegistry::new();
    capabilities
        .register(capability(
            "payments",
            vec![surface(SurfaceKind::Operation, "payments.refund")],
        ))
        .unwrap();

    let report = ConsistencyValidator::new(&capabilities).validate();
    assert!(report.valid);
}

/// Tests a back-reference to an unregistered capability is a reverse error.
#[test]
fn unknown_capability_reference_is_error() {
    let capabilities = CapabilityRegistry::new();
    let mut operations = OperationRegistry::new();
    operations
        .register(operation("payments.charge", Some(capability_ref("payments", "1.0.0"))))
        .unwrap();

    let report =
        ConsistencyValidator::new(&capabilities).with_operations(&operations).validate();

    assert!(!report.valid);
    assert_eq!(report.errors[0].kind, FindingKind::CapabilityNotFound);
}

/// Tests a back-reference the capability does not provide is a reverse error.
#[test]
fn surface_not_in_provides_is_error() {
    let mut capabilities = CapabilityRegistry::new();
    capabilities.register(capability("payments", Vec::new())).unwrap();
    let mut operations = OperationRegistry::new();
    operations
        .register(operation("payments.charge", Some(capability_ref("payments", "1.0.0"))))
        .unwrap();

    let report =
        ConsistencyValidator::new(&capabilities).with_operations(&operations).validate();

    assert!(!report.valid);
    assert_eq!(report.errors[0].kind, FindingKind::SurfaceNotInProvides);
}

/// Tests inherited provides satisfy the reverse check.
#[test]
fn inherited_provides_satisfy_reverse_check() {
    let mut capabilities = CapabilityRegistry::new();
    capabilities
        .register(capability(
            "payments-base",
            vec![surface(SurfaceKind::Operation, "payments.charge")],
        ))
        .unwrap();
    let mut child = capability("payments", Vec::new());
    child.extends = Some(capability_ref("payments-base", "1.0.0"));
    capabilities.register(child).unwrap();

    let mut operations = OperationRegistry::new();
    operations
        .register(operation("payments.charge", Some(capability_ref("payments", "1.0.0"))))
        .unwrap();

    let report =
        ConsistencyValidator::new(&capabilities).with_operations(&operations).validate();

    assert!(report.valid, "inherited provides should resolve: {:?}", report.errors);
}

/// Tests cyclic ancestry degrades to own provides with a warning.
#[test]
fn cyclic_ancestry_warns_and_falls_back() {
    let mut capabilities = CapabilityRegistry::new();
    let mut a = capability("a", vec![surface(SurfaceKind::Operation, "a.op")]);
    a.extends = Some(capability_ref("b", "1.0.0"));
    capabilities.register(a).unwrap();
    let mut b = capability("b", Vec::new());
    b.extends = Some(capability_ref("a", "1.0.0"));
    capabilities.register(b).unwrap();

    let mut operations = OperationRegistry::new();
    operations.register(operation("a.op", Some(capability_ref("a", "1.0.0")))).unwrap();

    let report =
        ConsistencyValidator::new(&capabilities).with_operations(&operations).validate();

    assert!(report.valid);
    assert!(report.warnings.iter().any(|finding| finding.kind == FindingKind::AncestryCycle));
}

// ============================================================================
// SECTION: Emission Hygiene
// ============================================================================

/// Tests unresolved emissions warn without failing validation.
#[test]
fn unresolved_emission_is_warning() {
    let (_, mut operations, events) = payments_world();
    let mut op = operation("payments.retry", Some(capability_ref("payments", "1.0.0")));
    op.side_effects.emits = vec![EmittedEvent::Unresolved {
        hint: Some("computed event name".to_string()),
    }];
    operations.register(op).unwrap();

    let mut capabilities = CapabilityRegistry::new();
    capabilities
        .register(capability(
            "payments",
            vec![
                surface(SurfaceKind::Operation, "payments.charge"),
                surface(SurfaceKind::Operation, "payments.retry"),
                surface(SurfaceKind::Event, "payment.captured"),
            ],
        ))
        .unwrap();

    let report = ConsistencyValidator::new(&capabilities)
        .with_operations(&operations)
        .with_events(&events)
        .validate();

    assert!(report.valid);
    assert!(
        report.warnings.iter().any(|finding| finding.kind == FindingKind::UnresolvedEmission)
    );
}

/// Tests resolved emissions pointing at unregistered events warn.
#[test]
fn unknown_emitted_event_is_warning() {
    let (capabilities, _, events) = payments_world();
    let mut operations = OperationRegistry::new();
    let mut op = operation("payments.charge", Some(capability_ref("payments", "1.0.0")));
    op.side_effects.emits = vec![EmittedEvent::Resolved {
        key: SpecKey::new("payment.ghost"),
        version: SpecVersion::new("1.0.0"),
    }];
    operations.register(op).unwrap();

    let report = ConsistencyValidator::new(&capabilities)
        .with_operations(&operations)
        .with_events(&events)
        .validate();

    assert!(report.valid);
    assert!(
        report.warnings.iter().any(|finding| finding.kind == FindingKind::UnknownEmittedEvent)
    );
}

// ============================================================================
// SECTION: Orphans
// ============================================================================

/// Tests orphan reporting lists specs lacking a capability back-reference.
#[test]
fn orphan_specs_are_reported() {
    let (capabilities, mut operations, events) = payments_world();
    operations.register(operation("internal.debug", None)).unwrap();

    let validator = ConsistencyValidator::new(&capabilities)
        .with_operations(&operations)
        .with_events(&events);
    let orphans = validator.find_orphan_specs();

    assert_eq!(orphans.operations, vec!["internal.debug.v1.0.0".to_string()]);
    assert!(orphans.events.is_empty());
}
