// crates/contract-gate-core/src/core/mod.rs
// ============================================================================
// Module: Contract Gate Core Model
// Description: Data model and pure governance algorithms.
// Purpose: Group descriptors, hashing, snapshots, diffing, and registries.
// Dependencies: crate::core submodules
// ============================================================================

//! ## Overview
//! The core module holds the spec descriptor data model and the pure
//! governance algorithms: canonical snapshots, diffing, impact
//! classification, dependency analysis, and the capability machinery. All of
//! it is deterministic over immutable inputs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod capability;
pub mod consistency;
pub mod descriptor;
pub mod diff;
pub mod graph;
pub mod hashing;
pub mod identifiers;
pub mod impact;
pub mod registry;
pub mod snapshot;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capability::CapabilityError;
pub use capability::CapabilityRegistry;
pub use consistency::ConsistencyFinding;
pub use consistency::ConsistencyReport;
pub use consistency::ConsistencyValidator;
pub use consistency::FindingKind;
pub use consistency::OrphanReport;
pub use descriptor::CapabilityRef;
pub use descriptor::CapabilityRequirement;
pub use descriptor::CapabilitySpec;
pub use descriptor::EmittedEvent;
pub use descriptor::EventSpec;
pub use descriptor::FieldMap;
pub use descriptor::FieldSnapshot;
pub use descriptor::FieldType;
pub use descriptor::HttpBinding;
pub use descriptor::OperationIo;
pub use descriptor::OperationSpec;
pub use descriptor::OutputShape;
pub use descriptor::PresentationSpec;
pub use descriptor::SideEffectSpec;
pub use descriptor::SpecDescriptor;
pub use descriptor::SpecMeta;
pub use descriptor::SurfaceRef;
pub use descriptor::TelemetryTriggers;
pub use diff::DiffKind;
pub use diff::FieldDiff;
pub use diff::diff_field_maps;
pub use diff::diff_specs;
pub use graph::ContractGraph;
pub use graph::GraphNode;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::canonical_json_bytes;
pub use identifiers::CompositeKey;
pub use identifiers::SpecKey;
pub use identifiers::SpecVersion;
pub use identifiers::Stability;
pub use identifiers::SurfaceKind;
pub use impact::ClassifyOptions;
pub use impact::ImpactClassifier;
pub use impact::ImpactDelta;
pub use impact::ImpactResult;
pub use impact::ImpactRule;
pub use impact::ImpactStatus;
pub use impact::ImpactSummary;
pub use impact::RulePredicate;
pub use impact::Severity;
pub use impact::SpecDiffSet;
pub use impact::SpecRef;
pub use registry::EventRegistry;
pub use registry::OperationRegistry;
pub use registry::PresentationRegistry;
pub use registry::RegistryError;
pub use registry::SurfaceRegistry;
pub use registry::SurfaceSpec;
pub use snapshot::ContractSnapshot;
pub use snapshot::SnapshotError;
pub use snapshot::SnapshotOptions;
pub use snapshot::build_snapshot;
pub use snapshot::normalize_descriptor;
