// crates/contract-gate-core/src/core/descriptor.rs
// ============================================================================
// Module: Contract Gate Spec Descriptors
// Description: Plain-data descriptors for operations, events, capabilities, and presentations.
// Purpose: Define the sole input boundary consumed by the governance core.
// Dependencies: crate::core::identifiers, serde, serde_json
// ============================================================================

//! ## Overview
//! Spec descriptors are the normalized data form produced by external
//! scanners. The core never parses source text; it operates exclusively on
//! these records. Field maps are `BTreeMap`s so canonical key ordering is
//! structural rather than a serialization concern.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::SpecKey;
use crate::core::identifiers::SpecVersion;
use crate::core::identifiers::Stability;
use crate::core::identifiers::SurfaceKind;

// ============================================================================
// SECTION: Field Snapshots
// ============================================================================

/// Closed set of field types compared by the diff engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// JSON number.
    Number,
    /// Boolean.
    Boolean,
    /// Nested object with `properties`.
    Object,
    /// Array with `items`.
    Array,
    /// Closed string enumeration with `enum_values`.
    Enum,
    /// Union of shapes listed in `union_types`.
    Union,
    /// Literal constant carried in `literal`.
    Literal,
    /// RFC 3339 date or date-time string.
    Date,
    /// Statically unresolvable type; validation always passes.
    Unknown,
}

impl FieldType {
    /// Returns a stable label for the field type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Enum => "enum",
            Self::Union => "union",
            Self::Literal => "literal",
            Self::Date => "date",
            Self::Unknown => "unknown",
        }
    }
}

/// Atomic unit compared by the diff engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    /// Field name as declared in the contract.
    pub name: String,
    /// Declared field type.
    pub field_type: FieldType,
    /// Whether callers must supply the field.
    pub required: bool,
    /// Whether an explicit null is accepted.
    pub nullable: bool,
    /// Allowed values for `enum` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Constant value for `literal` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<Value>,
    /// Element shape for `array` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSnapshot>>,
    /// Nested shape for `object` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<FieldMap>,
    /// Member shapes for `union` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub union_types: Option<Vec<FieldSnapshot>>,
}

/// Field map keyed by field name in canonical order.
pub type FieldMap = BTreeMap<String, FieldSnapshot>;

// ============================================================================
// SECTION: Shared Metadata
// ============================================================================

/// Metadata shared by every spec descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecMeta {
    /// Spec key, globally unique per spec type.
    pub key: SpecKey,
    /// Spec version.
    pub version: SpecVersion,
    /// Stability classification.
    pub stability: Stability,
    /// Owning teams or individuals.
    #[serde(default)]
    pub owners: Vec<String>,
    /// Free-form governance tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reference to a capability by key and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRef {
    /// Capability key.
    pub key: SpecKey,
    /// Capability version.
    pub version: SpecVersion,
}

// ============================================================================
// SECTION: Operation Descriptor
// ============================================================================

/// HTTP binding advertised by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpBinding {
    /// HTTP method.
    pub method: String,
    /// Route path.
    pub path: String,
}

/// Output contract of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputShape {
    /// Plain schema validated by the execution pipeline.
    Fields {
        /// Output field map.
        fields: FieldMap,
    },
    /// Resource reference hydrated by an adapter; output validation is skipped.
    ResourceRef {
        /// Referenced resource key.
        resource: String,
    },
}

/// Input/output contract of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationIo {
    /// Input field map.
    pub input: FieldMap,
    /// Output contract.
    pub output: OutputShape,
}

/// Declared event emission.
///
/// # Invariants
/// - The scanner never fabricates keys for dynamic references; emissions it
///   cannot resolve statically are carried as [`EmittedEvent::Unresolved`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmittedEvent {
    /// Statically resolved event reference.
    Resolved {
        /// Event key.
        key: SpecKey,
        /// Event version.
        version: SpecVersion,
    },
    /// Emission the scanner could not resolve statically.
    Unresolved {
        /// Source-level hint, when available.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
}

/// Declared side effects of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SideEffectSpec {
    /// Events the operation may emit.
    #[serde(default)]
    pub emits: Vec<EmittedEvent>,
}

/// Declared telemetry triggers for an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryTriggers {
    /// Trigger tracked when the handler succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    /// Trigger tracked when the handler fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Operation spec descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// Shared spec metadata.
    #[serde(flatten)]
    pub meta: SpecMeta,
    /// Input/output contract.
    pub io: OperationIo,
    /// Optional HTTP binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpBinding>,
    /// Required authentication level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_level: Option<String>,
    /// Declared side effects.
    #[serde(default)]
    pub side_effects: SideEffectSpec,
    /// Declared telemetry triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<TelemetryTriggers>,
    /// Capability back-reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<CapabilityRef>,
}

// ============================================================================
// SECTION: Event Descriptor
// ============================================================================

/// Event spec descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    /// Shared spec metadata.
    #[serde(flatten)]
    pub meta: SpecMeta,
    /// Event payload field map.
    pub payload: FieldMap,
    /// Capability back-reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<CapabilityRef>,
}

// ============================================================================
// SECTION: Presentation Descriptor
// ============================================================================

/// Presentation spec descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationSpec {
    /// Shared spec metadata.
    #[serde(flatten)]
    pub meta: SpecMeta,
    /// Route the presentation is mounted at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Capability back-reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<CapabilityRef>,
}

// ============================================================================
// SECTION: Capability Descriptor
// ============================================================================

/// Surface provided by a capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceRef {
    /// Surface kind.
    pub surface: SurfaceKind,
    /// Surface spec key.
    pub key: SpecKey,
    /// Optional surface spec version constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<SpecVersion>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Requirement on another capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRequirement {
    /// Required capability key.
    pub key: SpecKey,
    /// Optional required version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<SpecVersion>,
    /// Requirement kind label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Whether the requirement is optional.
    #[serde(default)]
    pub optional: bool,
    /// Reason the requirement exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Capability spec descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySpec {
    /// Shared spec metadata.
    #[serde(flatten)]
    pub meta: SpecMeta,
    /// Surfaces the capability provides.
    #[serde(default)]
    pub provides: Vec<SurfaceRef>,
    /// Capabilities this capability requires.
    #[serde(default)]
    pub requires: Vec<CapabilityRequirement>,
    /// Optional parent capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<CapabilityRef>,
}

// ============================================================================
// SECTION: Spec Descriptor
// ============================================================================

/// Discriminated spec descriptor, the core's sole input type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "spec_type", rename_all = "snake_case")]
pub enum SpecDescriptor {
    /// Operation descriptor.
    Operation(OperationSpec),
    /// Event descriptor.
    Event(EventSpec),
    /// Presentation descriptor.
    Presentation(PresentationSpec),
    /// Capability descriptor.
    Capability(CapabilitySpec),
}

impl SpecDescriptor {
    /// Returns the shared metadata of the descriptor.
    #[must_use]
    pub const fn meta(&self) -> &SpecMeta {
        match self {
            Self::Operation(spec) => &spec.meta,
            Self::Event(spec) => &spec.meta,
            Self::Presentation(spec) => &spec.meta,
            Self::Capability(spec) => &spec.meta,
        }
    }

    /// Returns the spec key.
    #[must_use]
    pub const fn key(&self) -> &SpecKey {
        &self.meta().key
    }

    /// Returns the spec version.
    #[must_use]
    pub const fn version(&self) -> &SpecVersion {
        &self.meta().version
    }

    /// Returns a stable label for the spec type.
    #[must_use]
    pub const fn spec_type(&self) -> &'static str {
        match self {
            Self::Operation(_) => "operation",
            Self::Event(_) => "event",
            Self::Presentation(_) => "presentation",
            Self::Capability(_) => "capability",
        }
    }

    /// Returns the capability back-reference, when present.
    #[must_use]
    pub const fn capability_ref(&self) -> Option<&CapabilityRef> {
        match self {
            Self::Operation(spec) => spec.capability.as_ref(),
            Self::Event(spec) => spec.capability.as_ref(),
            Self::Presentation(spec) => spec.capability.as_ref(),
            Self::Capability(_) => None,
        }
    }
}
