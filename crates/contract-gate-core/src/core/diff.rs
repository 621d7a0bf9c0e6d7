// crates/contract-gate-core/src/core/diff.rs
// ============================================================================
// Module: Contract Gate Diff Engine
// Description: Field-level semantic comparison of spec descriptors.
// Purpose: Emit typed deltas between base and head contract shapes.
// Dependencies: crate::core::descriptor, serde, serde_json
// ============================================================================

//! ## Overview
//! The diff engine compares two normalized field maps per IO section and
//! classifies every difference according to the compatibility table: removals,
//! tightenings, and HTTP binding changes break callers, additions and
//! relaxations do not. Nested
//! object, array, and union shapes are compared recursively with a dotted
//! path accumulator (for example `io.output.user.email`). Metadata changes
//! (stability, description, owners, tags) are emitted as non-breaking deltas
//! for the impact classifier's informational rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::core::descriptor::FieldMap;
use crate::core::descriptor::FieldSnapshot;
use crate::core::descriptor::OutputShape;
use crate::core::descriptor::SpecDescriptor;
use crate::core::descriptor::SpecMeta;

// ============================================================================
// SECTION: Diff Types
// ============================================================================

/// Kind of difference detected between base and head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Field present in base, absent in head.
    Removed,
    /// Required field added in head.
    AddedRequired,
    /// Optional field added in head.
    AddedOptional,
    /// Declared field type changed.
    TypeChanged,
    /// Literal constant changed.
    LiteralChanged,
    /// Field became required.
    RequiredTightened,
    /// Field became optional.
    RequiredRelaxed,
    /// Field stopped accepting null.
    NullableNarrowed,
    /// Field started accepting null.
    NullableWidened,
    /// Enum value removed.
    EnumValueRemoved,
    /// Enum value added.
    EnumValueAdded,
    /// Stability classification changed.
    StabilityChanged,
    /// Description changed.
    DescriptionChanged,
    /// Owner list changed.
    OwnersChanged,
    /// Tag list changed.
    TagsChanged,
    /// Authentication level changed.
    AuthLevelChanged,
    /// HTTP binding changed.
    HttpBindingChanged,
}

impl DiffKind {
    /// Whether the difference can break previously-valid callers.
    #[must_use]
    pub const fn is_breaking(self) -> bool {
        match self {
            Self::Removed
            | Self::AddedRequired
            | Self::TypeChanged
            | Self::LiteralChanged
            | Self::RequiredTightened
            | Self::NullableNarrowed
            | Self::EnumValueRemoved
            | Self::HttpBindingChanged => true,
            Self::AddedOptional
            | Self::RequiredRelaxed
            | Self::NullableWidened
            | Self::EnumValueAdded
            | Self::StabilityChanged
            | Self::DescriptionChanged
            | Self::OwnersChanged
            | Self::TagsChanged
            | Self::AuthLevelChanged => false,
        }
    }
}

/// One typed delta between base and head shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Dotted path of the changed element.
    pub path: String,
    /// Kind of difference.
    pub kind: DiffKind,
    /// Whether the delta breaks callers per the compatibility table.
    pub breaking: bool,
    /// Human-readable description consumed by the impact classifier.
    pub description: String,
    /// Base-side value, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    /// Head-side value, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl FieldDiff {
    /// Builds a delta, deriving the breaking flag from its kind.
    fn new(
        path: String,
        kind: DiffKind,
        description: String,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Self {
        Self {
            path,
            kind,
            breaking: kind.is_breaking(),
            description,
            old_value,
            new_value,
        }
    }
}

// ============================================================================
// SECTION: Field Map Diffing
// ============================================================================

/// Diffs two field maps under the given path prefix.
#[must_use]
pub fn diff_field_maps(base: &FieldMap, head: &FieldMap, prefix: &str) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();

    for (name, base_field) in base {
        let path = join_path(prefix, name);
        match head.get(name) {
            None => diffs.push(FieldDiff::new(
                path,
                DiffKind::Removed,
                format!("field `{name}` was removed"),
                Some(json!(base_field.field_type.as_str())),
                None,
            )),
            Some(head_field) => diff_fields(base_field, head_field, &path, &mut diffs),
        }
    }

    for (name, head_field) in head {
        if base.contains_key(name) {
            continue;
        }
        let path = join_path(prefix, name);
        if head_field.required {
            diffs.push(FieldDiff::new(
                path,
                DiffKind::AddedRequired,
                format!("required field `{name}` was added"),
                None,
                Some(json!(head_field.field_type.as_str())),
            ));
        } else {
            diffs.push(FieldDiff::new(
                path,
                DiffKind::AddedOptional,
                format!("optional field `{name}` was added"),
                None,
                Some(json!(head_field.field_type.as_str())),
            ));
        }
    }

    diffs
}

/// Diffs two field snapshots sharing the same path.
fn diff_fields(base: &FieldSnapshot, head: &FieldSnapshot, path: &str, diffs: &mut Vec<FieldDiff>) {
    if base.field_type != head.field_type {
        diffs.push(FieldDiff::new(
            path.to_string(),
            DiffKind::TypeChanged,
            format!(
                "type changed from `{}` to `{}`",
                base.field_type.as_str(),
                head.field_type.as_str()
            ),
            Some(json!(base.field_type.as_str())),
            Some(json!(head.field_type.as_str())),
        ));
        return;
    }

    if base.literal != head.literal {
        diffs.push(FieldDiff::new(
            path.to_string(),
            DiffKind::LiteralChanged,
            "literal value changed".to_string(),
            base.literal.clone(),
            head.literal.clone(),
        ));
    }

    match (base.required, head.required) {
        (true, false) => diffs.push(FieldDiff::new(
            path.to_string(),
            DiffKind::RequiredRelaxed,
            "field is no longer required".to_string(),
            Some(json!(true)),
            Some(json!(false)),
        )),
        (false, true) => diffs.push(FieldDiff::new(
            path.to_string(),
            DiffKind::RequiredTightened,
            "field became required".to_string(),
            Some(json!(false)),
            Some(json!(true)),
        )),
        _ => {}
    }

    match (base.nullable, head.nullable) {
        (false, true) => diffs.push(FieldDiff::new(
            path.to_string(),
            DiffKind::NullableWidened,
            "field became nullable".to_string(),
            Some(json!(false)),
            Some(json!(true)),
        )),
        (true, false) => diffs.push(FieldDiff::new(
            path.to_string(),
            DiffKind::NullableNarrowed,
            "field is no longer nullable".to_string(),
            Some(json!(true)),
            Some(json!(false)),
        )),
        _ => {}
    }

    diff_enum_values(base, head, path, diffs);

    if let (Some(base_items), Some(head_items)) = (&base.items, &head.items) {
        diff_fields(base_items, head_items, &format!("{path}[]"), diffs);
    }

    if let (Some(base_props), Some(head_props)) = (&base.properties, &head.properties) {
        diffs.extend(diff_field_maps(base_props, head_props, path));
    }

    diff_union_members(base, head, path, diffs);
}

/// Diffs enum value lists, one delta per added or removed value.
///
/// A missing list on one side counts as empty, so dropping the whole list
/// surfaces as a removal of every previously-allowed value and introducing
/// one surfaces as an addition per value.
fn diff_enum_values(
    base: &FieldSnapshot,
    head: &FieldSnapshot,
    path: &str,
    diffs: &mut Vec<FieldDiff>,
) {
    let base_values = base.enum_values.as_deref().unwrap_or_default();
    let head_values = head.enum_values.as_deref().unwrap_or_default();

    for value in base_values {
        if !head_values.contains(value) {
            diffs.push(FieldDiff::new(
                path.to_string(),
                DiffKind::EnumValueRemoved,
                format!("enum value `{value}` was removed"),
                Some(json!(value)),
                None,
            ));
        }
    }
    for value in head_values {
        if !base_values.contains(value) {
            diffs.push(FieldDiff::new(
                path.to_string(),
                DiffKind::EnumValueAdded,
                format!("enum value `{value}` was added"),
                None,
                Some(json!(value)),
            ));
        }
    }
}

/// Diffs union members matched by member name.
fn diff_union_members(
    base: &FieldSnapshot,
    head: &FieldSnapshot,
    path: &str,
    diffs: &mut Vec<FieldDiff>,
) {
    let (Some(base_members), Some(head_members)) = (&base.union_types, &head.union_types) else {
        return;
    };

    for member in base_members {
        let member_path = join_path(path, &member.name);
        match head_members.iter().find(|candidate| candidate.name == member.name) {
            None => diffs.push(FieldDiff::new(
                member_path,
                DiffKind::Removed,
                format!("union member `{}` was removed", member.name),
                Some(json!(member.field_type.as_str())),
                None,
            )),
            Some(head_member) => diff_fields(member, head_member, &member_path, diffs),
        }
    }
    for member in head_members {
        if base_members.iter().any(|candidate| candidate.name == member.name) {
            continue;
        }
        diffs.push(FieldDiff::new(
            join_path(path, &member.name),
            DiffKind::AddedOptional,
            format!("union member `{}` was added", member.name),
            None,
            Some(json!(member.field_type.as_str())),
        ));
    }
}

/// Joins a path prefix and segment with a dot separator.
fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

// ============================================================================
// SECTION: Descriptor Diffing
// ============================================================================

/// Diffs two descriptors sharing the same key and type.
///
/// Operations are compared under `io.input` / `io.output`, events under
/// `payload`; shared metadata deltas are emitted for every type. Descriptors
/// of differing types produce a single type-changed delta.
#[must_use]
pub fn diff_specs(base: &SpecDescriptor, head: &SpecDescriptor) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();
    diff_meta(base.meta(), head.meta(), &mut diffs);

    match (base, head) {
        (SpecDescriptor::Operation(base_op), SpecDescriptor::Operation(head_op)) => {
            diffs.extend(diff_field_maps(&base_op.io.input, &head_op.io.input, "io.input"));
            diff_outputs(&base_op.io.output, &head_op.io.output, &mut diffs);
            if base_op.auth_level != head_op.auth_level {
                diffs.push(FieldDiff::new(
                    "auth_level".to_string(),
                    DiffKind::AuthLevelChanged,
                    "authentication level changed".to_string(),
                    base_op.auth_level.as_ref().map(|level| json!(level)),
                    head_op.auth_level.as_ref().map(|level| json!(level)),
                ));
            }
            if base_op.http != head_op.http {
                diffs.push(FieldDiff::new(
                    "http".to_string(),
                    DiffKind::HttpBindingChanged,
                    "http binding changed".to_string(),
                    base_op.http.as_ref().and_then(|http| serde_json::to_value(http).ok()),
                    head_op.http.as_ref().and_then(|http| serde_json::to_value(http).ok()),
                ));
            }
        }
        (SpecDescriptor::Event(base_event), SpecDescriptor::Event(head_event)) => {
            diffs.extend(diff_field_maps(&base_event.payload, &head_event.payload, "payload"));
        }
        (SpecDescriptor::Presentation(_), SpecDescriptor::Presentation(_))
        | (SpecDescriptor::Capability(_), SpecDescriptor::Capability(_)) => {}
        _ => diffs.push(FieldDiff::new(
            "spec_type".to_string(),
            DiffKind::TypeChanged,
            format!("spec type changed from `{}` to `{}`", base.spec_type(), head.spec_type()),
            Some(json!(base.spec_type())),
            Some(json!(head.spec_type())),
        )),
    }

    diffs
}

/// Diffs operation output shapes.
fn diff_outputs(base: &OutputShape, head: &OutputShape, diffs: &mut Vec<FieldDiff>) {
    match (base, head) {
        (
            OutputShape::Fields {
                fields: base_fields,
            },
            OutputShape::Fields {
                fields: head_fields,
            },
        ) => diffs.extend(diff_field_maps(base_fields, head_fields, "io.output")),
        (
            OutputShape::ResourceRef {
                resource: base_resource,
            },
            OutputShape::ResourceRef {
                resource: head_resource,
            },
        ) => {
            if base_resource != head_resource {
                diffs.push(FieldDiff::new(
                    "io.output".to_string(),
                    DiffKind::TypeChanged,
                    format!(
                        "output resource changed from `{base_resource}` to `{head_resource}`"
                    ),
                    Some(json!(base_resource)),
                    Some(json!(head_resource)),
                ));
            }
        }
        _ => diffs.push(FieldDiff::new(
            "io.output".to_string(),
            DiffKind::TypeChanged,
            "output shape changed between schema and resource reference".to_string(),
            None,
            None,
        )),
    }
}

/// Diffs shared spec metadata.
fn diff_meta(base: &SpecMeta, head: &SpecMeta, diffs: &mut Vec<FieldDiff>) {
    if base.stability != head.stability {
        diffs.push(FieldDiff::new(
            "stability".to_string(),
            DiffKind::StabilityChanged,
            format!(
                "stability changed from `{}` to `{}`",
                base.stability.as_str(),
                head.stability.as_str()
            ),
            Some(json!(base.stability.as_str())),
            Some(json!(head.stability.as_str())),
        ));
    }
    if base.description != head.description {
        diffs.push(FieldDiff::new(
            "description".to_string(),
            DiffKind::DescriptionChanged,
            "description changed".to_string(),
            base.description.as_ref().map(|text| json!(text)),
            head.description.as_ref().map(|text| json!(text)),
        ));
    }
    if base.owners != head.owners {
        diffs.push(FieldDiff::new(
            "owners".to_string(),
            DiffKind::OwnersChanged,
            "owner list changed".to_string(),
            Some(json!(base.owners)),
            Some(json!(head.owners)),
        ));
    }
    if base.tags != head.tags {
        diffs.push(FieldDiff::new(
            "tags".to_string(),
            DiffKind::TagsChanged,
            "tag list changed".to_string(),
            Some(json!(base.tags)),
            Some(json!(head.tags)),
        ));
    }
}
