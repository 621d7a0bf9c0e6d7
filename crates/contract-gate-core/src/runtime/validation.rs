// crates/contract-gate-core/src/runtime/validation.rs
// ============================================================================
// Module: Contract Gate Schema Validation
// Description: Structural validation of JSON values against field maps.
// Purpose: Enforce declared input, output, and event payload contracts.
// Dependencies: crate::core::descriptor, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Schema validation checks a `serde_json::Value` against a declared field
//! map: required presence, nullability, closed type checks, enum membership,
//! literal equality, and recursion through array items, object properties,
//! and union members. Undeclared keys are rejected so unvalidated data never
//! reaches a handler. `unknown` fields always pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::descriptor::FieldMap;
use crate::core::descriptor::FieldSnapshot;
use crate::core::descriptor::FieldType;

// ============================================================================
// SECTION: Validation Issues
// ============================================================================

/// One structural validation issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path of the offending element.
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

/// Validation failure carrying every collected issue.
#[derive(Debug, Error)]
#[error("schema validation failed ({} issue(s))", .issues.len())]
pub struct ValidationError {
    /// Collected issues.
    pub issues: Vec<ValidationIssue>,
}

// ============================================================================
// SECTION: Entry Points
// ============================================================================

/// Validates a JSON object against a field map.
///
/// # Errors
///
/// Returns [`ValidationError`] listing every structural issue found.
pub fn validate_object(fields: &FieldMap, value: &Value) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    check_object(fields, value, "", &mut issues);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            issues,
        })
    }
}

// ============================================================================
// SECTION: Structural Checks
// ============================================================================

/// Checks an object value against a field map, collecting issues.
fn check_object(fields: &FieldMap, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    let Value::Object(object) = value else {
        issues.push(issue(path, "expected an object"));
        return;
    };

    for (name, field) in fields {
        let field_path = join_path(path, name);
        match object.get(name) {
            None => {
                if field.required {
                    issues.push(issue(&field_path, "required field is missing"));
                }
            }
            Some(entry) => check_field(field, entry, &field_path, issues),
        }
    }

    for name in object.keys() {
        if !fields.contains_key(name) {
            issues.push(issue(&join_path(path, name), "undeclared field"));
        }
    }
}

/// Checks a single value against its field snapshot.
fn check_field(field: &FieldSnapshot, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    if value.is_null() {
        if !field.nullable {
            issues.push(issue(path, "null is not accepted"));
        }
        return;
    }

    match field.field_type {
        FieldType::String => {
            if !value.is_string() {
                issues.push(issue(path, "expected a string"));
            }
        }
        FieldType::Number => {
            if !value.is_number() {
                issues.push(issue(path, "expected a number"));
            }
        }
        FieldType::Boolean => {
            if !value.is_boolean() {
                issues.push(issue(path, "expected a boolean"));
            }
        }
        FieldType::Date => match value.as_str() {
            Some(text) if is_temporal(text) => {}
            Some(_) => issues.push(issue(path, "expected an RFC 3339 date or date-time")),
            None => issues.push(issue(path, "expected a date string")),
        },
        FieldType::Enum => check_enum(field, value, path, issues),
        FieldType::Literal => {
            if field.literal.as_ref() != Some(value) {
                issues.push(issue(path, "value does not match the declared literal"));
            }
        }
        FieldType::Object => match &field.properties {
            Some(properties) => check_object(properties, value, path, issues),
            None => {
                if !value.is_object() {
                    issues.push(issue(path, "expected an object"));
                }
            }
        },
        FieldType::Array => check_array(field, value, path, issues),
        FieldType::Union => check_union(field, value, path, issues),
        FieldType::Unknown => {}
    }
}

/// Checks enum membership.
fn check_enum(field: &FieldSnapshot, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    let Some(text) = value.as_str() else {
        issues.push(issue(path, "expected an enum string"));
        return;
    };
    let allowed = field
        .enum_values
        .as_ref()
        .is_some_and(|values| values.iter().any(|candidate| candidate == text));
    if !allowed {
        issues.push(issue(path, "value is not an allowed enum member"));
    }
}

/// Checks an array value and recurses into its item shape.
fn check_array(field: &FieldSnapshot, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    let Value::Array(entries) = value else {
        issues.push(issue(path, "expected an array"));
        return;
    };
    let Some(items) = &field.items else {
        return;
    };
    for (index, entry) in entries.iter().enumerate() {
        check_field(items, entry, &format!("{path}[{index}]"), issues);
    }
}

/// Checks a union value: any member accepting the value passes.
fn check_union(field: &FieldSnapshot, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    let Some(members) = &field.union_types else {
        return;
    };
    let accepted = members.iter().any(|member| {
        let mut member_issues = Vec::new();
        check_field(member, value, path, &mut member_issues);
        member_issues.is_empty()
    });
    if !accepted {
        issues.push(issue(path, "value matches no union member"));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Whether a string parses as RFC 3339 date-time or date-only.
fn is_temporal(text: &str) -> bool {
    if OffsetDateTime::parse(text, &Rfc3339).is_ok() {
        return true;
    }
    parse_date_only(text).is_some()
}

/// Parses a date-only value (YYYY-MM-DD).
fn parse_date_only(text: &str) -> Option<Date> {
    let mut parts = text.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = time::Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

/// Builds an issue at a path.
fn issue(path: &str, message: &str) -> ValidationIssue {
    ValidationIssue {
        path: if path.is_empty() {
            ".".to_string()
        } else {
            path.to_string()
        },
        message: message.to_string(),
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
