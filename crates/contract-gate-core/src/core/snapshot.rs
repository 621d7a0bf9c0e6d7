// crates/contract-gate-core/src/core/snapshot.rs
// ============================================================================
// Module: Contract Gate Snapshot Normalizer
// Description: Canonical ordering and hashing of spec descriptor corpora.
// Purpose: Produce deterministic, diffable contract snapshot artifacts.
// Dependencies: crate::core::{descriptor, hashing, identifiers}, serde, time
// ============================================================================

//! ## Overview
//! The snapshot normalizer sorts a corpus of spec descriptors into a total,
//! stable order, canonicalizes every nested field map, and computes a content
//! hash over the sorted specs. Semantically identical corpora yield identical
//! hashes regardless of scan order. The hash covers only the specs; the
//! `generated_at` and `commit_sha` envelope fields never influence it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::descriptor::EmittedEvent;
use crate::core::descriptor::FieldMap;
use crate::core::descriptor::FieldSnapshot;
use crate::core::descriptor::OutputShape;
use crate::core::descriptor::SpecDescriptor;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;

// ============================================================================
// SECTION: Snapshot Artifact
// ============================================================================

/// Format version written into every snapshot artifact.
pub const SNAPSHOT_FORMAT_VERSION: &str = "1.0.0";

/// Durable, diffable snapshot of a contract corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSnapshot {
    /// Snapshot format version.
    pub version: String,
    /// Generation timestamp (RFC 3339), supplied by the host.
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    /// Commit the corpus was scanned at, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    /// Normalized specs in canonical order.
    pub specs: Vec<SpecDescriptor>,
    /// Content hash over the canonical spec list.
    pub hash: HashDigest,
}

impl ContractSnapshot {
    /// Re-verifies the stored content hash against the stored specs.
    ///
    /// Returns `false` when the specs no longer match the digest recorded at
    /// generation time.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when canonical serialization fails.
    pub fn verify_hash(&self) -> Result<bool, SnapshotError> {
        Ok(self.hash.verifies(&self.specs)?)
    }
}

/// Host-supplied envelope values for snapshot generation.
///
/// # Invariants
/// - The core never reads wall-clock time; `generated_at` is always provided
///   by the caller so snapshot generation stays replayable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Generation timestamp recorded in the artifact envelope.
    pub generated_at: OffsetDateTime,
    /// Commit the corpus was scanned at.
    pub commit_sha: Option<String>,
    /// Hash algorithm for the content digest.
    pub hash_algorithm: HashAlgorithm,
}

impl SnapshotOptions {
    /// Creates options with the default hash algorithm.
    #[must_use]
    pub const fn new(generated_at: OffsetDateTime) -> Self {
        Self {
            generated_at,
            commit_sha: None,
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
        }
    }

    /// Sets the commit the corpus was scanned at.
    #[must_use]
    pub fn with_commit_sha(mut self, commit_sha: impl Into<String>) -> Self {
        self.commit_sha = Some(commit_sha.into());
        self
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised during snapshot generation.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Canonical serialization of the sorted corpus failed.
    #[error("snapshot canonicalization failed: {0}")]
    Canonicalization(#[from] HashError),
}

// ============================================================================
// SECTION: Snapshot Builder
// ============================================================================

/// Builds a canonical snapshot from a corpus of spec descriptors.
///
/// Input order is irrelevant: specs are normalized and sorted by
/// `(key, spec_type, version)` before hashing.
///
/// # Errors
///
/// Returns [`SnapshotError`] when canonical serialization fails.
pub fn build_snapshot(
    specs: Vec<SpecDescriptor>,
    options: &SnapshotOptions,
) -> Result<ContractSnapshot, SnapshotError> {
    let mut normalized: Vec<SpecDescriptor> = specs.into_iter().map(normalize_descriptor).collect();
    normalized.sort_by(compare_descriptors);

    let hash = HashDigest::of_canonical_json(options.hash_algorithm, &normalized)?;

    Ok(ContractSnapshot {
        version: SNAPSHOT_FORMAT_VERSION.to_string(),
        generated_at: options.generated_at,
        commit_sha: options.commit_sha.clone(),
        specs: normalized,
        hash,
    })
}

/// Total, stable descriptor ordering: key, then spec type, then version.
fn compare_descriptors(lhs: &SpecDescriptor, rhs: &SpecDescriptor) -> Ordering {
    lhs.key()
        .cmp(rhs.key())
        .then_with(|| lhs.spec_type().cmp(rhs.spec_type()))
        .then_with(|| lhs.version().cmp(rhs.version()))
}

// ============================================================================
// SECTION: Descriptor Normalization
// ============================================================================

/// Normalizes a descriptor into its canonical form.
#[must_use]
pub fn normalize_descriptor(spec: SpecDescriptor) -> SpecDescriptor {
    match spec {
        SpecDescriptor::Operation(mut op) => {
            normalize_meta_vectors(&mut op.meta.owners, &mut op.meta.tags);
            normalize_field_map(&mut op.io.input);
            if let OutputShape::Fields { fields } = &mut op.io.output {
                normalize_field_map(fields);
            }
            op.side_effects.emits.sort_by(compare_emits);
            SpecDescriptor::Operation(op)
        }
        SpecDescriptor::Event(mut event) => {
            normalize_meta_vectors(&mut event.meta.owners, &mut event.meta.tags);
            normalize_field_map(&mut event.payload);
            SpecDescriptor::Event(event)
        }
        SpecDescriptor::Presentation(mut presentation) => {
            normalize_meta_vectors(&mut presentation.meta.owners, &mut presentation.meta.tags);
            SpecDescriptor::Presentation(presentation)
        }
        SpecDescriptor::Capability(mut capability) => {
            normalize_meta_vectors(&mut capability.meta.owners, &mut capability.meta.tags);
            capability.provides.sort_by(|lhs, rhs| {
                lhs.surface
                    .cmp(&rhs.surface)
                    .then_with(|| lhs.key.cmp(&rhs.key))
                    .then_with(|| lhs.version.cmp(&rhs.version))
            });
            capability.requires.sort_by(|lhs, rhs| {
                lhs.key.cmp(&rhs.key).then_with(|| lhs.version.cmp(&rhs.version))
            });
            SpecDescriptor::Capability(capability)
        }
    }
}

/// Sorts shared metadata vectors deterministically.
fn normalize_meta_vectors(owners: &mut [String], tags: &mut [String]) {
    owners.sort();
    tags.sort();
}

/// Deterministic ordering for emitted-event declarations.
///
/// Resolved entries sort by key then version; unresolved entries sort last by
/// hint so dynamic references never interleave with resolved ones.
fn compare_emits(lhs: &EmittedEvent, rhs: &EmittedEvent) -> Ordering {
    match (lhs, rhs) {
        (
            EmittedEvent::Resolved {
                key: lhs_key,
                version: lhs_version,
            },
            EmittedEvent::Resolved {
                key: rhs_key,
                version: rhs_version,
            },
        ) => lhs_key.cmp(rhs_key).then_with(|| lhs_version.cmp(rhs_version)),
        (EmittedEvent::Resolved { .. }, EmittedEvent::Unresolved { .. }) => Ordering::Less,
        (EmittedEvent::Unresolved { .. }, EmittedEvent::Resolved { .. }) => Ordering::Greater,
        (
            EmittedEvent::Unresolved { hint: lhs_hint },
            EmittedEvent::Unresolved { hint: rhs_hint },
        ) => lhs_hint.cmp(rhs_hint),
    }
}

/// Recursively normalizes a field map and its nested shapes.
fn normalize_field_map(fields: &mut FieldMap) {
    for field in fields.values_mut() {
        normalize_field(field);
    }
}

/// Normalizes a single field snapshot.
fn normalize_field(field: &mut FieldSnapshot) {
    if let Some(values) = &mut field.enum_values {
        values.sort();
    }
    if let Some(items) = &mut field.items {
        normalize_field(items);
    }
    if let Some(properties) = &mut field.properties {
        normalize_field_map(properties);
    }
    if let Some(union_types) = &mut field.union_types {
        for member in union_types.iter_mut() {
            normalize_field(member);
        }
        union_types.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
    }
}
