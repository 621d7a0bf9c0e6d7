// crates/contract-gate-core/src/core/capability.rs
// ============================================================================
// Module: Contract Gate Capability Registry
// Description: Versioned capability store with inheritance and surface index.
// Purpose: Resolve capability versions, ancestor chains, and effective contracts.
// Dependencies: crate::core::{descriptor, identifiers}, thiserror
// ============================================================================

//! ## Overview
//! The capability registry stores immutable capability specs keyed by
//! `{key}.v{version}`. "Latest" resolution uses genuine semantic-version
//! ordering. Inheritance chains are resolved through `extends` references;
//! effective requirements and surfaces merge the ancestor chain from root to
//! immediate parent, with the capability's own declarations overlaid last.
//!
//! The surface reverse index is a cached derived view: every registration
//! invalidates it whole and the next query rebuilds it whole. It is never
//! patched incrementally. Queries therefore take `&mut self`; concurrent
//! register and query requires external synchronization.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::descriptor::CapabilityRequirement;
use crate::core::descriptor::CapabilitySpec;
use crate::core::descriptor::SurfaceRef;
use crate::core::identifiers::CompositeKey;
use crate::core::identifiers::SurfaceKind;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the capability registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// A capability with the same key and version is already registered.
    #[error("duplicate capability registration: {0}")]
    DuplicateRegistration(String),
    /// The ancestry walk revisited a capability already on the chain.
    #[error("capability ancestry cycle detected at {0}")]
    CycleDetected(String),
}

// ============================================================================
// SECTION: Capability Registry
// ============================================================================

/// Surface reverse index key in the stable form `{surface}:{key}`.
fn surface_index_key(surface: SurfaceKind, key: &str) -> String {
    format!("{surface}:{key}")
}

/// Versioned capability registry.
///
/// # Invariants
/// - Entries are created once at registration and immutable thereafter.
/// - `surface_index` is `None` whenever a registration occurred since the
///   last rebuild; it is rebuilt whole on the next surface query.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    /// Capability specs keyed by composite key.
    entries: BTreeMap<String, CapabilitySpec>,
    /// Cached reverse index from `{surface}:{key}` to capability composite keys.
    surface_index: Option<BTreeMap<String, BTreeSet<String>>>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability spec.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::DuplicateRegistration`] when a spec with
    /// the same key and version is already registered.
    pub fn register(&mut self, spec: CapabilitySpec) -> Result<(), CapabilityError> {
        let composite = CompositeKey::new(&spec.meta.key, &spec.meta.version);
        if self.entries.contains_key(composite.as_str()) {
            return Err(CapabilityError::DuplicateRegistration(composite.to_string()));
        }
        self.entries.insert(composite.to_string(), spec);
        self.surface_index = None;
        Ok(())
    }

    /// Returns a capability by key, exact version or latest.
    ///
    /// With a version, this is an exact composite lookup. Without one, every
    /// registered version of the key is compared under semantic-version
    /// ordering and the greatest wins.
    #[must_use]
    pub fn get(&self, key: &str, version: Option<&str>) -> Option<&CapabilitySpec> {
        if let Some(version) = version {
            return self.entries.get(CompositeKey::from_parts(key, version).as_str());
        }
        self.entries
            .values()
            .filter(|spec| spec.meta.key.as_str() == key)
            .max_by(|lhs, rhs| lhs.meta.version.cmp(&rhs.meta.version))
    }

    /// Returns the registered capabilities in deterministic composite-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapabilitySpec)> {
        self.entries.iter().map(|(composite, spec)| (composite.as_str(), spec))
    }

    /// Returns the number of registered capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// SECTION: Inheritance Resolution
// ============================================================================

impl CapabilityRegistry {
    /// Returns the ancestor chain of a capability, nearest parent first.
    ///
    /// The walk follows `extends` references until a parent is missing from
    /// the registry (the chain simply ends there).
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::CycleDetected`] when an ancestor already on
    /// the chain would be revisited.
    pub fn ancestors(
        &self,
        key: &str,
        version: Option<&str>,
    ) -> Result<Vec<&CapabilitySpec>, CapabilityError> {
        let mut chain = Vec::new();
        let Some(start) = self.get(key, version) else {
            return Ok(chain);
        };

        let mut seen = BTreeSet::new();
        seen.insert(CompositeKey::new(&start.meta.key, &start.meta.version).to_string());

        let mut current = start;
        while let Some(parent_ref) = &current.extends {
            let parent_composite =
                CompositeKey::new(&parent_ref.key, &parent_ref.version).to_string();
            if !seen.insert(parent_composite.clone()) {
                return Err(CapabilityError::CycleDetected(parent_composite));
            }
            let Some(parent) =
                self.get(parent_ref.key.as_str(), Some(parent_ref.version.as_str()))
            else {
                break;
            };
            chain.push(parent);
            current = parent;
        }

        Ok(chain)
    }

    /// Returns effective requirements, keyed by required capability key.
    ///
    /// The ancestor chain is merged from root to immediate parent, then the
    /// capability's own requirements are overlaid last, so a child's
    /// declaration always wins over an inherited one with the same key.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::CycleDetected`] when the ancestry contains
    /// a cycle.
    pub fn effective_requirements(
        &self,
        key: &str,
        version: Option<&str>,
    ) -> Result<BTreeMap<String, CapabilityRequirement>, CapabilityError> {
        let mut merged = BTreeMap::new();
        let Some(spec) = self.get(key, version) else {
            return Ok(merged);
        };
        let chain = self.ancestors(key, version)?;

        for ancestor in chain.iter().rev() {
            for requirement in &ancestor.requires {
                merged.insert(requirement.key.to_string(), requirement.clone());
            }
        }
        for requirement in &spec.requires {
            merged.insert(requirement.key.to_string(), requirement.clone());
        }
        Ok(merged)
    }

    /// Returns effective provided surfaces, keyed by `{surface}:{key}`.
    ///
    /// Merge order matches [`Self::effective_requirements`].
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::CycleDetected`] when the ancestry contains
    /// a cycle.
    pub fn effective_surfaces(
        &self,
        key: &str,
        version: Option<&str>,
    ) -> Result<BTreeMap<String, SurfaceRef>, CapabilityError> {
        let mut merged = BTreeMap::new();
        let Some(spec) = self.get(key, version) else {
            return Ok(merged);
        };
        let chain = self.ancestors(key, version)?;

        for ancestor in chain.iter().rev() {
            for surface in &ancestor.provides {
                merged.insert(
                    surface_index_key(surface.surface, surface.key.as_str()),
                    surface.clone(),
                );
            }
        }
        for surface in &spec.provides {
            merged
                .insert(surface_index_key(surface.surface, surface.key.as_str()), surface.clone());
        }
        Ok(merged)
    }
}

// ============================================================================
// SECTION: Surface Reverse Index
// ============================================================================

impl CapabilityRegistry {
    /// Returns the composite keys of capabilities providing a surface.
    ///
    /// The cached reverse index is rebuilt whole on the first query after any
    /// registration. The query takes `&mut self`; concurrent register and
    /// query requires external synchronization.
    pub fn capabilities_for_surface(
        &mut self,
        surface: SurfaceKind,
        key: &str,
    ) -> Vec<String> {
        let index = self.surface_index.get_or_insert_with(|| build_surface_index(&self.entries));
        index
            .get(&surface_index_key(surface, key))
            .map(|composites| composites.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Rebuilds the surface reverse index from every capability's own provides.
fn build_surface_index(
    entries: &BTreeMap<String, CapabilitySpec>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (composite, spec) in entries {
        for surface in &spec.provides {
            index
                .entry(surface_index_key(surface.surface, surface.key.as_str()))
                .or_default()
                .insert(composite.clone());
        }
    }
    index
}
