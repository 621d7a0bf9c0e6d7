// crates/contract-gate-core/src/core/registry.rs
// ============================================================================
// Module: Contract Gate Surface Registries
// Description: Typed registries for operation, event, and presentation specs.
// Purpose: Provide constructed-once, read-mostly spec lookup contexts.
// Dependencies: crate::core::{descriptor, identifiers}, thiserror
// ============================================================================

//! ## Overview
//! Surface registries are explicit context objects constructed during a
//! single-threaded initialization phase and passed into the functions that
//! need them. No internal locking is provided; concurrent registration must
//! be externally serialized.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::descriptor::CapabilityRef;
use crate::core::descriptor::EventSpec;
use crate::core::descriptor::OperationSpec;
use crate::core::descriptor::PresentationSpec;
use crate::core::descriptor::SpecMeta;
use crate::core::identifiers::CompositeKey;
use crate::core::identifiers::SurfaceKind;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by surface registries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A spec with the same key and version is already registered.
    #[error("duplicate spec registration: {0}")]
    DuplicateRegistration(String),
    /// No spec exists for the requested key and version.
    #[error("spec not found: {0}")]
    SpecNotFound(String),
}

// ============================================================================
// SECTION: Surface Spec Trait
// ============================================================================

/// Spec types storable in a surface registry.
pub trait SurfaceSpec {
    /// Surface kind of the spec type.
    const KIND: SurfaceKind;

    /// Returns the shared spec metadata.
    fn meta(&self) -> &SpecMeta;

    /// Returns the capability back-reference, when present.
    fn capability(&self) -> Option<&CapabilityRef>;
}

impl SurfaceSpec for OperationSpec {
    const KIND: SurfaceKind = SurfaceKind::Operation;

    fn meta(&self) -> &SpecMeta {
        &self.meta
    }

    fn capability(&self) -> Option<&CapabilityRef> {
        self.capability.as_ref()
    }
}

impl SurfaceSpec for EventSpec {
    const KIND: SurfaceKind = SurfaceKind::Event;

    fn meta(&self) -> &SpecMeta {
        &self.meta
    }

    fn capability(&self) -> Option<&CapabilityRef> {
        self.capability.as_ref()
    }
}

impl SurfaceSpec for PresentationSpec {
    const KIND: SurfaceKind = SurfaceKind::Presentation;

    fn meta(&self) -> &SpecMeta {
        &self.meta
    }

    fn capability(&self) -> Option<&CapabilityRef> {
        self.capability.as_ref()
    }
}

// ============================================================================
// SECTION: Surface Registry
// ============================================================================

/// Typed, read-mostly registry keyed by `{key}.v{version}`.
#[derive(Debug, Clone)]
pub struct SurfaceRegistry<T: SurfaceSpec> {
    /// Specs keyed by composite key.
    entries: BTreeMap<String, T>,
}

impl<T: SurfaceSpec> Default for SurfaceRegistry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: SurfaceSpec> SurfaceRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a spec.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRegistration`] when a spec with the
    /// same key and version is already registered.
    pub fn register(&mut self, spec: T) -> Result<(), RegistryError> {
        let meta = spec.meta();
        let composite = CompositeKey::new(&meta.key, &meta.version);
        if self.entries.contains_key(composite.as_str()) {
            return Err(RegistryError::DuplicateRegistration(composite.to_string()));
        }
        self.entries.insert(composite.to_string(), spec);
        Ok(())
    }

    /// Returns the spec for an exact key and version.
    #[must_use]
    pub fn get(&self, key: &str, version: &str) -> Option<&T> {
        self.entries.get(CompositeKey::from_parts(key, version).as_str())
    }

    /// Returns the spec for an exact key and version, or an error.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SpecNotFound`] when no spec matches.
    pub fn require(&self, key: &str, version: &str) -> Result<&T, RegistryError> {
        self.get(key, version)
            .ok_or_else(|| RegistryError::SpecNotFound(CompositeKey::from_parts(key, version).to_string()))
    }

    /// Returns the latest registered version of a key under semantic-version
    /// ordering.
    #[must_use]
    pub fn latest(&self, key: &str) -> Option<&T> {
        self.entries
            .values()
            .filter(|spec| spec.meta().key.as_str() == key)
            .max_by(|lhs, rhs| lhs.meta().version.cmp(&rhs.meta().version))
    }

    /// Whether any version of a key is registered.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.values().any(|spec| spec.meta().key.as_str() == key)
    }

    /// Returns the registered specs in deterministic composite-key order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Returns the number of registered specs.
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
// SECTION: Registry Aliases
// ============================================================================

/// Registry of operation specs.
pub type OperationRegistry = SurfaceRegistry<OperationSpec>;
/// Registry of event specs.
pub type EventRegistry = SurfaceRegistry<EventSpec>;
/// Registry of presentation specs.
pub type PresentationRegistry = SurfaceRegistry<PresentationSpec>;
