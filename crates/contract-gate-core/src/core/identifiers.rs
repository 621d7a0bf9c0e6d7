// crates/contract-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Contract Gate Identifiers
// Description: Canonical identifiers for specs, versions, and surfaces.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: semver, serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Contract
//! Gate. Spec keys are opaque strings; versions carry a semver string and
//! compare under genuine semantic-version ordering rather than lexicographic
//! ordering, so `2.0.0` sorts below `10.0.0`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;

use semver::Version;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Spec Key
// ============================================================================

/// Spec key, globally unique per spec type.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecKey(String);

impl SpecKey {
    /// Creates a new spec key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Spec Version
// ============================================================================

/// Spec version carried as a semver string.
///
/// # Invariants
/// - The wire form is the raw string as extracted by the scanner.
/// - Ordering is semantic-version ordering; unparseable versions sort below
///   every parseable version and tie-break lexicographically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecVersion(String);

impl SpecVersion {
    /// Creates a new spec version.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Returns the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the version as semver, when well formed.
    #[must_use]
    pub fn parsed(&self) -> Option<Version> {
        Version::parse(&self.0).ok()
    }
}

impl Ord for SpecVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.parsed(), other.parsed()) {
            (Some(lhs), Some(rhs)) => lhs.cmp(&rhs).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SpecVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Composite Key
// ============================================================================

/// Composite registry key in the stable form `{key}.v{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(String);

impl CompositeKey {
    /// Builds the composite key for a spec key and version.
    #[must_use]
    pub fn new(key: &SpecKey, version: &SpecVersion) -> Self {
        Self(format!("{key}.v{version}"))
    }

    /// Builds the composite key from raw string parts.
    #[must_use]
    pub fn from_parts(key: &str, version: &str) -> Self {
        Self(format!("{key}.v{version}"))
    }

    /// Returns the composite key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Surface Kind
// ============================================================================

/// Externally addressable spec kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Callable operation surface.
    Operation,
    /// Published event surface.
    Event,
    /// UI presentation surface.
    Presentation,
    /// Workflow surface.
    Workflow,
    /// Resource surface.
    Resource,
}

impl SurfaceKind {
    /// Returns a stable label for the surface kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Operation => "operation",
            Self::Event => "event",
            Self::Presentation => "presentation",
            Self::Workflow => "workflow",
            Self::Resource => "resource",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Stability
// ============================================================================

/// Stability classification for a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    /// Contract may change without notice.
    Experimental,
    /// Contract is stabilizing; breaking changes are still possible.
    Beta,
    /// Contract is stable and governed by impact rules.
    Stable,
    /// Contract is scheduled for removal.
    Deprecated,
}

impl Stability {
    /// Returns a stable label for the stability level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Experimental => "experimental",
            Self::Beta => "beta",
            Self::Stable => "stable",
            Self::Deprecated => "deprecated",
        }
    }
}
