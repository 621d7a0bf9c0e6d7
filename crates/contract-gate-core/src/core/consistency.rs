// crates/contract-gate-core/src/core/consistency.rs
// ============================================================================
// Module: Contract Gate Consistency Validator
// Description: Bidirectional capability/surface consistency checks.
// Purpose: Cross-check capability claims against registered surface specs.
// Dependencies: crate::core::{capability, descriptor, identifiers, registry}, serde
// ============================================================================

//! ## Overview
//! The consistency validator checks the declared capability graph against the
//! registered surfaces in both directions. Findings are structured results,
//! never errors: callers decide whether to treat them as fatal. A registry
//! that was not supplied passes its checks permissively rather than failing
//! closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::capability::CapabilityRegistry;
use crate::core::descriptor::EmittedEvent;
use crate::core::identifiers::CompositeKey;
use crate::core::identifiers::SurfaceKind;
use crate::core::registry::EventRegistry;
use crate::core::registry::OperationRegistry;
use crate::core::registry::PresentationRegistry;
use crate::core::registry::SurfaceRegistry;
use crate::core::registry::SurfaceSpec;

// ============================================================================
// SECTION: Findings
// ============================================================================

/// Kind of consistency finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A spec references a capability that is not registered.
    CapabilityNotFound,
    /// A spec's key is absent from its capability's provides list.
    SurfaceNotInProvides,
    /// A capability provides a surface with no registered spec.
    MissingSurfaceSpec,
    /// An operation declares an emission the scanner could not resolve.
    UnresolvedEmission,
    /// A resolved emission references an event with no registered spec.
    UnknownEmittedEvent,
    /// A capability ancestry walk hit a cycle; checks fell back to the
    /// capability's own declarations.
    AncestryCycle,
}

/// One structured consistency finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyFinding {
    /// Finding kind.
    pub kind: FindingKind,
    /// Capability composite key involved, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    /// Surface kind involved, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<SurfaceKind>,
    /// Spec key involved, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_key: Option<String>,
    /// Human-readable message.
    pub message: String,
}

/// Consistency validation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Whether validation produced zero errors.
    pub valid: bool,
    /// Blocking findings.
    pub errors: Vec<ConsistencyFinding>,
    /// Non-blocking findings.
    pub warnings: Vec<ConsistencyFinding>,
}

/// Specs with no capability back-reference, per registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReport {
    /// Orphan operation composite keys.
    pub operations: Vec<String>,
    /// Orphan event composite keys.
    pub events: Vec<String>,
    /// Orphan presentation composite keys.
    pub presentations: Vec<String>,
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Bidirectional capability/surface consistency validator.
#[derive(Debug)]
pub struct ConsistencyValidator<'a> {
    /// Capability registry under validation.
    capabilities: &'a CapabilityRegistry,
    /// Operation registry, when supplied.
    operations: Option<&'a OperationRegistry>,
    /// Event registry, when supplied.
    events: Option<&'a EventRegistry>,
    /// Presentation registry, when supplied.
    presentations: Option<&'a PresentationRegistry>,
}

impl<'a> ConsistencyValidator<'a> {
    /// Creates a validator over a capability registry.
    #[must_use]
    pub const fn new(capabilities: &'a CapabilityRegistry) -> Self {
        Self {
            capabilities,
            operations: None,
            events: None,
            presentations: None,
        }
    }

    /// Supplies the operation registry.
    #[must_use]
    pub const fn with_operations(mut self, operations: &'a OperationRegistry) -> Self {
        self.operations = Some(operations);
        self
    }

    /// Supplies the event registry.
    #[must_use]
    pub const fn with_events(mut self, events: &'a EventRegistry) -> Self {
        self.events = Some(events);
        self
    }

    /// Supplies the presentation registry.
    #[must_use]
    pub const fn with_presentations(mut self, presentations: &'a PresentationRegistry) -> Self {
        self.presentations = Some(presentations);
        self
    }

    /// Validates capability consistency in both directions.
    #[must_use]
    pub fn validate(&self) -> ConsistencyReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        self.check_forward(&mut errors);
        self.check_reverse(self.operations, &mut errors, &mut warnings);
        self.check_reverse(self.events, &mut errors, &mut warnings);
        self.check_reverse(self.presentations, &mut errors, &mut warnings);
        self.check_emissions(&mut warnings);

        ConsistencyReport {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Forward direction: every provides entry must resolve in the matching
    /// registry. A registry that was not supplied passes permissively.
    fn check_forward(&self, errors: &mut Vec<ConsistencyFinding>) {
        for (composite, spec) in self.capabilities.iter() {
            for surface in &spec.provides {
                let registered = match surface.surface {
                    SurfaceKind::Operation => {
                        self.operations.map(|registry| registry.contains_key(surface.key.as_str()))
                    }
                    SurfaceKind::Event => {
                        self.events.map(|registry| registry.contains_key(surface.key.as_str()))
                    }
                    SurfaceKind::Presentation => self
                        .presentations
                        .map(|registry| registry.contains_key(surface.key.as_str())),
                    SurfaceKind::Workflow | SurfaceKind::Resource => None,
                };
                if registered == Some(false) {
                    errors.push(ConsistencyFinding {
                        kind: FindingKind::MissingSurfaceSpec,
                        capability: Some(composite.to_string()),
                        surface: Some(surface.surface),
                        spec_key: Some(surface.key.to_string()),
                        message: format!(
                            "capability `{composite}` provides {} `{}` but no such spec is registered",
                            surface.surface, surface.key
                        ),
                    });
                }
            }
        }
    }

    /// Reverse direction: every spec back-reference must resolve to a
    /// registered capability whose effective provides contains the spec.
    fn check_reverse<T: SurfaceSpec>(
        &self,
        registry: Option<&SurfaceRegistry<T>>,
        errors: &mut Vec<ConsistencyFinding>,
        warnings: &mut Vec<ConsistencyFinding>,
    ) {
        let Some(registry) = registry else {
            return;
        };

        for spec in registry.iter() {
            let meta = spec.meta();
            let Some(capability_ref) = spec.capability() else {
                continue;
            };
            let capability_composite =
                CompositeKey::new(&capability_ref.key, &capability_ref.version).to_string();

            let Some(capability) = self
                .capabilities
                .get(capability_ref.key.as_str(), Some(capability_ref.version.as_str()))
            else {
                errors.push(ConsistencyFinding {
                    kind: FindingKind::CapabilityNotFound,
                    capability: Some(capability_composite),
                    surface: Some(T::KIND),
                    spec_key: Some(meta.key.to_string()),
                    message: format!(
                        "{} `{}` references capability `{}@{}` which is not registered",
                        T::KIND,
                        meta.key,
                        capability_ref.key,
                        capability_ref.version
                    ),
                });
                continue;
            };

            let provided = match self.capabilities.effective_surfaces(
                capability_ref.key.as_str(),
                Some(capability_ref.version.as_str()),
            ) {
                Ok(surfaces) => surfaces
                    .values()
                    .any(|surface| surface.surface == T::KIND && surface.key == meta.key),
                Err(_) => {
                    warnings.push(ConsistencyFinding {
                        kind: FindingKind::AncestryCycle,
                        capability: Some(capability_composite.clone()),
                        surface: Some(T::KIND),
                        spec_key: Some(meta.key.to_string()),
                        message: format!(
                            "capability `{capability_composite}` has a cyclic ancestry; checked own provides only"
                        ),
                    });
                    capability
                        .provides
                        .iter()
                        .any(|surface| surface.surface == T::KIND && surface.key == meta.key)
                }
            };

            if !provided {
                errors.push(ConsistencyFinding {
                    kind: FindingKind::SurfaceNotInProvides,
                    capability: Some(capability_composite),
                    surface: Some(T::KIND),
                    spec_key: Some(meta.key.to_string()),
                    message: format!(
                        "{} `{}` is not listed in the provides of capability `{}@{}`",
                        T::KIND,
                        meta.key,
                        capability_ref.key,
                        capability_ref.version
                    ),
                });
            }
        }
    }

    /// Emission hygiene: unresolved declarations and resolved declarations
    /// pointing at unregistered events are reported as warnings.
    fn check_emissions(&self, warnings: &mut Vec<ConsistencyFinding>) {
        let Some(operations) = self.operations else {
            return;
        };

        for operation in operations.iter() {
            for emit in &operation.side_effects.emits {
                match emit {
                    EmittedEvent::Unresolved { hint } => warnings.push(ConsistencyFinding {
                        kind: FindingKind::UnresolvedEmission,
                        capability: None,
                        surface: Some(SurfaceKind::Operation),
                        spec_key: Some(operation.meta.key.to_string()),
                        message: match hint {
                            Some(hint) => format!(
                                "operation `{}` declares an unresolved emission ({hint})",
                                operation.meta.key
                            ),
                            None => format!(
                                "operation `{}` declares an unresolved emission",
                                operation.meta.key
                            ),
                        },
                    }),
                    EmittedEvent::Resolved { key, version } => {
                        let known = self
                            .events
                            .is_none_or(|events| events.get(key.as_str(), version.as_str()).is_some());
                        if !known {
                            warnings.push(ConsistencyFinding {
                                kind: FindingKind::UnknownEmittedEvent,
                                capability: None,
                                surface: Some(SurfaceKind::Event),
                                spec_key: Some(key.to_string()),
                                message: format!(
                                    "operation `{}` emits `{key}@{version}` which is not registered",
                                    operation.meta.key
                                ),
                            });
                        }
                    }
                }
            }
        }
    }

    /// Enumerates specs with no capability back-reference, for reporting only.
    #[must_use]
    pub fn find_orphan_specs(&self) -> OrphanReport {
        OrphanReport {
            operations: orphan_keys(self.operations),
            events: orphan_keys(self.events),
            presentations: orphan_keys(self.presentations),
        }
    }
}

/// Collects composite keys of specs lacking a capability back-reference.
fn orphan_keys<T: SurfaceSpec>(registry: Option<&SurfaceRegistry<T>>) -> Vec<String> {
    let Some(registry) = registry else {
        return Vec::new();
    };
    registry
        .iter()
        .filter(|spec| spec.capability().is_none())
        .map(|spec| CompositeKey::new(&spec.meta().key, &spec.meta().version).to_string())
        .collect()
}
