// crates/contract-gate-core/src/core/impact.rs
// ============================================================================
// Module: Contract Gate Impact Classifier
// Description: Ordered rule table turning diffs into a governance verdict.
// Purpose: Aggregate deltas and spec additions/removals into an impact report.
// Dependencies: crate::core::{descriptor, diff, identifiers}, serde, time
// ============================================================================

//! ## Overview
//! The impact classifier applies an ordered rule table to diff items plus the
//! sets of added and removed specs. Breaking rules are tried first, then
//! non-breaking, then informational; the first matching rule determines the
//! delta's severity and rule id. Unmatched diffs are dropped, never silently
//! escalated. Custom rules are tried before the defaults so hosts can
//! override classification without forking the engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::descriptor::SpecDescriptor;
use crate::core::diff::DiffKind;
use crate::core::diff::FieldDiff;
use crate::core::diff::diff_specs;
use crate::core::identifiers::SpecKey;
use crate::core::identifiers::SpecVersion;

// ============================================================================
// SECTION: Severity & Status
// ============================================================================

/// Severity assigned to a classified delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Previously-valid callers can fail.
    Breaking,
    /// Contract changed without breaking callers.
    NonBreaking,
    /// Metadata-only change.
    Info,
}

/// Aggregate impact status for a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImpactStatus {
    /// At least one breaking delta or spec removal.
    Breaking,
    /// No breaking deltas, at least one non-breaking delta or addition.
    NonBreaking,
    /// No governance-relevant change.
    NoImpact,
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Predicate selecting the diffs a rule applies to.
///
/// # Invariants
/// - An empty kind list matches every kind; string predicates are substring
///   matches against the delta path and description.
#[derive(Debug, Clone, Default)]
pub struct RulePredicate {
    /// Diff kinds the rule applies to; empty matches all kinds.
    pub kinds: Vec<DiffKind>,
    /// Required substring of the delta path.
    pub path_contains: Option<String>,
    /// Required substring of the delta description.
    pub description_contains: Option<String>,
}

impl RulePredicate {
    /// Predicate matching a set of diff kinds.
    #[must_use]
    pub fn kinds(kinds: &[DiffKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            ..Self::default()
        }
    }

    /// Whether the predicate matches a diff item.
    #[must_use]
    pub fn matches(&self, diff: &FieldDiff) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&diff.kind) {
            return false;
        }
        if let Some(needle) = &self.path_contains
            && !diff.path.contains(needle.as_str())
        {
            return false;
        }
        if let Some(needle) = &self.description_contains
            && !diff.description.contains(needle.as_str())
        {
            return false;
        }
        true
    }
}

/// One classification rule in the ordered table.
#[derive(Debug, Clone)]
pub struct ImpactRule {
    /// Stable rule identifier recorded on matched deltas.
    pub id: String,
    /// Severity assigned to matched deltas.
    pub severity: Severity,
    /// Predicate selecting applicable diffs.
    pub predicate: RulePredicate,
}

impl ImpactRule {
    /// Creates a rule with the given id, severity, and predicate.
    #[must_use]
    pub fn new(id: impl Into<String>, severity: Severity, predicate: RulePredicate) -> Self {
        Self {
            id: id.into(),
            severity,
            predicate,
        }
    }
}

/// Rule id assigned to removed specs.
pub const RULE_ENDPOINT_REMOVED: &str = "endpoint-removed";
/// Rule id assigned to added specs.
pub const RULE_ENDPOINT_ADDED: &str = "endpoint-added";

/// Default ordered rule table: breaking, then non-breaking, then informational.
#[must_use]
pub fn default_rules() -> Vec<ImpactRule> {
    vec![
        ImpactRule::new(
            "field-removed",
            Severity::Breaking,
            RulePredicate::kinds(&[DiffKind::Removed]),
        ),
        ImpactRule::new(
            "type-changed",
            Severity::Breaking,
            RulePredicate::kinds(&[DiffKind::TypeChanged, DiffKind::LiteralChanged]),
        ),
        ImpactRule::new(
            "required-field-added",
            Severity::Breaking,
            RulePredicate::kinds(&[DiffKind::AddedRequired]),
        ),
        ImpactRule::new(
            "field-became-required",
            Severity::Breaking,
            RulePredicate::kinds(&[DiffKind::RequiredTightened]),
        ),
        ImpactRule::new(
            "nullability-removed",
            Severity::Breaking,
            RulePredicate::kinds(&[DiffKind::NullableNarrowed]),
        ),
        ImpactRule::new(
            "enum-value-removed",
            Severity::Breaking,
            RulePredicate::kinds(&[DiffKind::EnumValueRemoved]),
        ),
        ImpactRule::new(
            "http-binding-changed",
            Severity::Breaking,
            RulePredicate::kinds(&[DiffKind::HttpBindingChanged]),
        ),
        ImpactRule::new(
            "optional-field-added",
            Severity::NonBreaking,
            RulePredicate::kinds(&[DiffKind::AddedOptional]),
        ),
        ImpactRule::new(
            "field-became-optional",
            Severity::NonBreaking,
            RulePredicate::kinds(&[DiffKind::RequiredRelaxed]),
        ),
        ImpactRule::new(
            "nullability-added",
            Severity::NonBreaking,
            RulePredicate::kinds(&[DiffKind::NullableWidened]),
        ),
        ImpactRule::new(
            "enum-value-added",
            Severity::NonBreaking,
            RulePredicate::kinds(&[DiffKind::EnumValueAdded]),
        ),
        ImpactRule::new(
            "stability-changed",
            Severity::Info,
            RulePredicate::kinds(&[DiffKind::StabilityChanged]),
        ),
        ImpactRule::new(
            "docs-changed",
            Severity::Info,
            RulePredicate::kinds(&[DiffKind::DescriptionChanged]),
        ),
        ImpactRule::new(
            "ownership-changed",
            Severity::Info,
            RulePredicate::kinds(&[DiffKind::OwnersChanged, DiffKind::TagsChanged]),
        ),
        ImpactRule::new(
            "auth-level-changed",
            Severity::Info,
            RulePredicate::kinds(&[DiffKind::AuthLevelChanged]),
        ),
    ]
}

// ============================================================================
// SECTION: Impact Report Types
// ============================================================================

/// Reference to a spec within an impact report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRef {
    /// Spec key.
    pub key: SpecKey,
    /// Spec version.
    pub version: SpecVersion,
    /// Spec type label.
    pub spec_type: String,
}

impl SpecRef {
    /// Builds a reference to the given descriptor.
    #[must_use]
    pub fn of(spec: &SpecDescriptor) -> Self {
        Self {
            key: spec.key().clone(),
            version: spec.version().clone(),
            spec_type: spec.spec_type().to_string(),
        }
    }
}

/// One classified difference between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactDelta {
    /// Key of the affected spec.
    pub spec_key: SpecKey,
    /// Version of the affected spec.
    pub spec_version: SpecVersion,
    /// Type label of the affected spec.
    pub spec_type: String,
    /// Dotted path of the change.
    pub path: String,
    /// Severity derived solely from the matching rule.
    pub severity: Severity,
    /// Identifier of the matching rule.
    pub rule: String,
    /// Human-readable description.
    pub description: String,
    /// Base-side value, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    /// Head-side value, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// Summary counts for an impact report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImpactSummary {
    /// Breaking delta count.
    pub breaking: usize,
    /// Non-breaking delta count.
    pub non_breaking: usize,
    /// Informational delta count.
    pub info: usize,
    /// Added spec count.
    pub added: usize,
    /// Removed spec count.
    pub removed: usize,
}

/// JSON-serializable impact report consumed by CI gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    /// Aggregate status.
    pub status: ImpactStatus,
    /// Whether any breaking delta or removal exists.
    pub has_breaking: bool,
    /// Whether any non-breaking delta or addition exists.
    pub has_non_breaking: bool,
    /// Summary counts.
    pub summary: ImpactSummary,
    /// Classified deltas.
    pub deltas: Vec<ImpactDelta>,
    /// Specs added in head.
    pub added_specs: Vec<SpecRef>,
    /// Specs removed from head.
    pub removed_specs: Vec<SpecRef>,
    /// Base corpus reference (for example a git ref).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_ref: Option<String>,
    /// Head corpus reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_ref: Option<String>,
    /// Classification timestamp (RFC 3339), supplied by the host.
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<OffsetDateTime>,
}

/// Diff items computed for one spec present in both corpora.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDiffSet {
    /// Spec the diffs belong to.
    pub spec: SpecRef,
    /// Diff items for the spec.
    pub items: Vec<FieldDiff>,
}

/// Envelope values recorded on the impact report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Base corpus reference.
    pub base_ref: Option<String>,
    /// Head corpus reference.
    pub head_ref: Option<String>,
    /// Classification timestamp.
    pub timestamp: Option<OffsetDateTime>,
}

// ============================================================================
// SECTION: Classifier
// ============================================================================

/// Impact classifier over an ordered, extensible rule table.
#[derive(Debug, Clone)]
pub struct ImpactClassifier {
    /// Custom rules tried before the defaults.
    custom_rules: Vec<ImpactRule>,
    /// Default rule table.
    default_rules: Vec<ImpactRule>,
}

impl Default for ImpactClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ImpactClassifier {
    /// Creates a classifier with the default rule table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            custom_rules: Vec::new(),
            default_rules: default_rules(),
        }
    }

    /// Adds custom rules tried before the defaults, enabling override
    /// without forking the engine.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<ImpactRule>) -> Self {
        self.custom_rules = rules;
        self
    }

    /// Classifies precomputed diffs plus base/head spec sets.
    #[must_use]
    pub fn classify(
        &self,
        base: &[SpecDescriptor],
        head: &[SpecDescriptor],
        diffs: &[SpecDiffSet],
        options: &ClassifyOptions,
    ) -> ImpactResult {
        let mut deltas = Vec::new();
        let mut removed_specs = Vec::new();
        let mut added_specs = Vec::new();

        for spec in base {
            if !contains_spec(head, spec) {
                removed_specs.push(SpecRef::of(spec));
                deltas.push(ImpactDelta {
                    spec_key: spec.key().clone(),
                    spec_version: spec.version().clone(),
                    spec_type: spec.spec_type().to_string(),
                    path: String::new(),
                    severity: Severity::Breaking,
                    rule: RULE_ENDPOINT_REMOVED.to_string(),
                    description: format!("{} `{}` was removed", spec.spec_type(), spec.key()),
                    old_value: None,
                    new_value: None,
                });
            }
        }

        for spec in head {
            if !contains_spec(base, spec) {
                added_specs.push(SpecRef::of(spec));
                deltas.push(ImpactDelta {
                    spec_key: spec.key().clone(),
                    spec_version: spec.version().clone(),
                    spec_type: spec.spec_type().to_string(),
                    path: String::new(),
                    severity: Severity::NonBreaking,
                    rule: RULE_ENDPOINT_ADDED.to_string(),
                    description: format!("{} `{}` was added", spec.spec_type(), spec.key()),
                    old_value: None,
                    new_value: None,
                });
            }
        }

        for diff_set in diffs {
            for item in &diff_set.items {
                if let Some(rule) = self.match_rule(item) {
                    deltas.push(ImpactDelta {
                        spec_key: diff_set.spec.key.clone(),
                        spec_version: diff_set.spec.version.clone(),
                        spec_type: diff_set.spec.spec_type.clone(),
                        path: item.path.clone(),
                        severity: rule.severity,
                        rule: rule.id.clone(),
                        description: item.description.clone(),
                        old_value: item.old_value.clone(),
                        new_value: item.new_value.clone(),
                    });
                }
            }
        }

        build_result(deltas, added_specs, removed_specs, options)
    }

    /// Diffs matching specs between two corpora and classifies the result.
    ///
    /// Specs are matched by `(spec_type, key)`; version changes surface as
    /// field and metadata diffs rather than removal/addition pairs.
    #[must_use]
    pub fn classify_corpora(
        &self,
        base: &[SpecDescriptor],
        head: &[SpecDescriptor],
        options: &ClassifyOptions,
    ) -> ImpactResult {
        let mut diff_sets = Vec::new();
        for base_spec in base {
            let Some(head_spec) = find_spec(head, base_spec) else {
                continue;
            };
            let items = diff_specs(base_spec, head_spec);
            if !items.is_empty() {
                diff_sets.push(SpecDiffSet {
                    spec: SpecRef::of(head_spec),
                    items,
                });
            }
        }
        self.classify(base, head, &diff_sets, options)
    }

    /// Finds the first matching rule for a diff item: custom rules first,
    /// then defaults, first match wins.
    fn match_rule(&self, diff: &FieldDiff) -> Option<&ImpactRule> {
        self.custom_rules
            .iter()
            .chain(self.default_rules.iter())
            .find(|rule| rule.predicate.matches(diff))
    }
}

/// Whether a corpus contains a spec with the same type and key.
fn contains_spec(corpus: &[SpecDescriptor], spec: &SpecDescriptor) -> bool {
    find_spec(corpus, spec).is_some()
}

/// Finds the corpus entry matching a spec's type and key.
fn find_spec<'a>(corpus: &'a [SpecDescriptor], spec: &SpecDescriptor) -> Option<&'a SpecDescriptor> {
    corpus
        .iter()
        .find(|candidate| candidate.spec_type() == spec.spec_type() && candidate.key() == spec.key())
}

/// Aggregates deltas into the final report.
fn build_result(
    deltas: Vec<ImpactDelta>,
    added_specs: Vec<SpecRef>,
    removed_specs: Vec<SpecRef>,
    options: &ClassifyOptions,
) -> ImpactResult {
    let mut summary = ImpactSummary {
        added: added_specs.len(),
        removed: removed_specs.len(),
        ..ImpactSummary::default()
    };
    for delta in &deltas {
        match delta.severity {
            Severity::Breaking => summary.breaking += 1,
            Severity::NonBreaking => summary.non_breaking += 1,
            Severity::Info => summary.info += 1,
        }
    }

    let has_breaking = summary.breaking > 0;
    let has_non_breaking = summary.non_breaking > 0;
    let status = if has_breaking {
        ImpactStatus::Breaking
    } else if has_non_breaking {
        ImpactStatus::NonBreaking
    } else {
        ImpactStatus::NoImpact
    };

    ImpactResult {
        status,
        has_breaking,
        has_non_breaking,
        summary,
        deltas,
        added_specs,
        removed_specs,
        base_ref: options.base_ref.clone(),
        head_ref: options.head_ref.clone(),
        timestamp: options.timestamp,
    }
}
