//! The rule engine: an ordered fold of matched rules over a persona working
//! copy. Rule order is load-bearing, since later rules see the effects of
//! earlier ones within the same run, so rules are sorted once at
//! construction and never reordered.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::lexicon::Lexicon;
use crate::models::persona::{PersonaState, StateAdjustment};
use crate::models::rule::ImpactRule;
use crate::models::signal::Signal;
use crate::rules::matcher::CompiledRule;
use crate::rules::transform::apply_transform;

/// Matches with an effective strength below this are discarded as noise.
const MIN_EFFECTIVE_STRENGTH: f64 = 0.01;

/// Signals below this confidence have their effective strength halved.
const LOW_CONFIDENCE_CUTOFF: f64 = 0.6;
const LOW_CONFIDENCE_PENALTY: f64 = 0.5;

/// Fixed trust weight per rule source tier.
pub fn source_priority_weight(priority: i32) -> f64 {
    match priority {
        1 => 1.0,
        2 => 0.9,
        3 => 0.8,
        4 => 0.7,
        _ => 0.6,
    }
}

/// Result of one evaluation run: the adjusted working copy and the audit
/// trail of every field change, in application order.
#[derive(Debug, Serialize)]
pub struct RunOutcome {
    pub state: PersonaState,
    pub adjustments: Vec<StateAdjustment>,
}

/// Process-scoped rule set, compiled and sorted at construction.
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
}

impl RuleEngine {
    /// Build an engine from a rule set. Disabled rules are dropped here;
    /// everything else is compiled and sorted by `(precedence,
    /// source_priority)`, ties keeping their configured order.
    pub fn new(rules: Vec<ImpactRule>, lexicon: &Lexicon) -> Self {
        let mut enabled: Vec<ImpactRule> = rules.into_iter().filter(|r| r.enabled).collect();
        enabled.sort_by_key(ImpactRule::order_key);
        let compiled = enabled
            .into_iter()
            .map(|rule| CompiledRule::compile(rule, lexicon))
            .collect::<Vec<_>>();
        info!(rules = compiled.len(), "rule engine ready");
        Self { rules: compiled }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate all signals against the rule set, starting from `initial`.
    ///
    /// Pure with respect to its inputs: no I/O, no shared state, same inputs
    /// produce the identical outcome. Signals are processed in extraction
    /// order; for each signal, every key-matching rule runs in sorted order
    /// against the working copy accumulated so far.
    pub fn evaluate(
        &self,
        persona_id: Uuid,
        document_id: Uuid,
        initial: &PersonaState,
        signals: &[Signal],
    ) -> RunOutcome {
        let mut working = initial.clone();
        let mut adjustments: Vec<StateAdjustment> = Vec::new();

        for signal in signals {
            for compiled in &self.rules {
                let rule = &compiled.rule;
                if rule.signal_key != signal.key {
                    continue;
                }
                if !compiled.matches(signal) {
                    continue;
                }
                let eff = effective_strength(rule.impact_strength, signal.confidence, rule.source_priority);
                if eff < MIN_EFFECTIVE_STRENGTH {
                    debug!(
                        rule = %rule.name,
                        effective_strength = eff,
                        "match below noise floor, discarded"
                    );
                    continue;
                }
                let deltas = apply_transform(&mut working, rule, eff);
                if deltas.is_empty() {
                    continue;
                }
                let confidence_score = (signal.confidence
                    * rule.impact_strength
                    * source_priority_weight(rule.source_priority))
                .clamp(0.0, 1.0);
                let reason = format!("{} on {}", rule.name, signal.key.as_str());
                debug!(
                    rule = %rule.name,
                    fields = deltas.len(),
                    effective_strength = eff,
                    "rule applied"
                );
                for delta in deltas {
                    adjustments.push(StateAdjustment {
                        persona_id,
                        document_id,
                        field_path: delta.field_path,
                        before_value: delta.before,
                        after_value: delta.after,
                        reason: reason.clone(),
                        confidence_score,
                    });
                }
            }
        }

        info!(
            signals = signals.len(),
            adjustments = adjustments.len(),
            "rule evaluation complete"
        );
        RunOutcome {
            state: working,
            adjustments,
        }
    }
}

/// Runtime magnitude of one rule application:
/// `impact_strength x confidence x source weight`, halved for
/// low-confidence signals.
fn effective_strength(impact_strength: f64, confidence: f64, source_priority: i32) -> f64 {
    let mut eff = impact_strength * confidence * source_priority_weight(source_priority);
    if confidence < LOW_CONFIDENCE_CUTOFF {
        eff *= LOW_CONFIDENCE_PENALTY;
    }
    eff
}
