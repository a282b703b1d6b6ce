//! Transform application: the five bounded mutations a matched rule can make
//! to the persona working copy. Every changed field is reported as a delta;
//! malformed payloads and unknown target fields degrade to a logged no-op.

use serde_json::Value;
use tracing::warn;

use crate::models::persona::{declared_range, FieldValue, PersonaState, METRICS};
use crate::models::rule::{ImpactRule, TransformType};

/// Numeric changes smaller than this are treated as no change.
const DELTA_EPSILON: f64 = 1e-12;

/// One observed field change, before and after as JSON values.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDelta {
    pub field_path: String,
    pub before: Value,
    pub after: Value,
}

/// Apply one rule's transform to the working copy, returning every field
/// that actually changed. An empty vector means no adjustment is recorded.
pub fn apply_transform(
    state: &mut PersonaState,
    rule: &ImpactRule,
    effective_strength: f64,
) -> Vec<FieldDelta> {
    match rule.transform_type {
        TransformType::Set => apply_set(state, rule),
        TransformType::Append => apply_append(state, rule),
        TransformType::Scale => apply_scale(state, rule, effective_strength),
        TransformType::BoostWeight => apply_boost_weight(state, rule, effective_strength),
        TransformType::SetThreshold => apply_set_threshold(state, rule, effective_strength),
    }
}

fn apply_set(state: &mut PersonaState, rule: &ImpactRule) -> Vec<FieldDelta> {
    let Some(before) = state.get_field(&rule.target_field) else {
        return unknown_field(rule);
    };
    let Some(next) = payload_field_value(rule) else {
        return Vec::new();
    };
    if !state.set_field(&rule.target_field, next.clone()) {
        warn!(
            rule = %rule.name,
            field = %rule.target_field,
            "set value kind does not fit target field"
        );
        return Vec::new();
    }
    delta_if_changed(&rule.target_field, &before, &next)
}

/// Append is idempotent: a value already present in the target leaves the
/// state untouched and records nothing.
fn apply_append(state: &mut PersonaState, rule: &ImpactRule) -> Vec<FieldDelta> {
    let Some(before) = state.get_field(&rule.target_field) else {
        return unknown_field(rule);
    };
    let Some(addition) = payload_string(rule) else {
        return Vec::new();
    };
    let after = match &before {
        FieldValue::Text(cur) => {
            if cur.contains(&addition) {
                return Vec::new();
            }
            let joined = if cur.is_empty() {
                addition
            } else {
                format!("{cur}, {addition}")
            };
            FieldValue::Text(joined)
        }
        FieldValue::Keywords(cur) => {
            if cur.contains(&addition) {
                return Vec::new();
            }
            let mut next = cur.clone();
            next.push(addition);
            FieldValue::Keywords(next)
        }
        FieldValue::Number(_) => {
            warn!(
                rule = %rule.name,
                field = %rule.target_field,
                "append target is numeric, skipping"
            );
            return Vec::new();
        }
    };
    state.set_field(&rule.target_field, after.clone());
    delta_if_changed(&rule.target_field, &before, &after)
}

fn apply_scale(state: &mut PersonaState, rule: &ImpactRule, eff: f64) -> Vec<FieldDelta> {
    let Some(before) = state.get_field(&rule.target_field) else {
        return unknown_field(rule);
    };
    let FieldValue::Number(cur) = before else {
        warn!(
            rule = %rule.name,
            field = %rule.target_field,
            "scale target is not numeric, skipping"
        );
        return Vec::new();
    };
    let Some(factor) = payload_number(rule, "factor") else {
        return Vec::new();
    };
    let mut next = cur * (1.0 + (factor - 1.0) * eff);
    if let Some((lo, hi)) = declared_range(&rule.target_field) {
        next = next.clamp(lo, hi);
    }
    state.set_field(&rule.target_field, FieldValue::Number(next));
    delta_if_changed(
        &rule.target_field,
        &FieldValue::Number(cur),
        &FieldValue::Number(next),
    )
}

/// Raise one metric weight toward its cap and shrink the others so the six
/// still sum to 1.0. A weight already at or past the cap is left untouched.
/// When the other weights sum to zero there is nothing to shrink
/// proportionally, so the boosted weight is clamped to the cap and the
/// remainder is split equally instead.
fn apply_boost_weight(state: &mut PersonaState, rule: &ImpactRule, eff: f64) -> Vec<FieldDelta> {
    let Some(metric) = rule.target_field.strip_prefix("weights.") else {
        warn!(
            rule = %rule.name,
            field = %rule.target_field,
            "boost_weight target must be a weight field"
        );
        return Vec::new();
    };
    let Some(cur) = state.weights.get(metric) else {
        return unknown_field(rule);
    };
    let (Some(delta), Some(cap)) = (payload_number(rule, "delta"), payload_number(rule, "cap"))
    else {
        return Vec::new();
    };

    let before = state.weights.clone();
    let boosted = (cur + delta * eff).min(cap).clamp(0.0, 1.0);
    let others_sum: f64 = before
        .as_pairs()
        .iter()
        .filter(|(name, _)| *name != metric)
        .map(|(_, w)| w)
        .sum();

    if others_sum > DELTA_EPSILON {
        // A cap below the current weight must not turn the boost into a cut;
        // a weight already at its cap stays put.
        if boosted <= cur + DELTA_EPSILON {
            return Vec::new();
        }
        state.weights.set(metric, boosted);
        let shrink = (1.0 - boosted) / others_sum;
        for (name, w) in before.as_pairs() {
            if name != metric {
                state.weights.set(name, w * shrink);
            }
        }
    } else {
        state.weights.set(metric, boosted);
        let share = (1.0 - boosted) / (METRICS.len() - 1) as f64;
        for name in METRICS {
            if name != metric {
                state.weights.set(name, share);
            }
        }
    }

    let mut deltas = Vec::new();
    for (name, prev) in before.as_pairs() {
        let now = state
            .weights
            .get(name)
            .unwrap_or(prev);
        if (now - prev).abs() > DELTA_EPSILON {
            deltas.push(FieldDelta {
                field_path: format!("weights.{name}"),
                before: Value::from(prev),
                after: Value::from(now),
            });
        }
    }
    deltas
}

/// Move a threshold toward the payload value by the effective-strength
/// fraction of the gap.
fn apply_set_threshold(state: &mut PersonaState, rule: &ImpactRule, eff: f64) -> Vec<FieldDelta> {
    let Some(metric) = rule.target_field.strip_prefix("thresholds.") else {
        warn!(
            rule = %rule.name,
            field = %rule.target_field,
            "set_threshold target must be a threshold field"
        );
        return Vec::new();
    };
    let Some(cur) = state.thresholds.get(metric) else {
        return unknown_field(rule);
    };
    let Some(target) = payload_number(rule, "value") else {
        return Vec::new();
    };
    let next = (cur + (target - cur) * eff).clamp(0.0, 100.0);
    state.thresholds.set(metric, next);
    delta_if_changed(
        &rule.target_field,
        &FieldValue::Number(cur),
        &FieldValue::Number(next),
    )
}

fn unknown_field(rule: &ImpactRule) -> Vec<FieldDelta> {
    warn!(
        rule = %rule.name,
        field = %rule.target_field,
        "rule targets a field absent from persona state, skipping"
    );
    Vec::new()
}

fn payload_field_value(rule: &ImpactRule) -> Option<FieldValue> {
    let raw = rule.transform_payload.get("value").cloned();
    let Some(raw) = raw else {
        warn!(rule = %rule.name, "transform payload is missing \"value\"");
        return None;
    };
    match serde_json::from_value::<FieldValue>(raw) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!(rule = %rule.name, %err, "transform payload value has unsupported shape");
            None
        }
    }
}

fn payload_string(rule: &ImpactRule) -> Option<String> {
    match rule.transform_payload.get("value").and_then(Value::as_str) {
        Some(s) => Some(s.to_string()),
        None => {
            warn!(rule = %rule.name, "append payload needs a string \"value\"");
            None
        }
    }
}

fn payload_number(rule: &ImpactRule, key: &str) -> Option<f64> {
    match rule.transform_payload.get(key).and_then(Value::as_f64) {
        Some(n) => Some(n),
        None => {
            warn!(rule = %rule.name, key, "transform payload needs a numeric field");
            None
        }
    }
}

fn delta_if_changed(path: &str, before: &FieldValue, after: &FieldValue) -> Vec<FieldDelta> {
    let changed = match (before, after) {
        (FieldValue::Number(a), FieldValue::Number(b)) => (a - b).abs() > DELTA_EPSILON,
        (a, b) => a != b,
    };
    if !changed {
        return Vec::new();
    }
    vec![FieldDelta {
        field_path: path.to_string(),
        before: serde_json::to_value(before).unwrap_or(Value::Null),
        after: serde_json::to_value(after).unwrap_or(Value::Null),
    }]
}
