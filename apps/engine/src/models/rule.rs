//! Impact rules: declarative signal-to-persona mappings loaded from
//! configuration, evaluated in a stable order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::signal::SignalKey;

/// How a rule decides whether a signal is relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Signal value equals the pattern exactly.
    Exact,
    /// Signal value contains the pattern, ASCII case-insensitive.
    Includes,
    /// Signal value matches the pattern as a regular expression.
    Regex,
    /// Numeric comparison against a payload field, e.g. `"tech >= 0.35"`.
    Threshold,
    /// Signal text shares vocabulary with a named lexicon cluster.
    Semantic,
}

/// How a matched rule changes the persona field it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformType {
    /// Overwrite the field with the payload value.
    Set,
    /// Add to a list or comma-joined string; already-present items are kept.
    Append,
    /// Multiply a numeric field, attenuated by effective strength.
    Scale,
    /// Raise one metric weight and renormalize the others to keep the sum at 1.
    BoostWeight,
    /// Move a threshold toward a target value by effective strength.
    SetThreshold,
}

/// One configured signal-to-persona mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactRule {
    pub id: Uuid,
    pub name: String,
    /// Dotted path into the persona state, e.g. `weights.expertise`.
    pub target_field: String,
    pub signal_key: SignalKey,
    pub match_type: MatchType,
    pub match_pattern: String,
    pub transform_type: TransformType,
    pub transform_payload: Value,
    /// 0.0 – 1.0 author-assigned magnitude.
    pub impact_strength: f64,
    /// Lower runs first.
    pub precedence: i32,
    /// 1 = most trusted source tier; scales effective strength.
    pub source_priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ImpactRule {
    /// Sort key for deterministic evaluation order.
    pub fn order_key(&self) -> (i32, i32) {
        (self.precedence, self.source_priority)
    }
}
