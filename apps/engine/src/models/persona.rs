//! Evaluator persona state: the mutable profile a rule run adjusts, plus the
//! append-only adjustment records that explain every change.
//!
//! Field access is path-based (`weights.expertise`, `profile.strategic_focus`)
//! so rules can name their target declaratively. The path vocabulary is
//! closed: unknown paths are rejected at the accessor, not at parse time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ─────────────────────────────────────────────
// Trait scores and narrative profile
// ─────────────────────────────────────────────

/// Behavioral trait scores on a 1–10 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaTraits {
    pub risk_tolerance: f64,
    pub detail_orientation: f64,
    pub price_sensitivity: f64,
    pub innovation_appetite: f64,
}

impl Default for PersonaTraits {
    fn default() -> Self {
        Self {
            risk_tolerance: 5.0,
            detail_orientation: 5.0,
            price_sensitivity: 5.0,
            innovation_appetite: 5.0,
        }
    }
}

/// Free-text evaluator description; `set` and `append` transforms edit these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub strategic_focus: String,
    pub evaluation_stance: String,
}

impl Default for PersonaProfile {
    fn default() -> Self {
        Self {
            strategic_focus: String::new(),
            evaluation_stance: "balanced".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Scoring metrics: weights and thresholds
// ─────────────────────────────────────────────

/// The six evaluation metrics, in their canonical (and only) iteration order.
pub const METRICS: [&str; 6] = [
    "expertise",
    "price",
    "track_record",
    "innovation",
    "stability",
    "compliance",
];

/// Relative importance of each metric. Invariant: the six weights are
/// non-negative and sum to 1.0 within 1e-6 at every commit boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricWeights {
    pub expertise: f64,
    pub price: f64,
    pub track_record: f64,
    pub innovation: f64,
    pub stability: f64,
    pub compliance: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            expertise: 0.25,
            price: 0.20,
            track_record: 0.20,
            innovation: 0.10,
            stability: 0.15,
            compliance: 0.10,
        }
    }
}

impl MetricWeights {
    pub fn get(&self, metric: &str) -> Option<f64> {
        match metric {
            "expertise" => Some(self.expertise),
            "price" => Some(self.price),
            "track_record" => Some(self.track_record),
            "innovation" => Some(self.innovation),
            "stability" => Some(self.stability),
            "compliance" => Some(self.compliance),
            _ => None,
        }
    }

    pub fn set(&mut self, metric: &str, value: f64) -> bool {
        match metric {
            "expertise" => self.expertise = value,
            "price" => self.price = value,
            "track_record" => self.track_record = value,
            "innovation" => self.innovation = value,
            "stability" => self.stability = value,
            "compliance" => self.compliance = value,
            _ => return false,
        }
        true
    }

    pub fn sum(&self) -> f64 {
        self.expertise
            + self.price
            + self.track_record
            + self.innovation
            + self.stability
            + self.compliance
    }

    /// All six weights in canonical order.
    pub fn as_pairs(&self) -> [(&'static str, f64); 6] {
        [
            ("expertise", self.expertise),
            ("price", self.price),
            ("track_record", self.track_record),
            ("innovation", self.innovation),
            ("stability", self.stability),
            ("compliance", self.compliance),
        ]
    }
}

/// Minimum acceptable bidder score per metric, on a 0–100 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricThresholds {
    pub expertise: f64,
    pub price: f64,
    pub track_record: f64,
    pub innovation: f64,
    pub stability: f64,
    pub compliance: f64,
}

impl Default for MetricThresholds {
    fn default() -> Self {
        Self {
            expertise: 65.0,
            price: 50.0,
            track_record: 60.0,
            innovation: 40.0,
            stability: 55.0,
            compliance: 70.0,
        }
    }
}

impl MetricThresholds {
    pub fn get(&self, metric: &str) -> Option<f64> {
        match metric {
            "expertise" => Some(self.expertise),
            "price" => Some(self.price),
            "track_record" => Some(self.track_record),
            "innovation" => Some(self.innovation),
            "stability" => Some(self.stability),
            "compliance" => Some(self.compliance),
            _ => None,
        }
    }

    pub fn set(&mut self, metric: &str, value: f64) -> bool {
        match metric {
            "expertise" => self.expertise = value,
            "price" => self.price = value,
            "track_record" => self.track_record = value,
            "innovation" => self.innovation = value,
            "stability" => self.stability = value,
            "compliance" => self.compliance = value,
            _ => return false,
        }
        true
    }
}

/// Keyword lists that bias downstream scoring up or down.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FocusKeywords {
    pub boost: Vec<String>,
    pub penalty: Vec<String>,
}

// ─────────────────────────────────────────────
// Persona state and path-based field access
// ─────────────────────────────────────────────

/// Full evaluator persona state. This is the value the rule engine folds
/// over; persistence stores it as one JSONB document per persona.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaState {
    pub traits: PersonaTraits,
    pub profile: PersonaProfile,
    pub weights: MetricWeights,
    pub thresholds: MetricThresholds,
    pub focus_keywords: FocusKeywords,
}

/// A value read from or written to a persona field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Keywords(Vec<String>),
}

/// Declared numeric bounds by path prefix. Paths outside these prefixes are
/// unbounded (free text and keyword lists).
const FIELD_RANGES: [(&str, f64, f64); 3] = [
    ("traits.", 1.0, 10.0),
    ("weights.", 0.0, 1.0),
    ("thresholds.", 0.0, 100.0),
];

/// Numeric range declared for a field path, if any.
pub fn declared_range(path: &str) -> Option<(f64, f64)> {
    FIELD_RANGES
        .iter()
        .find(|(prefix, _, _)| path.starts_with(prefix))
        .map(|(_, lo, hi)| (*lo, *hi))
}

impl PersonaState {
    /// Read a field by dotted path. Returns `None` for unknown paths.
    pub fn get_field(&self, path: &str) -> Option<FieldValue> {
        let (group, field) = path.split_once('.')?;
        match group {
            "traits" => {
                let v = match field {
                    "risk_tolerance" => self.traits.risk_tolerance,
                    "detail_orientation" => self.traits.detail_orientation,
                    "price_sensitivity" => self.traits.price_sensitivity,
                    "innovation_appetite" => self.traits.innovation_appetite,
                    _ => return None,
                };
                Some(FieldValue::Number(v))
            }
            "profile" => {
                let v = match field {
                    "strategic_focus" => &self.profile.strategic_focus,
                    "evaluation_stance" => &self.profile.evaluation_stance,
                    _ => return None,
                };
                Some(FieldValue::Text(v.clone()))
            }
            "weights" => self.weights.get(field).map(FieldValue::Number),
            "thresholds" => self.thresholds.get(field).map(FieldValue::Number),
            "focus_keywords" => {
                let v = match field {
                    "boost" => &self.focus_keywords.boost,
                    "penalty" => &self.focus_keywords.penalty,
                    _ => return None,
                };
                Some(FieldValue::Keywords(v.clone()))
            }
            _ => None,
        }
    }

    /// Write a field by dotted path. Returns `false` when the path is unknown
    /// or the value kind does not fit the field.
    pub fn set_field(&mut self, path: &str, value: FieldValue) -> bool {
        let Some((group, field)) = path.split_once('.') else {
            return false;
        };
        match (group, value) {
            ("traits", FieldValue::Number(v)) => {
                match field {
                    "risk_tolerance" => self.traits.risk_tolerance = v,
                    "detail_orientation" => self.traits.detail_orientation = v,
                    "price_sensitivity" => self.traits.price_sensitivity = v,
                    "innovation_appetite" => self.traits.innovation_appetite = v,
                    _ => return false,
                }
                true
            }
            ("profile", FieldValue::Text(v)) => {
                match field {
                    "strategic_focus" => self.profile.strategic_focus = v,
                    "evaluation_stance" => self.profile.evaluation_stance = v,
                    _ => return false,
                }
                true
            }
            ("weights", FieldValue::Number(v)) => self.weights.set(field, v),
            ("thresholds", FieldValue::Number(v)) => self.thresholds.set(field, v),
            ("focus_keywords", FieldValue::Keywords(v)) => {
                match field {
                    "boost" => self.focus_keywords.boost = v,
                    "penalty" => self.focus_keywords.penalty = v,
                    _ => return false,
                }
                true
            }
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────
// Adjustment audit records
// ─────────────────────────────────────────────

/// One recorded field change from a rule application. Append-only: history
/// rows are inserted and never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateAdjustment {
    pub persona_id: Uuid,
    pub document_id: Uuid,
    pub field_path: String,
    pub before_value: Value,
    pub after_value: Value,
    /// Human-readable explanation, `"<rule name> on <signal key>"`.
    pub reason: String,
    /// confidence x impact_strength x source weight, clamped to 0.0 – 1.0.
    pub confidence_score: f64,
}

// ─────────────────────────────────────────────
// Database row shapes
// ─────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct PersonaRow {
    pub persona_id: Uuid,
    pub name: String,
    pub state: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct AdjustmentRow {
    pub id: i64,
    pub persona_id: Uuid,
    pub document_id: Uuid,
    pub field_path: String,
    pub before_value: Value,
    pub after_value: Value,
    pub reason: String,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = MetricWeights::default();
        assert!(
            (weights.sum() - 1.0).abs() < 1e-6,
            "default weights must sum to 1.0, got {}",
            weights.sum()
        );
    }

    #[test]
    fn test_metrics_order_matches_as_pairs() {
        let weights = MetricWeights::default();
        let pairs = weights.as_pairs();
        for (i, name) in METRICS.iter().enumerate() {
            assert_eq!(pairs[i].0, *name);
        }
    }

    #[test]
    fn test_get_field_reads_every_group() {
        let state = PersonaState::default();
        assert_eq!(
            state.get_field("traits.risk_tolerance"),
            Some(FieldValue::Number(5.0))
        );
        assert_eq!(
            state.get_field("weights.expertise"),
            Some(FieldValue::Number(0.25))
        );
        assert_eq!(
            state.get_field("thresholds.compliance"),
            Some(FieldValue::Number(70.0))
        );
        assert_eq!(
            state.get_field("profile.evaluation_stance"),
            Some(FieldValue::Text("balanced".to_string()))
        );
        assert_eq!(
            state.get_field("focus_keywords.boost"),
            Some(FieldValue::Keywords(vec![]))
        );
    }

    #[test]
    fn test_get_field_rejects_unknown_paths() {
        let state = PersonaState::default();
        assert_eq!(state.get_field("weights.bribes"), None);
        assert_eq!(state.get_field("nonsense"), None);
        assert_eq!(state.get_field("traits"), None, "group without field");
    }

    #[test]
    fn test_set_field_round_trips() {
        let mut state = PersonaState::default();
        assert!(state.set_field("weights.innovation", FieldValue::Number(0.3)));
        assert_eq!(
            state.get_field("weights.innovation"),
            Some(FieldValue::Number(0.3))
        );

        assert!(state.set_field(
            "focus_keywords.penalty",
            FieldValue::Keywords(vec!["하도급".to_string()])
        ));
        assert_eq!(
            state.get_field("focus_keywords.penalty"),
            Some(FieldValue::Keywords(vec!["하도급".to_string()]))
        );
    }

    #[test]
    fn test_set_field_rejects_kind_mismatch() {
        let mut state = PersonaState::default();
        assert!(!state.set_field("weights.price", FieldValue::Text("cheap".to_string())));
        assert!(!state.set_field("profile.strategic_focus", FieldValue::Number(1.0)));
    }

    #[test]
    fn test_declared_ranges() {
        assert_eq!(declared_range("traits.risk_tolerance"), Some((1.0, 10.0)));
        assert_eq!(declared_range("weights.price"), Some((0.0, 1.0)));
        assert_eq!(declared_range("thresholds.expertise"), Some((0.0, 100.0)));
        assert_eq!(declared_range("profile.strategic_focus"), None);
        assert_eq!(declared_range("focus_keywords.boost"), None);
    }

    #[test]
    fn test_persona_state_json_round_trip() {
        let mut state = PersonaState::default();
        state.weights.expertise = 0.31;
        state.focus_keywords.boost.push("클라우드".to_string());
        let value = serde_json::to_value(&state).unwrap();
        let back: PersonaState = serde_json::from_value(value).unwrap();
        assert!((back.weights.expertise - 0.31).abs() < 1e-12);
        assert_eq!(back.focus_keywords.boost, vec!["클라우드".to_string()]);
    }
}
