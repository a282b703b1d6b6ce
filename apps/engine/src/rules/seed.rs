//! Built-in rule set. Ships with the engine so persona adjustment works with
//! zero external configuration; operators can replace it wholesale with a
//! JSON rule file.
//!
//! Rule ids are fixed constants, not random: seeded rules must keep stable
//! identities across processes so audit trails and overrides can refer to
//! them.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::rule::{ImpactRule, MatchType, TransformType};
use crate::models::signal::SignalKey;

const SEED_ID_BASE: u128 = 0x0000_5EED_0000_0000_0000_0000_0000_0000;

fn seed_id(n: u128) -> Uuid {
    Uuid::from_u128(SEED_ID_BASE | n)
}

#[allow(clippy::too_many_arguments)]
fn rule(
    n: u128,
    name: &str,
    signal_key: SignalKey,
    match_type: MatchType,
    pattern: &str,
    target: &str,
    transform_type: TransformType,
    payload: Value,
    impact_strength: f64,
    precedence: i32,
    source_priority: i32,
) -> ImpactRule {
    ImpactRule {
        id: seed_id(n),
        name: name.to_string(),
        target_field: target.to_string(),
        signal_key,
        match_type,
        match_pattern: pattern.to_string(),
        transform_type,
        transform_payload: payload,
        impact_strength,
        precedence,
        source_priority,
        enabled: true,
    }
}

/// Load a rule set from a JSON file (an array of rules).
pub fn load_rule_set(path: &Path) -> Result<Vec<ImpactRule>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read rule file {}", path.display()))?;
    let rules: Vec<ImpactRule> =
        serde_json::from_str(&data).context("failed to parse rule file JSON")?;
    Ok(rules)
}

/// The default rule set. Evaluation-criteria weights drive metric weights;
/// budget size and payment schedule move pricing and stability posture;
/// demanding KPI targets and timeline pressure move thresholds and risk
/// appetite; compliance and governance mentions tighten thresholds; thematic
/// mentions shape the free-text profile.
pub fn default_rule_set() -> Vec<ImpactRule> {
    vec![
        rule(
            1,
            "tech-heavy evaluation boosts expertise weight",
            SignalKey::EvaluationCriteria,
            MatchType::Threshold,
            "tech >= 0.35",
            "weights.expertise",
            TransformType::BoostWeight,
            json!({"delta": 0.08, "cap": 0.45}),
            0.9,
            10,
            1,
        ),
        rule(
            2,
            "price-heavy evaluation boosts price weight",
            SignalKey::EvaluationCriteria,
            MatchType::Threshold,
            "price >= 0.3",
            "weights.price",
            TransformType::BoostWeight,
            json!({"delta": 0.08, "cap": 0.45}),
            0.9,
            10,
            1,
        ),
        rule(
            3,
            "track-record emphasis boosts track record weight",
            SignalKey::EvaluationCriteria,
            MatchType::Threshold,
            "track_record >= 0.25",
            "weights.track_record",
            TransformType::BoostWeight,
            json!({"delta": 0.06, "cap": 0.40}),
            0.85,
            15,
            1,
        ),
        rule(
            4,
            "price-heavy evaluation raises price sensitivity",
            SignalKey::EvaluationCriteria,
            MatchType::Threshold,
            "price >= 0.3",
            "traits.price_sensitivity",
            TransformType::Scale,
            json!({"factor": 1.2}),
            0.8,
            20,
            1,
        ),
        rule(
            18,
            "demanding kpi targets raise expertise threshold",
            SignalKey::KpiTarget,
            MatchType::Threshold,
            "target >= 95",
            "thresholds.expertise",
            TransformType::SetThreshold,
            json!({"value": 75.0}),
            0.75,
            25,
            2,
        ),
        rule(
            5,
            "large budget relaxes price threshold",
            SignalKey::BudgetAmount,
            MatchType::Threshold,
            "amount >= 10000000000",
            "thresholds.price",
            TransformType::SetThreshold,
            json!({"value": 40.0}),
            0.7,
            30,
            2,
        ),
        rule(
            6,
            "small budget raises price sensitivity",
            SignalKey::BudgetAmount,
            MatchType::Threshold,
            "amount <= 1000000000",
            "traits.price_sensitivity",
            TransformType::Scale,
            json!({"factor": 1.25}),
            0.7,
            30,
            2,
        ),
        rule(
            19,
            "large budget boosts track record weight",
            SignalKey::BudgetAmount,
            MatchType::Threshold,
            "amount >= 10000000000",
            "weights.track_record",
            TransformType::BoostWeight,
            json!({"delta": 0.06, "cap": 0.40}),
            0.7,
            30,
            2,
        ),
        rule(
            20,
            "small budget boosts price weight",
            SignalKey::BudgetAmount,
            MatchType::Threshold,
            "amount <= 1000000000",
            "weights.price",
            TransformType::BoostWeight,
            json!({"delta": 0.06, "cap": 0.45}),
            0.7,
            30,
            2,
        ),
        rule(
            21,
            "installment schedule boosts stability weight",
            SignalKey::BudgetAmount,
            MatchType::Threshold,
            "installments >= 1",
            "weights.stability",
            TransformType::BoostWeight,
            json!({"delta": 0.05, "cap": 0.35}),
            0.7,
            32,
            2,
        ),
        rule(
            7,
            "iso or isms certification demands strict compliance",
            SignalKey::ComplianceMention,
            MatchType::Regex,
            r"(?i)iso\s*\d{4,5}|isms",
            "thresholds.compliance",
            TransformType::SetThreshold,
            json!({"value": 90.0}),
            0.9,
            35,
            1,
        ),
        rule(
            8,
            "compliance mentions tighten compliance threshold",
            SignalKey::ComplianceMention,
            MatchType::Semantic,
            "compliance",
            "thresholds.compliance",
            TransformType::SetThreshold,
            json!({"value": 85.0}),
            0.8,
            40,
            2,
        ),
        rule(
            9,
            "technology themes grow innovation appetite",
            SignalKey::StrategicTheme,
            MatchType::Semantic,
            "technology",
            "traits.innovation_appetite",
            TransformType::Scale,
            json!({"factor": 1.15}),
            0.6,
            40,
            2,
        ),
        rule(
            10,
            "innovation mentions boost innovation weight",
            SignalKey::InnovationMention,
            MatchType::Semantic,
            "innovation",
            "weights.innovation",
            TransformType::BoostWeight,
            json!({"delta": 0.05, "cap": 0.30}),
            0.7,
            40,
            2,
        ),
        rule(
            11,
            "digital government theme shapes strategic focus",
            SignalKey::StrategicTheme,
            MatchType::Semantic,
            "digital_government",
            "profile.strategic_focus",
            TransformType::Append,
            json!({"value": "디지털 정부혁신"}),
            0.7,
            45,
            2,
        ),
        rule(
            12,
            "digital transformation keyword boosts focus keywords",
            SignalKey::StrategicTheme,
            MatchType::Includes,
            "디지털",
            "focus_keywords.boost",
            TransformType::Append,
            json!({"value": "디지털 전환"}),
            0.7,
            45,
            2,
        ),
        rule(
            13,
            "committee governance raises detail orientation",
            SignalKey::GovernanceStructure,
            MatchType::Includes,
            "위원회",
            "traits.detail_orientation",
            TransformType::Scale,
            json!({"factor": 1.1}),
            0.6,
            50,
            3,
        ),
        rule(
            14,
            "pmo governance adds management focus",
            SignalKey::GovernanceStructure,
            MatchType::Exact,
            "pmo",
            "profile.strategic_focus",
            TransformType::Append,
            json!({"value": "체계적 사업관리"}),
            0.6,
            55,
            3,
        ),
        rule(
            15,
            "long timeline favors stability",
            SignalKey::TimelineDate,
            MatchType::Threshold,
            "months >= 24",
            "weights.stability",
            TransformType::BoostWeight,
            json!({"delta": 0.05, "cap": 0.35}),
            0.7,
            60,
            2,
        ),
        rule(
            16,
            "tight timeline sets delivery stance",
            SignalKey::TimelineDate,
            MatchType::Threshold,
            "months <= 6",
            "profile.evaluation_stance",
            TransformType::Set,
            json!({"value": "실행력 중시"}),
            0.6,
            60,
            2,
        ),
        rule(
            22,
            "tight timeline curbs risk tolerance",
            SignalKey::TimelineDate,
            MatchType::Threshold,
            "months <= 6",
            "traits.risk_tolerance",
            TransformType::Scale,
            json!({"factor": 0.85}),
            0.7,
            60,
            2,
        ),
        // Kept for experimentation; off until the KPI scan earns more trust.
        ImpactRule {
            enabled: false,
            ..rule(
                17,
                "kpi density raises detail orientation",
                SignalKey::KpiTarget,
                MatchType::Includes,
                "%",
                "traits.detail_orientation",
                TransformType::Scale,
                json!({"factor": 1.05}),
                0.5,
                90,
                4,
            )
        },
    ]
}
