//! Per-type section payload normalizers. Each section type gets a small
//! structured summary of its content; sections with nothing recognizable get
//! an empty object, which downstream stages treat as "no data".

use serde_json::{json, Map, Value};

use crate::document::lexicon::Lexicon;
use crate::models::document::SectionType;
use crate::models::signal::SignalKey;
use crate::signals::patterns;

/// Cues that mark a budget as paid in installments or with an advance.
const INSTALLMENT_CUES: [&str; 4] = ["분할", "연차별", "분기별", "installment"];
const ADVANCE_CUES: [&str; 3] = ["선금", "선급금", "advance payment"];

/// Build the normalized payload for one section.
pub fn normalize_payload(section_type: SectionType, content: &str, lexicon: &Lexicon) -> Value {
    match section_type {
        SectionType::Evaluation => evaluation_payload(content, lexicon),
        SectionType::Budget => budget_payload(content),
        SectionType::Kpi => kpi_payload(content),
        SectionType::Timeline => timeline_payload(content),
        SectionType::Governance => keyword_payload(content, SignalKey::GovernanceStructure, lexicon),
        SectionType::Technical => keyword_payload(content, SignalKey::TechnicalRequirement, lexicon),
        SectionType::Strategic => keyword_payload(content, SignalKey::StrategicTheme, lexicon),
        SectionType::Compliance => keyword_payload(content, SignalKey::ComplianceMention, lexicon),
        SectionType::Innovation => keyword_payload(content, SignalKey::InnovationMention, lexicon),
        SectionType::Scope => keyword_payload(content, SignalKey::ScopeItem, lexicon),
        SectionType::Intro => json!({}),
    }
}

/// `{ "criteria": { canonical-or-raw label -> weight fraction } }`
fn evaluation_payload(content: &str, lexicon: &Lexicon) -> Value {
    let hits = patterns::criterion_weights(content);
    if hits.is_empty() {
        return json!({});
    }
    let mut criteria = Map::new();
    for hit in hits {
        let key = lexicon
            .canonical_criterion(&hit.label)
            .unwrap_or(hit.label.as_str())
            .to_string();
        criteria.insert(key, json!(hit.weight));
    }
    json!({ "criteria": criteria })
}

/// Largest monetary amount plus payment-schedule flags. Korean amounts win
/// over dollar amounts when both appear.
fn budget_payload(content: &str) -> Value {
    let amounts = patterns::money_amounts(content);
    let best = amounts
        .iter()
        .filter(|m| m.currency == "KRW")
        .max_by(|a, b| a.amount.total_cmp(&b.amount))
        .or_else(|| amounts.iter().max_by(|a, b| a.amount.total_cmp(&b.amount)));
    let Some(best) = best else {
        return json!({});
    };
    let lowered = content.to_lowercase();
    json!({
        "amount": best.amount,
        "currency": best.currency,
        "installments": INSTALLMENT_CUES.iter().any(|cue| lowered.contains(cue)),
        "advance_payment": ADVANCE_CUES.iter().any(|cue| lowered.contains(cue)),
    })
}

/// `{ "targets": [ { name, target, unit } ] }`
fn kpi_payload(content: &str) -> Value {
    let hits = patterns::kpi_targets(content);
    if hits.is_empty() {
        return json!({});
    }
    let targets: Vec<Value> = hits
        .iter()
        .map(|t| json!({ "name": t.name, "target": t.target, "unit": t.unit }))
        .collect();
    json!({ "targets": targets })
}

/// Longest stated duration and any explicit year-month references.
fn timeline_payload(content: &str) -> Value {
    let months = patterns::durations(content)
        .iter()
        .map(|d| d.months)
        .max();
    let dates: Vec<Value> = patterns::date_refs(content)
        .iter()
        .map(|d| json!({ "year": d.year, "month": d.month }))
        .collect();
    match (months, dates.is_empty()) {
        (None, true) => json!({}),
        (Some(m), true) => json!({ "months": m }),
        (None, false) => json!({ "dates": dates }),
        (Some(m), false) => json!({ "months": m, "dates": dates }),
    }
}

/// `{ "keywords": [...] }` with the lexicon keywords found in the content,
/// in lexicon order.
fn keyword_payload(content: &str, key: SignalKey, lexicon: &Lexicon) -> Value {
    let lowered = content.to_lowercase();
    let found: Vec<&str> = lexicon
        .signal_keywords_for(key)
        .iter()
        .filter(|kw| lowered.contains(&kw.to_lowercase()))
        .map(|kw| kw.as_str())
        .collect();
    if found.is_empty() {
        json!({})
    } else {
        json!({ "keywords": found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex() -> Lexicon {
        Lexicon::default()
    }

    #[test]
    fn test_evaluation_payload_canonicalizes_criteria() {
        let payload = normalize_payload(
            SectionType::Evaluation,
            "정량평가: 기술 (40%), 가격 (30%), 수행실적 (30%)",
            &lex(),
        );
        let criteria = payload.get("criteria").unwrap();
        assert!((criteria["tech"].as_f64().unwrap() - 0.4).abs() < 1e-12);
        assert!((criteria["price"].as_f64().unwrap() - 0.3).abs() < 1e-12);
        assert!((criteria["track_record"].as_f64().unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_evaluation_payload_keeps_unknown_labels_raw() {
        let payload = normalize_payload(SectionType::Evaluation, "디자인 (20%)", &lex());
        let criteria = payload.get("criteria").unwrap();
        assert!((criteria["디자인"].as_f64().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_budget_payload_prefers_largest_krw_amount() {
        let payload = normalize_payload(
            SectionType::Budget,
            "총 사업비 120억 원 중 1차년도 45억 원, 선금 지급 가능, 연차별 분할 계약",
            &lex(),
        );
        assert!((payload["amount"].as_f64().unwrap() - 120.0e8).abs() < 1.0);
        assert_eq!(payload["currency"], "KRW");
        assert_eq!(payload["installments"], true);
        assert_eq!(payload["advance_payment"], true);
    }

    #[test]
    fn test_budget_payload_empty_without_amounts() {
        let payload = normalize_payload(SectionType::Budget, "예산은 별도 공지 예정", &lex());
        assert_eq!(payload, json!({}));
    }

    #[test]
    fn test_kpi_payload_lists_targets() {
        let payload = normalize_payload(
            SectionType::Kpi,
            "대국민 만족도 85점 달성, 처리 시간 30% 단축",
            &lex(),
        );
        let targets = payload["targets"].as_array().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0]["name"], "대국민 만족도");
        assert_eq!(targets[1]["unit"], "%");
    }

    #[test]
    fn test_timeline_payload_takes_longest_duration() {
        let payload = normalize_payload(
            SectionType::Timeline,
            "총 사업기간 24개월, 이 중 안정화 3개월 포함, 착수 2025년 9월",
            &lex(),
        );
        assert_eq!(payload["months"], 24);
        assert_eq!(payload["dates"][0]["year"], 2025);
    }

    #[test]
    fn test_keyword_payload_collects_lexicon_hits() {
        let payload = normalize_payload(
            SectionType::Governance,
            "사업 추진을 위해 추진위원회를 구성하고 PMO를 운영한다",
            &lex(),
        );
        let keywords = payload["keywords"].as_array().unwrap();
        assert!(keywords.iter().any(|k| k == "추진위원회"));
        assert!(keywords.iter().any(|k| k == "pmo"));
    }

    #[test]
    fn test_intro_payload_is_always_empty() {
        let payload = normalize_payload(SectionType::Intro, "사업 개요 설명 텍스트", &lex());
        assert_eq!(payload, json!({}));
    }
}
