//! The two operations collaborators call: pure signal extraction from
//! document text, and the persona adjustment run composed around the
//! persistence seam. Extraction never touches I/O; adjustment reads state
//! once, folds the rules in memory, and commits once.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::document::lexicon::Lexicon;
use crate::document::{segment_pages, structure_sections};
use crate::errors::EngineError;
use crate::models::document::{DocumentSection, PageUnit};
use crate::models::persona::StateAdjustment;
use crate::models::signal::Signal;
use crate::persona::normalizer::normalize_state;
use crate::persona::store::PersonaStore;
use crate::rules::engine::{RuleEngine, RunOutcome};
use crate::signals::extract_from_sections;

/// Everything extraction produced for one document, in pipeline order.
#[derive(Debug, Serialize)]
pub struct ExtractionOutcome {
    pub pages: Vec<PageUnit>,
    pub sections: Vec<DocumentSection>,
    pub signals: Vec<Signal>,
}

/// Segment, structure and extract, in one pass. Pure function of its input:
/// empty or unrecognizable text simply produces empty collections.
pub fn extract_signals(document_text: &str, lexicon: &Lexicon) -> ExtractionOutcome {
    let pages = segment_pages(document_text, lexicon);
    let sections = structure_sections(&pages, lexicon);
    let signals = extract_from_sections(&sections, lexicon);
    info!(
        pages = pages.len(),
        sections = sections.len(),
        signals = signals.len(),
        "document extraction complete"
    );
    ExtractionOutcome {
        pages,
        sections,
        signals,
    }
}

/// Run the rule fold against current persona state without committing.
/// The returned state is already normalized, exactly as a commit would
/// persist it.
pub async fn preview_adjustments(
    store: &dyn PersonaStore,
    engine: &RuleEngine,
    persona_id: Uuid,
    document_id: Uuid,
    signals: &[Signal],
) -> Result<RunOutcome, EngineError> {
    let initial = store.load(persona_id).await?;
    let mut outcome = engine.evaluate(persona_id, document_id, &initial, signals);
    normalize_state(&mut outcome.state);
    Ok(outcome)
}

/// Full adjustment run: load, evaluate, normalize, commit. Returns the audit
/// trail in application order. The commit is the only write and is atomic,
/// so an aborted run leaves no trace.
pub async fn adjust_persona(
    store: &dyn PersonaStore,
    engine: &RuleEngine,
    persona_id: Uuid,
    document_id: Uuid,
    signals: &[Signal],
) -> Result<Vec<StateAdjustment>, EngineError> {
    let outcome = preview_adjustments(store, engine, persona_id, document_id, signals).await?;
    store
        .commit(persona_id, &outcome.state, &outcome.adjustments)
        .await?;
    info!(
        %persona_id,
        %document_id,
        adjustments = outcome.adjustments.len(),
        "persona adjusted"
    );
    Ok(outcome.adjustments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::SectionType;
    use crate::models::persona::PersonaState;
    use crate::models::signal::SignalKey;
    use crate::persona::normalizer::weights_normalized;
    use crate::persona::store::MemoryPersonaStore;
    use crate::rules::seed::default_rule_set;

    const PERSONA: Uuid = Uuid::from_u128(0xEE01);
    const DOCUMENT: Uuid = Uuid::from_u128(0xDD01);

    fn lex() -> Lexicon {
        Lexicon::default()
    }

    fn default_engine() -> RuleEngine {
        RuleEngine::new(default_rule_set(), &lex())
    }

    async fn store_with_default_persona() -> MemoryPersonaStore {
        let store = MemoryPersonaStore::new();
        store
            .create(PERSONA, "기본 평가자", &PersonaState::default())
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_extract_signals_evaluation_scenario() {
        let outcome = extract_signals("3. 평가 기준\n기술 (40%)", &lex());
        assert_eq!(outcome.sections.len(), 1);
        assert_eq!(outcome.sections[0].section_type, SectionType::Evaluation);
        assert_eq!(outcome.signals.len(), 1);
        let signal = &outcome.signals[0];
        assert_eq!(signal.key, SignalKey::EvaluationCriteria);
        assert_eq!(signal.payload["criterion"], "tech");
        assert!((signal.payload["weight"].as_f64().unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_extract_signals_empty_text() {
        let outcome = extract_signals("", &lex());
        assert!(outcome.pages.is_empty());
        assert!(outcome.sections.is_empty());
        assert!(outcome.signals.is_empty());
    }

    #[test]
    fn test_extraction_deterministic() {
        let text = "3. 평가 기준\n기술 (40%), 가격 (30%)\n4. 사업 예산\n총 사업비 120억 원";
        let a = serde_json::to_string(&extract_signals(text, &lex())).unwrap();
        let b = serde_json::to_string(&extract_signals(text, &lex())).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_adjust_persona_boosts_expertise() {
        let store = store_with_default_persona().await;
        let engine = default_engine();
        let text = "1. 사업 개요\n본 사업은 행정 서비스 품질을 높이기 위한 것이다.\n\
                    3. 평가 기준\n기술 (40%)";
        let extraction = extract_signals(text, &lex());
        assert_eq!(extraction.signals.len(), 1, "one criterion signal expected");

        let adjustments = adjust_persona(&store, &engine, PERSONA, DOCUMENT, &extraction.signals)
            .await
            .unwrap();

        // Only the expertise boost fires: eff = 0.9 strength x 0.9
        // confidence x 1.0 source weight.
        let eff = 0.9 * 0.9;
        let expected = 0.25 + 0.08 * eff;
        let state = store.load(PERSONA).await.unwrap();
        assert!((state.weights.expertise - expected).abs() < 1e-9);
        assert!(weights_normalized(&state));
        assert!(state.weights.price < 0.20, "other weights shrank");

        assert_eq!(adjustments.len(), 6, "one delta per weight");
        assert!(adjustments
            .iter()
            .all(|a| a.reason == "tech-heavy evaluation boosts expertise weight on evaluation_criteria"));
        assert!(adjustments
            .iter()
            .all(|a| (a.confidence_score - eff).abs() < 1e-9));
        assert!(adjustments.iter().all(|a| a.document_id == DOCUMENT));

        let history = store.adjustment_history(PERSONA).await.unwrap();
        assert_eq!(history.len(), 6);
    }

    #[tokio::test]
    async fn test_full_run_multiple_signal_kinds() {
        let store = store_with_default_persona().await;
        let engine = default_engine();
        let text = "3. 평가 기준\n기술 (40%), 가격 (30%), 실적 (30%)\n\
                    4. 사업 예산\n총 사업비 120억 원\n\
                    5. 추진 일정\n총 사업기간 30개월";
        let extraction = extract_signals(text, &lex());
        let kinds: Vec<SignalKey> = extraction.signals.iter().map(|s| s.key).collect();
        assert!(kinds.contains(&SignalKey::EvaluationCriteria));
        assert!(kinds.contains(&SignalKey::BudgetAmount));
        assert!(kinds.contains(&SignalKey::TimelineDate));

        adjust_persona(&store, &engine, PERSONA, DOCUMENT, &extraction.signals)
            .await
            .unwrap();
        let state = store.load(PERSONA).await.unwrap();

        assert!(weights_normalized(&state));
        assert!(state.weights.expertise > 0.25, "tech emphasis raised expertise");
        assert!(state.traits.price_sensitivity > 5.0, "price emphasis raised sensitivity");
        assert!(state.thresholds.price < 50.0, "large budget relaxed price threshold");
        assert!(state.weights.track_record > 0.22, "large budget lifted track record");
        assert!(state.weights.stability > 0.15 * 0.8, "long timeline favored stability");
    }

    #[tokio::test]
    async fn test_installment_budget_lifts_stability() {
        let store = store_with_default_persona().await;
        let engine = default_engine();
        let text = "4. 사업 예산\n총 사업비 50억 원, 연차별 분할 계약으로 집행한다";
        let extraction = extract_signals(text, &lex());
        let budget = extraction
            .signals
            .iter()
            .find(|s| s.key == SignalKey::BudgetAmount)
            .expect("budget signal");
        assert_eq!(budget.payload["installments"], 1.0);

        let adjustments = adjust_persona(&store, &engine, PERSONA, DOCUMENT, &extraction.signals)
            .await
            .unwrap();
        assert!(adjustments
            .iter()
            .any(|a| a.reason == "installment schedule boosts stability weight on budget_amount"));

        let state = store.load(PERSONA).await.unwrap();
        assert!(weights_normalized(&state));
        assert!(state.weights.stability > 0.15, "installment schedule lifted stability");
    }

    #[tokio::test]
    async fn test_demanding_kpi_raises_expertise_threshold() {
        let store = store_with_default_persona().await;
        let engine = default_engine();
        let text = "2. 성과 목표\n시스템 가동률 99.9% 달성";
        let extraction = extract_signals(text, &lex());
        let kpi = extraction
            .signals
            .iter()
            .find(|s| s.key == SignalKey::KpiTarget)
            .expect("kpi signal");
        assert!(kpi.payload["target"].as_f64().unwrap() > 95.0);

        adjust_persona(&store, &engine, PERSONA, DOCUMENT, &extraction.signals)
            .await
            .unwrap();
        let state = store.load(PERSONA).await.unwrap();
        assert!(
            state.thresholds.expertise > 65.0,
            "demanding kpi raised the expertise floor above its default"
        );
    }

    #[tokio::test]
    async fn test_tight_timeline_curbs_risk_tolerance() {
        let store = store_with_default_persona().await;
        let engine = default_engine();
        let text = "5. 추진 일정\n계약 후 6개월 내 구축 완료";
        let extraction = extract_signals(text, &lex());

        adjust_persona(&store, &engine, PERSONA, DOCUMENT, &extraction.signals)
            .await
            .unwrap();
        let state = store.load(PERSONA).await.unwrap();
        assert!(state.traits.risk_tolerance < 5.0, "tight deadline curbed risk appetite");
        assert_eq!(state.profile.evaluation_stance, "실행력 중시");
    }

    #[tokio::test]
    async fn test_headerless_document_adjusts_nothing() {
        let store = store_with_default_persona().await;
        let engine = default_engine();
        let extraction = extract_signals("아무 제목 없는 본문이다\n그저 긴 설명이 이어진다", &lex());
        assert_eq!(extraction.sections.len(), 1);
        assert_eq!(extraction.sections[0].section_type, SectionType::Intro);

        let adjustments = adjust_persona(&store, &engine, PERSONA, DOCUMENT, &extraction.signals)
            .await
            .unwrap();
        assert!(adjustments.is_empty());

        let state = store.load(PERSONA).await.unwrap();
        let default = PersonaState::default();
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            serde_json::to_value(&default).unwrap(),
            "state untouched"
        );
    }

    #[tokio::test]
    async fn test_adjust_missing_persona_fails_cleanly() {
        let store = MemoryPersonaStore::new();
        let engine = default_engine();
        let extraction = extract_signals("3. 평가 기준\n기술 (40%)", &lex());
        let err = adjust_persona(&store, &engine, PERSONA, DOCUMENT, &extraction.signals)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PersonaNotFound(_)));
        assert!(store.adjustment_history(PERSONA).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_leaves_store_untouched() {
        let store = store_with_default_persona().await;
        let engine = default_engine();
        let extraction = extract_signals("3. 평가 기준\n기술 (40%)", &lex());
        let outcome = preview_adjustments(&store, &engine, PERSONA, DOCUMENT, &extraction.signals)
            .await
            .unwrap();
        assert!(!outcome.adjustments.is_empty());
        assert!(outcome.state.weights.expertise > 0.25);

        let stored = store.load(PERSONA).await.unwrap();
        assert!((stored.weights.expertise - 0.25).abs() < 1e-12, "no commit happened");
        assert!(store.adjustment_history(PERSONA).await.unwrap().is_empty());
    }
}
