//! Language lexicon: every language-specific string the pipeline consults.
//!
//! Section classification, criterion canonicalization, semantic clusters and
//! keyword scans all read from this one structure. The built-in seed covers
//! Korean public-sector RFPs with English fallbacks; operators can replace
//! any part of it with a JSON file, and omitted fields keep their seed
//! values. No other module may hard-code document vocabulary.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::document::SectionType;
use crate::models::signal::SignalKey;

/// Title keywords for one section type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionVocab {
    pub section_type: SectionType,
    pub keywords: Vec<String>,
}

/// Canonical criterion name plus the raw labels that map onto it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionAlias {
    pub canonical: String,
    pub aliases: Vec<String>,
}

/// Named bag of related terms for semantic rule matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCluster {
    pub name: String,
    pub terms: Vec<String>,
}

/// Scan keywords that emit a given signal kind when found in section text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalVocab {
    pub key: SignalKey,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub section_titles: Vec<SectionVocab>,
    pub criterion_aliases: Vec<CriterionAlias>,
    pub semantic_clusters: Vec<SemanticCluster>,
    pub signal_keywords: Vec<SignalVocab>,
    pub chart_cues: Vec<String>,
    pub image_cues: Vec<String>,
    pub kpi_line_cues: Vec<String>,
}

impl Lexicon {
    /// Load a lexicon from a JSON file. Fields absent from the file keep
    /// their built-in seed values.
    pub fn from_path(path: &Path) -> Result<Lexicon> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read lexicon file {}", path.display()))?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Lexicon> {
        serde_json::from_str(data).context("failed to parse lexicon JSON")
    }

    /// Whether a character counts toward the target-language ratio:
    /// Hangul syllables and jamo, plus ASCII letters.
    pub fn is_target_char(c: char) -> bool {
        matches!(c,
            '\u{AC00}'..='\u{D7A3}'
            | '\u{1100}'..='\u{11FF}'
            | '\u{3130}'..='\u{318F}'
        ) || c.is_ascii_alphabetic()
    }

    /// Fraction of non-whitespace characters that are target-language
    /// characters. Empty or all-whitespace text scores 0.
    pub fn target_ratio(text: &str) -> f64 {
        let mut total = 0usize;
        let mut hits = 0usize;
        for c in text.chars() {
            if c.is_whitespace() {
                continue;
            }
            total += 1;
            if Self::is_target_char(c) {
                hits += 1;
            }
        }
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Map a raw criterion label to its canonical name. Tries an exact
    /// alias match first, then substring containment, in declared order.
    pub fn canonical_criterion(&self, raw: &str) -> Option<&str> {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        for entry in &self.criterion_aliases {
            if entry
                .aliases
                .iter()
                .any(|alias| alias.to_lowercase() == needle)
            {
                return Some(&entry.canonical);
            }
        }
        for entry in &self.criterion_aliases {
            if entry
                .aliases
                .iter()
                .any(|alias| needle.contains(&alias.to_lowercase()))
            {
                return Some(&entry.canonical);
            }
        }
        None
    }

    /// Classify a candidate heading line by title vocabulary. Ambiguous
    /// titles resolve to the first matching type in the fixed priority
    /// order, independent of lexicon file ordering.
    pub fn title_section_type(&self, line: &str) -> Option<SectionType> {
        let haystack = line.to_lowercase();
        for section_type in SectionType::PRIORITY {
            let Some(vocab) = self
                .section_titles
                .iter()
                .find(|v| v.section_type == section_type)
            else {
                continue;
            };
            if vocab
                .keywords
                .iter()
                .any(|kw| haystack.contains(&kw.to_lowercase()))
            {
                return Some(section_type);
            }
        }
        None
    }

    pub fn signal_keywords_for(&self, key: SignalKey) -> &[String] {
        self.signal_keywords
            .iter()
            .find(|v| v.key == key)
            .map(|v| v.keywords.as_slice())
            .unwrap_or(&[])
    }

    pub fn cluster_terms(&self, name: &str) -> Option<&[String]> {
        self.semantic_clusters
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.terms.as_slice())
    }
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn vocab(section_type: SectionType, words: &[&str]) -> SectionVocab {
    SectionVocab {
        section_type,
        keywords: strings(words),
    }
}

fn alias(canonical: &str, aliases: &[&str]) -> CriterionAlias {
    CriterionAlias {
        canonical: canonical.to_string(),
        aliases: strings(aliases),
    }
}

fn cluster(name: &str, terms: &[&str]) -> SemanticCluster {
    SemanticCluster {
        name: name.to_string(),
        terms: strings(terms),
    }
}

fn signal_vocab(key: SignalKey, words: &[&str]) -> SignalVocab {
    SignalVocab {
        key,
        keywords: strings(words),
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            section_titles: vec![
                vocab(
                    SectionType::Kpi,
                    &[
                        "성과지표",
                        "성과 목표",
                        "성과목표",
                        "핵심성과",
                        "정량적 목표",
                        "kpi",
                        "performance indicator",
                    ],
                ),
                vocab(
                    SectionType::Evaluation,
                    &[
                        "평가",
                        "심사",
                        "배점",
                        "평가기준",
                        "평가항목",
                        "evaluation",
                        "scoring",
                        "assessment criteria",
                    ],
                ),
                vocab(
                    SectionType::Budget,
                    &[
                        "예산",
                        "사업비",
                        "소요예산",
                        "계약금액",
                        "투입예산",
                        "budget",
                        "funding",
                    ],
                ),
                vocab(
                    SectionType::Governance,
                    &[
                        "추진체계",
                        "거버넌스",
                        "운영체계",
                        "수행조직",
                        "governance",
                        "organization structure",
                    ],
                ),
                vocab(
                    SectionType::Technical,
                    &[
                        "기술 요구",
                        "기술요구",
                        "시스템 요구",
                        "기능 요구",
                        "기술적 요구사항",
                        "technical requirement",
                        "specifications",
                    ],
                ),
                vocab(
                    SectionType::Strategic,
                    &["전략", "비전", "추진전략", "strategy", "vision"],
                ),
                vocab(
                    SectionType::Compliance,
                    &[
                        "준수",
                        "법규",
                        "보안 요구",
                        "보안요구",
                        "규정",
                        "compliance",
                        "regulatory",
                    ],
                ),
                vocab(
                    SectionType::Innovation,
                    &["혁신", "신기술", "innovation", "emerging technology"],
                ),
                vocab(
                    SectionType::Intro,
                    &[
                        "개요",
                        "사업 개요",
                        "배경",
                        "목적",
                        "추진 배경",
                        "introduction",
                        "overview",
                        "background",
                    ],
                ),
                vocab(
                    SectionType::Scope,
                    &[
                        "사업 범위",
                        "과업 범위",
                        "과업범위",
                        "과업내용",
                        "사업범위",
                        "scope of work",
                        "scope",
                    ],
                ),
                vocab(
                    SectionType::Timeline,
                    &[
                        "일정",
                        "추진일정",
                        "사업기간",
                        "추진 일정",
                        "schedule",
                        "timeline",
                        "milestone",
                    ],
                ),
            ],
            criterion_aliases: vec![
                alias(
                    "tech",
                    &[
                        "기술",
                        "기술력",
                        "기술부문",
                        "기술평가",
                        "기술능력",
                        "technical",
                        "technology",
                        "tech",
                    ],
                ),
                alias("price", &["가격", "입찰가격", "가격부문", "price", "cost"]),
                alias(
                    "track_record",
                    &[
                        "실적",
                        "수행실적",
                        "사업실적",
                        "track record",
                        "past performance",
                        "experience",
                    ],
                ),
                alias("management", &["경영", "경영상태", "경영능력", "management"]),
                alias(
                    "plan",
                    &["수행계획", "사업계획", "추진계획", "plan", "approach"],
                ),
                alias(
                    "personnel",
                    &["인력", "투입인력", "수행인력", "personnel", "staffing"],
                ),
            ],
            semantic_clusters: vec![
                cluster(
                    "technology",
                    &[
                        "인공지능",
                        "빅데이터",
                        "클라우드",
                        "플랫폼",
                        "데이터",
                        "소프트웨어",
                        "머신러닝",
                        "시스템",
                        "ai",
                        "cloud",
                        "platform",
                        "machine learning",
                        "artificial intelligence",
                    ],
                ),
                cluster(
                    "finance",
                    &[
                        "예산",
                        "비용",
                        "원가",
                        "경제성",
                        "절감",
                        "budget",
                        "cost",
                        "financial",
                    ],
                ),
                cluster(
                    "innovation",
                    &[
                        "혁신",
                        "신기술",
                        "선도",
                        "최초",
                        "첨단",
                        "innovation",
                        "novel",
                        "emerging",
                    ],
                ),
                cluster(
                    "compliance",
                    &[
                        "보안",
                        "법규",
                        "준수",
                        "인증",
                        "개인정보",
                        "security",
                        "compliance",
                        "certification",
                        "privacy",
                    ],
                ),
                cluster(
                    "digital_government",
                    &[
                        "전자정부",
                        "디지털플랫폼",
                        "공공데이터",
                        "행정서비스",
                        "디지털 전환",
                        "digital government",
                        "public data",
                    ],
                ),
                cluster(
                    "sustainability",
                    &[
                        "친환경",
                        "탄소중립",
                        "에너지 효율",
                        "sustainability",
                        "carbon",
                        "green",
                    ],
                ),
            ],
            signal_keywords: vec![
                signal_vocab(
                    SignalKey::GovernanceStructure,
                    &[
                        "추진위원회",
                        "자문위원회",
                        "전담조직",
                        "운영위원회",
                        "pmo",
                        "tf",
                        "steering committee",
                        "working group",
                    ],
                ),
                signal_vocab(
                    SignalKey::TechnicalRequirement,
                    &[
                        "시스템 구축",
                        "연계",
                        "표준 프레임워크",
                        "인터페이스",
                        "성능 요구",
                        "가용성",
                        "interface",
                        "integration",
                        "availability",
                    ],
                ),
                signal_vocab(
                    SignalKey::StrategicTheme,
                    &[
                        "디지털 전환",
                        "혁신성장",
                        "국정과제",
                        "중장기",
                        "digital transformation",
                        "modernization",
                    ],
                ),
                signal_vocab(
                    SignalKey::ComplianceMention,
                    &[
                        "개인정보보호",
                        "보안성 검토",
                        "정보보호",
                        "감리",
                        "isms",
                        "iso",
                        "security review",
                        "audit",
                    ],
                ),
                signal_vocab(
                    SignalKey::InnovationMention,
                    &[
                        "신기술 적용",
                        "지능형",
                        "자동화",
                        "첨단",
                        "ai 기반",
                        "proof of concept",
                        "pilot",
                    ],
                ),
                signal_vocab(
                    SignalKey::ScopeItem,
                    &[
                        "구축",
                        "고도화",
                        "유지보수",
                        "컨설팅",
                        "운영 지원",
                        "development",
                        "maintenance",
                    ],
                ),
            ],
            chart_cues: strings(&["그림", "차트", "그래프", "figure", "chart", "graph"]),
            image_cues: strings(&["[이미지]", "[image]", "<image>", "사진"]),
            kpi_line_cues: strings(&["달성", "목표치", "지표", "만족도", "target", "achieve"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_criterion_exact_match() {
        let lex = Lexicon::default();
        assert_eq!(lex.canonical_criterion("기술"), Some("tech"));
        assert_eq!(lex.canonical_criterion("  가격 "), Some("price"));
        assert_eq!(lex.canonical_criterion("Technical"), Some("tech"));
    }

    #[test]
    fn test_canonical_criterion_containment_fallback() {
        let lex = Lexicon::default();
        assert_eq!(lex.canonical_criterion("기술능력평가"), Some("tech"));
        assert_eq!(lex.canonical_criterion("수행실적 부문"), Some("track_record"));
    }

    #[test]
    fn test_canonical_criterion_unknown_is_none() {
        let lex = Lexicon::default();
        assert_eq!(lex.canonical_criterion("디자인"), None);
        assert_eq!(lex.canonical_criterion(""), None);
    }

    #[test]
    fn test_title_section_type_uses_priority_order() {
        let lex = Lexicon::default();
        // "성과지표 평가" matches both kpi and evaluation vocab; kpi wins.
        assert_eq!(
            lex.title_section_type("성과지표 평가"),
            Some(SectionType::Kpi)
        );
        assert_eq!(
            lex.title_section_type("3. 평가 기준"),
            Some(SectionType::Evaluation)
        );
        assert_eq!(lex.title_section_type("임의의 제목"), None);
    }

    #[test]
    fn test_target_ratio_korean_and_english() {
        assert!(Lexicon::target_ratio("클라우드 기반 시스템") > 0.9);
        assert!(Lexicon::target_ratio("cloud based system") > 0.9);
        assert!(Lexicon::target_ratio("§§ ◆◆ 123 ---") < 0.1);
        assert_eq!(Lexicon::target_ratio("   "), 0.0);
    }

    #[test]
    fn test_from_json_partial_file_keeps_seed_defaults() {
        let lex = Lexicon::from_json(
            r#"{
                "criterion_aliases": [
                    {"canonical": "design", "aliases": ["디자인"]}
                ]
            }"#,
        )
        .unwrap();
        // Overridden field replaced wholesale.
        assert_eq!(lex.canonical_criterion("디자인"), Some("design"));
        assert_eq!(lex.canonical_criterion("기술"), None);
        // Untouched fields keep the seed.
        assert!(!lex.section_titles.is_empty());
        assert!(lex.cluster_terms("technology").is_some());
    }

    #[test]
    fn test_signal_keywords_for_unknown_key_is_empty() {
        let lex = Lexicon::default();
        assert!(!lex
            .signal_keywords_for(SignalKey::GovernanceStructure)
            .is_empty());
        assert!(lex.signal_keywords_for(SignalKey::BudgetAmount).is_empty());
    }
}
