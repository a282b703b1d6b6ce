//! Document-side data model: pages produced by segmentation and the labeled
//! sections built on top of them. Both are immutable once the pipeline stage
//! that created them has finished.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provisional content classification of one extracted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Table,
    Mixed,
    Chart,
    Image,
}

/// A page-sized unit of extracted document text.
///
/// Created once per page during segmentation and never mutated afterwards.
/// `extraction_confidence` is a heuristic quality score for the extracted
/// text itself, not for anything derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageUnit {
    /// 1-based page number.
    pub page_no: u32,
    pub text: String,
    pub content_kind: ContentKind,
    /// 0.0 – 1.0
    pub extraction_confidence: f64,
}

/// The closed set of section labels the structurer can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Kpi,
    Evaluation,
    Budget,
    Governance,
    Technical,
    Strategic,
    Compliance,
    Innovation,
    Intro,
    Scope,
    Timeline,
}

impl SectionType {
    /// Fixed disambiguation order: when a title line matches the vocabulary of
    /// several types, the earliest entry here wins.
    pub const PRIORITY: [SectionType; 11] = [
        SectionType::Kpi,
        SectionType::Evaluation,
        SectionType::Budget,
        SectionType::Governance,
        SectionType::Technical,
        SectionType::Strategic,
        SectionType::Compliance,
        SectionType::Innovation,
        SectionType::Intro,
        SectionType::Scope,
        SectionType::Timeline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Kpi => "kpi",
            SectionType::Evaluation => "evaluation",
            SectionType::Budget => "budget",
            SectionType::Governance => "governance",
            SectionType::Technical => "technical",
            SectionType::Strategic => "strategic",
            SectionType::Compliance => "compliance",
            SectionType::Innovation => "innovation",
            SectionType::Intro => "intro",
            SectionType::Scope => "scope",
            SectionType::Timeline => "timeline",
        }
    }
}

/// Inclusive page span owned by a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

/// A labeled, contiguous span of document text.
///
/// One document produces an ordered sequence of these; `normalized_payload`
/// holds the per-type structured summary (e.g. parsed criterion weights for
/// an evaluation section) and is an empty JSON object when the normalizer
/// found nothing to extract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSection {
    pub section_type: SectionType,
    pub title: String,
    pub content: String,
    pub page_range: PageRange,
    /// 0.0 – 1.0 heuristic score from content length and normalized data.
    pub confidence: f64,
    pub normalized_payload: Value,
}
