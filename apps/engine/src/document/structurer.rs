//! Section structuring: walks page text line by line, opens a new section at
//! every line that looks like a heading, and accumulates everything else into
//! the open section. Text before the first heading lands in an implicit
//! intro section, so no input line is ever dropped.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::document::lexicon::Lexicon;
use crate::document::normalizer::normalize_payload;
use crate::models::document::{DocumentSection, PageRange, PageUnit, SectionType};

/// Headings longer than this are treated as body text.
const MAX_HEADING_CHARS: usize = 50;

/// Keyword-only headings (no numbering) must be this short to count.
const MAX_KEYWORD_TITLE_CHARS: usize = 30;

/// Content length at which the length share of the confidence score maxes out.
const FULL_CONTENT_CHARS: f64 = 600.0;

/// Title given to the implicit section that collects preamble text.
const IMPLICIT_INTRO_TITLE: &str = "(도입부)";

/// Arabic (`1.`, `2.3`), Roman (`IV.`) and Korean legal (`제3장`) numbering.
static NUMBERED_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d{1,2}(?:\.\d{1,2})*[.)]?|[IVXLC]+\.|제\s*\d{1,3}\s*(?:장|절|조))\s+\S")
        .expect("valid numbered heading regex")
});

struct OpenSection {
    section_type: SectionType,
    title: String,
    lines: Vec<String>,
    page_start: u32,
    page_end: u32,
}

/// Assemble ordered sections from segmented pages.
pub fn structure_sections(pages: &[PageUnit], lexicon: &Lexicon) -> Vec<DocumentSection> {
    let mut sections: Vec<DocumentSection> = Vec::new();
    let mut open: Option<OpenSection> = None;

    for page in pages {
        for line in page.text.lines() {
            if let Some(section_type) = heading_type(line, lexicon) {
                if let Some(done) = open.take() {
                    sections.push(finalize(done, lexicon));
                }
                open = Some(OpenSection {
                    section_type,
                    title: line.trim().to_string(),
                    lines: Vec::new(),
                    page_start: page.page_no,
                    page_end: page.page_no,
                });
                continue;
            }
            if line.trim().is_empty() && open.is_none() {
                continue;
            }
            let section = open.get_or_insert_with(|| OpenSection {
                section_type: SectionType::Intro,
                title: IMPLICIT_INTRO_TITLE.to_string(),
                lines: Vec::new(),
                page_start: page.page_no,
                page_end: page.page_no,
            });
            section.lines.push(line.to_string());
            section.page_end = page.page_no;
        }
    }
    if let Some(done) = open.take() {
        sections.push(finalize(done, lexicon));
    }
    debug!(sections = sections.len(), "structured document sections");
    sections
}

/// Decide whether a line opens a section, and of which type.
///
/// Numbered headings always open one; without a vocabulary match they fall
/// back to intro rather than inventing a type outside the closed set.
/// Keyword-only headings must additionally look like a standalone title.
fn heading_type(line: &str, lexicon: &Lexicon) -> Option<SectionType> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    if trimmed.starts_with(['-', '•', '·', '▶', '○', '*']) {
        return None;
    }
    let by_vocab = lexicon.title_section_type(trimmed);
    if NUMBERED_HEADING_RE.is_match(trimmed) {
        return Some(by_vocab.unwrap_or(SectionType::Intro));
    }
    if by_vocab.is_some() && looks_like_title(trimmed) {
        return by_vocab;
    }
    None
}

// Keyword-only titles carry no digits; numbered lines go through the
// numbering branch instead, which keeps data lines like "총 사업기간 18개월"
// in the body.
fn looks_like_title(trimmed: &str) -> bool {
    trimmed.chars().count() <= MAX_KEYWORD_TITLE_CHARS
        && trimmed.split_whitespace().count() <= 6
        && !trimmed.chars().any(|c| c.is_ascii_digit())
        && !trimmed.ends_with('.')
        && !trimmed.ends_with('다')
        && !trimmed.ends_with(',')
}

fn finalize(open: OpenSection, lexicon: &Lexicon) -> DocumentSection {
    let content = open.lines.join("\n").trim().to_string();
    let normalized_payload = normalize_payload(open.section_type, &content, lexicon);
    let has_payload = normalized_payload
        .as_object()
        .map(|o| !o.is_empty())
        .unwrap_or(false);

    let length_share = (content.chars().count() as f64 / FULL_CONTENT_CHARS).min(1.0);
    let mut confidence = 0.35 + 0.35 * length_share;
    if has_payload {
        confidence += 0.3;
    }

    DocumentSection {
        section_type: open.section_type,
        title: open.title,
        content,
        page_range: PageRange {
            start: open.page_start,
            end: open.page_end,
        },
        confidence: confidence.clamp(0.0, 1.0),
        normalized_payload,
    }
}
