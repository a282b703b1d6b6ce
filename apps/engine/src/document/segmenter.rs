//! Page segmentation: splits raw extracted text into page-sized units and
//! classifies what each page mostly holds.
//!
//! Real page boundaries (form feeds left by the text extractor) are used when
//! present; otherwise a fixed line-count heuristic approximates them. All
//! scoring here is heuristic and deterministic.

use tracing::debug;

use crate::document::lexicon::Lexicon;
use crate::models::document::{ContentKind, PageUnit};

/// Approximate lines per page when no form feeds are present.
const LINES_PER_PAGE: usize = 40;

/// Form feed, the page separator emitted by most text extractors.
const PAGE_BREAK: char = '\u{000C}';

/// Share of tabular-looking lines above which a page is a table, and the
/// lower bound above which it is mixed prose and table.
const TABLE_LINE_RATIO: f64 = 0.5;
const MIXED_LINE_RATIO: f64 = 0.2;

/// Split document text into classified pages. Empty input yields zero pages.
/// Pages with no printable content are dropped but keep their place in the
/// numbering, so provenance page numbers stay true to the source.
pub fn segment_pages(text: &str, lexicon: &Lexicon) -> Vec<PageUnit> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chunks: Vec<String> = if text.contains(PAGE_BREAK) {
        text.split(PAGE_BREAK).map(str::to_string).collect()
    } else {
        text.lines()
            .collect::<Vec<_>>()
            .chunks(LINES_PER_PAGE)
            .map(|lines| lines.join("\n"))
            .collect()
    };

    let mut pages = Vec::with_capacity(chunks.len());
    for (idx, chunk) in chunks.into_iter().enumerate() {
        if chunk.trim().is_empty() {
            continue;
        }
        let content_kind = classify_content(&chunk, lexicon);
        let extraction_confidence = score_extraction(&chunk);
        pages.push(PageUnit {
            page_no: idx as u32 + 1,
            text: chunk,
            content_kind,
            extraction_confidence,
        });
    }
    debug!(pages = pages.len(), "segmented document text");
    pages
}

fn classify_content(text: &str, lexicon: &Lexicon) -> ContentKind {
    let lowered = text.to_lowercase();

    let has_image_cue = lexicon
        .image_cues
        .iter()
        .any(|cue| lowered.contains(&cue.to_lowercase()));
    if has_image_cue && Lexicon::target_ratio(text) < 0.35 {
        return ContentKind::Image;
    }

    let non_empty: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if !non_empty.is_empty() {
        let tabular = non_empty.iter().filter(|l| is_tabular_line(l)).count();
        let ratio = tabular as f64 / non_empty.len() as f64;
        if ratio >= TABLE_LINE_RATIO {
            return ContentKind::Table;
        }
        if ratio >= MIXED_LINE_RATIO {
            return ContentKind::Mixed;
        }
    }

    let has_chart_cue = text.lines().any(|line| {
        let head = line.trim_start().to_lowercase();
        lexicon
            .chart_cues
            .iter()
            .any(|cue| head.starts_with(&cue.to_lowercase()))
    });
    if has_chart_cue {
        return ContentKind::Chart;
    }

    ContentKind::Text
}

/// A line that looks like a table row: cell separators, or a percentage or
/// score token next to digits.
fn is_tabular_line(line: &str) -> bool {
    let separators = line.matches('|').count() + line.matches('\t').count();
    if separators >= 2 {
        return true;
    }
    let has_digit = line.chars().any(|c| c.is_ascii_digit());
    has_digit && (line.contains('%') || line.contains('점'))
}

/// Extraction quality heuristic: base 0.5, plus 0.3 scaled by the
/// target-language character ratio, plus 0.1 each for sentence structure and
/// quantitative tokens. Clamped to [0, 1].
fn score_extraction(text: &str) -> f64 {
    let mut score = 0.5 + 0.3 * Lexicon::target_ratio(text);
    if has_sentence_structure(text) {
        score += 0.1;
    }
    if has_quantitative_tokens(text) {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}

fn has_sentence_structure(text: &str) -> bool {
    let enders = text.matches('.').count() + text.matches('。').count();
    let bullets = text
        .lines()
        .filter(|line| {
            let head = line.trim_start();
            head.starts_with('-')
                || head.starts_with('•')
                || head.starts_with('·')
                || head.starts_with('▶')
                || head.starts_with('○')
        })
        .count();
    enders >= 2 || bullets >= 2
}

fn has_quantitative_tokens(text: &str) -> bool {
    text.chars().filter(|c| c.is_ascii_digit()).count() >= 3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex() -> Lexicon {
        Lexicon::default()
    }

    #[test]
    fn test_empty_input_yields_zero_pages() {
        assert!(segment_pages("", &lex()).is_empty());
        assert!(segment_pages("   \n\n  ", &lex()).is_empty());
    }

    #[test]
    fn test_form_feed_boundaries_win_over_line_count() {
        let text = "첫 페이지 내용\u{000C}둘째 페이지 내용\u{000C}셋째 페이지 내용";
        let pages = segment_pages(text, &lex());
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].page_no, 1);
        assert_eq!(pages[2].page_no, 3);
    }

    #[test]
    fn test_blank_page_skipped_but_numbering_preserved() {
        let text = "첫 페이지\u{000C}\u{000C}셋째 페이지";
        let pages = segment_pages(text, &lex());
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_no, 1);
        assert_eq!(pages[1].page_no, 3, "blank page keeps its slot");
    }

    #[test]
    fn test_line_count_chunking_without_form_feeds() {
        let text = (0..85)
            .map(|i| format!("내용 줄 {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let pages = segment_pages(&text, &lex());
        assert_eq!(pages.len(), 3, "85 lines split into 40/40/5");
        assert_eq!(pages[1].page_no, 2);
    }

    #[test]
    fn test_percent_and_score_lines_classified_as_table() {
        let text = "구분 | 배점 | 비고\n기술 | 40% | 80점\n가격 | 30% | 70점\n실적 | 30% | 90점";
        let pages = segment_pages(text, &lex());
        assert_eq!(pages[0].content_kind, ContentKind::Table);
    }

    #[test]
    fn test_prose_with_some_figures_is_mixed() {
        let lines = [
            "본 사업은 차세대 행정 서비스를 구축하는 사업이다.",
            "기술 부문은 40% 배점으로 평가한다.",
            "사업 기간 동안 단계별로 검수를 진행한다.",
            "모든 산출물은 표준 양식을 따른다.",
            "시스템 안정성 확보 방안을 제시하여야 한다.",
        ];
        let pages = segment_pages(&lines.join("\n"), &lex());
        assert_eq!(pages[0].content_kind, ContentKind::Mixed);
    }

    #[test]
    fn test_chart_caption_page_classified_as_chart() {
        let text = "그림 1. 연도별 예산 추이\n세부 수치는 본문 참조";
        let pages = segment_pages(text, &lex());
        assert_eq!(pages[0].content_kind, ContentKind::Chart);
    }

    #[test]
    fn test_image_placeholder_page_classified_as_image() {
        let text = "[이미지]\n--------";
        let pages = segment_pages(text, &lex());
        assert_eq!(pages[0].content_kind, ContentKind::Image);
    }

    #[test]
    fn test_clean_prose_scores_high_confidence() {
        let text = "본 사업의 목적은 대국민 행정 서비스 품질을 높이는 것이다. \
                    이를 위해 2개 기관의 시스템 15종을 통합한다. \
                    통합 이후 운영 비용은 연간 12% 절감될 것으로 본다.";
        let pages = segment_pages(text, &lex());
        assert!(
            pages[0].extraction_confidence > 0.85,
            "got {}",
            pages[0].extraction_confidence
        );
    }

    #[test]
    fn test_symbol_soup_scores_low_confidence() {
        let text = "◆◆◆ ---- §§§ 1 ==== ****";
        let pages = segment_pages(text, &lex());
        assert!(
            pages[0].extraction_confidence < 0.65,
            "got {}",
            pages[0].extraction_confidence
        );
    }
}
