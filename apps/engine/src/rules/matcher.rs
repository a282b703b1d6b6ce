//! Rule match conditions, compiled once at engine construction.
//!
//! Compiling up front means malformed patterns are reported a single time as
//! configuration warnings and the rule simply never matches, instead of
//! re-parsing (and re-warning) on every signal.

use regex::Regex;
use tracing::warn;

use crate::document::lexicon::Lexicon;
use crate::models::rule::{ImpactRule, MatchType};
use crate::models::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
}

impl CmpOp {
    fn eval(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Eq => (lhs - rhs).abs() < 1e-9,
        }
    }
}

#[derive(Debug)]
pub enum CompiledMatcher {
    Exact(String),
    /// Lowercased pattern for case-insensitive containment.
    Includes(String),
    Regex(Regex),
    Threshold {
        field: String,
        op: CmpOp,
        value: f64,
    },
    /// Cluster terms resolved from the lexicon, lowercased.
    Semantic(Vec<String>),
    /// Produced from unparseable patterns; matches nothing.
    Never,
}

/// A rule paired with its compiled match condition.
#[derive(Debug)]
pub struct CompiledRule {
    pub rule: ImpactRule,
    pub matcher: CompiledMatcher,
}

impl CompiledRule {
    pub fn compile(rule: ImpactRule, lexicon: &Lexicon) -> CompiledRule {
        let matcher = match rule.match_type {
            MatchType::Exact => CompiledMatcher::Exact(rule.match_pattern.clone()),
            MatchType::Includes => CompiledMatcher::Includes(rule.match_pattern.to_lowercase()),
            MatchType::Regex => match Regex::new(&rule.match_pattern) {
                Ok(re) => CompiledMatcher::Regex(re),
                Err(err) => {
                    warn!(rule = %rule.name, %err, "invalid regex pattern, rule will never match");
                    CompiledMatcher::Never
                }
            },
            MatchType::Threshold => match parse_threshold(&rule.match_pattern) {
                Some((field, op, value)) => CompiledMatcher::Threshold { field, op, value },
                None => {
                    warn!(
                        rule = %rule.name,
                        pattern = %rule.match_pattern,
                        "unparseable threshold pattern, rule will never match"
                    );
                    CompiledMatcher::Never
                }
            },
            MatchType::Semantic => match lexicon.cluster_terms(&rule.match_pattern) {
                Some(terms) => {
                    CompiledMatcher::Semantic(terms.iter().map(|t| t.to_lowercase()).collect())
                }
                None => {
                    warn!(
                        rule = %rule.name,
                        cluster = %rule.match_pattern,
                        "unknown semantic cluster, rule will never match"
                    );
                    CompiledMatcher::Never
                }
            },
        };
        CompiledRule { rule, matcher }
    }

    /// Whether this rule's condition holds for the signal. Key filtering is
    /// the engine's job; this only evaluates the pattern.
    pub fn matches(&self, signal: &Signal) -> bool {
        match &self.matcher {
            CompiledMatcher::Exact(pat) => signal.value == *pat,
            CompiledMatcher::Includes(pat) => signal.value.to_lowercase().contains(pat),
            CompiledMatcher::Regex(re) => re.is_match(&signal.value),
            CompiledMatcher::Threshold { field, op, value } => signal
                .payload_number(field)
                .map(|actual| op.eval(actual, *value))
                .unwrap_or(false),
            CompiledMatcher::Semantic(terms) => {
                let haystack = signal.value.to_lowercase();
                terms.iter().any(|t| haystack.contains(t))
            }
            CompiledMatcher::Never => false,
        }
    }
}

/// Parse `field OP number`, OP in `>=`, `<=`, `==`, `>`, `<`. Two-character
/// operators are tried first so `>=` is never read as `>`.
fn parse_threshold(pattern: &str) -> Option<(String, CmpOp, f64)> {
    const OPS: [(&str, CmpOp); 5] = [
        (">=", CmpOp::Ge),
        ("<=", CmpOp::Le),
        ("==", CmpOp::Eq),
        (">", CmpOp::Gt),
        ("<", CmpOp::Lt),
    ];
    for (token, op) in OPS {
        if let Some((lhs, rhs)) = pattern.split_once(token) {
            let field = lhs.trim();
            let value = rhs.trim().parse::<f64>().ok()?;
            if field.is_empty() {
                return None;
            }
            return Some((field.to_string(), op, value));
        }
    }
    None
}
