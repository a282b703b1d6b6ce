//! RFP analysis engine: segments raw document text into pages, structures
//! pages into typed sections, extracts typed signals from them, and folds
//! impact rules over evaluator persona state with an append-only audit
//! trail.
//!
//! Extraction is pure and synchronous. Everything stateful goes through the
//! [`persona::PersonaStore`] seam, so the adjustment pipeline runs the same
//! against Postgres and against the in-memory store used in tests.

pub mod config;
pub mod document;
pub mod errors;
pub mod models;
pub mod persona;
pub mod pipeline;
pub mod rules;
pub mod signals;

pub use document::Lexicon;
pub use errors::EngineError;
pub use persona::{PersonaStore, PgPersonaStore};
pub use pipeline::{adjust_persona, extract_signals, preview_adjustments, ExtractionOutcome};
pub use rules::{default_rule_set, load_rule_set, RuleEngine, RunOutcome};
