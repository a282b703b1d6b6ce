//! Core data model shared by every pipeline stage.

pub mod document;
pub mod persona;
pub mod rule;
pub mod signal;

pub use document::{ContentKind, DocumentSection, PageRange, PageUnit, SectionType};
pub use persona::{
    declared_range, FieldValue, FocusKeywords, MetricThresholds, MetricWeights, PersonaProfile,
    PersonaState, PersonaTraits, StateAdjustment, METRICS,
};
pub use rule::{ImpactRule, MatchType, TransformType};
pub use signal::{Signal, SignalKey, SourceRef};
