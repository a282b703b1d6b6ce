//! Signal extraction: domain pattern matchers and the per-section extractor
//! built on them.

pub mod extractor;
pub mod patterns;

pub use extractor::extract_from_sections;
