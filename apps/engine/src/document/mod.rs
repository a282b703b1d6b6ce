//! Document ingestion side of the pipeline: segmentation into pages,
//! structuring into typed sections, and the language lexicon both lean on.

pub mod lexicon;
pub mod normalizer;
pub mod segmenter;
pub mod structurer;

pub use lexicon::Lexicon;
pub use segmenter::segment_pages;
pub use structurer::structure_sections;
