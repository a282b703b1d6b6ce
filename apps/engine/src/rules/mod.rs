//! Rule engine: compiled match conditions, bounded transforms, the ordered
//! evaluation fold, and the built-in rule seed.

pub mod engine;
pub mod matcher;
pub mod seed;
pub mod transform;

pub use engine::{RuleEngine, RunOutcome};
pub use seed::{default_rule_set, load_rule_set};
