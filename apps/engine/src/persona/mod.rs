//! Persona state management: post-run normalization and the persistence
//! seam with its in-memory and Postgres implementations.

pub mod normalizer;
pub mod postgres;
pub mod store;

pub use normalizer::{normalize_state, weights_normalized};
pub use postgres::PgPersonaStore;
pub use store::{MemoryPersonaStore, PersonaStore};
