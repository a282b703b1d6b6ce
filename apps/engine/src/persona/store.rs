//! Persona persistence seam.
//!
//! The pipeline only ever talks to `PersonaStore`, so the rule engine stays
//! testable without a database. `MemoryPersonaStore` backs tests and dry
//! runs; the Postgres implementation lives in [`crate::persona::postgres`].

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::persona::{PersonaState, StateAdjustment};

/// Durable storage for persona state and its append-only adjustment log.
///
/// `commit` must be atomic: either the new state and every adjustment land
/// together, or nothing does.
#[async_trait]
pub trait PersonaStore: Send + Sync {
    async fn load(&self, persona_id: Uuid) -> Result<PersonaState, EngineError>;

    async fn commit(
        &self,
        persona_id: Uuid,
        state: &PersonaState,
        adjustments: &[StateAdjustment],
    ) -> Result<(), EngineError>;

    async fn create(
        &self,
        persona_id: Uuid,
        name: &str,
        state: &PersonaState,
    ) -> Result<(), EngineError>;

    async fn adjustment_history(
        &self,
        persona_id: Uuid,
    ) -> Result<Vec<StateAdjustment>, EngineError>;
}

struct PersonaRecord {
    #[allow(dead_code)]
    name: String,
    state: PersonaState,
}

/// In-memory store with the same commit semantics as the Postgres one.
#[derive(Default)]
pub struct MemoryPersonaStore {
    personas: RwLock<HashMap<Uuid, PersonaRecord>>,
    adjustments: RwLock<Vec<StateAdjustment>>,
}

impl MemoryPersonaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonaStore for MemoryPersonaStore {
    async fn load(&self, persona_id: Uuid) -> Result<PersonaState, EngineError> {
        let personas = self.personas.read().await;
        personas
            .get(&persona_id)
            .map(|r| r.state.clone())
            .ok_or(EngineError::PersonaNotFound(persona_id))
    }

    async fn commit(
        &self,
        persona_id: Uuid,
        state: &PersonaState,
        adjustments: &[StateAdjustment],
    ) -> Result<(), EngineError> {
        // The personas lock is held across the log append so a failed lookup
        // never leaves partial adjustments behind.
        let mut personas = self.personas.write().await;
        let record = personas
            .get_mut(&persona_id)
            .ok_or(EngineError::PersonaNotFound(persona_id))?;
        record.state = state.clone();
        let mut log = self.adjustments.write().await;
        log.extend_from_slice(adjustments);
        Ok(())
    }

    async fn create(
        &self,
        persona_id: Uuid,
        name: &str,
        state: &PersonaState,
    ) -> Result<(), EngineError> {
        let mut personas = self.personas.write().await;
        if personas.contains_key(&persona_id) {
            return Err(EngineError::Validation(format!(
                "persona {persona_id} already exists"
            )));
        }
        personas.insert(
            persona_id,
            PersonaRecord {
                name: name.to_string(),
                state: state.clone(),
            },
        );
        Ok(())
    }

    async fn adjustment_history(
        &self,
        persona_id: Uuid,
    ) -> Result<Vec<StateAdjustment>, EngineError> {
        let log = self.adjustments.read().await;
        Ok(log
            .iter()
            .filter(|a| a.persona_id == persona_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_adjustment(persona_id: Uuid, field_path: &str) -> StateAdjustment {
        StateAdjustment {
            persona_id,
            document_id: Uuid::from_u128(0xD0C),
            field_path: field_path.to_string(),
            before_value: json!(0.25),
            after_value: json!(0.31),
            reason: "test rule on evaluation_criteria".to_string(),
            confidence_score: 0.81,
        }
    }

    #[tokio::test]
    async fn test_create_load_round_trip() {
        let store = MemoryPersonaStore::new();
        let id = Uuid::from_u128(1);
        let mut state = PersonaState::default();
        state.weights.expertise = 0.31;
        store.create(id, "테스트 평가자", &state).await.unwrap();
        let loaded = store.load(id).await.unwrap();
        assert!((loaded.weights.expertise - 0.31).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_load_missing_persona_fails() {
        let store = MemoryPersonaStore::new();
        let err = store.load(Uuid::from_u128(42)).await.unwrap_err();
        assert!(matches!(err, EngineError::PersonaNotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = MemoryPersonaStore::new();
        let id = Uuid::from_u128(2);
        let state = PersonaState::default();
        store.create(id, "첫 번째", &state).await.unwrap();
        let err = store.create(id, "중복", &state).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_commit_updates_state_and_appends_log() {
        let store = MemoryPersonaStore::new();
        let id = Uuid::from_u128(3);
        store
            .create(id, "평가자", &PersonaState::default())
            .await
            .unwrap();

        let mut state = PersonaState::default();
        state.weights.expertise = 0.31;
        let adjustments = vec![
            make_adjustment(id, "weights.expertise"),
            make_adjustment(id, "weights.price"),
        ];
        store.commit(id, &state, &adjustments).await.unwrap();

        let loaded = store.load(id).await.unwrap();
        assert!((loaded.weights.expertise - 0.31).abs() < 1e-12);
        let history = store.adjustment_history(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].field_path, "weights.expertise");
    }

    #[tokio::test]
    async fn test_commit_to_missing_persona_writes_nothing() {
        let store = MemoryPersonaStore::new();
        let missing = Uuid::from_u128(4);
        let err = store
            .commit(
                missing,
                &PersonaState::default(),
                &[make_adjustment(missing, "weights.expertise")],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PersonaNotFound(_)));
        assert!(store.adjustment_history(missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_filtered_by_persona() {
        let store = MemoryPersonaStore::new();
        let a = Uuid::from_u128(5);
        let b = Uuid::from_u128(6);
        store.create(a, "a", &PersonaState::default()).await.unwrap();
        store.create(b, "b", &PersonaState::default()).await.unwrap();
        store
            .commit(a, &PersonaState::default(), &[make_adjustment(a, "weights.price")])
            .await
            .unwrap();
        assert_eq!(store.adjustment_history(a).await.unwrap().len(), 1);
        assert!(store.adjustment_history(b).await.unwrap().is_empty());
    }
}
