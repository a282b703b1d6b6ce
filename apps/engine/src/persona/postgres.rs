//! Postgres-backed persona store. State lives as one JSONB document per
//! persona; adjustments are an append-only log.
//! CRITICAL: adjustment rows are only ever INSERTed. Never UPDATE or DELETE
//! them, or the audit trail stops explaining the current state.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::persona::{AdjustmentRow, PersonaRow, PersonaState, StateAdjustment};
use crate::persona::store::PersonaStore;

pub struct PgPersonaStore {
    pool: PgPool,
}

impl PgPersonaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pooled connection to the persona database.
    pub async fn connect(database_url: &str) -> Result<Self, EngineError> {
        info!("Connecting to the persona database");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        info!("Persona database pool established");
        Ok(Self::new(pool))
    }

    /// Create the persona tables and index if they do not exist yet. Safe to
    /// run on every startup.
    pub async fn ensure_schema(&self) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS personas (
                persona_id UUID PRIMARY KEY,
                name       TEXT NOT NULL,
                state      JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS persona_adjustments (
                id               BIGSERIAL PRIMARY KEY,
                persona_id       UUID NOT NULL REFERENCES personas (persona_id),
                document_id      UUID NOT NULL,
                field_path       TEXT NOT NULL,
                before_value     JSONB NOT NULL,
                after_value      JSONB NOT NULL,
                reason           TEXT NOT NULL,
                confidence_score DOUBLE PRECISION NOT NULL,
                created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_persona_adjustments_persona_document
            ON persona_adjustments (persona_id, document_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Persona schema ensured");
        Ok(())
    }
}

#[async_trait]
impl PersonaStore for PgPersonaStore {
    async fn load(&self, persona_id: Uuid) -> Result<PersonaState, EngineError> {
        let row = sqlx::query_as::<_, PersonaRow>(
            "SELECT persona_id, name, state, created_at, updated_at FROM personas WHERE persona_id = $1",
        )
        .bind(persona_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(EngineError::PersonaNotFound(persona_id))?;
        Ok(serde_json::from_value(row.state)?)
    }

    /// Single transaction per run: the state write and every adjustment row
    /// land together or not at all.
    async fn commit(
        &self,
        persona_id: Uuid,
        state: &PersonaState,
        adjustments: &[StateAdjustment],
    ) -> Result<(), EngineError> {
        let state_json = serde_json::to_value(state)?;
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE personas SET state = $2, updated_at = NOW() WHERE persona_id = $1",
        )
        .bind(persona_id)
        .bind(&state_json)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(EngineError::PersonaNotFound(persona_id));
        }

        for adjustment in adjustments {
            sqlx::query(
                r#"
                INSERT INTO persona_adjustments
                    (persona_id, document_id, field_path, before_value,
                     after_value, reason, confidence_score)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(adjustment.persona_id)
            .bind(adjustment.document_id)
            .bind(&adjustment.field_path)
            .bind(&adjustment.before_value)
            .bind(&adjustment.after_value)
            .bind(&adjustment.reason)
            .bind(adjustment.confidence_score)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "Committed persona {persona_id} with {} adjustments",
            adjustments.len()
        );
        Ok(())
    }

    async fn create(
        &self,
        persona_id: Uuid,
        name: &str,
        state: &PersonaState,
    ) -> Result<(), EngineError> {
        let state_json = serde_json::to_value(state)?;
        sqlx::query("INSERT INTO personas (persona_id, name, state) VALUES ($1, $2, $3)")
            .bind(persona_id)
            .bind(name)
            .bind(&state_json)
            .execute(&self.pool)
            .await?;
        info!("Created persona {persona_id} ({name})");
        Ok(())
    }

    async fn adjustment_history(
        &self,
        persona_id: Uuid,
    ) -> Result<Vec<StateAdjustment>, EngineError> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(
            r#"
            SELECT id, persona_id, document_id, field_path, before_value,
                   after_value, reason, confidence_score, created_at
            FROM persona_adjustments
            WHERE persona_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(persona_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| StateAdjustment {
                persona_id: row.persona_id,
                document_id: row.document_id,
                field_path: row.field_path,
                before_value: row.before_value,
                after_value: row.after_value,
                reason: row.reason,
                confidence_score: row.confidence_score,
            })
            .collect())
    }
}
