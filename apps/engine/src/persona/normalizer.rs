//! Post-run state normalization: restores the declared invariants after all
//! transforms have been applied, immediately before commit.

use tracing::debug;

use crate::models::persona::{PersonaState, METRICS};

/// Tolerance on the weight-sum invariant.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Clamp every bounded field to its declared range and rescale the metric
/// weights to sum to 1.0. A zero weight vector is reset to the uniform
/// distribution rather than divided by zero.
pub fn normalize_state(state: &mut PersonaState) {
    state.traits.risk_tolerance = state.traits.risk_tolerance.clamp(1.0, 10.0);
    state.traits.detail_orientation = state.traits.detail_orientation.clamp(1.0, 10.0);
    state.traits.price_sensitivity = state.traits.price_sensitivity.clamp(1.0, 10.0);
    state.traits.innovation_appetite = state.traits.innovation_appetite.clamp(1.0, 10.0);

    for metric in METRICS {
        if let Some(t) = state.thresholds.get(metric) {
            state.thresholds.set(metric, t.clamp(0.0, 100.0));
        }
        if let Some(w) = state.weights.get(metric) {
            state.weights.set(metric, w.max(0.0));
        }
    }

    let sum = state.weights.sum();
    if sum <= WEIGHT_SUM_TOLERANCE {
        debug!("weight vector collapsed to zero, resetting to uniform");
        let uniform = 1.0 / METRICS.len() as f64;
        for metric in METRICS {
            state.weights.set(metric, uniform);
        }
        return;
    }
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        for metric in METRICS {
            if let Some(w) = state.weights.get(metric) {
                state.weights.set(metric, w / sum);
            }
        }
    }
}

/// Whether the weight invariant currently holds.
pub fn weights_normalized(state: &PersonaState) -> bool {
    let all_non_negative = state.weights.as_pairs().iter().all(|(_, w)| *w >= 0.0);
    all_non_negative && (state.weights.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
}
