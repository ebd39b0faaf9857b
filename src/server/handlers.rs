//! Request handlers for the triage API

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use ndarray::Array2;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::dataset::FEATURE_NAMES;

use super::error::{ApiError, Result};
use super::state::AppState;

/// One scored patient, in the same position as its input element
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOut {
    pub id: Option<String>,
    /// Raw regression output (disease-progression index)
    pub progression: f64,
    /// Affinely rescaled, clamped to [0, 1]
    pub risk_score: f64,
}

/// Health probe. Never fails: a missing model is reported through
/// `model_loaded`, not an error status.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let model = state.model.read().await;
    Json(json!({
        "status": "ok",
        "model_loaded": model.is_loaded(),
        "model_version": model.version(),
    }))
}

/// Score a batch of feature vectors.
///
/// The body is a JSON array of objects with the ten feature fields plus an
/// optional `id`. An empty array returns an empty array. Any malformed
/// element fails the whole request with a 422 naming its position.
/// Extraction failures (unparseable JSON, wrong content-type) get the same
/// 422 error shape instead of the extractor's plain-text rejection.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<PredictionOut>>> {
    let Json(payload) =
        payload.map_err(|e| ApiError::validation(format!("invalid request body: {}", e)))?;

    let batch = payload
        .as_array()
        .ok_or_else(|| ApiError::validation("expected a JSON array of patient objects"))?;

    if batch.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let mut rows = Vec::with_capacity(batch.len() * FEATURE_NAMES.len());
    let mut ids = Vec::with_capacity(batch.len());

    for (index, element) in batch.iter().enumerate() {
        let obj = element
            .as_object()
            .ok_or_else(|| ApiError::element(index, None, "expected an object"))?;

        for name in FEATURE_NAMES {
            let value = obj
                .get(name)
                .ok_or_else(|| ApiError::element(index, Some(name), "missing field"))?;
            let number = value
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    ApiError::element(index, Some(name), "must be a finite number")
                })?;
            rows.push(number);
        }

        let id = match obj.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(ApiError::element(index, Some("id"), "must be a string"));
            }
        };
        ids.push(id);
    }

    let x = Array2::from_shape_vec((batch.len(), FEATURE_NAMES.len()), rows)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let scored = state.predict(&x).await?;

    let results = ids
        .into_iter()
        .zip(scored)
        .map(|(id, (progression, risk_score))| PredictionOut {
            id,
            progression,
            risk_score,
        })
        .collect();

    Ok(Json(results))
}
