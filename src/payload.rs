use serde_json::Value;

use crate::error::{Result, ViewerError};

/// Sample interval assumed when the service sends neither `Time` nor `dt`.
pub const DEFAULT_DT: f64 = 0.1;

// ---------------------------------------------------------------------------
// Normalized simulation result
// ---------------------------------------------------------------------------

/// Simulation result in the shape both renderers consume.
///
/// `time`, `position` and `velocity` always have the same, non-zero length.
/// Individual samples are kept as received and may be malformed (wrong
/// component count or NaN entries); renderers decide how to treat them.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    time: Vec<f64>,
    position: Vec<Vec<f64>>,
    velocity: Vec<Vec<f64>>,
    run_id: Option<i64>,
}

impl Payload {
    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn position(&self) -> &[Vec<f64>] {
        &self.position
    }

    pub fn velocity(&self) -> &[Vec<f64>] {
        &self.velocity
    }

    /// Identifier the backend assigned to this run, if any.
    pub fn run_id(&self) -> Option<i64> {
        self.run_id
    }

    pub fn final_position(&self) -> Option<&[f64]> {
        self.position.last().map(|p| p.as_slice())
    }

    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Unwrap and validate a raw service response.
///
/// Accepts the result object directly or wrapped one level under `result`.
pub fn normalize(raw: Value) -> Result<Payload> {
    normalize_with(raw, DEFAULT_DT)
}

/// Like [`normalize`], with the sample interval used when the payload
/// carries neither `Time` nor `dt`.
pub fn normalize_with(raw: Value, default_dt: f64) -> Result<Payload> {
    let run_id = raw.get("id").and_then(Value::as_i64);
    let body = match raw.get("result") {
        Some(inner) if inner.is_object() => inner,
        _ => &raw,
    };

    let position = samples(body.get("Position"))
        .ok_or_else(|| ViewerError::Data("No valid data to plot.".into()))?;
    let velocity = samples(body.get("Velocity"))
        .ok_or_else(|| ViewerError::Data("No valid data to plot.".into()))?;
    if velocity.len() != position.len() {
        return Err(ViewerError::Data("Inconsistent velocity data.".into()));
    }

    let time = match body.get("Time") {
        Some(t) if !t.is_null() => explicit_time(t, position.len())?,
        _ => {
            let dt = body
                .get("dt")
                .and_then(Value::as_f64)
                .filter(|dt| dt.is_finite() && *dt > 0.0)
                .unwrap_or(default_dt);
            (0..position.len()).map(|i| i as f64 * dt).collect()
        }
    };

    Ok(Payload {
        time,
        position,
        velocity,
        run_id: run_id.or_else(|| body.get("id").and_then(Value::as_i64)),
    })
}

/// Non-empty array of samples; non-numeric components become NaN.
fn samples(field: Option<&Value>) -> Option<Vec<Vec<f64>>> {
    let arr = field?.as_array()?;
    if arr.is_empty() {
        return None;
    }
    let out = arr
        .iter()
        .map(|s| match s.as_array() {
            Some(comps) => comps.iter().map(|c| c.as_f64().unwrap_or(f64::NAN)).collect(),
            None => Vec::new(),
        })
        .collect();
    Some(out)
}

fn explicit_time(field: &Value, expected: usize) -> Result<Vec<f64>> {
    let inconsistent = || ViewerError::Data("Inconsistent time data.".into());
    let arr = field.as_array().ok_or_else(inconsistent)?;
    if arr.len() != expected {
        return Err(inconsistent());
    }
    arr.iter().map(|t| t.as_f64().ok_or_else(inconsistent)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_result_and_synthesizes_time() {
        let raw = json!({
            "result": {
                "Position": [[0, 0, 0], [1, 1, 1]],
                "Velocity": [[0, 0, 0], [1, 1, 1]]
            }
        });
        let p = normalize(raw).unwrap();
        assert_eq!(p.time(), &[0.0, 0.1]);
        assert_eq!(p.position()[1], vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn accepts_unwrapped_payload_with_time() {
        let raw = json!({
            "Time": [0.0, 0.05, 0.1],
            "Position": [[0, 0, 10], [0.05, 0, 9.99], [0.1, 0, 9.95]],
            "Velocity": [[1, 0, 0], [1, 0, -0.5], [1, 0, -1]]
        });
        let p = normalize(raw).unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.duration() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn time_length_mismatch_is_data_error() {
        let raw = json!({
            "Position": [[0, 0, 0], [1, 1, 1]],
            "Velocity": [[0, 0, 0], [1, 1, 1]],
            "Time": [0, 1, 2]
        });
        assert_eq!(
            normalize(raw),
            Err(ViewerError::Data("Inconsistent time data.".into()))
        );
    }

    #[test]
    fn null_time_is_synthesized() {
        let raw = json!({
            "Position": [[0, 0, 0], [0, 0, 1]],
            "Velocity": [[0, 0, 1], [0, 0, 1]],
            "Time": null
        });
        assert_eq!(normalize(raw).unwrap().time(), &[0.0, DEFAULT_DT]);
    }

    #[test]
    fn non_numeric_time_is_data_error() {
        let raw = json!({
            "Position": [[0, 0, 0]],
            "Velocity": [[0, 0, 0]],
            "Time": ["zero"]
        });
        assert!(matches!(normalize(raw), Err(ViewerError::Data(_))));
    }

    #[test]
    fn missing_or_empty_samples_are_data_errors() {
        for raw in [
            json!({}),
            json!({ "Position": [], "Velocity": [] }),
            json!({ "Position": [[0, 0, 0]] }),
            json!({ "Position": "nope", "Velocity": [[0, 0, 0]] }),
        ] {
            assert_eq!(
                normalize(raw),
                Err(ViewerError::Data("No valid data to plot.".into()))
            );
        }
    }

    #[test]
    fn velocity_length_mismatch_is_data_error() {
        let raw = json!({
            "Position": [[0, 0, 0], [1, 1, 1]],
            "Velocity": [[0, 0, 0]]
        });
        assert!(matches!(normalize(raw), Err(ViewerError::Data(_))));
    }

    #[test]
    fn payload_dt_overrides_default() {
        let raw = json!({
            "Position": [[0, 0, 0], [1, 0, 0], [2, 0, 0]],
            "Velocity": [[1, 0, 0], [1, 0, 0], [1, 0, 0]],
            "dt": 0.05
        });
        let p = normalize(raw).unwrap();
        assert_eq!(p.time(), &[0.0, 0.05, 0.1]);
    }

    #[test]
    fn configured_default_dt_is_used() {
        let raw = json!({ "Position": [[0, 0, 0], [0, 0, 1]], "Velocity": [[0, 0, 1], [0, 0, 1]] });
        assert_eq!(normalize_with(raw, 0.5).unwrap().time(), &[0.0, 0.5]);
    }

    #[test]
    fn malformed_samples_survive_normalization() {
        let raw = json!({
            "Position": [[0, 0], [1, "x", 1]],
            "Velocity": [[0, 0, 0], 5]
        });
        let p = normalize(raw).unwrap();
        assert_eq!(p.position()[0].len(), 2);
        assert!(p.position()[1][1].is_nan());
        assert!(p.velocity()[1].is_empty());
    }

    #[test]
    fn keeps_run_id() {
        let raw = json!({
            "id": 7,
            "result": { "Position": [[0, 0, 0]], "Velocity": [[0, 0, 0]] }
        });
        assert_eq!(normalize(raw).unwrap().run_id(), Some(7));
    }
}
