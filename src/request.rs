use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};
use crate::parse::{parse_components, parse_scalar};

// ---------------------------------------------------------------------------
// Wire request: POST /simulate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Drone {
    pub position: [f64; 3],   // m
    pub velocity: [f64; 3],   // m/s
    pub mass: f64,            // kg
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    pub wind: [f64; 3],       // m/s
    pub gravity: f64,         // m/s^2
    pub drag: f64,            // dimensionless
}

/// One simulation request, built fresh from form state for each submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimulationRequest {
    pub drone: Drone,
    pub environment: Environment,
}

impl SimulationRequest {
    /// One-line "parameters used" summary shown next to the result.
    pub fn summary(&self) -> String {
        let d = &self.drone;
        let e = &self.environment;
        format!(
            "Mass={} kg, Position={}, Velocity={}, Wind={}, Gravity={}, Drag={}",
            d.mass,
            fmt_vec(&d.position),
            fmt_vec(&d.velocity),
            fmt_vec(&e.wind),
            e.gravity,
            e.drag,
        )
    }
}

fn fmt_vec(v: &[f64; 3]) -> String {
    format!("[{}, {}, {}]", v[0], v[1], v[2])
}

// ---------------------------------------------------------------------------
// Form state
// ---------------------------------------------------------------------------

/// Raw text of the six form fields, as typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct FormInput {
    pub position: String,
    pub velocity: String,
    pub mass: String,
    pub wind: String,
    pub gravity: String,
    pub drag: String,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            position: "0,0,10".into(),
            velocity: "1,0,0".into(),
            mass: "1".into(),
            wind: "0,0,0".into(),
            gravity: "9.81".into(),
            drag: "0.1".into(),
        }
    }
}

impl FormInput {
    /// Validate every field and build the request.
    ///
    /// Vector checks run before scalar checks, so a form with both kinds of
    /// problem reports the vector one.
    pub fn to_request(&self) -> Result<SimulationRequest> {
        let position = vector_field("position", &self.position)?;
        let velocity = vector_field("velocity", &self.velocity)?;
        let wind = vector_field("wind", &self.wind)?;

        let mass = scalar_field("mass", &self.mass)?;
        let gravity = scalar_field("gravity", &self.gravity)?;
        let drag = scalar_field("drag", &self.drag)?;
        if mass <= 0.0 {
            return Err(ViewerError::Validation(
                "Invalid numeric parameters. (mass must be positive)".into(),
            ));
        }

        Ok(SimulationRequest {
            drone: Drone { position, velocity, mass },
            environment: Environment { wind, gravity, drag },
        })
    }
}

fn vector_field(name: &str, raw: &str) -> Result<[f64; 3]> {
    let values = parse_components(raw);
    match values.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(ViewerError::Validation(format!(
            "All vectors must have 3 values. ({name} has {})",
            values.len()
        ))),
    }
}

fn scalar_field(name: &str, raw: &str) -> Result<f64> {
    parse_scalar(raw).ok_or_else(|| {
        ViewerError::Validation(format!("Invalid numeric parameters. ({name})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> FormInput {
        FormInput {
            position: "0,0,0".into(),
            velocity: "1,0,0".into(),
            mass: "1".into(),
            wind: "0,0,0".into(),
            gravity: "9.8".into(),
            drag: "0.1".into(),
        }
    }

    #[test]
    fn valid_form_builds_request() {
        let req = form().to_request().unwrap();
        assert_eq!(req.drone.velocity, [1.0, 0.0, 0.0]);
        assert_eq!(req.environment.gravity, 9.8);
    }

    #[test]
    fn short_vector_is_rejected() {
        let mut f = form();
        f.position = "0,0".into();
        let err = f.to_request().unwrap_err();
        assert!(matches!(err, ViewerError::Validation(_)));
        assert!(err.message().contains("position"));
    }

    #[test]
    fn non_numeric_scalar_is_rejected() {
        let mut f = form();
        f.drag = "lots".into();
        assert!(matches!(f.to_request(), Err(ViewerError::Validation(_))));
    }

    #[test]
    fn zero_mass_is_rejected() {
        let mut f = form();
        f.mass = "0".into();
        assert!(f.to_request().is_err());
    }

    #[test]
    fn serializes_to_wire_shape() {
        let req = form().to_request().unwrap();
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "Drone": { "Position": [0.0, 0.0, 0.0], "Velocity": [1.0, 0.0, 0.0], "Mass": 1.0 },
                "Environment": { "Wind": [0.0, 0.0, 0.0], "Gravity": 9.8, "Drag": 0.1 }
            })
        );
    }

    #[test]
    fn summary_lists_every_parameter() {
        let s = form().to_request().unwrap().summary();
        assert!(s.contains("Mass=1 kg"));
        assert!(s.contains("Velocity=[1, 0, 0]"));
        assert!(s.contains("Drag=0.1"));
    }
}
