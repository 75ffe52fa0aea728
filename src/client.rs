use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::chart::magnitude;
use crate::error::{Result, ViewerError};
use crate::request::SimulationRequest;

// ---------------------------------------------------------------------------
// Service seam
// ---------------------------------------------------------------------------

/// The external simulation backend.
///
/// Implement this to plug in a different transport or a canned service.
pub trait SimulationService {
    /// POST the request; returns the decoded, not yet normalized, response.
    fn simulate(&self, request: &SimulationRequest) -> Result<Value>;

    /// Past runs, newest first as the backend orders them.
    fn logs(&self) -> Result<Vec<LogRecord>>;
}

// ---------------------------------------------------------------------------
// Run history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogRecord {
    pub id: i64,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl LogRecord {
    pub fn initial_position(&self) -> Option<Vec<f64>> {
        vector(self.params.pointer("/Drone/Position")?)
    }

    pub fn final_position(&self) -> Option<Vec<f64>> {
        let body = match self.result.get("result") {
            Some(inner) if inner.is_object() => inner,
            _ => &self.result,
        };
        vector(body.get("Position")?.as_array()?.last()?)
    }

    /// One history line: id, start point, end point.
    pub fn summary(&self) -> String {
        let show = |v: Option<Vec<f64>>| match v {
            Some(v) => format!("{v:?}"),
            None => "n/a".to_string(),
        };
        let mut line = format!(
            "#{:<5} start={}  end={}",
            self.id,
            show(self.initial_position()),
            show(self.final_position()),
        );
        if let Some(fp) = self.final_position() {
            line.push_str(&format!("  range={:.2} m", magnitude(&fp)));
        }
        if let Some(ts) = &self.timestamp {
            line.push_str(&format!("  at {ts}"));
        }
        line
    }
}

fn vector(v: &Value) -> Option<Vec<f64>> {
    v.as_array()?.iter().map(Value::as_f64).collect()
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Blocking HTTP client for the simulation backend. No timeout, no retry.
#[derive(Clone)]
pub struct HttpService {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, agent: ureq::AgentBuilder::new().build() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn transport(err: ureq::Error) -> ViewerError {
    match err {
        ureq::Error::Status(code, _) => ViewerError::Transport(format!("HTTP {code}")),
        other => ViewerError::Transport(other.to_string()),
    }
}

impl SimulationService for HttpService {
    fn simulate(&self, request: &SimulationRequest) -> Result<Value> {
        let url = self.url("simulate");
        info!(%url, "posting simulation request");
        let resp = self.agent.post(&url).send_json(request).map_err(transport)?;
        debug!(status = resp.status(), "simulation response");
        resp.into_json::<Value>()
            .map_err(|e| ViewerError::Data(format!("response is not JSON: {e}")))
    }

    fn logs(&self) -> Result<Vec<LogRecord>> {
        let url = self.url("logs");
        info!(%url, "fetching run history");
        let resp = self.agent.get(&url).call().map_err(transport)?;
        resp.into_json::<Vec<LogRecord>>()
            .map_err(|e| ViewerError::Data(format!("unexpected history format: {e}")))
    }
}
