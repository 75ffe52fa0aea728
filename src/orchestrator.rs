use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::chart::ChartBoard;
use crate::config::ViewerConfig;
use crate::client::SimulationService;
use crate::error::{Result, ViewerError};
use crate::notify::{MessageSlot, Notifier, StatusLine};
use crate::payload::{normalize_with, Payload};
use crate::request::{FormInput, SimulationRequest};
use crate::scene::{AssetSource, TrajectoryView};
use crate::view::{ViewController, ViewState};

// ---------------------------------------------------------------------------
// Simulation orchestrator
// ---------------------------------------------------------------------------

/// Owns every piece of render state and drives validate → fetch → render.
///
/// A submission is split in two halves, [`begin`](Self::begin) and
/// [`complete`](Self::complete), so the fetch itself can run elsewhere.
/// Only one request may be in flight at a time.
pub struct Orchestrator {
    pub view: ViewController,
    pub charts: ChartBoard,
    pub trajectory: TrajectoryView,
    pub errors: MessageSlot,
    pub status: StatusLine,
    model: Option<AssetSource>,
    default_dt: f64,
    in_flight: bool,
    last_params: Option<String>,
    payload: Option<Payload>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}

impl Orchestrator {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            view: ViewController::new(),
            charts: ChartBoard::default(),
            trajectory: TrajectoryView::default(),
            errors: MessageSlot::new(),
            status: StatusLine::default(),
            model: config.model_source(),
            default_dt: config.default_dt,
            in_flight: false,
            last_params: None,
            payload: None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Last successfully rendered payload.
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// "Parameters used" line of the last submitted request.
    pub fn last_params(&self) -> Option<&str> {
        self.last_params.as_deref()
    }

    pub fn select_view(&mut self, view: ViewState) {
        self.view.select(view, &mut self.charts);
    }

    /// Validate the form and claim the in-flight slot.
    ///
    /// On error nothing but the message slot and status line changes.
    pub fn begin(&mut self, form: &FormInput) -> Result<SimulationRequest> {
        if self.in_flight {
            let err = ViewerError::Validation("A simulation is already running.".into());
            self.fail(&err);
            return Err(err);
        }
        self.errors.clear();

        let request = match form.to_request() {
            Ok(r) => r,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        self.in_flight = true;
        let summary = request.summary();
        info!(params = %summary, "simulation submitted");
        self.last_params = Some(summary);
        self.status.set("Sending data to the backend...");
        Ok(request)
    }

    /// Consume the service outcome and render it.
    ///
    /// Transport and payload failures leave previously rendered content
    /// alone. A trajectory failure keeps the old 3D session but still lets
    /// the charts render.
    pub fn complete(&mut self, outcome: Result<Value>) -> Result<()> {
        self.in_flight = false;

        let payload = match outcome.and_then(|raw| normalize_with(raw, self.default_dt)) {
            Ok(p) => p,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };
        debug!(samples = payload.len(), "response received");
        self.status.set(format!("Received {} samples.", payload.len()));

        let trajectory = self.trajectory.render_trajectory(&payload, self.model.as_ref());
        self.charts.render_all(&payload);
        self.view.restore(&mut self.charts);
        info!(samples = payload.len(), run_id = ?payload.run_id(), "simulation rendered");

        let summary = format!(
            "Simulation completed: {} samples over {:.2} s.",
            payload.len(),
            payload.duration()
        );
        self.payload = Some(payload);
        if let Err(e) = trajectory {
            self.fail(&e);
            return Err(e);
        }
        self.errors.clear();
        self.status.set(summary);
        Ok(())
    }

    /// Blocking submit: validate, call the service, render.
    pub fn run(&mut self, form: &FormInput, service: &dyn SimulationService) -> Result<()> {
        let request = self.begin(form)?;
        let outcome = service.simulate(&request);
        self.complete(outcome)
    }

    /// One animation frame for the 3D view.
    pub fn tick(&mut self) -> bool {
        self.trajectory.tick()
    }

    fn fail(&mut self, err: &ViewerError) {
        match err {
            ViewerError::Validation(_) => warn!("{err}"),
            _ => error!("{err}"),
        }
        let shown = match err {
            ViewerError::Transport(_) => format!("Could not run the simulation. ({})", err.message()),
            _ => err.message().to_string(),
        };
        self.errors.notify(err.kind(), &shown);
        self.status.set(format!("Error: {}", err.message()));
    }
}
