//! Front end for a remote drone flight simulation service.
//!
//! Collects drone and environment parameters, posts them to the backend,
//! and turns the returned trajectory into a 3D playback session and two
//! time-series charts. The physics runs in the backend, not here.

pub mod config;
pub mod error;
pub mod notify;
pub mod parse;
pub mod request;
pub mod payload;
pub mod chart;
pub mod scene;
pub mod view;
pub mod client;
pub mod orchestrator;

pub use client::{HttpService, LogRecord, SimulationService};
pub use config::ViewerConfig;
pub use error::ViewerError;
pub use orchestrator::Orchestrator;
pub use payload::{normalize, Payload};
pub use request::{FormInput, SimulationRequest};
pub use view::{ViewController, ViewState};
