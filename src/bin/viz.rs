use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use clap::Parser;
use eframe::egui::{self, Color32, RichText};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drone_sim_viewer::chart::ChartAxis;
use drone_sim_viewer::error::ViewerError;
use drone_sim_viewer::notify::ErrorKind;
use drone_sim_viewer::scene::paint::paint_session;
use drone_sim_viewer::view::SelectorStyle;
use drone_sim_viewer::{FormInput, HttpService, Orchestrator, SimulationService, ViewState, ViewerConfig};

#[derive(Parser)]
#[command(name = "drone-viz")]
#[command(about = "Interactive drone simulation viewer")]
struct Args {
    /// Backend base URL (overrides DRONE_SIM_URL)
    #[arg(long)]
    url: Option<String>,

    /// Actor model, .obj path or URL (overrides DRONE_SIM_MODEL)
    #[arg(long)]
    model: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = ViewerConfig::from_env().with_overrides(args.url, args.model);
    tracing::info!(url = %config.base_url, model = ?config.model_asset, "starting viewer");

    let app = SimViz::new(&config);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(config.window_size),
        ..Default::default()
    };
    eframe::run_native("Drone Flight Simulator", options, Box::new(|_| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("viewer exited: {e}"))
}

const SKY: Color32 = Color32::from_rgb(14, 165, 233);

struct SimViz {
    form: FormInput,
    orch: Orchestrator,
    service: HttpService,
    pending: Option<Receiver<Result<Value, ViewerError>>>,
}

impl SimViz {
    fn new(config: &ViewerConfig) -> Self {
        Self {
            form: FormInput::default(),
            orch: Orchestrator::new(config),
            service: HttpService::new(config.base_url.clone()),
            pending: None,
        }
    }

    fn submit(&mut self) {
        let Ok(request) = self.orch.begin(&self.form) else { return };
        let (tx, rx) = mpsc::channel();
        let service = self.service.clone();
        thread::spawn(move || {
            let _ = tx.send(service.simulate(&request));
        });
        self.pending = Some(rx);
    }

    fn poll_pending(&mut self) {
        let Some(rx) = &self.pending else { return };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err(ViewerError::Transport("request worker exited".into()))
            }
        };
        self.pending = None;
        let _ = self.orch.complete(outcome);
    }

    fn form_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Parameters");
        egui::Grid::new("form").num_columns(2).spacing([8.0, 6.0]).show(ui, |ui| {
            field(ui, "Position (x,y,z)", &mut self.form.position);
            field(ui, "Velocity (x,y,z)", &mut self.form.velocity);
            field(ui, "Mass (kg)", &mut self.form.mass);
            field(ui, "Wind (x,y,z)", &mut self.form.wind);
            field(ui, "Gravity (m/s²)", &mut self.form.gravity);
            field(ui, "Drag", &mut self.form.drag);
        });
        ui.add_space(8.0);
        let busy = self.orch.is_in_flight();
        if ui.add_enabled(!busy, egui::Button::new("Run simulation")).clicked() {
            self.submit();
        }
        if busy {
            ui.spinner();
        }

        ui.separator();
        if let Some(params) = self.orch.last_params() {
            ui.label(RichText::new("Parameters used").strong());
            ui.label(params);
        }
        ui.label(RichText::new(self.orch.status.text()).monospace().small());
    }

    fn tabs(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for view in ViewState::ALL {
                let (fill, text) = match self.orch.view.selector_style(view) {
                    SelectorStyle::Active => (SKY, Color32::WHITE),
                    SelectorStyle::Inactive => (Color32::from_gray(160), Color32::BLACK),
                };
                let button = egui::Button::new(RichText::new(view.title()).color(text)).fill(fill);
                if ui.add(button).clicked() {
                    self.orch.select_view(view);
                }
            }
        });
    }

    fn result_area(&mut self, ui: &mut egui::Ui) {
        if let Some((kind, msg)) = self.orch.errors.current() {
            let color = match kind {
                ErrorKind::Validation => Color32::from_rgb(217, 119, 6),
                _ => Color32::from_rgb(248, 113, 113),
            };
            ui.label(RichText::new(msg).color(color).size(16.0));
        }

        match self.orch.view.active() {
            ViewState::Trajectory3D => {
                let overlay = self.orch.trajectory.error_overlay().map(str::to_owned);
                match self.orch.trajectory.session_mut() {
                    Some(session) => paint_session(ui, session, overlay.as_deref()),
                    None => {
                        let (text, color) = match overlay {
                            Some(msg) => (msg, Color32::from_rgb(248, 113, 113)),
                            None => (
                                self.orch.trajectory.welcome().unwrap_or_default().to_string(),
                                Color32::GRAY,
                            ),
                        };
                        ui.centered_and_justified(|ui| {
                            ui.label(RichText::new(text).color(color));
                        });
                    }
                }
            }
            view => {
                let axis = view.chart_axis().unwrap_or(ChartAxis::Position);
                match self.orch.charts.instance_mut(axis) {
                    Some(chart) => chart.show(ui),
                    None => {
                        ui.centered_and_justified(|ui| {
                            ui.label(RichText::new("No data yet").color(Color32::GRAY));
                        });
                    }
                }
            }
        }
    }
}

fn field(ui: &mut egui::Ui, label: &str, value: &mut String) {
    ui.label(label);
    ui.text_edit_singleline(value);
    ui.end_row();
}

impl eframe::App for SimViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_pending();
        if self.orch.trajectory.session().is_some() {
            self.orch.tick();
            ctx.request_repaint();
        }
        if self.pending.is_some() {
            ctx.request_repaint();
        }

        egui::SidePanel::left("params").min_width(260.0).show(ctx, |ui| {
            self.form_panel(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.tabs(ui);
            ui.separator();
            self.result_area(ui);
        });
    }
}
