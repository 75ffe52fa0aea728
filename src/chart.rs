use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::payload::Payload;

/// Euclidean norm of a 3-component sample; anything else counts as 0.
pub fn magnitude(sample: &[f64]) -> f64 {
    match sample {
        [x, y, z] => {
            let m = (x * x + y * y + z * z).sqrt();
            if m.is_finite() { m } else { 0.0 }
        }
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Axis definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartAxis {
    Position,
    Velocity,
}

impl ChartAxis {
    pub const ALL: [ChartAxis; 2] = [ChartAxis::Position, ChartAxis::Velocity];

    pub fn label(self) -> &'static str {
        match self {
            ChartAxis::Position => "Position (magnitude)",
            ChartAxis::Velocity => "Velocity (magnitude)",
        }
    }

    pub fn x_title(self) -> &'static str {
        "Time (s)"
    }

    pub fn y_title(self) -> &'static str {
        match self {
            ChartAxis::Position => "Position (m)",
            ChartAxis::Velocity => "Velocity (m/s)",
        }
    }

    /// Line color as RGB.
    pub fn color(self) -> [u8; 3] {
        match self {
            ChartAxis::Position => [54, 162, 235],
            ChartAxis::Velocity => [255, 99, 132],
        }
    }

    fn samples(self, payload: &Payload) -> &[Vec<f64>] {
        match self {
            ChartAxis::Position => payload.position(),
            ChartAxis::Velocity => payload.velocity(),
        }
    }
}

pub const FILL_ALPHA: f32 = 0.2;

// ---------------------------------------------------------------------------
// Chart instance
// ---------------------------------------------------------------------------

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// One live single-series line chart bound to a slot.
#[derive(Debug, Clone)]
pub struct ChartInstance {
    pub axis: ChartAxis,
    pub points: Vec<[f64; 2]>,  // (time, magnitude)
    generation: u64,
    redraws: usize,
    pending_reset: bool,
    alive: bool,
}

impl ChartInstance {
    pub fn new(axis: ChartAxis, payload: &Payload) -> Self {
        let points = payload
            .time()
            .iter()
            .zip(axis.samples(payload))
            .map(|(t, s)| [*t, magnitude(s)])
            .collect();
        Self {
            axis,
            points,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            redraws: 0,
            pending_reset: true,
            alive: true,
        }
    }

    /// Unique per construction; a replaced chart never shares it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn redraw_count(&self) -> usize {
        self.redraws
    }

    /// Request a re-fit of the plot bounds on the next draw.
    ///
    /// Needed for charts built while their view was hidden.
    pub fn resize_and_redraw(&mut self) {
        self.redraws += 1;
        self.pending_reset = true;
    }

    /// Consume the pending re-fit request.
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.pending_reset)
    }

    pub fn destroy(&mut self) {
        self.alive = false;
        self.points.clear();
    }

    pub fn peak(&self) -> f64 {
        self.points.iter().map(|p| p[1]).fold(0.0_f64, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Slots and board
// ---------------------------------------------------------------------------

/// Drawing surface for one axis. Holds at most one live chart.
#[derive(Debug, Clone)]
pub struct ChartSlot {
    pub mounted: bool,
    instance: Option<ChartInstance>,
}

impl ChartSlot {
    pub fn mounted() -> Self {
        Self { mounted: true, instance: None }
    }

    pub fn unmounted() -> Self {
        Self { mounted: false, instance: None }
    }

    pub fn instance(&self) -> Option<&ChartInstance> {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> Option<&mut ChartInstance> {
        self.instance.as_mut()
    }

    /// Destroy the current chart, then build the new one in its place.
    pub fn replace(&mut self, axis: ChartAxis, payload: &Payload) -> &ChartInstance {
        if let Some(mut old) = self.instance.take() {
            old.destroy();
            debug!(?axis, generation = old.generation(), "chart destroyed");
        }
        self.instance.insert(ChartInstance::new(axis, payload))
    }
}

/// Owns the chart state for both axes.
#[derive(Debug, Clone)]
pub struct ChartBoard {
    position: ChartSlot,
    velocity: ChartSlot,
}

impl Default for ChartBoard {
    fn default() -> Self {
        Self { position: ChartSlot::mounted(), velocity: ChartSlot::mounted() }
    }
}

impl ChartBoard {
    pub fn new(position: ChartSlot, velocity: ChartSlot) -> Self {
        Self { position, velocity }
    }

    pub fn slot(&self, axis: ChartAxis) -> &ChartSlot {
        match axis {
            ChartAxis::Position => &self.position,
            ChartAxis::Velocity => &self.velocity,
        }
    }

    pub fn slot_mut(&mut self, axis: ChartAxis) -> &mut ChartSlot {
        match axis {
            ChartAxis::Position => &mut self.position,
            ChartAxis::Velocity => &mut self.velocity,
        }
    }

    pub fn instance(&self, axis: ChartAxis) -> Option<&ChartInstance> {
        self.slot(axis).instance()
    }

    pub fn instance_mut(&mut self, axis: ChartAxis) -> Option<&mut ChartInstance> {
        self.slot_mut(axis).instance_mut()
    }

    /// Returns false, without error, when the slot is not mounted.
    pub fn render(&mut self, axis: ChartAxis, payload: &Payload) -> bool {
        let slot = self.slot_mut(axis);
        if !slot.mounted {
            debug!(?axis, "chart surface not mounted; skipping");
            return false;
        }
        let chart = slot.replace(axis, payload);
        debug!(?axis, points = chart.points.len(), "chart rendered");
        true
    }

    pub fn render_position_chart(&mut self, payload: &Payload) -> bool {
        self.render(ChartAxis::Position, payload)
    }

    pub fn render_velocity_chart(&mut self, payload: &Payload) -> bool {
        self.render(ChartAxis::Velocity, payload)
    }

    pub fn render_all(&mut self, payload: &Payload) {
        self.render_position_chart(payload);
        self.render_velocity_chart(payload);
    }
}

// ---------------------------------------------------------------------------
// egui drawing
// ---------------------------------------------------------------------------

#[cfg(feature = "viz")]
mod draw {
    use eframe::egui;
    use egui_plot::{Legend, Line, Plot, PlotPoints};

    use super::{ChartInstance, FILL_ALPHA};

    impl ChartInstance {
        pub fn show(&mut self, ui: &mut egui::Ui) {
            let [r, g, b] = self.axis.color();
            let points: PlotPoints = self.points.iter().copied().collect();
            // straight segments, filled down to zero
            let line = Line::new(self.axis.label(), points)
                .color(egui::Color32::from_rgb(r, g, b))
                .fill(0.0_f32)
                .fill_alpha(FILL_ALPHA);

            let mut plot = Plot::new(("chart", self.generation))
                .x_axis_label(self.axis.x_title())
                .y_axis_label(self.axis.y_title())
                .legend(Legend::default());
            if self.take_reset() {
                plot = plot.reset();
            }
            plot.show(ui, |plot_ui| {
                plot_ui.line(line);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::normalize;
    use serde_json::json;

    fn payload() -> Payload {
        normalize(json!({
            "Position": [[3, 4, 0], [0, 0], [1, 2, 2]],
            "Velocity": [[1, 0, 0], [0, 3, 4], [0, 0, 0]]
        }))
        .unwrap()
    }

    #[test]
    fn magnitude_of_valid_and_malformed_samples() {
        assert_eq!(magnitude(&[3.0, 4.0, 0.0]), 5.0);
        assert_eq!(magnitude(&[3.0, 4.0]), 0.0);
        assert_eq!(magnitude(&[]), 0.0);
        assert_eq!(magnitude(&[f64::NAN, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn chart_points_pair_time_with_magnitude() {
        let mut board = ChartBoard::default();
        assert!(board.render_position_chart(&payload()));
        let chart = board.instance(ChartAxis::Position).unwrap();
        assert_eq!(chart.points, vec![[0.0, 5.0], [0.1, 0.0], [0.2, 3.0]]);
    }

    #[test]
    fn unmounted_slot_is_skipped() {
        let mut board = ChartBoard::new(ChartSlot::unmounted(), ChartSlot::mounted());
        assert!(!board.render_position_chart(&payload()));
        assert!(board.instance(ChartAxis::Position).is_none());
        assert!(board.render_velocity_chart(&payload()));
    }

    #[test]
    fn rerender_replaces_instead_of_appending() {
        let mut board = ChartBoard::default();
        board.render_all(&payload());
        let first = board.instance(ChartAxis::Velocity).unwrap().generation();
        board.render_all(&payload());
        let second = board.instance(ChartAxis::Velocity).unwrap();
        assert_ne!(first, second.generation());
        assert!(second.is_alive());
        assert_eq!(second.points.len(), 3);
    }

    #[test]
    fn resize_sets_reset_once() {
        let mut board = ChartBoard::default();
        board.render_velocity_chart(&payload());
        let chart = board.instance_mut(ChartAxis::Velocity).unwrap();
        assert!(chart.take_reset());
        chart.resize_and_redraw();
        assert_eq!(chart.redraw_count(), 1);
        assert!(chart.take_reset());
        assert!(!chart.take_reset());
        assert_eq!(chart.peak(), 5.0);
    }
}
