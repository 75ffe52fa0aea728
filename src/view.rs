use tracing::debug;

use crate::chart::{ChartAxis, ChartBoard};

// ---------------------------------------------------------------------------
// View state machine
// ---------------------------------------------------------------------------

/// The three mutually exclusive result views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Trajectory3D,
    VelocityChart,
    PositionChart,
}

impl ViewState {
    pub const ALL: [ViewState; 3] =
        [ViewState::Trajectory3D, ViewState::VelocityChart, ViewState::PositionChart];

    pub fn title(self) -> &'static str {
        match self {
            ViewState::Trajectory3D => "3D Trajectory",
            ViewState::VelocityChart => "Velocity",
            ViewState::PositionChart => "Position",
        }
    }

    /// Chart shown by this view, if it is a chart view.
    pub fn chart_axis(self) -> Option<ChartAxis> {
        match self {
            ViewState::Trajectory3D => None,
            ViewState::VelocityChart => Some(ChartAxis::Velocity),
            ViewState::PositionChart => Some(ChartAxis::Position),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorStyle {
    Active,
    Inactive,
}

/// Remembers the selected view for the lifetime of the window.
#[derive(Debug, Clone, Default)]
pub struct ViewController {
    active: ViewState,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> ViewState {
        self.active
    }

    /// Switch to `view`; a chart view forces one resize+redraw of its chart.
    pub fn select(&mut self, view: ViewState, charts: &mut ChartBoard) {
        self.active = view;
        if let Some(axis) = view.chart_axis() {
            if let Some(chart) = charts.instance_mut(axis) {
                chart.resize_and_redraw();
            }
        }
        debug!(?view, "view selected");
    }

    /// Re-enter the remembered view, e.g. after a new result was rendered.
    pub fn restore(&mut self, charts: &mut ChartBoard) {
        self.select(self.active, charts);
    }

    pub fn is_visible(&self, view: ViewState) -> bool {
        self.active == view
    }

    pub fn selector_style(&self, view: ViewState) -> SelectorStyle {
        if self.is_visible(view) { SelectorStyle::Active } else { SelectorStyle::Inactive }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::normalize;
    use serde_json::json;

    fn board_with_charts() -> ChartBoard {
        let payload = normalize(json!({
            "Position": [[0, 0, 0], [1, 1, 1]],
            "Velocity": [[0, 0, 0], [1, 1, 1]]
        }))
        .unwrap();
        let mut board = ChartBoard::default();
        board.render_all(&payload);
        board
    }

    #[test]
    fn starts_on_trajectory() {
        let vc = ViewController::new();
        assert_eq!(vc.active(), ViewState::Trajectory3D);
        assert_eq!(vc.selector_style(ViewState::Trajectory3D), SelectorStyle::Active);
    }

    #[test]
    fn selecting_velocity_hides_3d_and_redraws_once() {
        let mut board = board_with_charts();
        let mut vc = ViewController::new();
        vc.select(ViewState::VelocityChart, &mut board);

        assert!(!vc.is_visible(ViewState::Trajectory3D));
        assert!(vc.is_visible(ViewState::VelocityChart));
        assert!(!vc.is_visible(ViewState::PositionChart));
        assert_eq!(vc.selector_style(ViewState::VelocityChart), SelectorStyle::Active);
        assert_eq!(vc.selector_style(ViewState::Trajectory3D), SelectorStyle::Inactive);

        assert_eq!(board.instance(ChartAxis::Velocity).unwrap().redraw_count(), 1);
        assert_eq!(board.instance(ChartAxis::Position).unwrap().redraw_count(), 0);
    }

    #[test]
    fn selecting_chart_without_instance_is_harmless() {
        let mut board = ChartBoard::default();
        let mut vc = ViewController::new();
        vc.select(ViewState::PositionChart, &mut board);
        assert!(vc.is_visible(ViewState::PositionChart));
    }

    #[test]
    fn restore_keeps_selection() {
        let mut board = board_with_charts();
        let mut vc = ViewController::new();
        vc.select(ViewState::PositionChart, &mut board);
        let mut fresh = board_with_charts();
        vc.restore(&mut fresh);
        assert_eq!(vc.active(), ViewState::PositionChart);
        assert_eq!(fresh.instance(ChartAxis::Position).unwrap().redraw_count(), 1);
    }
}
