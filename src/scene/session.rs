use std::sync::mpsc::{Receiver, TryRecvError};

use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

use super::asset::{AssetLoader, AssetSource, Mesh};
use super::camera::OrbitCamera;
use crate::error::{Result, ViewerError};
use crate::payload::Payload;

// ---------------------------------------------------------------------------
// Scene description
// ---------------------------------------------------------------------------

pub const BACKGROUND: u32 = 0xf0f0f0;
pub const TRAJECTORY_COLOR: u32 = 0xff0000;
pub const ACTOR_COLOR: u32 = 0x0000ff;
pub const SPHERE_RADIUS: f64 = 0.3;
pub const MODEL_SCALE: f64 = 0.6;   // scene units per unit mesh radius

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub position: Point3<f64>,
    pub color: u32,
    pub intensity: f64,
}

impl DirectionalLight {
    /// Unit vector pointing from the scene toward the light.
    pub fn direction(&self) -> Vector3<f64> {
        self.position.coords.normalize()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: u32,
}

impl AmbientLight {
    /// Brightness in [0, 1], averaged over channels.
    pub fn level(&self) -> f64 {
        let [r, g, b] = rgb(self.color);
        (r as f64 + g as f64 + b as f64) / (3.0 * 255.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub size: f64,
    pub divisions: usize,
}

impl Grid {
    /// Line segments on the y = 0 plane, both directions.
    pub fn segments(&self) -> Vec<[Point3<f64>; 2]> {
        let half = self.size / 2.0;
        let step = self.size / self.divisions as f64;
        let mut out = Vec::with_capacity(2 * (self.divisions + 1));
        for i in 0..=self.divisions {
            let k = -half + i as f64 * step;
            out.push([Point3::new(k, 0.0, -half), Point3::new(k, 0.0, half)]);
            out.push([Point3::new(-half, 0.0, k), Point3::new(half, 0.0, k)]);
        }
        out
    }
}

/// x/y/z indicator lines from the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub length: f64,
}

impl Axes {
    pub fn segments(&self) -> [([Point3<f64>; 2], u32); 3] {
        let o = Point3::origin();
        let l = self.length;
        [
            ([o, Point3::new(l, 0.0, 0.0)], 0xff0000),
            ([o, Point3::new(0.0, l, 0.0)], 0x00ff00),
            ([o, Point3::new(0.0, 0.0, l)], 0x0000ff),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Actor {
    Sphere { radius: f64 },
    Model(Mesh),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub background: u32,
    pub light: DirectionalLight,
    pub ambient: AmbientLight,
    pub grid: Grid,
    pub axes: Axes,
    pub path: Vec<Point3<f64>>,
    pub actor: Actor,
    pub actor_position: Point3<f64>,
}

impl Scene {
    pub fn new(path: Vec<Point3<f64>>) -> Self {
        Self {
            background: BACKGROUND,
            light: DirectionalLight {
                position: Point3::new(10.0, 10.0, 10.0),
                color: 0xffffff,
                intensity: 1.0,
            },
            ambient: AmbientLight { color: 0x404040 },
            grid: Grid { size: 50.0, divisions: 50 },
            axes: Axes { length: 10.0 },
            actor_position: path.first().copied().unwrap_or_else(Point3::origin),
            path,
            actor: Actor::Sphere { radius: SPHERE_RADIUS },
        }
    }

    /// Lambert shading factor for a surface normal, ambient included.
    pub fn shade(&self, normal: &Vector3<f64>) -> f64 {
        let diffuse = normal.dot(&self.light.direction()).max(0.0) * self.light.intensity;
        (self.ambient.level() + diffuse).min(1.0)
    }
}

pub fn rgb(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

/// Service samples are z-up; the scene is y-up and right-handed.
pub fn to_scene(sample: &[f64]) -> Option<Point3<f64>> {
    match sample {
        [x, y, z] if x.is_finite() && y.is_finite() && z.is_finite() => {
            Some(Point3::new(*x, *z, -*y))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Render session
// ---------------------------------------------------------------------------

/// Live resources behind one 3D visualization: scene, camera, playback.
pub struct RenderSession {
    pub scene: Scene,
    pub camera: OrbitCamera,
    points: Vec<Point3<f64>>,
    cursor: usize,
    running: bool,
    asset: Option<Receiver<Result<Mesh>>>,
}

impl RenderSession {
    pub fn new(points: Vec<Point3<f64>>, asset: Option<Receiver<Result<Mesh>>>) -> Self {
        Self {
            scene: Scene::new(points.clone()),
            camera: OrbitCamera::default(),
            points,
            cursor: 0,
            running: true,
            asset,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.points.len()
    }

    pub fn actor_position(&self) -> Point3<f64> {
        self.scene.actor_position
    }

    pub fn has_pending_asset(&self) -> bool {
        self.asset.is_some()
    }

    /// One animation frame. Returns true if the cursor advanced.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.poll_asset();
        match self.points.get(self.cursor) {
            Some(p) => {
                self.scene.actor_position = *p;
                self.cursor += 1;
                true
            }
            None => false,
        }
    }

    /// Halt playback for good and drop any pending model load.
    pub fn stop(&mut self) {
        self.running = false;
        self.asset = None;
    }

    fn poll_asset(&mut self) {
        let Some(rx) = &self.asset else { return };
        match rx.try_recv() {
            Ok(Ok(mesh)) => {
                debug!(triangles = mesh.triangles.len(), "actor model attached");
                self.scene.actor = Actor::Model(mesh);
                self.asset = None;
            }
            Ok(Err(e)) => {
                warn!("{e}; falling back to sphere actor");
                self.asset = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                warn!("model loader exited without a result; falling back to sphere actor");
                self.asset = None;
            }
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// 3D container
// ---------------------------------------------------------------------------

pub const WELCOME_MESSAGE: &str = "Run the simulation to see the 3D trajectory";

/// The 3D display surface and whatever it currently holds.
pub struct TrajectoryView {
    welcome: Option<String>,
    error_overlay: Option<String>,
    session: Option<RenderSession>,
    sessions_started: usize,
}

impl Default for TrajectoryView {
    fn default() -> Self {
        Self {
            welcome: Some(WELCOME_MESSAGE.to_string()),
            error_overlay: None,
            session: None,
            sessions_started: 0,
        }
    }
}

impl TrajectoryView {
    pub fn welcome(&self) -> Option<&str> {
        self.welcome.as_deref()
    }

    pub fn error_overlay(&self) -> Option<&str> {
        self.error_overlay.as_deref()
    }

    pub fn session(&self) -> Option<&RenderSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut RenderSession> {
        self.session.as_mut()
    }

    pub fn sessions_started(&self) -> usize {
        self.sessions_started
    }

    /// Tear down the previous session and start a new one for `payload`.
    ///
    /// Malformed position samples are left out of the path. With no usable
    /// sample at all the current session is kept, the error overlay is set
    /// and a data error returned.
    pub fn render_trajectory(
        &mut self,
        payload: &Payload,
        model: Option<&AssetSource>,
    ) -> Result<()> {
        let points: Vec<Point3<f64>> = payload.position().iter().filter_map(|s| to_scene(s)).collect();
        if points.is_empty() {
            let err = ViewerError::Data("No valid data to plot.".into());
            self.error_overlay = Some(err.message().to_string());
            return Err(err);
        }
        let skipped = payload.len() - points.len();
        if skipped > 0 {
            debug!(skipped, "malformed position samples left out of the path");
        }

        if let Some(mut old) = self.session.take() {
            old.stop();
        }
        self.error_overlay = None;
        self.welcome = None;

        let asset = model.map(|src| AssetLoader::spawn(src.clone()));
        info!(points = points.len(), model = model.is_some(), "3D session started");
        self.session = Some(RenderSession::new(points, asset));
        self.sessions_started += 1;
        Ok(())
    }

    /// Advance the active session by one frame.
    pub fn tick(&mut self) -> bool {
        self.session.as_mut().is_some_and(|s| s.tick())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::normalize;
    use serde_json::json;
    use std::sync::mpsc;

    fn payload(n: usize) -> Payload {
        let pos: Vec<_> = (0..n).map(|i| json!([i as f64, 0.0, 10.0 - i as f64])).collect();
        let vel: Vec<_> = (0..n).map(|_| json!([1.0, 0.0, -1.0])).collect();
        normalize(json!({ "Position": pos, "Velocity": vel })).unwrap()
    }

    #[test]
    fn cursor_advances_once_per_tick_then_holds() {
        let mut view = TrajectoryView::default();
        view.render_trajectory(&payload(3), None).unwrap();
        assert!(view.tick());
        assert!(view.tick());
        assert!(view.tick());
        assert!(!view.tick());
        let s = view.session().unwrap();
        assert_eq!(s.cursor(), 3);
        assert!(s.is_finished());
        assert!(s.is_running());
        assert_eq!(s.actor_position(), Point3::new(2.0, 8.0, 0.0));
    }

    #[test]
    fn stopped_session_never_advances() {
        let mut session = RenderSession::new(vec![Point3::origin(); 4], None);
        session.stop();
        assert!(!session.tick());
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn new_result_replaces_session() {
        let mut view = TrajectoryView::default();
        view.render_trajectory(&payload(5), None).unwrap();
        view.tick();
        view.tick();
        view.render_trajectory(&payload(2), None).unwrap();
        let s = view.session().unwrap();
        assert_eq!(s.cursor(), 0);
        assert_eq!(s.len(), 2);
        assert_eq!(view.sessions_started(), 2);
    }

    #[test]
    fn welcome_kept_until_first_success() {
        let mut view = TrajectoryView::default();
        let bad = normalize(json!({ "Position": [[1, 2]], "Velocity": [[0, 0, 0]] })).unwrap();
        assert!(matches!(view.render_trajectory(&bad, None), Err(ViewerError::Data(_))));
        assert_eq!(view.welcome(), Some(WELCOME_MESSAGE));
        assert!(view.session().is_none());
        assert_eq!(view.error_overlay(), Some("No valid data to plot."));

        view.render_trajectory(&payload(2), None).unwrap();
        assert!(view.welcome().is_none());
        assert!(view.error_overlay().is_none());
    }

    #[test]
    fn failed_render_keeps_previous_session() {
        let mut view = TrajectoryView::default();
        view.render_trajectory(&payload(4), None).unwrap();
        let bad = normalize(json!({ "Position": [[1, "x", 2]], "Velocity": [[0, 0, 0]] })).unwrap();
        assert!(view.render_trajectory(&bad, None).is_err());
        assert_eq!(view.session().unwrap().len(), 4);
        assert!(view.error_overlay().is_some());
    }

    #[test]
    fn asset_failure_keeps_sphere() {
        let (tx, rx) = mpsc::channel();
        let mut session = RenderSession::new(vec![Point3::origin(); 2], Some(rx));
        tx.send(Err(ViewerError::Asset("404".into()))).unwrap();
        session.tick();
        assert!(!session.has_pending_asset());
        assert_eq!(session.scene.actor, Actor::Sphere { radius: SPHERE_RADIUS });
    }

    #[test]
    fn loaded_asset_replaces_sphere() {
        let (tx, rx) = mpsc::channel();
        let mut session = RenderSession::new(vec![Point3::origin(); 2], Some(rx));
        assert!(session.tick());
        assert!(session.has_pending_asset());
        let mesh = Mesh::from_buffers(&[0., 0., 0., 1., 0., 0., 0., 1., 0.], &[0, 1, 2]).unwrap();
        tx.send(Ok(mesh)).unwrap();
        session.tick();
        assert!(matches!(session.scene.actor, Actor::Model(_)));
    }

    #[test]
    fn samples_map_z_up_to_y_up() {
        assert_eq!(to_scene(&[1.0, 2.0, 3.0]), Some(Point3::new(1.0, 3.0, -2.0)));
        assert_eq!(to_scene(&[1.0, 2.0]), None);
    }

    #[test]
    fn grid_and_lighting() {
        let scene = Scene::new(vec![]);
        assert_eq!(scene.grid.segments().len(), 102);
        let lit = scene.shade(&scene.light.direction());
        let dark = scene.shade(&-scene.light.direction());
        assert!(lit > dark);
        assert!((dark - scene.ambient.level()).abs() < 1e-12);
    }
}
