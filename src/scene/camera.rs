use nalgebra::{Matrix4, Perspective3, Point3, Vector3};

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Screen rectangle the scene is projected into, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// At least one pixel in each direction.
    pub fn is_drawable(&self) -> bool {
        self.width >= 1.0 && self.height >= 1.0
    }

    /// Width over height; 1.0 unless both sides are positive.
    pub fn aspect(&self) -> f64 {
        let aspect = (self.width / self.height) as f64;
        if self.width > 0.0 && self.height > 0.0 && aspect.is_finite() { aspect } else { 1.0 }
    }
}

// ---------------------------------------------------------------------------
// Orbit camera (y-up)
// ---------------------------------------------------------------------------

pub const FOV_Y_DEG: f64 = 60.0;
pub const NEAR: f64 = 0.1;
pub const FAR: f64 = 1000.0;
pub const MIN_DISTANCE: f64 = 1.0;
pub const MAX_DISTANCE: f64 = 500.0;
const PITCH_LIMIT: f64 = 1.55;     // rad, just short of the poles

/// Perspective camera orbiting a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Point3<f64>,
    pub distance: f64,
    pub yaw: f64,              // rad, around +y, 0 = looking down -z
    pub pitch: f64,            // rad, elevation above the xz-plane
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_at(Point3::new(20.0, 20.0, 20.0), Point3::origin())
    }
}

impl OrbitCamera {
    pub fn looking_at(eye: Point3<f64>, target: Point3<f64>) -> Self {
        let offset = eye - target;
        let distance = offset.norm().clamp(MIN_DISTANCE, MAX_DISTANCE);
        let pitch = (offset.y / offset.norm().max(1e-9)).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);
        Self { target, distance, yaw, pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT) }
    }

    pub fn eye(&self) -> Point3<f64> {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vector3::new(cp * sy, sp, cp * cy) * self.distance
    }

    fn forward(&self) -> Vector3<f64> {
        (self.target - self.eye()).normalize()
    }

    /// Rotate around the target. Angles in radians.
    pub fn orbit(&mut self, d_yaw: f64, d_pitch: f64) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Slide the target in the view plane, scaled by distance.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let fwd = self.forward();
        let right = fwd.cross(&Vector3::y()).normalize();
        let up = right.cross(&fwd);
        self.target += (right * dx + up * dy) * self.distance;
    }

    /// factor < 1 moves closer.
    pub fn zoom(&mut self, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::look_at_rh(&self.eye(), &self.target, &Vector3::y())
    }

    pub fn view_projection(&self, viewport: &Viewport) -> Matrix4<f64> {
        let proj = Perspective3::new(viewport.aspect(), FOV_Y_DEG.to_radians(), NEAR, FAR);
        proj.as_matrix() * self.view_matrix()
    }

    /// Screen position of a world point; `None` if behind the near plane.
    pub fn project(&self, point: &Point3<f64>, viewport: &Viewport) -> Option<[f32; 2]> {
        project_with(&self.view_projection(viewport), point, viewport)
    }

    /// Distance from the eye, used for back-to-front sorting.
    pub fn depth(&self, point: &Point3<f64>) -> f64 {
        (point - self.eye()).dot(&self.forward())
    }
}

/// Project with a precomputed view-projection matrix.
pub fn project_with(
    view_proj: &Matrix4<f64>,
    point: &Point3<f64>,
    viewport: &Viewport,
) -> Option<[f32; 2]> {
    let clip = view_proj * point.to_homogeneous();
    if clip.w <= NEAR {
        return None;
    }
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let sx = viewport.x as f64 + (ndc_x + 1.0) * 0.5 * viewport.width as f64;
    let sy = viewport.y as f64 + (1.0 - ndc_y) * 0.5 * viewport.height as f64;
    Some([sx as f32, sy as f32])
}

/// Project a polyline, split into runs wherever a point is culled.
///
/// Runs shorter than two points are dropped.
pub fn visible_runs(
    view_proj: &Matrix4<f64>,
    points: &[Point3<f64>],
    viewport: &Viewport,
) -> Vec<Vec<[f32; 2]>> {
    let mut runs = Vec::new();
    let mut current: Vec<[f32; 2]> = Vec::new();
    for p in points {
        match project_with(view_proj, p, viewport) {
            Some(xy) => current.push(xy),
            None => {
                if current.len() >= 2 {
                    runs.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }
    if current.len() >= 2 {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(0.0, 0.0, 800.0, 600.0)
    }

    #[test]
    fn default_eye_is_above_and_offset() {
        let cam = OrbitCamera::default();
        let eye = cam.eye();
        assert!((eye - Point3::new(20.0, 20.0, 20.0)).norm() < 1e-9);
    }

    #[test]
    fn target_projects_to_viewport_center() {
        let cam = OrbitCamera::default();
        let p = cam.project(&Point3::origin(), &viewport()).unwrap();
        assert!((p[0] - 400.0).abs() < 1e-3);
        assert!((p[1] - 300.0).abs() < 1e-3);
    }

    #[test]
    fn point_behind_camera_is_culled() {
        let cam = OrbitCamera::default();
        assert!(cam.project(&Point3::new(40.0, 40.0, 40.0), &viewport()).is_none());
    }

    #[test]
    fn degenerate_viewport_does_not_panic() {
        let cam = OrbitCamera::default();
        for vp in [
            Viewport::new(0.0, 0.0, 0.0, 600.0),
            Viewport::new(0.0, 0.0, 800.0, 0.0),
            Viewport::new(0.0, 0.0, 0.0, 0.0),
            Viewport::new(0.0, 0.0, -5.0, 600.0),
        ] {
            assert_eq!(vp.aspect(), 1.0);
            assert!(!vp.is_drawable());
            let _ = cam.project(&Point3::origin(), &vp);
        }
        assert!(viewport().is_drawable());
        assert!((viewport().aspect() - 800.0 / 600.0).abs() < 1e-9);
    }

    #[test]
    fn path_splits_where_points_are_culled() {
        let cam = OrbitCamera::default();
        let vp = viewport();
        let m = cam.view_projection(&vp);
        let behind = Point3::new(40.0, 40.0, 40.0);
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            behind,
            Point3::new(0.0, 1.0, 0.0),
            behind,
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(0.0, 0.0, 3.0),
        ];
        let runs = visible_runs(&m, &points, &vp);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].len(), 3);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = OrbitCamera::default();
        cam.zoom(1e-6);
        assert_eq!(cam.distance, MIN_DISTANCE);
        cam.zoom(1e9);
        assert_eq!(cam.distance, MAX_DISTANCE);
    }

    #[test]
    fn orbit_keeps_distance_and_clamps_pitch() {
        let mut cam = OrbitCamera::default();
        let d = cam.distance;
        cam.orbit(0.7, 10.0);
        assert!((cam.pitch - PITCH_LIMIT).abs() < 1e-12);
        assert!(((cam.eye() - cam.target).norm() - d).abs() < 1e-9);
    }

    #[test]
    fn pan_moves_target_not_orientation() {
        let mut cam = OrbitCamera::default();
        let (yaw, pitch) = (cam.yaw, cam.pitch);
        cam.pan(0.1, 0.0);
        assert!(cam.target.coords.norm() > 0.0);
        assert_eq!((cam.yaw, cam.pitch), (yaw, pitch));
        // right vector is horizontal
        assert!(cam.target.y.abs() < 1e-9);
    }
}
