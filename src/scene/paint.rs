use eframe::egui::{self, Color32, Pos2, Sense, Shape, Stroke};
use nalgebra::{Matrix4, Point3};

use super::camera::{project_with, visible_runs, Viewport};
use super::session::{rgb, Actor, RenderSession, MODEL_SCALE};
use super::session::{ACTOR_COLOR, TRAJECTORY_COLOR};

const ORBIT_SPEED: f64 = 0.01;    // rad per pixel
const PAN_SPEED: f64 = 0.0015;    // distance fraction per pixel
const ZOOM_SPEED: f64 = 0.002;    // per scroll point

fn color(c: u32) -> Color32 {
    let [r, g, b] = rgb(c);
    Color32::from_rgb(r, g, b)
}

fn shaded(c: u32, factor: f64) -> Color32 {
    let [r, g, b] = rgb(c);
    let f = factor.clamp(0.0, 1.0);
    Color32::from_rgb((r as f64 * f) as u8, (g as f64 * f) as u8, (b as f64 * f) as u8)
}

/// Take camera input and paint one frame of the session, with an optional
/// error message drawn over it.
///
/// Requests a repaint every frame so camera interaction stays live after
/// playback reaches the end.
pub fn paint_session(ui: &mut egui::Ui, session: &mut RenderSession, overlay: Option<&str>) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
    let rect = response.rect;
    let viewport = Viewport::new(rect.left(), rect.top(), rect.width(), rect.height());
    if !viewport.is_drawable() {
        return;
    }

    if response.dragged_by(egui::PointerButton::Primary) {
        let d = response.drag_delta();
        session.camera.orbit(-d.x as f64 * ORBIT_SPEED, d.y as f64 * ORBIT_SPEED);
    }
    if response.dragged_by(egui::PointerButton::Secondary) {
        let d = response.drag_delta();
        session.camera.pan(-d.x as f64 * PAN_SPEED, d.y as f64 * PAN_SPEED);
    }
    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            session.camera.zoom((-(scroll as f64) * ZOOM_SPEED).exp());
        }
    }

    let vp = session.camera.view_projection(&viewport);
    let scene = &session.scene;

    painter.rect_filled(rect, 0.0, color(scene.background));

    let grid_stroke = Stroke::new(1.0, Color32::from_gray(190));
    for seg in scene.grid.segments() {
        line(&painter, &vp, &viewport, &seg, grid_stroke);
    }
    for (seg, c) in scene.axes.segments() {
        line(&painter, &vp, &viewport, &seg, Stroke::new(2.0, color(c)));
    }

    for run in visible_runs(&vp, &scene.path, &viewport) {
        let pts = run.into_iter().map(|[x, y]| Pos2::new(x, y)).collect();
        painter.add(Shape::line(pts, Stroke::new(2.0, color(TRAJECTORY_COLOR))));
    }

    match &scene.actor {
        Actor::Sphere { radius } => {
            let c = scene.actor_position;
            if let Some([x, y]) = project_with(&vp, &c, &viewport) {
                // screen radius from a point offset along the camera's right
                let edge = c + (c - session.camera.eye()).cross(&nalgebra::Vector3::y()).normalize() * *radius;
                let r = project_with(&vp, &edge, &viewport)
                    .map(|[ex, ey]| ((ex - x).powi(2) + (ey - y).powi(2)).sqrt())
                    .unwrap_or(2.0)
                    .max(2.0);
                let toward_eye = (session.camera.eye() - c).normalize();
                painter.circle_filled(Pos2::new(x, y), r, shaded(ACTOR_COLOR, scene.shade(&toward_eye)));
            }
        }
        Actor::Model(mesh) => {
            let eye = session.camera.eye();
            let mut faces: Vec<(f64, Vec<Pos2>, Color32)> = Vec::with_capacity(mesh.triangles.len());
            for tri in &mesh.triangles {
                let world = tri.map(|i| scene.actor_position + mesh.vertices[i].coords * MODEL_SCALE);
                let normal = mesh.normal(tri);
                let center = Point3::from((world[0].coords + world[1].coords + world[2].coords) / 3.0);
                if normal.dot(&(eye - center)) <= 0.0 {
                    continue;
                }
                let projected: Option<Vec<Pos2>> = world
                    .iter()
                    .map(|p| project_with(&vp, p, &viewport).map(|[x, y]| Pos2::new(x, y)))
                    .collect();
                if let Some(pts) = projected {
                    let depth = session.camera.depth(&center);
                    faces.push((depth, pts, shaded(ACTOR_COLOR, scene.shade(&normal))));
                }
            }
            faces.sort_by(|a, b| b.0.total_cmp(&a.0));
            for (_, pts, fill) in faces {
                painter.add(Shape::convex_polygon(pts, fill, Stroke::NONE));
            }
        }
    }

    if let Some(msg) = overlay {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            msg,
            egui::FontId::proportional(18.0),
            Color32::from_rgb(248, 113, 113),
        );
    }

    ui.ctx().request_repaint();
}

fn line(
    painter: &egui::Painter,
    vp: &Matrix4<f64>,
    viewport: &Viewport,
    seg: &[Point3<f64>; 2],
    stroke: Stroke,
) {
    let a = project_with(vp, &seg[0], viewport);
    let b = project_with(vp, &seg[1], viewport);
    if let (Some([ax, ay]), Some([bx, by])) = (a, b) {
        painter.line_segment([Pos2::new(ax, ay), Pos2::new(bx, by)], stroke);
    }
}
