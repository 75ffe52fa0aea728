use std::io::{BufReader, Cursor, Read};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::error::{Result, ViewerError};

// ---------------------------------------------------------------------------
// Triangle mesh
// ---------------------------------------------------------------------------

/// Triangle mesh centered on the origin and scaled to a unit bounding radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3<f64>>,
    pub triangles: Vec<[usize; 3]>,
}

impl Mesh {
    /// Build a mesh from flat OBJ buffers, recentering and rescaling it.
    pub fn from_buffers(positions: &[f32], indices: &[u32]) -> Result<Self> {
        if positions.len() < 9 || positions.len() % 3 != 0 || indices.len() % 3 != 0 {
            return Err(ViewerError::Asset("mesh has no triangles".into()));
        }
        let raw: Vec<Point3<f64>> = positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64))
            .collect();

        let n = raw.len() as f64;
        let centroid = raw.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / n;
        let radius = raw
            .iter()
            .map(|p| (p.coords - centroid).norm())
            .fold(0.0_f64, f64::max);
        if radius <= 0.0 || !radius.is_finite() {
            return Err(ViewerError::Asset("mesh is degenerate".into()));
        }
        let vertices = raw.iter().map(|p| Point3::from((p.coords - centroid) / radius)).collect();

        let mut triangles = Vec::with_capacity(indices.len() / 3);
        for t in indices.chunks_exact(3) {
            let tri = [t[0] as usize, t[1] as usize, t[2] as usize];
            if tri.iter().any(|&i| i >= raw.len()) {
                return Err(ViewerError::Asset("mesh index out of range".into()));
            }
            triangles.push(tri);
        }
        if triangles.is_empty() {
            return Err(ViewerError::Asset("mesh has no triangles".into()));
        }
        Ok(Mesh { vertices, triangles })
    }

    /// Face normal (unnormalized inputs, normalized output).
    pub fn normal(&self, tri: &[usize; 3]) -> Vector3<f64> {
        let [a, b, c] = tri.map(|i| self.vertices[i]);
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len > 0.0 { n / len } else { Vector3::y() }
    }
}

// ---------------------------------------------------------------------------
// Asset source and background loading
// ---------------------------------------------------------------------------

/// Where the actor model comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetSource {
    File(String),
    Url(String),
}

impl AssetSource {
    /// `http://` and `https://` locations are fetched; anything else is a path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            AssetSource::Url(location.to_string())
        } else {
            AssetSource::File(location.to_string())
        }
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        match self {
            AssetSource::File(path) => std::fs::read(path)
                .map_err(|e| ViewerError::Asset(format!("{path}: {e}"))),
            AssetSource::Url(url) => {
                let resp = ureq::get(url)
                    .call()
                    .map_err(|e| ViewerError::Asset(format!("{url}: {e}")))?;
                let mut buf = Vec::new();
                resp.into_reader()
                    .read_to_end(&mut buf)
                    .map_err(|e| ViewerError::Asset(format!("{url}: {e}")))?;
                Ok(buf)
            }
        }
    }
}

/// Parse a Wavefront OBJ document into a single merged mesh.
pub fn parse_obj(bytes: &[u8]) -> Result<Mesh> {
    let opts = tobj::LoadOptions { triangulate: true, single_index: true, ..Default::default() };
    let mut reader = BufReader::new(Cursor::new(bytes));
    let (models, _materials) = tobj::load_obj_buf(&mut reader, &opts, |_| Ok(Default::default()))
        .map_err(|e| ViewerError::Asset(format!("obj parse: {e}")))?;

    let mut positions: Vec<f32> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    for model in &models {
        let base = (positions.len() / 3) as u32;
        positions.extend_from_slice(&model.mesh.positions);
        indices.extend(model.mesh.indices.iter().map(|i| i + base));
    }
    Mesh::from_buffers(&positions, &indices)
}

pub fn load(source: &AssetSource) -> Result<Mesh> {
    let bytes = source.read_bytes()?;
    let mesh = parse_obj(&bytes)?;
    debug!(?source, triangles = mesh.triangles.len(), "model loaded");
    Ok(mesh)
}

/// Loads the actor model off the UI thread.
pub struct AssetLoader;

impl AssetLoader {
    /// Start loading; the result arrives exactly once on the returned channel.
    pub fn spawn(source: AssetSource) -> Receiver<Result<Mesh>> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = load(&source);
            if let Err(e) = &result {
                warn!("model load failed ({e}), keeping sphere");
            }
            let _ = tx.send(result);
        });
        rx
    }
}
