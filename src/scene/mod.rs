pub mod camera;
pub mod asset;
pub mod session;
#[cfg(feature = "viz")]
pub mod paint;

pub use asset::{AssetLoader, AssetSource, Mesh};
pub use camera::{OrbitCamera, Viewport};
pub use session::{Actor, RenderSession, Scene, TrajectoryView};
