use crate::TriangleMesh;
use tacsim_utils::AnyResult;

mod camera;
mod window;

pub use camera::OrbitCamera;
pub use window::WindowViewer;

pub trait Viewer {
    /// Displays the mesh under the given title, blocking until the user closes the view.
    ///
    /// The viewer takes ownership of the mesh for the whole session.
    fn show(&mut self, mesh: TriangleMesh, title: &str) -> AnyResult;
}
