use crate::{AssetPath, Converter, MeshLoader, PreviewError, TriangleMesh, Viewer};
use log::*;
use std::path::Path;

/// Walks a single asset from a path on the command line up to the viewer window.
///
/// Every capability is injected, so the whole flow can run without a converter executable or a
/// GPU around.
pub struct Previewer<C, L, V> {
    converter: C,
    loader: L,
    viewer: V,
}

impl<C: Converter, L: MeshLoader, V: Viewer> Previewer<C, L, V> {
    pub fn new(converter: C, loader: L, viewer: V) -> Self {
        Self {
            converter,
            loader,
            viewer,
        }
    }

    /// Resolves, loads and displays the asset, returning once the viewer is closed.
    pub fn preview(&mut self, path: &Path) -> Result<(), PreviewError> {
        let asset = AssetPath::resolve(path)?;
        debug!("Resolved asset path: {}", asset.path().display());

        let mesh = self.load(&asset)?;
        self.viewer
            .show(mesh, &asset.file_name())
            .map_err(PreviewError::Viewer)
    }

    /// Loads the asset, going through the converter for formats the loader can't read, and
    /// computes its vertex normals.
    pub fn load(&self, asset: &AssetPath) -> Result<TriangleMesh, PreviewError> {
        let mut mesh = if self.loader.supports(asset.extension()) {
            self.load_file(asset.path(), asset.path())?
        } else {
            let converted = self.converter.convert(asset)?;
            // `converted` is removed from disk once it goes out of scope, loaded or not
            self.load_file(converted.path(), asset.path())?
        };

        mesh.compute_vertex_normals();
        info!(
            "Loaded {} ({} vertices, {} triangles)",
            asset.file_name(),
            mesh.positions.len(),
            mesh.triangles.len()
        );
        Ok(mesh)
    }

    /// Errors are reported against `source`, the file the user actually asked for.
    fn load_file(&self, file: &Path, source: &Path) -> Result<TriangleMesh, PreviewError> {
        let mesh = self.loader.load(file).map_err(|cause| PreviewError::Load {
            path: source.to_owned(),
            cause,
        })?;

        if mesh.is_empty() {
            return Err(PreviewError::EmptyMesh(source.to_owned()));
        }
        Ok(mesh)
    }
}
