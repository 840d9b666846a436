use crate::PreviewError;
use std::path::{Path, PathBuf};

/// An asset file that's been resolved against the working directory and confirmed to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    path: PathBuf,
    extension: String,
}

impl AssetPath {
    /// Makes `path` absolute and checks that something's actually there.
    pub fn resolve(path: &Path) -> Result<Self, PreviewError> {
        let path =
            std::path::absolute(path).map_err(|_| PreviewError::NotFound(path.to_owned()))?;
        if !path.exists() {
            return Err(PreviewError::NotFound(path));
        }

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(Self { path, extension })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercase extension without the dot, empty if there's none.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The bare file name, used as the viewer's title.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn resolves_existing_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("Crate_Large.OBJ");
        fs::write(&file, "").unwrap();

        let asset = AssetPath::resolve(&file).unwrap();
        assert!(asset.path().is_absolute());
        assert_eq!(asset.extension(), "obj");
        assert_eq!(asset.file_name(), "Crate_Large.OBJ");
    }

    #[test]
    fn relative_paths_become_absolute() {
        let err = AssetPath::resolve(Path::new("surely/missing/model.fbx")).unwrap_err();
        let PreviewError::NotFound(path) = &err else {
            panic!("unexpected error: {err}");
        };
        assert!(path.is_absolute());
        assert!(path.ends_with("surely/missing/model.fbx"));
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn missing_extension_is_empty() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("mesh");
        fs::write(&file, "").unwrap();
        assert_eq!(AssetPath::resolve(&file).unwrap().extension(), "");
    }
}
