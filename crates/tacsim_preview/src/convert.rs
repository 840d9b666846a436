//! External format conversion
//!
//! Formats without a native loader (FBX, Maya binaries, and so on) are handed to an external
//! command line converter, which exports them as OBJ next to the source file. The exported file
//! only lives as long as its [`TempAsset`] guard.
//!
//! Files already sitting at the export paths are never overwritten or removed. In that case the
//! export goes to a private temporary directory instead.

use crate::{AssetPath, PreviewError};
use log::*;
use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};
use tempfile::TempDir;

/// Converter used when nothing else is configured.
pub const DEFAULT_CONVERTER: &str = "assimp";

pub trait Converter {
    /// Exports `asset` into a format supported by the native loaders.
    fn convert(&self, asset: &AssetPath) -> Result<TempAsset, PreviewError>;
}

/// A file that gets deleted together with the guard, along with any companion files the
/// converter might've written next to it.
#[derive(Debug)]
pub struct TempAsset {
    path: PathBuf,
    companions: Vec<PathBuf>,
    /// Removed, with everything in it, after the files above
    dir: Option<TempDir>,
}

impl TempAsset {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            companions: vec![],
            dir: None,
        }
    }

    /// A file named `file_name` inside `dir`, which lives as long as the guard does.
    pub fn in_dir(dir: TempDir, file_name: &OsStr) -> Self {
        Self {
            path: dir.path().join(file_name),
            companions: vec![],
            dir: Some(dir),
        }
    }

    /// Also removes `path` when the guard is dropped.
    pub fn with_companion(mut self, path: PathBuf) -> Self {
        self.companions.push(path);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAsset {
    fn drop(&mut self) {
        for path in std::iter::once(&self.path).chain(&self.companions) {
            match fs::remove_file(path) {
                Ok(()) => trace!("Removed temporary file {}", path.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => warn!("Couldn't remove temporary file {}: {err}", path.display()),
            }
        }

        if let Some(dir) = self.dir.take() {
            let dir_path = dir.path().to_owned();
            if let Err(err) = dir.close() {
                warn!("Couldn't remove temporary directory {}: {err}", dir_path.display());
            }
        }
    }
}

/// Where the converted copy of `source` is written: `<stem>_tmp.obj` in the same directory.
pub fn temp_path_for(source: &Path) -> PathBuf {
    let mut file_name = source.file_stem().unwrap_or_default().to_owned();
    file_name.push("_tmp.obj");
    source.with_file_name(file_name)
}

/// Runs `<program> export <input> <output>`, the Assimp command line interface.
#[derive(Debug, Clone)]
pub struct AssimpConverter {
    program: String,
}

impl AssimpConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn failure(&self, asset: &AssetPath, reason: impl Into<String>) -> PreviewError {
        PreviewError::Conversion {
            tool: self.program.clone(),
            extension: asset.extension().to_owned(),
            reason: reason.into(),
        }
    }
}

impl Default for AssimpConverter {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERTER)
    }
}

impl Converter for AssimpConverter {
    fn convert(&self, asset: &AssetPath) -> Result<TempAsset, PreviewError> {
        let output_path = temp_path_for(asset.path());
        let material_path = output_path.with_extension("mtl");

        // The guard is set up before the tool runs, so a half-written export gets cleaned up too.
        // It may only own paths that were free beforehand.
        let output = if output_path.exists() || material_path.exists() {
            let dir = tempfile::Builder::new()
                .prefix("tacsim_preview")
                .tempdir()
                .map_err(|err| {
                    self.failure(asset, format!("couldn't create a temporary directory: {err}"))
                })?;
            debug!(
                "{} is taken, exporting into {} instead",
                output_path.display(),
                dir.path().display()
            );
            TempAsset::in_dir(dir, output_path.file_name().unwrap_or_default())
        } else {
            TempAsset::new(output_path).with_companion(material_path)
        };

        info!(
            "Converting {} with `{} export`...",
            asset.path().display(),
            self.program
        );
        debug!("Exporting to {}", output.path().display());

        let result = Command::new(&self.program)
            .arg("export")
            .arg(asset.path())
            .arg(output.path())
            .output();

        let result = match result {
            Ok(result) => result,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(PreviewError::ToolMissing {
                    tool: self.program.clone(),
                    extension: asset.extension().to_owned(),
                });
            }
            Err(err) => return Err(self.failure(asset, format!("couldn't run it: {err}"))),
        };

        for line in String::from_utf8_lossy(&result.stderr).lines() {
            debug!("{}: {line}", self.program);
        }

        if !result.status.success() {
            return Err(self.failure(asset, format!("it exited with {}", result.status)));
        }
        if !output.path().exists() {
            return Err(self.failure(asset, "no output file was produced"));
        }

        Ok(output)
    }
}
