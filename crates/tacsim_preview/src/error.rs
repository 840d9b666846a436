use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a preview. None of these are recoverable, they're reported to the
/// user as a single line and the previewer exits.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(
        "Cannot display .{extension} files: '{tool}' command not found. \
        Export the file to OBJ or glTF first."
    )]
    ToolMissing { tool: String, extension: String },

    #[error(
        "Failed to convert .{extension} file with {tool} ({reason}). \
        Ensure {tool} supports the format or export the file manually."
    )]
    Conversion {
        tool: String,
        extension: String,
        reason: String,
    },

    #[error("Unable to load mesh from {}", .0.display())]
    EmptyMesh(PathBuf),

    #[error("Unable to load mesh from {}: {cause:#}", path.display())]
    Load { path: PathBuf, cause: anyhow::Error },

    #[error("couldn't read config {}: {cause:#}", path.display())]
    Config { path: PathBuf, cause: anyhow::Error },

    #[error("viewer failed: {0:#}")]
    Viewer(anyhow::Error),
}
