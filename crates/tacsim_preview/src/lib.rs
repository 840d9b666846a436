//! TacSim asset previewer
//!
//! Opens a single 3D model in an interactive window. It's completely standalone and doesn't
//! rely on any of the simulation code. OBJ, glTF, STL and PLY files are loaded directly,
//! anything else is first exported to OBJ with an external converter (Assimp by default).

use clap::Parser;
use std::path::PathBuf;

pub mod asset;
pub mod config;
pub mod convert;
pub mod error;
pub mod loader;
pub mod mesh;
pub mod previewer;
pub mod viewer;

pub use asset::AssetPath;
pub use config::PreviewConfig;
pub use convert::{AssimpConverter, Converter, TempAsset};
pub use error::PreviewError;
pub use loader::{MeshLoader, NativeLoader};
pub use mesh::TriangleMesh;
pub use previewer::Previewer;
pub use viewer::{Viewer, WindowViewer};

/// User-specified command line parameters
#[derive(Debug, Parser)]
#[command(name = "preview", version, about = "Preview a 3D asset")]
pub struct Cli {
    /// Path to the model file to display.
    pub path: PathBuf,

    /// Converter executable for formats that can't be loaded directly. Takes priority over
    /// the config file.
    #[arg(long)]
    pub converter: Option<String>,

    /// TOML file with converter and viewer settings.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Enables debug logging.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Runs the previewer as if it was ran from the command line.
pub fn run(cli: Cli) -> Result<(), PreviewError> {
    let mut config = match &cli.config {
        Some(path) => PreviewConfig::load(path)?,
        None => PreviewConfig::default(),
    };
    if let Some(program) = cli.converter {
        config.converter.program = program;
    }

    let mut previewer = Previewer::new(
        AssimpConverter::new(config.converter.program),
        NativeLoader,
        WindowViewer::new(config.viewer),
    );
    previewer.preview(&cli.path)
}
