use crate::{convert::DEFAULT_CONVERTER, PreviewError};
use serde::Deserialize;
use std::{fs, path::Path};

/// Settings file passed in with `--config`. Everything in it is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub converter: ConverterSettings,
    pub viewer: ViewerSettings,
}

impl PreviewConfig {
    pub fn load(path: &Path) -> Result<Self, PreviewError> {
        let error = |cause: anyhow::Error| PreviewError::Config {
            path: path.to_owned(),
            cause,
        };

        let text = fs::read_to_string(path).map_err(|e| error(e.into()))?;
        toml::from_str(&text).map_err(|e| error(e.into()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterSettings {
    /// Executable invoked as `<program> export <input> <output>`.
    pub program: String,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_CONVERTER.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerSettings {
    /// Initial window width, in logical pixels.
    pub width: u32,
    /// Initial window height, in logical pixels.
    pub height: u32,
    /// Clear color, linear RGB.
    pub background: [f64; 3],
    /// Base color of the mesh surface, linear RGB.
    pub color: [f32; 3],
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            background: [0.1, 0.1, 0.12],
            color: [0.75, 0.75, 0.78],
        }
    }
}
