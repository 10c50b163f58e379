//! Engine configuration.

use std::path::{Path, PathBuf};

use doodler_renderer::FitPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Settings for a Doodler session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoodlerConfig {
    /// Logical width before the first resize.
    pub initial_width: u32,
    /// Logical height before the first resize.
    pub initial_height: u32,
    /// Longest allowed canvas edge.
    pub max_dimension: u32,
    /// Viewport padding removed before fitting the canvas.
    pub viewport_padding: u32,
    /// Longest edge of the image uploaded for generative edits.
    pub upload_max_dimension: u32,
    /// How generated images are fitted onto the canvas.
    pub fit_policy: FitPolicy,
    /// Sampling temperature forwarded to the generative endpoint (0..=1).
    pub temperature: Option<f32>,
    /// Reject generated results when the canvas was edited while the
    /// request was in flight.
    pub reject_stale_responses: bool,
    /// Font used for the text tool.
    pub font_path: Option<PathBuf>,
}

impl Default for DoodlerConfig {
    fn default() -> Self {
        Self {
            initial_width: 800,
            initial_height: 600,
            max_dimension: 1024,
            viewport_padding: 32,
            upload_max_dimension: 1024,
            fit_policy: FitPolicy::Cover,
            temperature: None,
            reject_stale_responses: false,
            font_path: None,
        }
    }
}

impl DoodlerConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the file cannot be read, parsed or
    /// fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] describing the first violation.
    pub fn validate(&self) -> EngineResult<()> {
        if self.initial_width == 0 || self.initial_height == 0 {
            return Err(EngineError::Config(
                "initial canvas size must be non-zero".to_string(),
            ));
        }
        if self.max_dimension == 0 || self.upload_max_dimension == 0 {
            return Err(EngineError::Config(
                "maximum dimensions must be non-zero".to_string(),
            ));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(EngineError::Config(format!(
                    "temperature must be within 0..=1, got {t}"
                )));
            }
        }
        Ok(())
    }
}
