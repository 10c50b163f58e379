//! Scripted input replay.
//!
//! A script is a JSON document with a viewport size and a list of steps.
//! Each step maps to one session call:
//!
//! ```json
//! {
//!   "viewport_width": 232,
//!   "viewport_height": 232,
//!   "steps": [
//!     { "action": "select_tool", "tool": "rectangle" },
//!     { "action": "settings", "patch": { "stroke_color": "#ff0000" } },
//!     { "action": "event", "event": { "type": "Pointer",
//!       "data": { "phase": "down", "client_x": 10, "client_y": 10 } } },
//!     { "action": "undo" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use doodler_core::{AlwaysConfirm, InputEvent, SettingsPatch, ToolId};
use doodler_engine::{Doodler, ResizeTrigger};
use serde::{Deserialize, Serialize};

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReplayStep {
    /// Resize the viewport.
    Resize {
        /// Viewport width.
        width: u32,
        /// Viewport height.
        height: u32,
        /// What caused the resize.
        #[serde(default = "viewport_trigger")]
        trigger: ResizeTrigger,
    },
    /// Select a tool.
    SelectTool {
        /// Tool to select.
        tool: ToolId,
    },
    /// Change tool settings.
    Settings {
        /// Fields to change.
        patch: SettingsPatch,
    },
    /// Dispatch an input event.
    Event {
        /// The event.
        event: InputEvent,
    },
    /// Step back in history.
    Undo,
    /// Step forward in history.
    Redo,
    /// Jump to the oldest entry.
    Reset,
    /// Jump to the entry at `index` (oldest is 0).
    GoTo {
        /// Position in the log.
        index: usize,
    },
    /// Wipe the canvas to white.
    Clear,
    /// Import an image file. Relative paths resolve against the script.
    Import {
        /// Image path.
        path: PathBuf,
    },
}

const fn viewport_trigger() -> ResizeTrigger {
    ResizeTrigger::Viewport
}

/// A replay script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Initial viewport width.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    /// Initial viewport height.
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    /// Steps, in order.
    #[serde(default)]
    pub steps: Vec<ReplayStep>,
}

const fn default_viewport_width() -> u32 {
    832
}

const fn default_viewport_height() -> u32 {
    632
}

impl ReplayScript {
    /// Parse a script from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or unknown actions.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("parsing replay script")
    }

    /// Load a script file, resolving relative import paths against its
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut script = Self::from_json(&json)?;
        if let Some(base) = path.parent() {
            for step in &mut script.steps {
                if let ReplayStep::Import { path } = step {
                    if path.is_relative() {
                        *path = base.join(&*path);
                    }
                }
            }
        }
        Ok(script)
    }
}

/// Run every step against `doodler`, after an initial resize to the
/// script's viewport.
///
/// # Errors
///
/// Stops at the first failing step and reports its position.
pub fn run_script(doodler: &mut Doodler, script: &ReplayScript) -> anyhow::Result<()> {
    doodler.resize(
        script.viewport_width,
        script.viewport_height,
        ResizeTrigger::Initial,
    )?;
    for (i, step) in script.steps.iter().enumerate() {
        tracing::trace!("Replay step {i}: {step:?}");
        run_step(doodler, step).with_context(|| format!("replay step {i}"))?;
    }
    tracing::info!(
        "Replayed {} steps, {} history entries",
        script.steps.len(),
        doodler.history().len()
    );
    Ok(())
}

fn run_step(doodler: &mut Doodler, step: &ReplayStep) -> anyhow::Result<()> {
    match step {
        ReplayStep::Resize {
            width,
            height,
            trigger,
        } => {
            doodler.resize(*width, *height, *trigger)?;
        }
        ReplayStep::SelectTool { tool } => doodler.select_tool(*tool)?,
        ReplayStep::Settings { patch } => doodler.update_settings(patch.clone())?,
        ReplayStep::Event { event } => {
            doodler.handle_event(event)?;
        }
        ReplayStep::Undo => {
            doodler.undo()?;
        }
        ReplayStep::Redo => {
            doodler.redo()?;
        }
        ReplayStep::Reset => {
            doodler.reset()?;
        }
        ReplayStep::GoTo { index } => {
            let id = doodler
                .history()
                .items()
                .get(*index)
                .map(|item| item.id.clone())
                .with_context(|| format!("no history entry at {index}"))?;
            doodler.go_to(&id)?;
        }
        ReplayStep::Clear => {
            doodler.clear_canvas(&mut AlwaysConfirm)?;
        }
        ReplayStep::Import { path } => {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            doodler.import_image(&bytes)?;
        }
    }
    Ok(())
}
