//! Tool catalog and the settings shared by the drawing tools.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::{hex_to_rgba, is_transparent};
use crate::{CanvasError, CanvasResult};

/// Identifier of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    /// Freehand brush.
    Brush,
    /// Freehand eraser (paints background white).
    Eraser,
    /// Straight line.
    Line,
    /// Axis-aligned rectangle.
    Rectangle,
    /// Ellipse inscribed in the dragged box.
    Ellipse,
    /// Flood fill.
    Fill,
    /// Text placement.
    Text,
    /// Hand tool for panning the view.
    Hand,
    /// One-shot image import.
    Image,
    /// One-shot canvas clear.
    Clear,
}

impl ToolId {
    /// Whether selecting this tool keeps the user's stroke color.
    #[must_use]
    pub const fn is_color_capable(self) -> bool {
        matches!(
            self,
            Self::Brush | Self::Line | Self::Rectangle | Self::Ellipse | Self::Fill
        )
    }

    /// Whether this entry is an immediate action rather than a selectable tool.
    #[must_use]
    pub const fn is_action(self) -> bool {
        matches!(self, Self::Image | Self::Clear)
    }

    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brush => "brush",
            Self::Eraser => "eraser",
            Self::Line => "line",
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Fill => "fill",
            Self::Text => "text",
            Self::Hand => "hand",
            Self::Image => "image",
            Self::Clear => "clear",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TOOLS
            .iter()
            .map(|t| t.id)
            .find(|id| id.as_str() == s || (s == "pan" && *id == Self::Hand))
            .ok_or_else(|| CanvasError::InvalidOperation(format!("unknown tool: {s}")))
    }
}

/// Partial settings a tool applies when selected.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToolDefaults {
    /// Line width override.
    pub line_width: Option<f32>,
    /// Stroke color override.
    pub stroke_color: Option<&'static str>,
    /// Fill color override.
    pub fill_color: Option<&'static str>,
    /// Font size override.
    pub font_size: Option<f32>,
    /// Font family override.
    pub font_family: Option<&'static str>,
}

impl ToolDefaults {
    const NONE: Self = Self {
        line_width: None,
        stroke_color: None,
        fill_color: None,
        font_size: None,
        font_family: None,
    };
}

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tool {
    /// Identifier.
    pub id: ToolId,
    /// Display name.
    pub name: &'static str,
    /// Cursor hint for the host.
    pub cursor: &'static str,
    /// Settings merged in on selection.
    pub defaults: ToolDefaults,
}

/// The immutable tool catalog.
pub const TOOLS: [Tool; 10] = [
    Tool {
        id: ToolId::Brush,
        name: "Brush",
        cursor: "crosshair",
        defaults: ToolDefaults {
            line_width: Some(5.0),
            stroke_color: Some("#000000"),
            ..ToolDefaults::NONE
        },
    },
    Tool {
        id: ToolId::Eraser,
        name: "Eraser",
        cursor: "crosshair",
        defaults: ToolDefaults {
            line_width: Some(20.0),
            stroke_color: Some("#ffffff"),
            ..ToolDefaults::NONE
        },
    },
    Tool {
        id: ToolId::Line,
        name: "Line",
        cursor: "crosshair",
        defaults: ToolDefaults {
            line_width: Some(2.0),
            stroke_color: Some("#000000"),
            ..ToolDefaults::NONE
        },
    },
    Tool {
        id: ToolId::Rectangle,
        name: "Rectangle",
        cursor: "crosshair",
        defaults: ToolDefaults {
            line_width: Some(2.0),
            stroke_color: Some("#000000"),
            fill_color: Some("transparent"),
            ..ToolDefaults::NONE
        },
    },
    Tool {
        id: ToolId::Ellipse,
        name: "Ellipse",
        cursor: "crosshair",
        defaults: ToolDefaults {
            line_width: Some(2.0),
            stroke_color: Some("#000000"),
            fill_color: Some("transparent"),
            ..ToolDefaults::NONE
        },
    },
    Tool {
        id: ToolId::Fill,
        name: "Fill",
        cursor: "crosshair",
        defaults: ToolDefaults {
            stroke_color: Some("#000000"),
            ..ToolDefaults::NONE
        },
    },
    Tool {
        id: ToolId::Text,
        name: "Text",
        cursor: "text",
        defaults: ToolDefaults {
            font_size: Some(16.0),
            font_family: Some("Arial"),
            ..ToolDefaults::NONE
        },
    },
    Tool {
        id: ToolId::Hand,
        name: "Hand",
        cursor: "grab",
        defaults: ToolDefaults::NONE,
    },
    Tool {
        id: ToolId::Image,
        name: "Import Image",
        cursor: "pointer",
        defaults: ToolDefaults::NONE,
    },
    Tool {
        id: ToolId::Clear,
        name: "Clear Canvas",
        cursor: "default",
        defaults: ToolDefaults::NONE,
    },
];

impl Tool {
    /// Look up a catalog entry.
    #[must_use]
    pub fn get(id: ToolId) -> &'static Tool {
        TOOLS
            .iter()
            .find(|t| t.id == id)
            .unwrap_or(&TOOLS[0])
    }
}

/// Current drawing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Stroke width in logical pixels.
    pub line_width: f32,
    /// Stroke (and text, and fill-tool) color as hex.
    pub stroke_color: String,
    /// Shape fill color as hex, or `"transparent"` for no fill.
    pub fill_color: String,
    /// Font size in logical pixels.
    pub font_size: f32,
    /// Font family name.
    pub font_family: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            line_width: 5.0,
            stroke_color: "#000000".to_string(),
            fill_color: "#ffffff".to_string(),
            font_size: 16.0,
            font_family: "Arial".to_string(),
        }
    }
}

/// A user-initiated change to some settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    /// New line width.
    pub line_width: Option<f32>,
    /// New stroke color.
    pub stroke_color: Option<String>,
    /// New fill color.
    pub fill_color: Option<String>,
    /// New font size.
    pub font_size: Option<f32>,
    /// New font family.
    pub font_family: Option<String>,
}

impl ToolSettings {
    /// Merge a tool's defaults in, as happens on tool selection.
    ///
    /// The stroke color the user picked survives the switch when the new
    /// tool draws with it.
    pub fn apply_tool_defaults(&mut self, tool: &Tool) {
        let preserved_stroke = self.stroke_color.clone();
        let d = &tool.defaults;

        if let Some(width) = d.line_width {
            self.line_width = width;
        }
        if let Some(stroke) = d.stroke_color {
            self.stroke_color = stroke.to_string();
        }
        if let Some(fill) = d.fill_color {
            self.fill_color = fill.to_string();
        }
        if let Some(size) = d.font_size {
            self.font_size = size;
        }
        if let Some(family) = d.font_family {
            self.font_family = family.to_string();
        }

        if tool.id.is_color_capable() {
            self.stroke_color = preserved_stroke;
        }
    }

    /// Apply an explicit user change.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidColor`] for unparseable colors and
    /// [`CanvasError::InvalidOperation`] for non-positive sizes. Nothing is
    /// changed when an error is returned.
    pub fn update(&mut self, patch: SettingsPatch) -> CanvasResult<()> {
        if let Some(color) = &patch.stroke_color {
            if is_transparent(color) {
                return Err(CanvasError::InvalidColor(color.clone()));
            }
            hex_to_rgba(color)?;
        }
        if let Some(color) = &patch.fill_color {
            hex_to_rgba(color)?;
        }
        for size in [patch.line_width, patch.font_size].into_iter().flatten() {
            if !(size.is_finite() && size > 0.0) {
                return Err(CanvasError::InvalidOperation(format!(
                    "size must be positive, got {size}"
                )));
            }
        }

        if let Some(width) = patch.line_width {
            self.line_width = width;
        }
        if let Some(color) = patch.stroke_color {
            self.stroke_color = color;
        }
        if let Some(color) = patch.fill_color {
            self.fill_color = color;
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(family) = patch.font_family {
            self.font_family = family;
        }
        Ok(())
    }

    /// Stroke color as RGBA.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidColor`] if the stored color is malformed.
    pub fn stroke_rgba(&self) -> CanvasResult<[u8; 4]> {
        hex_to_rgba(&self.stroke_color)
    }

    /// Fill color as RGBA, or `None` when fill is transparent.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidColor`] if the stored color is malformed.
    pub fn fill_rgba(&self) -> CanvasResult<Option<[u8; 4]>> {
        if is_transparent(&self.fill_color) {
            return Ok(None);
        }
        hex_to_rgba(&self.fill_color).map(Some)
    }
}
