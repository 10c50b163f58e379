//! Canvas state: committed snapshot, working raster and pan offset.
//!
//! Gestures draw into the *working* raster. Committing copies it to the
//! *snapshot*; discarding copies the snapshot back. While idle the two are
//! identical. What the user sees is the working raster over white,
//! translated by the pan offset.

use doodler_core::{fit_canvas_to_viewport, Point};
use doodler_renderer::Raster;
use serde::{Deserialize, Serialize};

use crate::config::DoodlerConfig;
use crate::error::EngineResult;

/// What caused a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeTrigger {
    /// First layout of the session.
    Initial,
    /// The window or viewport changed size.
    Viewport,
    /// An on-screen keyboard appeared or disappeared. Ignored, so content is
    /// never rescaled while typing.
    Keyboard,
}

/// Result of a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// A fresh white canvas was created.
    Created,
    /// Existing content was scaled into the new size.
    Rescaled,
    /// Nothing changed.
    Skipped,
}

/// The canvas surface owned by a session.
#[derive(Debug, Clone)]
pub struct CanvasModel {
    width: u32,
    height: u32,
    snapshot: Raster,
    working: Raster,
    pan_offset: Point,
    scale: f32,
    has_content: bool,
    max_dimension: u32,
    viewport_padding: u32,
}

impl CanvasModel {
    /// Create a white canvas at the configured initial size.
    ///
    /// # Errors
    ///
    /// Returns an error if the raster cannot be allocated.
    pub fn new(config: &DoodlerConfig) -> EngineResult<Self> {
        let snapshot = Raster::white(config.initial_width, config.initial_height)?;
        Ok(Self {
            width: config.initial_width,
            height: config.initial_height,
            working: snapshot.clone(),
            snapshot,
            pan_offset: Point::default(),
            scale: 1.0,
            has_content: false,
            max_dimension: config.max_dimension,
            viewport_padding: config.viewport_padding,
        })
    }

    /// Logical width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Logical height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Last committed raster.
    #[must_use]
    pub const fn snapshot(&self) -> &Raster {
        &self.snapshot
    }

    /// Raster gestures draw into.
    #[must_use]
    pub const fn working(&self) -> &Raster {
        &self.working
    }

    /// Raster gestures draw into, mutably.
    pub fn working_mut(&mut self) -> &mut Raster {
        &mut self.working
    }

    /// Current pan offset.
    #[must_use]
    pub const fn pan_offset(&self) -> Point {
        self.pan_offset
    }

    /// Zoom factor. Always 1.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Whether the canvas has been laid out or had content installed.
    #[must_use]
    pub const fn has_content(&self) -> bool {
        self.has_content
    }

    /// Whether the working raster differs from the snapshot.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.working != self.snapshot
    }

    /// Convert a canvas-space point to logical content coordinates.
    #[must_use]
    pub fn to_logical(&self, canvas_point: Point) -> Point {
        canvas_point.minus(self.pan_offset)
    }

    /// Fit the canvas to a new viewport.
    ///
    /// Without prior content a white canvas is created. With prior content
    /// the old snapshot is drawn translated by the pan offset and stretched
    /// to the new size; the pan offset is then reset since it is baked into
    /// the pixels. Any uncommitted work in the working raster is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the new raster cannot be allocated.
    #[allow(clippy::cast_precision_loss)]
    pub fn resize(
        &mut self,
        viewport_width: u32,
        viewport_height: u32,
        trigger: ResizeTrigger,
    ) -> EngineResult<ResizeOutcome> {
        if trigger == ResizeTrigger::Keyboard {
            tracing::trace!("Ignoring keyboard-triggered resize");
            return Ok(ResizeOutcome::Skipped);
        }

        let (width, height) = fit_canvas_to_viewport(
            viewport_width,
            viewport_height,
            self.viewport_padding,
            self.max_dimension,
        );
        let mut next = Raster::white(width, height)?;

        let outcome = if self.has_content {
            next.draw_scaled(
                &self.snapshot,
                self.pan_offset.x,
                self.pan_offset.y,
                width as f32,
                height as f32,
            );
            self.pan_offset = Point::default();
            ResizeOutcome::Rescaled
        } else {
            ResizeOutcome::Created
        };

        tracing::debug!(
            "Canvas {outcome:?} at {width}x{height} \
             ({trigger:?}, viewport {viewport_width}x{viewport_height})"
        );
        self.width = width;
        self.height = height;
        self.working = next.clone();
        self.snapshot = next;
        self.has_content = true;
        Ok(outcome)
    }

    /// Replace the canvas content wholesale.
    ///
    /// A raster of a different size is copied at the origin into a fresh
    /// transparent buffer of the current size (cropped or padded).
    ///
    /// # Errors
    ///
    /// Returns an error if a buffer cannot be allocated.
    pub fn apply_snapshot(&mut self, raster: Raster) -> EngineResult<()> {
        let raster = if raster.width() == self.width && raster.height() == self.height {
            raster
        } else {
            let mut fitted = Raster::new(self.width, self.height)?;
            fitted.copy_from(&raster);
            fitted
        };
        self.working = raster.clone();
        self.snapshot = raster;
        self.has_content = true;
        Ok(())
    }

    /// Accumulate a pan delta.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_offset.x += dx;
        self.pan_offset.y += dy;
    }

    /// Make the working raster the new snapshot.
    pub fn commit(&mut self) {
        self.snapshot.copy_from(&self.working);
    }

    /// Throw away uncommitted work.
    pub fn discard(&mut self) {
        self.working.copy_from(&self.snapshot);
    }

    /// Compose the visible view: working raster over white, panned.
    ///
    /// # Errors
    ///
    /// Returns an error if the view buffer cannot be allocated.
    pub fn render_view(&self) -> EngineResult<Raster> {
        let mut view = Raster::white(self.width, self.height)?;
        if self.pan_offset == Point::default() {
            view.draw(&self.working, 0, 0);
        } else {
            #[allow(clippy::cast_precision_loss)]
            view.draw_scaled(
                &self.working,
                self.pan_offset.x,
                self.pan_offset.y,
                self.width as f32,
                self.height as f32,
            );
        }
        Ok(view)
    }
}
