//! # Doodler Core
//!
//! Platform-independent pieces of the Doodler canvas editor: coordinate
//! mapping, colors, the tool catalog, input events, the history log and the
//! persistent history store contract.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                doodler-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Geometry        │  Input                   │
//! │  - Pointer map   │  - Pointer / touch       │
//! │  - Viewport fit  │  - Keys / text overlay   │
//! │  - Colors        │  - Tool catalog          │
//! ├─────────────────────────────────────────────┤
//! │  History Log     │  History Store           │
//! │  - Items         │  - Memory                │
//! │  - Cursor        │  - JSON files            │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod confirm;
pub mod error;
pub mod event;
pub mod geometry;
pub mod history;
pub mod store;
pub mod text;
pub mod tool;

pub use color::{hex_to_rgba, is_transparent};
pub use confirm::{AlwaysConfirm, Confirm, DestructiveAction, NeverConfirm};
pub use error::{CanvasError, CanvasResult};
pub use event::{
    InputEvent, KeyModifiers, PointerEvent, PointerPhase, TouchEvent, TouchPhase, TouchPoint,
};
pub use geometry::{fit_canvas_to_viewport, pointer_to_canvas_coords, ClientRect, Point};
pub use history::{HistoryItem, HistoryKind, HistoryLog};
pub use store::{FileHistoryStore, HistoryStore, MemoryHistoryStore, StoreError};
pub use text::TextEditState;
pub use tool::{SettingsPatch, Tool, ToolDefaults, ToolId, ToolSettings, TOOLS};

/// Doodler core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
