//! # Doodler Engine
//!
//! Canvas editing engine: the canvas state model, the interaction state
//! machine, undo/redo history mirrored to a persistent store, and the
//! generative edit bridge.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       Doodler                        │
//! ├──────────────────────────────────────────────────────┤
//! │  InteractionEngine   │  HistoryEngine                │
//! │  - gesture dispatch  │  - HistoryLog (cursor)        │
//! │  - text overlay      │  - HistoryStore mirror        │
//! │  - shortcuts         │                               │
//! ├──────────────────────┼───────────────────────────────┤
//! │  CanvasModel         │  GenerativeBridge             │
//! │  - snapshot/working  │  - single-flight begin/finish │
//! │  - pan, resize       │  - ImageGenerator (HTTP)      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use doodler_core::{InputEvent, MemoryHistoryStore, PointerEvent, PointerPhase};
//! use doodler_engine::{Doodler, DoodlerConfig, ResizeTrigger};
//!
//! # fn main() -> Result<(), doodler_engine::EngineError> {
//! let mut doodler = Doodler::new(
//!     DoodlerConfig::default(),
//!     Box::new(MemoryHistoryStore::new()),
//!     None,
//! )?;
//! doodler.resize(1280, 800, ResizeTrigger::Initial)?;
//! for (phase, x, y) in [
//!     (PointerPhase::Down, 10.0, 10.0),
//!     (PointerPhase::Move, 80.0, 40.0),
//!     (PointerPhase::Up, 80.0, 40.0),
//! ] {
//!     doodler.handle_event(&InputEvent::Pointer(PointerEvent::new(phase, x, y)))?;
//! }
//! assert_eq!(doodler.history().len(), 2);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bridge;
pub mod canvas;
pub mod config;
pub mod error;
pub mod history;
pub mod interaction;
pub mod session;

pub use bridge::{
    BridgeError, GenerateRequest, GenerateResponse, GenerativeBridge, HttpImageGenerator,
    ImageGenerator, PendingEdit, USER_ERROR_MESSAGE,
};
pub use canvas::{CanvasModel, ResizeOutcome, ResizeTrigger};
pub use config::DoodlerConfig;
pub use error::{EngineError, EngineResult};
pub use history::HistoryEngine;
pub use interaction::{
    gesture_handler, GestureHandler, GestureState, InteractionEngine, InteractionState, Outcome,
};
pub use session::Doodler;

/// Doodler engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
