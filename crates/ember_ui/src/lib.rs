//! # Ember UI
//!
//! Immediate-mode UI toolkit with retained layout, built on the ember
//! memory substrate.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      FRAME PIPELINE                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  begin → declare boxes → end → draw list                 │
//! │    ↓          ↓            ↓        ↓                    │
//! │  recycle   frame arena   layout   layer-order            │
//! │  slot      + key cache   solve    tessellation           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The tree is declared from scratch every frame against an implicit
//! parent stack; a key cache maps string-derived identities to the most
//! recent box carrying them, so state can follow an identity across the
//! rebuild. Frame storage is double-buffered: the previous frame's tree
//! stays readable while the next one is declared.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_ui::{BoxFlags, MonospaceSource, Size, UiState, Vec2};
//!
//! let mut ui = UiState::new(&font)?;
//! loop {
//!     ui.begin(Vec2::new(1280.0, 720.0))?;
//!     let panel = ui.make_box(BoxFlags::from_bits(BoxFlags::DRAW_BACKGROUND), "panel###main")?;
//!     ui.node_mut(panel).unwrap().size[0] = Size::parent_percent(0.25);
//!     ui.end()?;
//!     let draw_list = ui.draw_list(); // hand vertices to the GL layer
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod font;
pub mod geometry;
pub mod key;
mod layout;
pub mod render;
pub mod size;
pub mod state;
pub mod style;
pub mod tree;

pub use config::UiConfig;
pub use error::{UiError, UiResult};
pub use font::{FontCache, FontMetrics, GlyphSource, MonospaceSource};
pub use geometry::{Axis, Rect, Vec2};
pub use key::{BoxKey, Crc32Hasher, KeyHasher, KeyMap, DEFAULT_KEY_BUCKETS, KEY_DELIMITER};
pub use render::{DrawCommand, DrawList, UiVertex};
pub use size::{Size, SizeKind};
pub use state::UiState;
pub use style::{BoxStyle, Color};
pub use tree::{BoxFlags, BoxId, BoxNode, FrameTree};
