//! # UI Error Types
//!
//! All errors that can occur while declaring, solving or rendering a frame.

use crate::geometry::Axis;
use ember_core::MemoryError;
use thiserror::Error;

/// Errors that can occur in the UI toolkit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UiError {
    /// An arena backing the UI ran out of capacity.
    ///
    /// This indicates a sizing bug in the host application. Construction of
    /// the current frame is aborted; the previous completed frame stays
    /// renderable.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// A parent-percent sized box had no fixed-size ancestor on the axis.
    ///
    /// Layout still completes: the box is resolved against the root's size
    /// on that axis as a fallback. The error reports the first offending
    /// box by key so the declaration can be fixed.
    #[error("parent-percent box {key:#010x} has no fixed-size ancestor on the {axis:?} axis")]
    MissingAncestor {
        /// Key hash of the offending box.
        key: u32,
        /// The axis that could not be resolved.
        axis: Axis,
    },

    /// A box id from a recycled frame was used.
    ///
    /// A box is valid for the frame it was built in and one frame after;
    /// its storage is reused once its double-buffer slot cycles around.
    #[error("box from frame {frame} used in frame {current}; its storage has been recycled")]
    StaleBox {
        /// Frame the box was built in.
        frame: u64,
        /// Current frame counter.
        current: u64,
    },

    /// A frame operation was issued outside a `begin`/`end` bracket.
    #[error("no frame is being built; call begin() first")]
    NoActiveFrame,

    /// Startup configuration failed to parse.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for UI operations.
pub type UiResult<T> = Result<T, UiError>;
