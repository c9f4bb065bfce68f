//! # Ember Core
//!
//! Memory substrate for the ember UI toolkit:
//! - [`Region`]: reserve / commit / release over a stable address range
//! - [`Arena`]: linear bump allocation with bulk reset
//! - [`Heap`]: size-bucketed free lists for individual alloc/free
//!
//! ## Architecture Rules
//!
//! 1. **Reserve once** - every allocator claims its full address range up
//!    front and never reallocates
//! 2. **Offsets, not pointers** - allocations are spans into their arena,
//!    so the whole substrate stays in safe Rust
//! 3. **Single-threaded** - one arena per owner, no locks
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_core::Arena;
//!
//! let mut frame = Arena::new(1 << 20);
//! let span = frame.push_bytes(b"per-frame data")?;
//! // ... end of frame:
//! frame.clear(); // committed pages retained, cursor back to zero
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod memory;

pub use error::{MemoryError, MemoryResult};
pub use memory::{Arena, Heap, HeapBlock, Region, Span, ARENA_DEFAULT_ALIGN, COMMIT_GRANULE, HEAP_BUCKET_COUNT};
