//! # Memory Management
//!
//! Pre-reserved arenas and a bucketed heap for allocation-free steady state.
//!
//! ## Design Philosophy
//!
//! Address space is reserved once at startup. After warm-up:
//! - No reallocation, ever - offsets stay valid for an arena's lifetime
//! - Bulk reset (arena) or recycled chunks (heap), no general-purpose free
//! - Predictable, flat latency

mod arena;
mod heap;
mod region;

pub use arena::{Arena, Span, ARENA_DEFAULT_ALIGN};
pub use heap::{Heap, HeapBlock, HEAP_BUCKET_COUNT};
pub use region::{Region, COMMIT_GRANULE};
