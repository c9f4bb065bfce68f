//! Box tree storage.
//!
//! The tree is rebuilt from scratch every frame. Nodes live in a contiguous
//! per-frame buffer and reference each other by index, so the whole frame is
//! recycled by clearing the buffer - no per-node bookkeeping, no dangling
//! pointers. References that may outlive the frame are generation-tagged
//! [`BoxId`]s and resolve to `None` once the backing slot cycles.

use crate::geometry::{Axis, Rect, Vec2};
use crate::key::BoxKey;
use crate::size::Size;
use crate::style::BoxStyle;
use ember_core::{Arena, MemoryResult, Span};

/// Box state flags (bitfield for efficiency).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxFlags(u32);

impl BoxFlags {
    /// Box reacts to clicks.
    pub const CLICKABLE: u32 = 1 << 0;
    /// Width is resolved before layout (set by the solver for resolved
    /// upward-dependent sizes too).
    pub const FIXED_WIDTH: u32 = 1 << 1;
    /// Height is resolved before layout.
    pub const FIXED_HEIGHT: u32 = 1 << 2;
    /// Box is excluded from X-axis flow layout; it keeps its own position.
    pub const FLOATING_X: u32 = 1 << 3;
    /// Box is excluded from Y-axis flow layout.
    pub const FLOATING_Y: u32 = 1 << 4;
    /// Children may overflow on X without being shrunk.
    pub const ALLOW_OVERFLOW_X: u32 = 1 << 5;
    /// Children may overflow on Y without being shrunk.
    pub const ALLOW_OVERFLOW_Y: u32 = 1 << 6;
    /// Children are clipped to the box rect when drawn.
    pub const CLIP: u32 = 1 << 7;
    /// The renderer fills the box rect with the background color.
    pub const DRAW_BACKGROUND: u32 = 1 << 8;

    /// No flags set.
    pub const NONE: Self = Self(0);

    /// Creates an empty flag set.
    #[must_use]
    pub const fn new() -> Self {
        Self::NONE
    }

    /// Creates a flag set from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if the flag is set.
    #[inline]
    #[must_use]
    pub const fn has(self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Sets a flag.
    #[inline]
    pub fn set(&mut self, flag: u32) {
        self.0 |= flag;
    }

    /// Clears a flag.
    #[inline]
    pub fn clear(&mut self, flag: u32) {
        self.0 &= !flag;
    }

    /// Returns a copy with the flag added.
    #[must_use]
    pub const fn with(self, flag: u32) -> Self {
        Self(self.0 | flag)
    }

    /// The fixed-size flag for an axis.
    #[must_use]
    pub const fn fixed_flag(axis: Axis) -> u32 {
        match axis {
            Axis::X => Self::FIXED_WIDTH,
            Axis::Y => Self::FIXED_HEIGHT,
        }
    }

    /// The floating flag for an axis.
    #[must_use]
    pub const fn floating_flag(axis: Axis) -> u32 {
        match axis {
            Axis::X => Self::FLOATING_X,
            Axis::Y => Self::FLOATING_Y,
        }
    }

    /// The overflow-allowed flag for an axis.
    #[must_use]
    pub const fn overflow_flag(axis: Axis) -> u32 {
        match axis {
            Axis::X => Self::ALLOW_OVERFLOW_X,
            Axis::Y => Self::ALLOW_OVERFLOW_Y,
        }
    }
}

/// Generation-tagged reference to a box.
///
/// Carries the frame the box was built in; resolving an id against the
/// state fails once the frame's double-buffer slot has been recycled
/// (two frames later).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxId {
    /// Frame the box was built in.
    pub frame: u64,
    /// Index into that frame's node buffer.
    pub index: u32,
}

/// One node of the per-frame box tree.
///
/// Tree links (`first`/`last`/`next`/`prev`/`parent`) are indices into the
/// same frame's node buffer. Hash-cache links may cross into the previous
/// frame and are generation-tagged.
#[derive(Debug, Clone, Default)]
pub struct BoxNode {
    /// First child.
    pub first: Option<u32>,
    /// Last child.
    pub last: Option<u32>,
    /// Next sibling.
    pub next: Option<u32>,
    /// Previous sibling.
    pub prev: Option<u32>,
    /// Parent node; `None` only for the root.
    pub parent: Option<u32>,

    /// Axis along which children are laid out.
    pub child_axis: Axis,
    /// Per-axis size specification.
    pub size: [Size; Axis::COUNT],
    /// Resolved size in pixels, one component per axis.
    pub fixed_size: Vec2,
    /// Resolved position relative to the parent.
    pub fixed_pos: Vec2,
    /// Lower bound the solver will not shrink below.
    pub min_size: Vec2,
    /// Total extent of non-floating children per axis.
    pub view_bounds: Vec2,
    /// Absolute rectangle after layout.
    pub rect: Rect,

    /// State flags.
    pub flags: BoxFlags,
    /// Display text, stored in the frame arena.
    pub text: Span,
    /// Style block.
    pub style: BoxStyle,
    /// Identity key derived from the declared text.
    pub key: BoxKey,
    /// Frame this node was built in.
    pub frame_created: u64,

    /// Next box in the same key-cache bucket.
    pub hash_next: Option<BoxId>,
    /// Previous box in the same key-cache bucket.
    pub hash_prev: Option<BoxId>,
}

/// One slot of the double-buffered frame storage.
///
/// Owns the node buffer and the byte arena that holds the frame's text.
/// Clearing retains capacity in both, so steady-state frames allocate
/// nothing.
#[derive(Debug)]
pub struct FrameTree {
    pub(crate) frame: u64,
    pub(crate) arena: Arena,
    pub(crate) nodes: Vec<BoxNode>,
}

impl FrameTree {
    /// Creates an empty slot with a text arena of `arena_bytes` capacity.
    #[must_use]
    pub fn new(arena_bytes: usize) -> Self {
        Self {
            frame: 0,
            arena: Arena::new(arena_bytes),
            nodes: Vec::new(),
        }
    }

    /// Recycles the slot for a new frame.
    pub(crate) fn reset(&mut self, frame: u64) {
        self.arena.clear();
        self.nodes.clear();
        self.frame = frame;
    }

    /// Returns the frame this slot currently holds.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns the number of nodes in the frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the frame holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns a node by index.
    #[must_use]
    pub fn node(&self, index: u32) -> Option<&BoxNode> {
        self.nodes.get(index as usize)
    }

    /// Returns a node by index, mutably.
    pub fn node_mut(&mut self, index: u32) -> Option<&mut BoxNode> {
        self.nodes.get_mut(index as usize)
    }

    /// Appends a zeroed node and returns its index.
    pub(crate) fn alloc_node(&mut self) -> u32 {
        let index = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        self.nodes.push(BoxNode::default());
        index
    }

    /// Copies text into the frame arena.
    pub(crate) fn push_text(&mut self, text: &str) -> MemoryResult<Span> {
        self.arena.push_bytes(text.as_bytes())
    }

    /// Reads a text span back out of the frame arena.
    ///
    /// Spans handed out by [`FrameTree::push_text`] always hold valid
    /// UTF-8; anything else reads as empty.
    #[must_use]
    pub fn text(&self, span: Span) -> &str {
        std::str::from_utf8(self.arena.bytes(span)).unwrap_or("")
    }

    /// Links `child` as the last child of `parent`, preserving declaration
    /// order.
    pub(crate) fn append_child(&mut self, parent: u32, child: u32) {
        let tail = self.nodes[parent as usize].last;
        {
            let node = &mut self.nodes[child as usize];
            node.parent = Some(parent);
            node.prev = tail;
            node.next = None;
        }
        match tail {
            Some(tail) => self.nodes[tail as usize].next = Some(child),
            None => self.nodes[parent as usize].first = Some(child),
        }
        self.nodes[parent as usize].last = Some(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_set_clear() {
        let mut flags = BoxFlags::new();
        flags.set(BoxFlags::CLICKABLE);
        flags.set(BoxFlags::DRAW_BACKGROUND);
        assert!(flags.has(BoxFlags::CLICKABLE));
        assert!(flags.has(BoxFlags::DRAW_BACKGROUND));
        flags.clear(BoxFlags::CLICKABLE);
        assert!(!flags.has(BoxFlags::CLICKABLE));
    }

    #[test]
    fn test_per_axis_flag_selectors() {
        assert_eq!(BoxFlags::fixed_flag(Axis::X), BoxFlags::FIXED_WIDTH);
        assert_eq!(BoxFlags::fixed_flag(Axis::Y), BoxFlags::FIXED_HEIGHT);
        assert_eq!(BoxFlags::floating_flag(Axis::Y), BoxFlags::FLOATING_Y);
        assert_eq!(BoxFlags::overflow_flag(Axis::X), BoxFlags::ALLOW_OVERFLOW_X);
    }

    #[test]
    fn test_append_child_keeps_declaration_order() {
        let mut tree = FrameTree::new(4096);
        let root = tree.alloc_node();
        let a = tree.alloc_node();
        let b = tree.alloc_node();
        let c = tree.alloc_node();
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(root, c);

        assert_eq!(tree.node(root).unwrap().first, Some(a));
        assert_eq!(tree.node(root).unwrap().last, Some(c));
        assert_eq!(tree.node(a).unwrap().next, Some(b));
        assert_eq!(tree.node(b).unwrap().prev, Some(a));
        assert_eq!(tree.node(b).unwrap().next, Some(c));
        assert_eq!(tree.node(c).unwrap().parent, Some(root));
    }

    #[test]
    fn test_reset_recycles_storage() {
        let mut tree = FrameTree::new(4096);
        let root = tree.alloc_node();
        let span = tree.push_text("hello").unwrap();
        let child = tree.alloc_node();
        tree.append_child(root, child);
        assert_eq!(tree.text(span), "hello");

        tree.reset(7);
        assert_eq!(tree.frame(), 7);
        assert!(tree.is_empty());
    }
}
