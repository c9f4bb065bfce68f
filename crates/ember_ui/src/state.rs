//! UI state and the frame lifecycle.
//!
//! One `UiState` owns everything the toolkit needs: a persistent arena for
//! long-lived data (baked font metrics), two frame slots that alternate by
//! frame parity, and the key cache. A frame is one `begin` / declare / `end`
//! bracket; the tree built in frame N stays readable until frame N+2 begins,
//! which is when its slot is recycled.
//!
//! There is no global current-state pointer: the state is an explicit
//! context threaded through every call.

use crate::config::UiConfig;
use crate::error::{UiError, UiResult};
use crate::font::{FontCache, GlyphSource};
use crate::geometry::{Axis, Rect, Vec2};
use crate::key::{split_text, BoxKey, Crc32Hasher, KeyHasher, KeyMap};
use crate::layout;
use crate::render::{self, DrawList};
use crate::tree::{BoxFlags, BoxId, BoxNode, FrameTree};
use ember_core::Arena;

/// The UI toolkit's state: arenas, frame slots, key cache, font metrics.
pub struct UiState {
    persistent: Arena,
    font: FontCache,
    trees: [FrameTree; 2],
    keys: KeyMap,
    hasher: Box<dyn KeyHasher>,
    frame: u64,
    root: Option<BoxId>,
    completed_root: Option<BoxId>,
    current_parent: Option<BoxId>,
    viewport: Vec2,
    building: bool,
    evict_scratch: Vec<BoxId>,
}

impl UiState {
    /// Creates a state with default configuration.
    ///
    /// # Errors
    ///
    /// Propagates persistent-arena exhaustion from font baking.
    pub fn new(font: &dyn GlyphSource) -> UiResult<Self> {
        Self::with_config(font, &UiConfig::default())
    }

    /// Creates a state with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Propagates persistent-arena exhaustion from font baking.
    pub fn with_config(font: &dyn GlyphSource, config: &UiConfig) -> UiResult<Self> {
        let mut persistent = Arena::new(config.persistent_arena_bytes);
        let font = FontCache::bake(font, &mut persistent)?;
        Ok(Self {
            persistent,
            font,
            trees: [
                FrameTree::new(config.frame_arena_bytes),
                FrameTree::new(config.frame_arena_bytes),
            ],
            keys: KeyMap::new(config.key_buckets),
            hasher: Box::new(Crc32Hasher),
            frame: 0,
            root: None,
            completed_root: None,
            current_parent: None,
            viewport: Vec2::ZERO,
            building: false,
            evict_scratch: Vec::new(),
        })
    }

    /// Replaces the key hasher. Intended for tests that need deterministic
    /// collisions; call before the first frame.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Box<dyn KeyHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Returns the current frame counter.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns true inside a `begin`/`end` bracket.
    #[must_use]
    pub const fn is_building(&self) -> bool {
        self.building
    }

    /// Returns the current viewport.
    #[must_use]
    pub const fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Returns the root of the frame being built.
    #[must_use]
    pub const fn root(&self) -> Option<BoxId> {
        self.root
    }

    /// Returns the root of the last completed frame.
    #[must_use]
    pub const fn completed_root(&self) -> Option<BoxId> {
        self.completed_root
    }

    /// Resolves a box id, failing once its frame slot has been recycled.
    #[must_use]
    pub fn node(&self, id: BoxId) -> Option<&BoxNode> {
        let tree = &self.trees[Self::slot(id.frame)];
        if tree.frame() != id.frame {
            return None;
        }
        tree.node(id.index)
    }

    /// Resolves a box id mutably.
    pub fn node_mut(&mut self, id: BoxId) -> Option<&mut BoxNode> {
        let tree = &mut self.trees[Self::slot(id.frame)];
        if tree.frame() != id.frame {
            return None;
        }
        tree.node_mut(id.index)
    }

    /// Returns a box's display text.
    #[must_use]
    pub fn box_text(&self, id: BoxId) -> Option<&str> {
        let tree = &self.trees[Self::slot(id.frame)];
        if tree.frame() != id.frame {
            return None;
        }
        let node = tree.node(id.index)?;
        Some(tree.text(node.text))
    }

    /// Measures a single line of text with the baked font metrics.
    #[must_use]
    pub fn text_width(&self, text: &str) -> f32 {
        self.font.text_width(&self.persistent, text)
    }

    /// Computes the key that `make_box` would derive for `text`.
    #[must_use]
    pub fn key_for(&self, text: &str) -> BoxKey {
        let (_, identity) = split_text(text);
        BoxKey::new(self.hasher.hash_identity(identity.as_bytes()))
    }

    /// Starts a new frame sized to `viewport`.
    ///
    /// Recycles the slot used two frames ago and creates the root box:
    /// viewport-sized, both fixed-size flags set, with a generated key that
    /// stays out of user key space.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` is part of the frame lifecycle
    /// surface alongside [`UiState::end`].
    pub fn begin(&mut self, viewport: Vec2) -> UiResult<()> {
        let frame = self.frame;
        // Only the previous frame's entries may survive into a new frame.
        // Anything else is a leftover from an aborted construction - either
        // in the slot about to be recycled, or from a failed attempt at this
        // same frame number - and re-inserting over such an entry would
        // corrupt its bucket chain.
        let previous = frame.checked_sub(1);
        self.evict_where(|created| Some(created) == previous);

        self.viewport = viewport;
        let slot = Self::slot(frame);
        self.trees[slot].reset(frame);

        let index = self.trees[slot].alloc_node();
        let key = self.root_key(frame);
        {
            let node = &mut self.trees[slot].nodes[index as usize];
            node.flags.set(BoxFlags::FIXED_WIDTH);
            node.flags.set(BoxFlags::FIXED_HEIGHT);
            node.fixed_size = viewport;
            node.child_axis = Axis::X;
            node.key = key;
            node.frame_created = frame;
            node.rect = Rect::from_pos_size(Vec2::ZERO, viewport);
        }
        let root = BoxId { frame, index };
        self.insert_key(root, key);

        self.root = Some(root);
        self.current_parent = Some(root);
        self.building = true;
        tracing::debug!(frame, "ui begin");
        Ok(())
    }

    /// Declares a box under the current parent.
    ///
    /// The display part of `text` is copied into the frame arena; the
    /// identity part (after `###`, or the whole text) derives the key. The
    /// box is appended to the parent's child list and registered in the key
    /// cache. Configure sizes and style through [`UiState::node_mut`] on
    /// the returned id.
    ///
    /// # Errors
    ///
    /// [`UiError::NoActiveFrame`] outside a `begin`/`end` bracket.
    /// [`UiError::Memory`] if the frame arena is exhausted; construction of
    /// this frame is aborted and the previous frame stays renderable.
    pub fn make_box(&mut self, flags: BoxFlags, text: &str) -> UiResult<BoxId> {
        let parent = match self.current_parent {
            Some(parent) if self.building => parent,
            _ => return Err(UiError::NoActiveFrame),
        };
        let frame = self.frame;
        let slot = Self::slot(frame);
        let (display, identity) = split_text(text);
        let key = BoxKey::new(self.hasher.hash_identity(identity.as_bytes()));

        let span = match self.trees[slot].push_text(display) {
            Ok(span) => span,
            Err(err) => {
                self.abort_frame();
                return Err(err.into());
            }
        };

        let tree = &mut self.trees[slot];
        let index = tree.alloc_node();
        {
            let node = &mut tree.nodes[index as usize];
            node.flags = flags;
            node.text = span;
            node.key = key;
            node.frame_created = frame;
        }
        tree.append_child(parent.index, index);

        let id = BoxId { frame, index };
        self.insert_key(id, key);
        Ok(id)
    }

    /// Makes `id` the current parent for subsequent declarations.
    ///
    /// # Errors
    ///
    /// [`UiError::NoActiveFrame`] outside a frame;
    /// [`UiError::StaleBox`] if `id` is not from the frame being built.
    pub fn push_parent(&mut self, id: BoxId) -> UiResult<()> {
        if !self.building {
            return Err(UiError::NoActiveFrame);
        }
        if id.frame != self.frame {
            return Err(UiError::StaleBox {
                frame: id.frame,
                current: self.frame,
            });
        }
        self.current_parent = Some(id);
        Ok(())
    }

    /// Moves the current parent up one level.
    ///
    /// A no-op at the root; popping past the top of the implicit stack is a
    /// declaration-site imbalance, not a crash.
    pub fn pop_parent(&mut self) {
        if let Some(current) = self.current_parent {
            if let Some(parent) = self.node(current).and_then(|node| node.parent) {
                self.current_parent = Some(BoxId {
                    frame: current.frame,
                    index: parent,
                });
            }
        }
    }

    /// Finishes the frame: evicts stale cache entries, runs the layout
    /// solver over both axes, advances the frame counter.
    ///
    /// # Errors
    ///
    /// [`UiError::NoActiveFrame`] without a matching [`UiState::begin`].
    /// [`UiError::MissingAncestor`] if a parent-percent box had no
    /// fixed-size ancestor; layout still completed with the root fallback
    /// and the frame is renderable.
    pub fn end(&mut self) -> UiResult<()> {
        if !self.building {
            return Err(UiError::NoActiveFrame);
        }
        let frame = self.frame;
        self.evict_where(|created| created >= frame);

        let slot = Self::slot(frame);
        let result = layout::solve(
            &mut self.trees[slot],
            &self.font,
            &self.persistent,
            self.viewport,
        );

        self.completed_root = self.root;
        self.current_parent = None;
        self.building = false;
        self.frame = frame + 1;
        tracing::debug!(frame, boxes = self.trees[slot].len(), "ui end");
        result
    }

    /// Builds the draw list for the last completed frame.
    ///
    /// Returns an empty list before the first completed frame. An aborted
    /// construction does not affect this: the previous tree stays valid
    /// until its slot is recycled by a later `begin`.
    #[must_use]
    pub fn draw_list(&self) -> DrawList {
        let Some(root) = self.completed_root else {
            return DrawList::default();
        };
        let tree = &self.trees[Self::slot(root.frame)];
        if tree.frame() != root.frame {
            return DrawList::default();
        }
        render::build_draw_list(tree, root.index)
    }

    /// Finds the most recently declared box for a key.
    #[must_use]
    pub fn lookup(&self, key: BoxKey) -> Option<BoxId> {
        let mut cursor = self.keys.head(self.keys.bucket_of(key));
        while let Some(id) = cursor {
            let node = self.node(id)?;
            if node.key == key {
                return Some(id);
            }
            cursor = node.hash_next;
        }
        None
    }

    /// Finds the previous frame's box for a key, if it was declared then.
    ///
    /// This is the cross-frame read: during construction of frame N it
    /// resolves to frame N-1's instance of the identity.
    #[must_use]
    pub fn lookup_previous(&self, key: BoxKey) -> Option<BoxId> {
        let mut cursor = self.keys.head(self.keys.bucket_of(key));
        while let Some(id) = cursor {
            let node = self.node(id)?;
            if node.key == key && node.frame_created < self.frame {
                return Some(id);
            }
            cursor = node.hash_next;
        }
        None
    }

    /// Counts live key-cache entries. Instrumentation for tests and debug
    /// overlays.
    #[must_use]
    pub fn key_entries(&self) -> usize {
        let mut count = 0;
        for bucket in 0..self.keys.bucket_count() {
            let mut cursor = self.keys.head(bucket);
            while let Some(id) = cursor {
                match self.node(id) {
                    None => break,
                    Some(node) => {
                        count += 1;
                        cursor = node.hash_next;
                    }
                }
            }
        }
        count
    }

    const fn slot(frame: u64) -> usize {
        (frame % 2) as usize
    }

    fn root_key(&self, frame: u64) -> BoxKey {
        // Reserved prefix keeps generated root keys out of user key space.
        let mut identity = [0u8; 16];
        identity[..8].copy_from_slice(b"__root__");
        identity[8..].copy_from_slice(&frame.to_le_bytes());
        BoxKey::new(self.hasher.hash_identity(&identity))
    }

    fn abort_frame(&mut self) {
        tracing::warn!(frame = self.frame, "frame construction aborted");
        self.building = false;
        self.current_parent = None;
    }

    fn insert_key(&mut self, id: BoxId, key: BoxKey) {
        let bucket = self.keys.bucket_of(key);
        let head = self.keys.head(bucket);
        if let Some(node) = self.node_mut(id) {
            node.hash_next = head;
            node.hash_prev = None;
        }
        if let Some(head_id) = head {
            if let Some(node) = self.node_mut(head_id) {
                node.hash_prev = Some(id);
            }
        }
        self.keys.set_head(bucket, Some(id));
    }

    /// Drops every cache entry whose creation frame fails `keep`,
    /// rebuilding each bucket chain from the entries that survive.
    fn evict_where(&mut self, keep: impl Fn(u64) -> bool) {
        let mut kept = std::mem::take(&mut self.evict_scratch);
        for bucket in 0..self.keys.bucket_count() {
            kept.clear();
            let mut changed = false;
            let mut cursor = self.keys.head(bucket);
            while let Some(id) = cursor {
                match self.node(id) {
                    // A chain into recycled storage has nothing reachable
                    // beyond it.
                    None => {
                        changed = true;
                        cursor = None;
                    }
                    Some(node) => {
                        let next = node.hash_next;
                        if keep(node.frame_created) {
                            kept.push(id);
                        } else {
                            changed = true;
                        }
                        cursor = next;
                    }
                }
            }
            if changed {
                self.keys.set_head(bucket, kept.first().copied());
                for i in 0..kept.len() {
                    let prev = if i == 0 { None } else { Some(kept[i - 1]) };
                    let next = kept.get(i + 1).copied();
                    if let Some(node) = self.node_mut(kept[i]) {
                        node.hash_prev = prev;
                        node.hash_next = next;
                    }
                }
            }
        }
        self.evict_scratch = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::MonospaceSource;
    use crate::key::KeyHasher;

    fn ui() -> UiState {
        UiState::new(&MonospaceSource::new(10.0, 20.0)).unwrap()
    }

    fn viewport() -> Vec2 {
        Vec2::new(800.0, 600.0)
    }

    #[test]
    fn test_make_box_outside_frame_fails() {
        let mut ui = ui();
        let err = ui.make_box(BoxFlags::NONE, "early").unwrap_err();
        assert_eq!(err, UiError::NoActiveFrame);
    }

    #[test]
    fn test_root_is_viewport_sized_and_fixed() {
        let mut ui = ui();
        ui.begin(viewport()).unwrap();
        let root = ui.root().unwrap();
        let node = ui.node(root).unwrap();
        assert!(node.flags.has(BoxFlags::FIXED_WIDTH));
        assert!(node.flags.has(BoxFlags::FIXED_HEIGHT));
        assert_eq!(node.fixed_size, viewport());
        assert!(node.parent.is_none());
    }

    #[test]
    fn test_box_text_is_display_segment() {
        let mut ui = ui();
        ui.begin(viewport()).unwrap();
        let id = ui.make_box(BoxFlags::NONE, "Close###dialog_close").unwrap();
        assert_eq!(ui.box_text(id), Some("Close"));
    }

    #[test]
    fn test_pop_parent_at_root_is_noop() {
        let mut ui = ui();
        ui.begin(viewport()).unwrap();
        ui.pop_parent();
        ui.pop_parent();
        let id = ui.make_box(BoxFlags::NONE, "still_under_root").unwrap();
        let root = ui.root().unwrap();
        assert_eq!(ui.node(id).unwrap().parent, Some(root.index));
    }

    #[test]
    fn test_identity_persists_across_frames() {
        let mut ui = ui();
        let key = ui.key_for("panel###main");

        ui.begin(viewport()).unwrap();
        let first = ui.make_box(BoxFlags::NONE, "panel###main").unwrap();
        ui.end().unwrap();
        assert_eq!(ui.lookup(key), Some(first));

        ui.begin(viewport()).unwrap();
        // Before re-declaring, the cache still resolves to last frame's box.
        assert_eq!(ui.lookup(key), Some(first));
        let second = ui.make_box(BoxFlags::NONE, "panel###main").unwrap();
        assert_ne!(first, second);
        assert_eq!(ui.lookup(key), Some(second));
        assert_eq!(ui.lookup_previous(key), Some(first));
        ui.end().unwrap();

        // end() evicted the frame-0 instance.
        assert_eq!(ui.lookup(key), Some(second));
        assert_eq!(ui.lookup_previous(key), None);
    }

    #[test]
    fn test_end_leaves_no_stale_entries() {
        let mut ui = ui();
        for _ in 0..3 {
            ui.begin(viewport()).unwrap();
            ui.make_box(BoxFlags::NONE, "a").unwrap();
            ui.make_box(BoxFlags::NONE, "b").unwrap();
            ui.end().unwrap();
            // Root + two declared boxes, nothing older.
            assert_eq!(ui.key_entries(), 3);
        }
    }

    #[test]
    fn test_undeclared_identity_is_evicted() {
        let mut ui = ui();
        let key = ui.key_for("sometimes");

        ui.begin(viewport()).unwrap();
        ui.make_box(BoxFlags::NONE, "sometimes").unwrap();
        ui.end().unwrap();
        assert!(ui.lookup(key).is_some());

        ui.begin(viewport()).unwrap();
        ui.end().unwrap();
        assert_eq!(ui.lookup(key), None);
    }

    #[test]
    fn test_box_ids_expire_when_slot_recycles() {
        let mut ui = ui();
        ui.begin(viewport()).unwrap();
        let id = ui.make_box(BoxFlags::NONE, "ephemeral").unwrap();
        ui.end().unwrap();

        // Frame 1: the frame-0 tree is still readable.
        ui.begin(viewport()).unwrap();
        assert!(ui.node(id).is_some());
        ui.end().unwrap();

        // Frame 2 recycles frame 0's slot.
        ui.begin(viewport()).unwrap();
        assert!(ui.node(id).is_none());
        let err = ui.push_parent(id).unwrap_err();
        assert_eq!(
            err,
            UiError::StaleBox {
                frame: 0,
                current: 2
            }
        );
    }

    #[test]
    fn test_arena_exhaustion_aborts_frame() {
        let config = UiConfig {
            frame_arena_bytes: 64,
            ..UiConfig::default()
        };
        let mut ui = UiState::with_config(&MonospaceSource::new(10.0, 20.0), &config).unwrap();

        // Complete one frame with visible content.
        ui.begin(viewport()).unwrap();
        let id = ui.make_box(
            BoxFlags::from_bits(BoxFlags::DRAW_BACKGROUND),
            "ok",
        )
        .unwrap();
        ui.node_mut(id).unwrap().size[Axis::X.index()] = crate::size::Size::pixels(10.0);
        ui.end().unwrap();
        assert_eq!(ui.draw_list().len(), 1);

        // Next frame blows the 64-byte text arena.
        ui.begin(viewport()).unwrap();
        let long = "x".repeat(200);
        let err = ui.make_box(BoxFlags::NONE, &long).unwrap_err();
        assert!(matches!(err, UiError::Memory(_)));
        assert!(!ui.is_building());
        assert_eq!(
            ui.make_box(BoxFlags::NONE, "after").unwrap_err(),
            UiError::NoActiveFrame
        );

        // The previous completed frame still renders.
        assert_eq!(ui.draw_list().len(), 1);

        // And the next frame recovers cleanly.
        ui.begin(viewport()).unwrap();
        ui.make_box(BoxFlags::NONE, "ok").unwrap();
        ui.end().unwrap();
    }

    #[test]
    fn test_collisions_chain_within_a_bucket() {
        /// Degenerate hasher: key is the identity length.
        struct LenHasher;
        impl KeyHasher for LenHasher {
            fn hash_identity(&self, identity: &[u8]) -> u32 {
                u32::try_from(identity.len()).unwrap_or(u32::MAX)
            }
        }

        let config = UiConfig {
            key_buckets: 8,
            ..UiConfig::default()
        };
        let mut ui = UiState::with_config(&MonospaceSource::new(10.0, 20.0), &config)
            .unwrap()
            .with_hasher(Box::new(LenHasher));

        ui.begin(viewport()).unwrap();
        // Lengths 2 and 10 share bucket 2 of 8 but carry different keys.
        let short = ui.make_box(BoxFlags::NONE, "ab").unwrap();
        let long = ui.make_box(BoxFlags::NONE, "abcdefghij").unwrap();
        ui.end().unwrap();

        assert_eq!(ui.lookup(BoxKey::new(2)), Some(short));
        assert_eq!(ui.lookup(BoxKey::new(10)), Some(long));
    }
}
