//! Renderer bridge.
//!
//! Walks the finished tree and emits draw commands for the host's GL layer.
//! Actual submission stays outside the toolkit; the bridge ends at a flat
//! command list plus a triangle-list tessellation of it.
//!
//! Traversal is layer order, not depth-first: a full sibling row is emitted
//! before any of its children, and children rows are found by scanning the
//! finished row right-to-left (then climbing), so boxes declared later at a
//! given depth draw before boxes nested deeper under an earlier sibling.

use crate::geometry::Rect;
use crate::style::Color;
use crate::tree::{BoxFlags, BoxNode, FrameTree};

/// A draw command for the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    /// Filled rectangle.
    Rect {
        /// Bounds.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
}

/// Vertex for UI rendering.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UiVertex {
    /// Position (x, y).
    pub position: [f32; 2],
    /// Color (RGBA).
    pub color: [f32; 4],
}

/// The draw commands for one completed frame.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Returns the commands in draw order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns the number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing would be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Tessellates the commands into a triangle list, two triangles per
    /// rectangle, ready for vertex-buffer upload.
    #[must_use]
    pub fn vertices(&self) -> Vec<UiVertex> {
        let mut vertices = Vec::with_capacity(self.commands.len() * 6);
        for command in &self.commands {
            let DrawCommand::Rect { rect, color } = command;
            let color = color.to_array();
            let (x0, y0) = (rect.p0.x, rect.p0.y);
            let (x1, y1) = (rect.p1.x, rect.p1.y);
            vertices.extend_from_slice(&[
                UiVertex { position: [x0, y0], color },
                UiVertex { position: [x0, y1], color },
                UiVertex { position: [x1, y1], color },
                UiVertex { position: [x0, y0], color },
                UiVertex { position: [x1, y1], color },
                UiVertex { position: [x1, y0], color },
            ]);
        }
        vertices
    }
}

/// Builds the draw list for a completed frame.
pub(crate) fn build_draw_list(tree: &FrameTree, root: u32) -> DrawList {
    let mut commands = Vec::new();
    for index in layer_order(&tree.nodes, root) {
        let node = &tree.nodes[index as usize];
        if node.flags.has(BoxFlags::DRAW_BACKGROUND) {
            commands.push(DrawCommand::Rect {
                rect: node.rect,
                color: node.style.background,
            });
        }
    }
    DrawList { commands }
}

/// Visits the tree in layer order starting at `root`.
///
/// After a sibling row is exhausted, the next row is the children of the
/// nearest node found by scanning the finished row right-to-left and, at
/// the row's left edge, climbing to the closest ancestor that still has a
/// previous sibling to continue the scan from.
pub(crate) fn layer_order(nodes: &[BoxNode], root: u32) -> Vec<u32> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut current = Some(root);
    while let Some(index) = current {
        if order.len() >= nodes.len() {
            tracing::warn!(visited = order.len(), "render traversal aborted: malformed tree");
            break;
        }
        order.push(index);
        let node = &nodes[index as usize];
        current = match node.next {
            Some(next) => Some(next),
            None => next_row(nodes, index),
        };
    }
    order
}

/// Finds the entry node of the next layer after a row ends at `walk`.
fn next_row(nodes: &[BoxNode], mut walk: u32) -> Option<u32> {
    loop {
        let node = &nodes[walk as usize];
        if let Some(first) = node.first {
            return Some(first);
        }
        if let Some(prev) = node.prev {
            walk = prev;
            continue;
        }
        // Left edge of the row: climb to the nearest ancestor that has a
        // previous sibling and continue the scan from there.
        loop {
            let parent = nodes[walk as usize].parent?;
            if let Some(prev) = nodes[parent as usize].prev {
                walk = prev;
                break;
            }
            walk = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::MonospaceSource;
    use crate::geometry::{Axis, Vec2};
    use crate::size::Size;
    use crate::state::UiState;
    use crate::style::Color;

    fn ui() -> UiState {
        UiState::new(&MonospaceSource::new(10.0, 20.0)).unwrap()
    }

    fn colored_box(ui: &mut UiState, text: &str, red: f32) -> crate::tree::BoxId {
        let id = ui
            .make_box(BoxFlags::from_bits(BoxFlags::DRAW_BACKGROUND), text)
            .unwrap();
        let node = ui.node_mut(id).unwrap();
        node.size[Axis::X.index()] = Size::pixels(10.0);
        node.style.background = Color::rgb(red, 0.0, 0.0);
        id
    }

    fn command_reds(list: &DrawList) -> Vec<f32> {
        list.commands()
            .iter()
            .map(|command| {
                let DrawCommand::Rect { color, .. } = command;
                color.r
            })
            .collect()
    }

    #[test]
    fn test_siblings_draw_before_earlier_siblings_children() {
        let mut ui = ui();
        ui.begin(Vec2::new(100.0, 100.0)).unwrap();
        let a = colored_box(&mut ui, "a", 0.1);
        ui.push_parent(a).unwrap();
        colored_box(&mut ui, "a_child", 0.3);
        ui.pop_parent();
        colored_box(&mut ui, "b", 0.2);
        ui.end().unwrap();

        // Row [a, b] first, then a's child - b draws before the deeper box.
        let list = ui.draw_list();
        assert_eq!(command_reds(&list), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_later_subtree_draws_before_earlier_subtree() {
        let mut ui = ui();
        ui.begin(Vec2::new(100.0, 100.0)).unwrap();
        let a = colored_box(&mut ui, "a", 0.1);
        ui.push_parent(a).unwrap();
        colored_box(&mut ui, "a_child", 0.4);
        ui.pop_parent();
        let b = colored_box(&mut ui, "b", 0.2);
        ui.push_parent(b).unwrap();
        colored_box(&mut ui, "b_child", 0.3);
        ui.pop_parent();
        ui.end().unwrap();

        // The scan walks the row right-to-left, so b's children come first.
        let list = ui.draw_list();
        assert_eq!(command_reds(&list), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_childless_root_terminates() {
        let mut ui = ui();
        ui.begin(Vec2::new(100.0, 100.0)).unwrap();
        ui.end().unwrap();
        assert!(ui.draw_list().is_empty());
    }

    #[test]
    fn test_only_flagged_boxes_emit() {
        let mut ui = ui();
        ui.begin(Vec2::new(100.0, 100.0)).unwrap();
        colored_box(&mut ui, "visible", 0.5);
        ui.make_box(BoxFlags::NONE, "silent").unwrap();
        ui.end().unwrap();
        assert_eq!(ui.draw_list().len(), 1);
    }

    #[test]
    fn test_vertices_cover_rect() {
        let mut ui = ui();
        ui.begin(Vec2::new(100.0, 100.0)).unwrap();
        colored_box(&mut ui, "quad", 1.0);
        ui.end().unwrap();

        let vertices = ui.draw_list().vertices();
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[0].position, [0.0, 0.0]);
        assert_eq!(vertices[2].position, [10.0, 0.0]);
        assert_eq!(vertices[0].color, [1.0, 0.0, 0.0, 1.0]);
    }
}
