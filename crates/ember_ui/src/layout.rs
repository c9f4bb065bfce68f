//! The layout solver.
//!
//! A fixed sequence of five tree passes per axis turns the declarative size
//! specifications into concrete pixel rectangles. X solves fully before Y;
//! the passes run in dependency order:
//!
//! 1. independent sizes (pre-order): pixels, text content
//! 2. upwards-dependent (pre-order): parent-percent
//! 3. downwards-dependent (post-order): children-sum
//! 4. constraint enforcement (pre-order): shrink overflowing children
//! 5. position (pre-order): offsets, absolute rects, view bounds
//!
//! Floating boxes get a resolved rectangle from their own `fixed_pos` but
//! are invisible to sum, shrink and offset accumulation.

use crate::error::{UiError, UiResult};
use crate::font::FontCache;
use crate::geometry::{Axis, Rect, Vec2};
use crate::size::SizeKind;
use crate::tree::{BoxFlags, BoxNode, FrameTree};
use ember_core::Arena;

/// Solves the frame's tree in place. The root is node 0.
///
/// A parent-percent box with no fixed-size ancestor resolves against the
/// root as a fallback; the first such box is reported after the solve
/// completes so one bad declaration cannot take down the frame.
pub(crate) fn solve(
    tree: &mut FrameTree,
    font: &FontCache,
    persistent: &Arena,
    viewport: Vec2,
) -> UiResult<()> {
    let FrameTree { arena, nodes, .. } = tree;
    let nodes = nodes.as_mut_slice();
    if nodes.is_empty() {
        return Ok(());
    }

    const ROOT: u32 = 0;
    nodes[ROOT as usize].rect = Rect::from_pos_size(Vec2::ZERO, viewport);

    let mut first_missing = None;
    for axis in Axis::ALL {
        independent_sizes(nodes, arena, font, persistent, ROOT, axis);
        upwards_dependent(nodes, ROOT, axis, &mut first_missing);
        downwards_dependent(nodes, ROOT, axis);
        enforce_constraints(nodes, ROOT, axis);
        position(nodes, ROOT, axis);
    }

    match first_missing {
        Some((key, axis)) => Err(UiError::MissingAncestor { key, axis }),
        None => Ok(()),
    }
}

/// Pass 1: sizes that depend on nothing else in the tree.
fn independent_sizes(
    nodes: &mut [BoxNode],
    arena: &Arena,
    font: &FontCache,
    persistent: &Arena,
    index: u32,
    axis: Axis,
) {
    let i = index as usize;
    let spec = nodes[i].size[axis.index()];
    match spec.kind {
        SizeKind::Pixels => {
            nodes[i].fixed_size[axis] = spec.value;
        }
        SizeKind::TextContent => {
            let content = match axis {
                Axis::X => {
                    let text = std::str::from_utf8(arena.bytes(nodes[i].text)).unwrap_or("");
                    font.text_width(persistent, text)
                }
                Axis::Y => font.metrics().line_height,
            };
            nodes[i].fixed_size[axis] = content + spec.value;
        }
        SizeKind::Null | SizeKind::ChildrenSum | SizeKind::ParentPercent => {}
    }

    let mut child = nodes[i].first;
    while let Some(c) = child {
        independent_sizes(nodes, arena, font, persistent, c, axis);
        child = nodes[c as usize].next;
    }
}

/// Pass 2: sizes resolved against an ancestor.
///
/// Resolved boxes set their own fixed flag so deeper parent-percent boxes
/// can chain off them.
fn upwards_dependent(
    nodes: &mut [BoxNode],
    index: u32,
    axis: Axis,
    first_missing: &mut Option<(u32, Axis)>,
) {
    let i = index as usize;
    if nodes[i].size[axis.index()].kind == SizeKind::ParentPercent {
        let fixed = BoxFlags::fixed_flag(axis);
        let mut reference = None;
        let mut ancestor = nodes[i].parent;
        while let Some(a) = ancestor {
            let ai = a as usize;
            if nodes[ai].flags.has(fixed) {
                reference = Some(nodes[ai].fixed_size[axis]);
                break;
            }
            ancestor = nodes[ai].parent;
        }

        let reference = reference.unwrap_or_else(|| {
            let key = nodes[i].key.hash;
            tracing::warn!(
                key,
                ?axis,
                "parent-percent box has no fixed-size ancestor; falling back to root"
            );
            if first_missing.is_none() {
                *first_missing = Some((key, axis));
            }
            nodes[0].fixed_size[axis]
        });

        nodes[i].fixed_size[axis] = reference * nodes[i].size[axis.index()].value;
        nodes[i].flags.set(fixed);
    }

    let mut child = nodes[i].first;
    while let Some(c) = child {
        upwards_dependent(nodes, c, axis, first_missing);
        child = nodes[c as usize].next;
    }
}

/// Pass 3: sizes aggregated from children, post-order.
fn downwards_dependent(nodes: &mut [BoxNode], index: u32, axis: Axis) {
    let i = index as usize;

    let mut child = nodes[i].first;
    while let Some(c) = child {
        downwards_dependent(nodes, c, axis);
        child = nodes[c as usize].next;
    }

    if nodes[i].size[axis.index()].kind == SizeKind::ChildrenSum {
        let floating = BoxFlags::floating_flag(axis);
        let along_main = nodes[i].child_axis == axis;
        let mut aggregate = 0.0f32;
        let mut child = nodes[i].first;
        while let Some(c) = child {
            let ci = c as usize;
            if !nodes[ci].flags.has(floating) {
                let size = nodes[ci].fixed_size[axis];
                if along_main {
                    aggregate += size;
                } else {
                    aggregate = aggregate.max(size);
                }
            }
            child = nodes[ci].next;
        }
        nodes[i].fixed_size[axis] = aggregate;
    }
}

/// Pass 4: shrink children that overflow a parent which disallows it.
fn enforce_constraints(nodes: &mut [BoxNode], index: u32, axis: Axis) {
    let i = index as usize;
    let floating = BoxFlags::floating_flag(axis);
    let allow_overflow = nodes[i].flags.has(BoxFlags::overflow_flag(axis));
    let along_main = nodes[i].child_axis == axis;

    // Cross axis: each child independently clamps to the parent's size,
    // never below its own minimum.
    if !allow_overflow && !along_main {
        let allowed = nodes[i].fixed_size[axis];
        let mut child = nodes[i].first;
        while let Some(c) = child {
            let ci = c as usize;
            if !nodes[ci].flags.has(floating) {
                let size = nodes[ci].fixed_size[axis];
                let room = (size - nodes[ci].min_size[axis]).max(0.0);
                let fixup = (size - allowed).clamp(0.0, room);
                if fixup > 0.0 {
                    nodes[ci].fixed_size[axis] -= fixup;
                }
            }
            child = nodes[ci].next;
        }
    }

    // Main axis: distribute the shared overflow across children by their
    // compressibility.
    if !allow_overflow && along_main {
        let allowed = nodes[i].fixed_size[axis];
        let mut total = 0.0f32;
        let mut child = nodes[i].first;
        while let Some(c) = child {
            let ci = c as usize;
            if !nodes[ci].flags.has(floating) {
                total += nodes[ci].fixed_size[axis];
            }
            child = nodes[ci].next;
        }

        let mut overflow = total - allowed;
        if overflow > 0.0 {
            // Weighted pass: each child offers size * (1 - strictness),
            // clamped at its minimum. Fully strict children offer nothing.
            let mut offers: Vec<(usize, f32)> = Vec::new();
            let mut offered = 0.0f32;
            let mut child = nodes[i].first;
            while let Some(c) = child {
                let ci = c as usize;
                if !nodes[ci].flags.has(floating) {
                    let size = nodes[ci].fixed_size[axis];
                    let strictness = nodes[ci].size[axis.index()].strictness;
                    let room = (size - nodes[ci].min_size[axis]).max(0.0);
                    let offer = (size * (1.0 - strictness)).clamp(0.0, room);
                    offers.push((ci, offer));
                    offered += offer;
                }
                child = nodes[ci].next;
            }
            if offered > 0.0 {
                let ratio = (overflow / offered).min(1.0);
                for &(ci, offer) in &offers {
                    nodes[ci].fixed_size[axis] -= offer * ratio;
                }
                overflow -= offered.min(overflow);
            }

            // Last resort: strict children give up the room above their
            // minimum, proportionally.
            if overflow > f32::EPSILON {
                let mut room_total = 0.0f32;
                for &(ci, _) in &offers {
                    room_total += (nodes[ci].fixed_size[axis] - nodes[ci].min_size[axis]).max(0.0);
                }
                if room_total > 0.0 {
                    let ratio = (overflow / room_total).min(1.0);
                    for &(ci, _) in &offers {
                        let room =
                            (nodes[ci].fixed_size[axis] - nodes[ci].min_size[axis]).max(0.0);
                        nodes[ci].fixed_size[axis] -= room * ratio;
                    }
                }
            }
        }
    }

    let mut child = nodes[i].first;
    while let Some(c) = child {
        enforce_constraints(nodes, c, axis);
        child = nodes[c as usize].next;
    }
}

/// Pass 5: offsets along the main axis, absolute rects, view bounds.
fn position(nodes: &mut [BoxNode], index: u32, axis: Axis) {
    let i = index as usize;
    let floating = BoxFlags::floating_flag(axis);
    let along_main = nodes[i].child_axis == axis;
    let origin = nodes[i].rect.p0[axis];

    let mut cursor = 0.0f32;
    let mut bounds = 0.0f32;
    let mut child = nodes[i].first;
    while let Some(c) = child {
        let ci = c as usize;
        if !nodes[ci].flags.has(floating) {
            nodes[ci].fixed_pos[axis] = cursor;
            if along_main {
                cursor += nodes[ci].fixed_size[axis];
                bounds += nodes[ci].fixed_size[axis];
            } else {
                bounds = bounds.max(nodes[ci].fixed_size[axis]);
            }
        }
        let p0 = origin + nodes[ci].fixed_pos[axis];
        nodes[ci].rect.p0[axis] = p0;
        nodes[ci].rect.p1[axis] = p0 + nodes[ci].fixed_size[axis];
        child = nodes[ci].next;
    }
    nodes[i].view_bounds[axis] = bounds;

    let mut child = nodes[i].first;
    while let Some(c) = child {
        position(nodes, c, axis);
        child = nodes[c as usize].next;
    }
}
