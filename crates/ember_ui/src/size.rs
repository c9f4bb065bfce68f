//! Declarative per-axis size specifications.

/// How a box's size on one axis is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeKind {
    /// No specification; the box keeps whatever `fixed_size` it was given.
    #[default]
    Null,
    /// An absolute pixel value.
    Pixels,
    /// Sized to the box's text: glyph advances on X, line height on Y,
    /// plus the padding carried in `value`.
    TextContent,
    /// Sum of children along the child-layout axis, max across it.
    ChildrenSum,
    /// A fraction of the nearest fixed-size ancestor on this axis.
    ParentPercent,
}

/// A size specification for one axis.
///
/// `strictness` trades off under layout pressure: 1.0 means the size must
/// not shrink, 0.0 means freely compressible.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    /// How the size is determined.
    pub kind: SizeKind,
    /// Resistance to shrink under overflow, in 0-1.
    pub strictness: f32,
    /// Kind-specific value: pixels, fraction, or text padding.
    pub value: f32,
}

impl Size {
    /// No specification.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            kind: SizeKind::Null,
            strictness: 0.0,
            value: 0.0,
        }
    }

    /// An absolute size in pixels.
    #[must_use]
    pub const fn pixels(pixels: f32) -> Self {
        Self {
            kind: SizeKind::Pixels,
            strictness: 1.0,
            value: pixels,
        }
    }

    /// A fraction (0-1) of the nearest fixed-size ancestor.
    #[must_use]
    pub const fn parent_percent(fraction: f32) -> Self {
        Self {
            kind: SizeKind::ParentPercent,
            strictness: 1.0,
            value: fraction,
        }
    }

    /// The sum (main axis) or max (cross axis) of the box's children.
    #[must_use]
    pub const fn children_sum() -> Self {
        Self {
            kind: SizeKind::ChildrenSum,
            strictness: 1.0,
            value: 0.0,
        }
    }

    /// Sized to the box's text content plus `padding` pixels.
    #[must_use]
    pub const fn text_content(padding: f32) -> Self {
        Self {
            kind: SizeKind::TextContent,
            strictness: 1.0,
            value: padding,
        }
    }

    /// Returns the same specification with a different strictness.
    #[must_use]
    pub const fn with_strictness(mut self, strictness: f32) -> Self {
        self.strictness = strictness;
        self
    }
}
