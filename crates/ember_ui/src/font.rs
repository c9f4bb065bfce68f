//! Glyph metrics for text measurement.
//!
//! Rasterization happens outside the toolkit; all layout needs is per-glyph
//! advances and the font-wide vertical metrics. Those are baked into the
//! persistent arena once at startup, so text measurement during layout
//! never calls back into the rasterizer.

use ember_core::{Arena, MemoryResult, Span};

/// First baked codepoint (space).
const ASCII_START: u32 = 0x20;

/// Number of baked codepoints (printable ASCII).
const ASCII_COUNT: u32 = 95;

/// Font-wide vertical metrics in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FontMetrics {
    /// Distance between consecutive baselines.
    pub line_height: f32,
    /// Height above the baseline.
    pub ascent: f32,
    /// Depth below the baseline (positive).
    pub descent: f32,
}

/// Source of glyph metrics, implemented by the host's font rasterizer.
pub trait GlyphSource {
    /// Returns the font-wide vertical metrics.
    fn metrics(&self) -> FontMetrics;

    /// Returns the horizontal advance of a codepoint in pixels.
    fn advance(&self, codepoint: char) -> f32;
}

/// A fixed-advance source for tests and demos.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceSource {
    advance: f32,
    metrics: FontMetrics,
}

impl MonospaceSource {
    /// Creates a monospace source with the given advance and line height.
    #[must_use]
    pub fn new(advance: f32, line_height: f32) -> Self {
        Self {
            advance,
            metrics: FontMetrics {
                line_height,
                ascent: line_height * 0.8,
                descent: line_height * 0.2,
            },
        }
    }
}

impl GlyphSource for MonospaceSource {
    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn advance(&self, _codepoint: char) -> f32 {
        self.advance
    }
}

/// Glyph metrics baked into the persistent arena.
///
/// Holds the font-wide metrics inline and the printable-ASCII advance table
/// as little-endian f32s in the arena. Codepoints outside the table use the
/// space advance.
#[derive(Debug, Clone, Copy)]
pub struct FontCache {
    metrics: FontMetrics,
    default_advance: f32,
    table: Span,
}

impl FontCache {
    /// Bakes a glyph source's metrics into `arena`.
    ///
    /// # Errors
    ///
    /// Propagates arena exhaustion from the advance-table allocation.
    pub fn bake(source: &dyn GlyphSource, arena: &mut Arena) -> MemoryResult<Self> {
        let table = arena.push(ASCII_COUNT as usize * 4)?;
        for offset in 0..ASCII_COUNT {
            let codepoint = char::from_u32(ASCII_START + offset).unwrap_or(' ');
            let advance = source.advance(codepoint);
            let at = offset as usize * 4;
            arena.bytes_mut(table)[at..at + 4].copy_from_slice(&advance.to_le_bytes());
        }
        Ok(Self {
            metrics: source.metrics(),
            default_advance: source.advance(' '),
            table,
        })
    }

    /// Returns the font-wide vertical metrics.
    #[must_use]
    pub const fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Returns a codepoint's advance, reading the baked table in `arena`.
    #[must_use]
    pub fn advance(&self, arena: &Arena, codepoint: char) -> f32 {
        let index = (codepoint as u32).wrapping_sub(ASCII_START);
        if index >= ASCII_COUNT {
            return self.default_advance;
        }
        let at = index as usize * 4;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&arena.bytes(self.table)[at..at + 4]);
        f32::from_le_bytes(raw)
    }

    /// Measures a single line of text.
    #[must_use]
    pub fn text_width(&self, arena: &Arena, text: &str) -> f32 {
        text.chars().map(|c| self.advance(arena, c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bake_and_measure() {
        let mut arena = Arena::new(4096);
        let cache = FontCache::bake(&MonospaceSource::new(10.0, 20.0), &mut arena).unwrap();
        assert_eq!(cache.metrics().line_height, 20.0);
        assert_eq!(cache.advance(&arena, 'a'), 10.0);
        assert_eq!(cache.text_width(&arena, "hello"), 50.0);
    }

    #[test]
    fn test_non_ascii_uses_default_advance() {
        let mut arena = Arena::new(4096);
        let cache = FontCache::bake(&MonospaceSource::new(8.0, 16.0), &mut arena).unwrap();
        assert_eq!(cache.advance(&arena, 'é'), 8.0);
        assert_eq!(cache.advance(&arena, '\n'), 8.0);
    }

    #[test]
    fn test_variable_advances_round_trip() {
        struct Widths;
        impl GlyphSource for Widths {
            fn metrics(&self) -> FontMetrics {
                FontMetrics {
                    line_height: 12.0,
                    ascent: 9.0,
                    descent: 3.0,
                }
            }
            fn advance(&self, codepoint: char) -> f32 {
                if codepoint == 'i' {
                    3.0
                } else {
                    7.0
                }
            }
        }

        let mut arena = Arena::new(4096);
        let cache = FontCache::bake(&Widths, &mut arena).unwrap();
        assert_eq!(cache.advance(&arena, 'i'), 3.0);
        assert_eq!(cache.advance(&arena, 'w'), 7.0);
        assert_eq!(cache.text_width(&arena, "iw"), 10.0);
    }
}
