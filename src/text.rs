//! Text shaping collaborator interface.
//!
//! Shaping and atlas generation live outside this crate. The layout builder
//! uses [`TextShaper::get_text_shape`] to measure text at insertion time and
//! the draw-list builder uses it again, together with
//! [`TextShaper::get_uv`], to emit one glyph quad per character. The atlas
//! is assumed pre-rasterized as a signed distance field in the alpha
//! channel.

use crate::math::{Vec2, Vec4};

/// Positions and sizes of the glyph quads of a shaped string, one entry per
/// character, relative to the text origin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextShape {
    pub positions: Vec<Vec2>,
    pub sizes: Vec<Vec2>,
    /// Extent of the whole run, used as the node size.
    pub bounding_size: Vec2,
}

pub trait TextShaper {
    /// Shape a string at the given font size.
    fn get_text_shape(&self, text: &str, font_size: f32) -> TextShape;

    /// Normalized atlas rectangle (x, y, width, height) for a char code.
    fn get_uv(&self, char_code: u32) -> Vec4;
}
