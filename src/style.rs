//! Style input consumed by the layout resolver.
//!
//! A [`Style`] is plain data with CSS-flavored defaults (column direction,
//! start alignment, relative position, transparent background). Sizes are
//! [`Dimension`]s: fixed pixels, a percentage of the parent, or `Auto` which
//! means "hug content".

use crate::color::Color;
use crate::error::{Error, Result};
use crate::math::Vec2;

/// Direction of the main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    Row,
    #[default]
    Column,
}

/// Main axis distribution of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JustifyContent {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

impl JustifyContent {
    /// The space-* variants distribute leftover space themselves; fixed gap
    /// and flex weights are ignored under them.
    pub fn distributes_space(self) -> bool {
        matches!(
            self,
            JustifyContent::SpaceBetween | JustifyContent::SpaceAround | JustifyContent::SpaceEvenly
        )
    }
}

/// Cross axis alignment of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignItems {
    #[default]
    Start,
    Center,
    End,
    Stretch,
}

/// Per-node override of the parent's `align_items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignSelf {
    #[default]
    Auto,
    Start,
    Center,
    End,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Relative,
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Flex,
    None,
}

/// A width or height input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    /// Fixed size in logical pixels.
    Px(f32),
    /// Fraction of the parent size, stored as 0..1.
    Percent(f32),
    /// Hug content.
    #[default]
    Auto,
}

impl Dimension {
    /// Parses a percentage string. A missing trailing `%` is a fatal input
    /// error.
    pub fn parse_percentage(value: &str) -> Result<Self> {
        let digits = value.strip_suffix('%').ok_or_else(|| {
            Error::invariant(format!("percentage value must end with '%': {value:?}"))
        })?;
        let number: f32 = digits
            .trim()
            .parse()
            .map_err(|_| Error::invariant(format!("malformed percentage value: {value:?}")))?;
        Ok(Dimension::Percent(number / 100.0))
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Dimension::Auto)
    }

    /// The fixed pixel value, if this is `Px`.
    pub fn fixed(&self) -> Option<f32> {
        match self {
            Dimension::Px(v) => Some(*v),
            _ => None,
        }
    }

    /// The 0..1 fraction, if this is `Percent`.
    pub fn percent(&self) -> Option<f32> {
        match self {
            Dimension::Percent(v) => Some(*v),
            _ => None,
        }
    }
}

/// f32 converts to a fixed pixel dimension.
impl From<f32> for Dimension {
    fn from(value: f32) -> Self {
        Dimension::Px(value)
    }
}

/// Per-side values in top, right, bottom, left order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const fn all(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub const fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// Per-corner values in top-left, top-right, bottom-right, bottom-left order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Corners {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl Corners {
    pub const fn all(value: f32) -> Self {
        Self {
            top_left: value,
            top_right: value,
            bottom_right: value,
            bottom_left: value,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top_left == 0.0
            && self.top_right == 0.0
            && self.bottom_right == 0.0
            && self.bottom_left == 0.0
    }
}

/// Box styling input. Every field has a neutral default, so styles are
/// written as struct literals over `..Default::default()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub flex_direction: FlexDirection,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub align_self: AlignSelf,
    pub position: Position,
    pub display: Display,
    pub gap: f32,
    pub padding: Edges,
    pub margin: Edges,
    pub width: Dimension,
    pub height: Dimension,
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub left: Option<f32>,
    /// Non-negative weight for distributing leftover main-axis space.
    /// `None` keeps the child at its own size; `Some(0.0)` is a flex child
    /// that receives nothing.
    pub flex: Option<f32>,
    pub aspect_ratio: Option<f32>,
    /// `None` inherits the parent's resolved z-index.
    pub z_index: Option<i32>,
    pub border_radius: Corners,
    pub border_width: Edges,
    pub border_color: Option<Color>,
    pub background_color: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Start,
            align_self: AlignSelf::Auto,
            position: Position::Relative,
            display: Display::Flex,
            gap: 0.0,
            padding: Edges::default(),
            margin: Edges::default(),
            width: Dimension::Auto,
            height: Dimension::Auto,
            top: None,
            right: None,
            bottom: None,
            left: None,
            flex: None,
            aspect_ratio: None,
            z_index: None,
            border_radius: Corners::default(),
            border_width: Edges::default(),
            border_color: None,
            background_color: Color::TRANSPARENT,
        }
    }
}

/// Axis-aligned clip region for text, applied per glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRect {
    pub start: Vec2,
    pub end: Vec2,
}

/// What kind of geometry a geometry node carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryKind {
    Line { thickness: f32 },
    Polygon,
}

/// The payload of a node. Exactly one shape per node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// A plain styled box.
    Box,
    /// A text run, measured at creation. Color defaults to white.
    Text {
        text: String,
        font_size: f32,
        color: Color,
        trim: Option<TrimRect>,
    },
    /// An ordered point list, drawn as a line or filled polygon in the
    /// style's background color. Points are relative to the node origin.
    Geometry { points: Vec<Vec2>, kind: GeometryKind },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_parsing() {
        assert_eq!(
            Dimension::parse_percentage("55%").unwrap(),
            Dimension::Percent(0.55)
        );
        assert_eq!(
            Dimension::parse_percentage("100%").unwrap(),
            Dimension::Percent(1.0)
        );
    }

    #[test]
    fn test_percentage_without_suffix_is_fatal() {
        let err = Dimension::parse_percentage("55").unwrap_err();
        assert!(err.to_string().contains("invariant violation"));
        assert!(Dimension::parse_percentage("abc%").is_err());
    }

    #[test]
    fn test_default_style_matches_view_defaults() {
        let style = Style::default();
        assert_eq!(style.flex_direction, FlexDirection::Column);
        assert_eq!(style.justify_content, JustifyContent::Start);
        assert_eq!(style.align_items, AlignItems::Start);
        assert_eq!(style.position, Position::Relative);
        assert_eq!(style.display, Display::Flex);
        assert!(style.width.is_auto());
        assert_eq!(style.background_color, Color::TRANSPARENT);
        assert_eq!(style.flex, None);
        assert_eq!(style.z_index, None);
    }

    #[test]
    fn test_edges_helpers() {
        let edges = Edges::symmetric(4.0, 8.0);
        assert_eq!(edges.horizontal(), 16.0);
        assert_eq!(edges.vertical(), 8.0);
        assert_eq!(Edges::all(2.0).horizontal(), 4.0);
    }
}
