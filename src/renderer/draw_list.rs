//! Draw-list construction from a resolved layout tree.
//!
//! [`build_draw_list`] walks the tree depth-first, prunes invisible
//! subtrees, sorts the surviving nodes by z-index and emits one
//! [`DrawPrimitive`] stream ready for the vertex batcher. Primitives are
//! frame-scoped: build, batch, discard.

use crate::color::Color;
use crate::math::{Vec2, Vec4};
use crate::style::{Corners, Display, Edges, GeometryKind, NodeContent, TrimRect};
use crate::text::TextShaper;
use crate::tree::{LayoutTree, NodeId};

/// Resolved boxes below this extent are dropped along with their subtrees.
const MIN_VISIBLE_SIZE: f32 = 0.1;

/// One draw operation in final pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawPrimitive {
    /// A rounded, optionally bordered rectangle.
    Rectangle {
        position: Vec2,
        size: Vec2,
        fill: Color,
        /// TL, TR, BR, BL.
        radius: Corners,
        /// T, R, B, L.
        border_width: Edges,
        border_color: Option<Color>,
    },
    /// One glyph of a text run, with its normalized atlas rectangle.
    GlyphQuad {
        position: Vec2,
        size: Vec2,
        uv: Vec4,
        color: Color,
    },
    /// A line strip to be triangulated at the given thickness.
    Line {
        points: Vec<Vec2>,
        thickness: f32,
        color: Color,
    },
    /// A filled polygon outline.
    Polygon { points: Vec<Vec2>, color: Color },
}

/// Builds the paint-ordered primitive list for the current frame.
///
/// Traversal is depth-first with children pushed in reverse sibling order,
/// so siblings come out left to right. A subtree is pruned when its resolved
/// box is sub-pixel on either axis or its display is none; the root itself
/// is never pruned. The surviving nodes are stable-sorted by z-index, which
/// makes z the primary paint key and traversal order the tie-breaker.
pub fn build_draw_list(tree: &LayoutTree, shaper: &dyn TextShaper) -> Vec<DrawPrimitive> {
    let mut visible: Vec<NodeId> = Vec::new();
    let mut stack = vec![tree.root()];

    while let Some(id) = stack.pop() {
        visible.push(id);

        let children: Vec<NodeId> = tree
            .children(id)
            .filter(|&child| {
                let node = tree.get(child);
                let resolved = node.resolved();
                resolved.width >= MIN_VISIBLE_SIZE
                    && resolved.height >= MIN_VISIBLE_SIZE
                    && node.style().display != Display::None
            })
            .collect();
        for &child in children.iter().rev() {
            stack.push(child);
        }
    }

    visible.sort_by_key(|&id| tree.get(id).resolved().z_index);

    let mut primitives = Vec::new();
    for id in visible {
        emit_node(tree, id, shaper, &mut primitives);
    }
    log::debug!("draw list: {} primitives", primitives.len());
    primitives
}

fn emit_node(
    tree: &LayoutTree,
    id: NodeId,
    shaper: &dyn TextShaper,
    out: &mut Vec<DrawPrimitive>,
) {
    let node = tree.get(id);
    let resolved = node.resolved();
    let origin = Vec2::new(resolved.x, resolved.y);

    match node.content() {
        NodeContent::Text {
            text,
            font_size,
            color,
            trim,
        } => {
            let shape = shaper.get_text_shape(text, *font_size);
            for (index, ch) in text.chars().enumerate() {
                let position = shape.positions[index].add(origin);
                let size = shape.sizes[index];
                let uv = shaper.get_uv(ch as u32);
                out.push(trim_glyph(position, size, uv, *color, *trim));
            }
        }
        NodeContent::Geometry { points, kind } => {
            let points: Vec<Vec2> = points.iter().map(|p| p.add(origin)).collect();
            let color = node.style().background_color;
            match kind {
                GeometryKind::Line { thickness } => out.push(DrawPrimitive::Line {
                    points,
                    thickness: *thickness,
                    color,
                }),
                GeometryKind::Polygon => out.push(DrawPrimitive::Polygon { points, color }),
            }
        }
        NodeContent::Box => {
            let style = node.style();
            // Fully transparent boxes take layout space but paint nothing.
            if style.background_color.a == 0.0 {
                return;
            }
            out.push(DrawPrimitive::Rectangle {
                position: origin,
                size: Vec2::new(resolved.width, resolved.height),
                fill: style.background_color,
                radius: style.border_radius,
                border_width: style.border_width,
                border_color: style.border_color,
            });
        }
    }
}

/// Clips one glyph quad against the trim rectangle.
///
/// A glyph fully outside keeps its quad with zero size. A partial overlap
/// moves the quad edge to the trim edge and shrinks the UV rectangle by the
/// same proportion, so the visible sub-glyph samples the matching atlas
/// sub-rectangle.
fn trim_glyph(
    position: Vec2,
    size: Vec2,
    uv: Vec4,
    color: Color,
    trim: Option<TrimRect>,
) -> DrawPrimitive {
    let Some(trim) = trim else {
        return DrawPrimitive::GlyphQuad {
            position,
            size,
            uv,
            color,
        };
    };

    let inside = position.x + size.x >= trim.start.x
        && position.x <= trim.end.x
        && position.y + size.y >= trim.start.y
        && position.y <= trim.end.y;
    if !inside {
        return DrawPrimitive::GlyphQuad {
            position,
            size: Vec2::ZERO,
            uv,
            color,
        };
    }

    let mut position = position;
    let mut size = size;
    let mut uv = uv;

    // Leading edge: shift the quad to the trim edge, drop the leading part
    // of the atlas rectangle.
    let diff_x = trim.start.x - position.x;
    if diff_x > 0.0 {
        let uv_diff = (diff_x / size.x) * uv.z;
        uv = Vec4::new(uv.x + uv_diff, uv.y, uv.z - uv_diff, uv.w);
        size.x -= diff_x;
        position.x = trim.start.x;
    }
    let diff_y = trim.start.y - position.y;
    if diff_y > 0.0 {
        let uv_diff = (diff_y / size.y) * uv.w;
        uv = Vec4::new(uv.x, uv.y + uv_diff, uv.z, uv.w - uv_diff);
        size.y -= diff_y;
        position.y = trim.start.y;
    }

    // Trailing edge: keep the origin, drop the trailing part.
    let diff_x = position.x + size.x - trim.end.x;
    if diff_x > 0.0 {
        let uv_diff = (diff_x / size.x) * uv.z;
        uv = Vec4::new(uv.x, uv.y, uv.z - uv_diff, uv.w);
        size.x -= diff_x;
    }
    let diff_y = position.y + size.y - trim.end.y;
    if diff_y > 0.0 {
        let uv_diff = (diff_y / size.y) * uv.w;
        uv = Vec4::new(uv.x, uv.y, uv.z, uv.w - uv_diff);
        size.y -= diff_y;
    }

    DrawPrimitive::GlyphQuad {
        position,
        size,
        uv,
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Dimension, NodeContent, Position, Style};
    use crate::text::TextShape;

    /// Monospace fake: glyphs are half the font size wide, UVs laid out in
    /// a 16x16 grid by char code.
    struct GridShaper;

    impl TextShaper for GridShaper {
        fn get_text_shape(&self, text: &str, font_size: f32) -> TextShape {
            let advance = font_size * 0.5;
            let count = text.chars().count();
            TextShape {
                positions: (0..count)
                    .map(|i| Vec2::new(i as f32 * advance, 0.0))
                    .collect(),
                sizes: vec![Vec2::new(advance, font_size); count],
                bounding_size: Vec2::new(count as f32 * advance, font_size),
            }
        }

        fn get_uv(&self, char_code: u32) -> Vec4 {
            let cell = 1.0 / 16.0;
            Vec4::new(
                (char_code % 16) as f32 * cell,
                (char_code / 16 % 16) as f32 * cell,
                cell,
                cell,
            )
        }
    }

    fn filled(width: f32, height: f32, color: Color) -> Style {
        Style {
            width: width.into(),
            height: height.into(),
            background_color: color,
            ..Style::default()
        }
    }

    #[test]
    fn test_transparent_boxes_emit_nothing() {
        let mut tree = LayoutTree::new(100.0, 100.0);
        let spacer = tree.create_node(filled(50.0, 50.0, Color::TRANSPARENT), NodeContent::Box);
        let painted = tree.create_node(filled(20.0, 20.0, Color::WHITE), NodeContent::Box);
        tree.add_child(tree.root(), spacer).unwrap();
        tree.add_child(spacer, painted).unwrap();
        tree.resolve().unwrap();

        let list = build_draw_list(&tree, &GridShaper);
        assert_eq!(list.len(), 1);
        assert!(matches!(list[0], DrawPrimitive::Rectangle { .. }));
    }

    #[test]
    fn test_hidden_and_subpixel_subtrees_are_pruned() {
        let mut tree = LayoutTree::new(100.0, 100.0);
        let hidden = tree.create_node(
            Style {
                display: Display::None,
                ..filled(50.0, 50.0, Color::WHITE)
            },
            NodeContent::Box,
        );
        let nested = tree.create_node(filled(10.0, 10.0, Color::WHITE), NodeContent::Box);
        let flat = tree.create_node(filled(40.0, 0.0, Color::WHITE), NodeContent::Box);
        tree.add_child(tree.root(), hidden).unwrap();
        tree.add_child(hidden, nested).unwrap();
        tree.add_child(tree.root(), flat).unwrap();
        tree.resolve().unwrap();

        // The hidden node stays addressable but paints nothing, and its
        // visible descendant is pruned with it.
        assert!(tree.node(hidden).is_some());
        assert!(build_draw_list(&tree, &GridShaper).is_empty());
    }

    #[test]
    fn test_paint_order_is_z_then_traversal() {
        let mut tree = LayoutTree::new(100.0, 100.0);
        let back = tree.create_node(
            Style {
                z_index: Some(1),
                position: Position::Absolute,
                ..filled(10.0, 10.0, Color::rgb(1.0, 0.0, 0.0))
            },
            NodeContent::Box,
        );
        let front = tree.create_node(
            Style {
                z_index: Some(3),
                position: Position::Absolute,
                ..filled(10.0, 10.0, Color::rgb(0.0, 1.0, 0.0))
            },
            NodeContent::Box,
        );
        let middle = tree.create_node(
            Style {
                z_index: Some(1),
                position: Position::Absolute,
                ..filled(10.0, 10.0, Color::rgb(0.0, 0.0, 1.0))
            },
            NodeContent::Box,
        );
        tree.add_child(tree.root(), back).unwrap();
        tree.add_child(tree.root(), front).unwrap();
        tree.add_child(tree.root(), middle).unwrap();
        tree.resolve().unwrap();

        let fills: Vec<Color> = build_draw_list(&tree, &GridShaper)
            .iter()
            .map(|p| match p {
                DrawPrimitive::Rectangle { fill, .. } => *fill,
                _ => panic!("expected rectangles"),
            })
            .collect();
        // Equal z keeps sibling order; higher z paints last.
        assert_eq!(
            fills,
            vec![
                Color::rgb(1.0, 0.0, 0.0),
                Color::rgb(0.0, 0.0, 1.0),
                Color::rgb(0.0, 1.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_text_emits_one_quad_per_character() {
        let mut tree = LayoutTree::new(100.0, 100.0);
        tree.text("ab", &GridShaper, 16.0, Color::WHITE, None).unwrap();
        tree.resolve().unwrap();

        let list = build_draw_list(&tree, &GridShaper);
        assert_eq!(list.len(), 2);
        let DrawPrimitive::GlyphQuad { position, size, uv, .. } = &list[1] else {
            panic!("expected a glyph quad");
        };
        assert_eq!(*position, Vec2::new(8.0, 0.0));
        assert_eq!(*size, Vec2::new(8.0, 16.0));
        assert_eq!(*uv, GridShaper.get_uv('b' as u32));
    }

    #[test]
    fn test_trim_fully_outside_zeroes_all_quads() {
        let mut tree = LayoutTree::new(100.0, 100.0);
        let trim = TrimRect {
            start: Vec2::new(500.0, 500.0),
            end: Vec2::new(600.0, 600.0),
        };
        tree.text("hi", &GridShaper, 16.0, Color::WHITE, Some(trim))
            .unwrap();
        tree.resolve().unwrap();

        let list = build_draw_list(&tree, &GridShaper);
        assert_eq!(list.len(), 2);
        for primitive in &list {
            let DrawPrimitive::GlyphQuad { size, .. } = primitive else {
                panic!("expected glyph quads");
            };
            assert_eq!(*size, Vec2::ZERO);
        }
    }

    #[test]
    fn test_trim_partial_overlap_rescales_size_and_uv() {
        // A lone 8x16 glyph at the origin, trimmed to its right half.
        let trim = Some(TrimRect {
            start: Vec2::new(4.0, 0.0),
            end: Vec2::new(100.0, 100.0),
        });
        let uv = Vec4::new(0.5, 0.25, 0.0625, 0.0625);
        let DrawPrimitive::GlyphQuad {
            position,
            size,
            uv: clipped,
            ..
        } = trim_glyph(Vec2::ZERO, Vec2::new(8.0, 16.0), uv, Color::WHITE, trim)
        else {
            panic!("expected a glyph quad");
        };

        assert_eq!(position, Vec2::new(4.0, 0.0));
        assert_eq!(size, Vec2::new(4.0, 16.0));
        // Half the glyph width is gone, so half the UV width is too.
        assert!((clipped.x - (0.5 + 0.03125)).abs() < 1e-6);
        assert!((clipped.z - 0.03125).abs() < 1e-6);
        assert_eq!((clipped.y, clipped.w), (uv.y, uv.w));
    }

    #[test]
    fn test_trim_trailing_edge_keeps_origin() {
        let trim = Some(TrimRect {
            start: Vec2::new(-100.0, -100.0),
            end: Vec2::new(6.0, 12.0),
        });
        let uv = Vec4::new(0.0, 0.0, 0.0625, 0.0625);
        let DrawPrimitive::GlyphQuad { position, size, uv: clipped, .. } =
            trim_glyph(Vec2::ZERO, Vec2::new(8.0, 16.0), uv, Color::WHITE, trim)
        else {
            panic!("expected a glyph quad");
        };

        assert_eq!(position, Vec2::ZERO);
        assert_eq!(size, Vec2::new(6.0, 12.0));
        assert_eq!((clipped.x, clipped.y), (0.0, 0.0));
        assert!((clipped.z - 0.0625 * 0.75).abs() < 1e-6);
        assert!((clipped.w - 0.0625 * 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_geometry_points_are_offset_by_node_origin() {
        let mut tree = LayoutTree::new(200.0, 200.0);
        let panel = tree
            .view(Style {
                left: Some(30.0),
                top: Some(20.0),
                width: Dimension::Px(100.0),
                height: Dimension::Px(100.0),
                ..Style::default()
            })
            .unwrap();
        tree.geometry(
            vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(5.0, 8.0)],
            GeometryKind::Polygon,
            Style {
                width: 10.0.into(),
                height: 8.0.into(),
                background_color: Color::WHITE,
                ..Style::default()
            },
        )
        .unwrap();
        tree.end().unwrap();
        tree.resolve().unwrap();
        let _ = panel;

        let list = build_draw_list(&tree, &GridShaper);
        let DrawPrimitive::Polygon { points, .. } = &list[0] else {
            panic!("expected a polygon, got {list:?}");
        };
        assert_eq!(points[0], Vec2::new(30.0, 20.0));
        assert_eq!(points[2], Vec2::new(35.0, 28.0));
    }
}
