//! Offscreen gallery: nested flex layout, rounded bordered cards, a polygon
//! and a line, rendered to `gallery.png`.
//!
//! ```sh
//! cargo run --example gallery
//! ```

use quilt::{
    build_draw_list, parse_color, AlignItems, Corners, Dimension, Edges, FlexDirection, FontAtlas,
    GeometryKind, JustifyContent, LayoutTree, Renderer, RendererConfig, Style, Tessellator,
    TextShape, TextShaper, Vec2, Vec4, VertexBatcher,
};

const STYLESHEET: &str = r#"
:root {
    --background: #1d2230;
    --card: hsl(222, 18%, 25%);
    --card-border: rgba(120, 140, 200, 0.9);
    --accent: #e8a33d;
    --accent-soft: --accent;
}
"#;

/// No text in this scene, so shaping is a no-op.
struct NoText;

impl TextShaper for NoText {
    fn get_text_shape(&self, _text: &str, _font_size: f32) -> TextShape {
        TextShape {
            positions: Vec::new(),
            sizes: Vec::new(),
            bounding_size: Vec2::new(0.0, 0.0),
        }
    }

    fn get_uv(&self, _char_code: u32) -> Vec4 {
        Vec4::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// Minimal tessellator: quads per line segment, a fan for polygons.
struct FanTessellator;

impl Tessellator for FanTessellator {
    fn triangulate_line(&self, points: &[Vec2], thickness: f32) -> Vec<Vec2> {
        let half = thickness / 2.0;
        let mut triangles = Vec::new();
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let length = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
            if length == 0.0 {
                continue;
            }
            let normal = Vec2::new(-(b.y - a.y) / length * half, (b.x - a.x) / length * half);
            let a_plus = Vec2::new(a.x + normal.x, a.y + normal.y);
            let a_minus = Vec2::new(a.x - normal.x, a.y - normal.y);
            let b_plus = Vec2::new(b.x + normal.x, b.y + normal.y);
            let b_minus = Vec2::new(b.x - normal.x, b.y - normal.y);
            triangles.extend([a_minus, b_minus, a_plus, a_plus, b_minus, b_plus]);
        }
        triangles
    }

    fn triangulate_polygon(&self, points: &[Vec2]) -> Vec<Vec2> {
        let mut triangles = Vec::new();
        for i in 1..points.len() - 1 {
            triangles.extend([points[0], points[i], points[i + 1]]);
        }
        triangles
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let theme = quilt::Theme::from_stylesheet(STYLESHEET);
    let background = parse_color("--background", &theme)?;
    let card = parse_color("--card", &theme)?;
    let card_border = parse_color("--card-border", &theme)?;
    let accent = parse_color("--accent-soft", &theme)?;

    let (width, height) = (800u32, 600u32);
    let mut tree = LayoutTree::new(width as f32, height as f32);

    // The root is not a flex container, so the scene lives in one
    // full-viewport column.
    tree.view(Style {
        width: Dimension::Percent(1.0),
        height: Dimension::Percent(1.0),
        padding: Edges::all(24.0),
        gap: 24.0,
        align_items: AlignItems::Stretch,
        ..Style::default()
    })?;

    // Header bar, stretched to the content width.
    tree.view(Style {
        height: Dimension::Px(64.0),
        background_color: accent,
        border_radius: Corners::all(12.0),
        ..Style::default()
    })?;
    tree.end()?;

    // A row of three cards; the middle one flexes wider.
    tree.view(Style {
        flex_direction: FlexDirection::Row,
        height: Dimension::Px(280.0),
        gap: 24.0,
        ..Style::default()
    })?;
    for weight in [1.0, 2.0, 1.0] {
        tree.view(Style {
            flex: Some(weight),
            height: Dimension::Percent(1.0),
            background_color: card,
            border_radius: Corners::all(16.0),
            border_width: Edges::all(2.0),
            border_color: Some(card_border),
            ..Style::default()
        })?;
        tree.end()?;
    }
    tree.end()?;

    // Footer with raw geometry: a triangle and a zig-zag line.
    tree.view(Style {
        flex_direction: FlexDirection::Row,
        flex: Some(1.0),
        gap: 48.0,
        justify_content: JustifyContent::Center,
        ..Style::default()
    })?;
    tree.geometry(
        vec![
            Vec2::new(60.0, 0.0),
            Vec2::new(0.0, 120.0),
            Vec2::new(120.0, 120.0),
        ],
        GeometryKind::Polygon,
        Style {
            width: Dimension::Px(120.0),
            height: Dimension::Px(120.0),
            background_color: accent,
            ..Style::default()
        },
    )?;
    tree.geometry(
        vec![
            Vec2::new(0.0, 100.0),
            Vec2::new(60.0, 20.0),
            Vec2::new(120.0, 100.0),
            Vec2::new(180.0, 20.0),
        ],
        GeometryKind::Line { thickness: 6.0 },
        Style {
            width: Dimension::Px(180.0),
            height: Dimension::Px(120.0),
            background_color: card_border,
            ..Style::default()
        },
    )?;
    tree.end()?;
    tree.end()?;

    tree.resolve()?;

    let shaper = NoText;
    let primitives = build_draw_list(&tree, &shaper);
    log::info!("gallery scene: {} primitives", primitives.len());

    let mut renderer = Renderer::new(RendererConfig {
        width,
        height,
        scale_factor: 1.0,
        clear_color: background,
        atlas: FontAtlas::blank(),
    })?;

    let tessellator = FanTessellator;
    let mut batcher = VertexBatcher::new(height as f32, 1.0);
    for primitive in &primitives {
        batcher.append(primitive, &tessellator)?;
    }
    batcher.flush(&mut renderer)?;

    let pixels = renderer.read_pixels()?;
    let image = image::RgbaImage::from_raw(width, height, pixels)
        .ok_or("pixel buffer does not match image dimensions")?;
    image.save("gallery.png")?;
    println!("wrote gallery.png");
    Ok(())
}
