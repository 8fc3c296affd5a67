//! Quilt is a flexbox-style layout engine with a single-draw-call wgpu
//! rasterizer.
//!
//! A scene goes through four stages:
//!
//! 1. Build a [`tree::LayoutTree`] of styled nodes with the cursor-style
//!    builder ([`LayoutTree::view`](tree::LayoutTree::view),
//!    [`end`](tree::LayoutTree::end), [`text`](tree::LayoutTree::text), ...).
//! 2. [`resolve`](tree::LayoutTree::resolve) runs the sizing and flow
//!    passes, producing a [`tree::ResolvedBox`] per node.
//! 3. [`renderer::build_draw_list`] walks the resolved tree into z-sorted
//!    [`renderer::DrawPrimitive`]s, and a [`renderer::VertexBatcher`] turns
//!    those into one interleaved vertex stream.
//! 4. [`renderer::Renderer`] rasterizes the stream in a single render pass
//!    and can read the target back for capture.
//!
//! Stages are independent: the tree and batcher have no GPU dependency, and
//! any [`renderer::Rasterizer`] can consume a batch.

pub mod color;
pub mod error;
pub mod layout;
pub mod math;
pub mod renderer;
pub mod style;
pub mod tessellate;
pub mod text;
pub mod tree;

pub use color::{parse_color, Color, Theme};
pub use error::{Error, Result};
pub use math::{Vec2, Vec4};
pub use renderer::{
    build_draw_list, DrawPrimitive, FontAtlas, Rasterizer, Renderer, RendererConfig, Vertex,
    VertexBatcher,
};
pub use style::{
    AlignItems, AlignSelf, Corners, Dimension, Display, Edges, FlexDirection, GeometryKind,
    JustifyContent, NodeContent, Position, Style, TrimRect,
};
pub use tessellate::Tessellator;
pub use text::{TextShape, TextShaper};
pub use tree::{LayoutTree, NodeId, ResolvedBox};
