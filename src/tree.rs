//! Arena-based layout tree.
//!
//! Nodes live in a single `Vec` and refer to each other through [`NodeId`]
//! indices: parent, first/last child and prev/next sibling. This keeps the
//! cyclic parent/child/sibling shape ownership-free while preserving O(1)
//! append and insertion-order iteration.
//!
//! The tree is insertion-only: it is built once per frame (or mutated
//! between frames through the `*_mut` accessors) and fully re-resolved on
//! each [`resolve`](LayoutTree::resolve) call.
//!
//! Two construction surfaces produce the same tree:
//! - the direct API: [`create_node`](LayoutTree::create_node) +
//!   [`add_child`](LayoutTree::add_child);
//! - the cursor API: [`view`](LayoutTree::view) / [`end`](LayoutTree::end) /
//!   [`text`](LayoutTree::text) / [`geometry`](LayoutTree::geometry), which
//!   nests under the most recently opened view.

use crate::color::Color;
use crate::error::{Error, Result};
use crate::math::Vec2;
use crate::style::{Display, GeometryKind, NodeContent, Style, TrimRect};
use crate::text::TextShaper;

/// Stable handle to a node in the tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Concrete pixel-space output of layout resolution.
///
/// `x`/`y`/`width`/`height` are integer-valued after resolution (the final
/// pass rounds them); `z_index` is the inherited-or-explicit paint order
/// key.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ResolvedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub z_index: i32,
}

/// One node: style input, content payload, tree links and the resolved box.
#[derive(Debug)]
pub struct Node {
    pub(crate) style: Style,
    pub(crate) content: NodeContent,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) resolved: ResolvedBox,
}

impl Node {
    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    pub fn resolved(&self) -> ResolvedBox {
        self.resolved
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// The retained tree of style-described boxes, text runs and geometry.
pub struct LayoutTree {
    nodes: Vec<Node>,
    root: NodeId,
    cursor: NodeId,
    viewport: Vec2,
}

impl LayoutTree {
    /// Creates a tree whose root is sized to the output viewport. The root
    /// keeps this size through resolution unless given an explicit style
    /// size; children hug or fill against it.
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        let root = Node {
            style: Style::default(),
            content: NodeContent::Box,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            resolved: ResolvedBox {
                x: 0.0,
                y: 0.0,
                width: viewport_width,
                height: viewport_height,
                z_index: 0,
            },
        };

        Self {
            nodes: vec![root],
            root: NodeId(0),
            cursor: NodeId(0),
            viewport: Vec2::new(viewport_width, viewport_height),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Updates the viewport; takes effect on the next resolution.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    /// Allocates a detached node. Attach it with
    /// [`add_child`](Self::add_child).
    pub fn create_node(&mut self, style: Style, content: NodeContent) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            style,
            content,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            resolved: ResolvedBox::default(),
        });
        id
    }

    /// Appends `child` to `parent`'s children. Sibling order is insertion
    /// order. Fails if the child is already attached somewhere; there is no
    /// re-parenting.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.lookup(parent)?;
        let child_node = self.lookup(child)?;
        if child_node.parent.is_some() {
            return Err(Error::invariant("child already has a parent"));
        }
        if parent == child {
            return Err(Error::invariant("cannot attach a node to itself"));
        }

        let previous_last = self.nodes[parent.index()].last_child;
        {
            let child_node = &mut self.nodes[child.index()];
            child_node.parent = Some(parent);
            child_node.prev_sibling = previous_last;
        }
        match previous_last {
            Some(last) => self.nodes[last.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        self.nodes[parent.index()].last_child = Some(child);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn style_mut(&mut self, id: NodeId) -> Option<&mut Style> {
        self.nodes.get_mut(id.index()).map(|n| &mut n.style)
    }

    pub fn content_mut(&mut self, id: NodeId) -> Option<&mut NodeContent> {
        self.nodes.get_mut(id.index()).map(|n| &mut n.content)
    }

    pub fn resolved_box(&self, id: NodeId) -> Option<ResolvedBox> {
        self.nodes.get(id.index()).map(|n| n.resolved)
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            next: self.node(id).and_then(|n| n.first_child),
        }
    }

    // ---- cursor API -------------------------------------------------------

    /// Opens a box view under the current cursor and makes it the cursor.
    /// Subsequent `view`/`text`/`geometry` calls nest inside it until
    /// [`end`](Self::end).
    pub fn view(&mut self, style: Style) -> Result<NodeId> {
        let parent = self.cursor;
        let id = self.create_node(style, NodeContent::Box);
        self.add_child(parent, id)?;
        self.cursor = id;
        Ok(id)
    }

    /// Closes the current view, returning the cursor to its parent.
    pub fn end(&mut self) -> Result<()> {
        let current = self.lookup(self.cursor)?;
        match current.parent {
            Some(parent) => {
                self.cursor = parent;
                Ok(())
            }
            None => Err(Error::invariant("no open view to end")),
        }
    }

    /// Appends a text leaf under the current cursor. The string is measured
    /// through the shaper now, so the node has a known size for content
    /// hugging. Does not move the cursor.
    pub fn text(
        &mut self,
        text: impl Into<String>,
        shaper: &dyn TextShaper,
        font_size: f32,
        color: Color,
        trim: Option<TrimRect>,
    ) -> Result<NodeId> {
        let text = text.into();
        let shape = shaper.get_text_shape(&text, font_size);
        let (width, height) = (shape.bounding_size.x, shape.bounding_size.y);

        let style = Style {
            width: width.into(),
            height: height.into(),
            ..Style::default()
        };
        let parent = self.cursor;
        let id = self.create_node(
            style,
            NodeContent::Text {
                text,
                font_size,
                color,
                trim,
            },
        );
        {
            let node = &mut self.nodes[id.index()];
            node.resolved.width = width;
            node.resolved.height = height;
        }
        self.add_child(parent, id)?;
        Ok(id)
    }

    /// Appends a geometry leaf (line or polygon) under the current cursor.
    /// Points are relative to the node's resolved origin. Does not move the
    /// cursor.
    pub fn geometry(
        &mut self,
        points: Vec<Vec2>,
        kind: GeometryKind,
        style: Style,
    ) -> Result<NodeId> {
        let minimum = match kind {
            GeometryKind::Line { .. } => 2,
            GeometryKind::Polygon => 3,
        };
        if points.len() < minimum {
            return Err(Error::invariant(format!(
                "geometry requires at least {minimum} points, got {}",
                points.len()
            )));
        }

        let parent = self.cursor;
        let id = self.create_node(style, NodeContent::Geometry { points, kind });
        self.add_child(parent, id)?;
        Ok(id)
    }

    /// Appends an already-created subtree under the current cursor.
    pub fn add(&mut self, node: NodeId) -> Result<()> {
        self.add_child(self.cursor, node)
    }

    // ---- internals --------------------------------------------------------

    fn lookup(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| Error::invariant(format!("unknown node id {:?}", id)))
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Whether the flow cursor places this child. Hidden and absolute
    /// children keep their slot in gap and hug accounting but are never
    /// moved by the parent.
    pub(crate) fn in_flow(&self, id: NodeId) -> bool {
        let node = self.get(id);
        node.style.position == crate::style::Position::Relative
            && node.style.display != Display::None
    }

    pub(crate) fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}

/// Iterator over a node's children in insertion order.
pub struct ChildIter<'a> {
    tree: &'a LayoutTree,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).next_sibling;
        Some(current)
    }
}
