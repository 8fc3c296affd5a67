//! Layout resolution.
//!
//! [`LayoutTree::resolve`] turns style inputs into concrete pixel boxes in
//! two sweeps over a breadth-first ordering of the tree:
//!
//! 1. bottom-up, content hugging: auto-sized nodes grow to wrap their
//!    children;
//! 2. top-down, flow: percentages, offsets, alignment, aspect ratios, flex
//!    distribution and the justify cursor, finishing with pixel rounding.
//!
//! The root takes part in neither sweep. It keeps the viewport size and
//! never flow-positions its children; children of the root place themselves
//! through their own offset and alignment rules.
//!
//! Resolution is a full recomputation: every resolved box is cleared up
//! front, so calling [`resolve`](LayoutTree::resolve) twice on an unchanged
//! tree yields identical boxes.

use crate::error::{Error, Result};
use crate::style::{
    AlignItems, AlignSelf, Display, FlexDirection, JustifyContent, Position,
};
use crate::tree::{LayoutTree, NodeId, ResolvedBox};

impl LayoutTree {
    /// Resolves every node's box from the current style inputs.
    ///
    /// Fails when a node carries a negative flex weight; the tree is left
    /// partially resolved in that case and the next successful call fully
    /// recomputes it.
    pub fn resolve(&mut self) -> Result<()> {
        let viewport = self.viewport();
        for id in self.node_ids().collect::<Vec<_>>() {
            self.get_mut(id).resolved = ResolvedBox::default();
        }
        {
            let root = self.get_mut(self.root());
            root.resolved.width = viewport.x;
            root.resolved.height = viewport.y;
        }

        // Level order below the root: reversed it visits children before
        // parents (hug), forwards parents before children (flow).
        let mut order: Vec<NodeId> = self.children(self.root()).collect();
        let mut head = 0;
        while head < order.len() {
            let id = order[head];
            head += 1;
            let mut child = self.get(id).first_child;
            while let Some(c) = child {
                order.push(c);
                child = self.get(c).next_sibling;
            }
        }

        for &id in order.iter().rev() {
            self.hug_pass(id);
        }
        for &id in &order {
            self.flow_pass(id)?;
        }

        log::debug!("resolved {} nodes", order.len() + 1);
        Ok(())
    }

    /// Pass 1: apply fixed style sizes, then wrap auto-sized nodes around
    /// their relative children. The main axis sums child extents, the cross
    /// axis takes the maximum; both add the node's own padding, and the row
    /// main axis adds gap slots between relative children.
    ///
    /// A child contributes its extent only once its own size is known: a
    /// fixed size counts immediately, a hugged size counts because children
    /// run first, and a percentage (still zero here) is deferred to the
    /// parent's flow pass. Child margins count toward the extent even though
    /// they never move the flow cursor later.
    fn hug_pass(&mut self, id: NodeId) {
        let (style_width, style_height, direction, padding, gap) = {
            let style = &self.get(id).style;
            (
                style.width,
                style.height,
                style.flex_direction,
                style.padding,
                style.gap,
            )
        };

        if let Some(width) = style_width.fixed() {
            self.get_mut(id).resolved.width = width;
        }
        if let Some(height) = style_height.fixed() {
            self.get_mut(id).resolved.height = height;
        }

        if style_width.is_auto() {
            let mut width = 0.0f32;
            let mut relative_count = 0i32;
            let mut child = self.get(id).first_child;
            while let Some(c) = child {
                let node = self.get(c);
                let relative = node.style.position == Position::Relative;
                let known = node.resolved.width != 0.0 || node.style.width.fixed().is_some();
                if relative && known {
                    let extent = node.resolved.width + node.style.margin.horizontal();
                    width = match direction {
                        FlexDirection::Row => width + extent,
                        FlexDirection::Column => width.max(extent),
                    };
                }
                if relative {
                    relative_count += 1;
                }
                child = node.next_sibling;
            }
            width += padding.horizontal();
            if direction == FlexDirection::Row {
                width += (relative_count - 1) as f32 * gap;
            }
            self.get_mut(id).resolved.width = width;
        }

        if style_height.is_auto() {
            let mut height = 0.0f32;
            let mut relative_count = 0i32;
            let mut child = self.get(id).first_child;
            while let Some(c) = child {
                let node = self.get(c);
                let relative = node.style.position == Position::Relative;
                let known = node.resolved.height != 0.0 || node.style.height.fixed().is_some();
                if relative && known {
                    let extent = node.resolved.height + node.style.margin.vertical();
                    height = match direction {
                        FlexDirection::Column => height + extent,
                        FlexDirection::Row => height.max(extent),
                    };
                }
                if relative {
                    relative_count += 1;
                }
                child = node.next_sibling;
            }
            height += padding.vertical();
            if direction == FlexDirection::Column {
                height += (relative_count - 1) as f32 * gap;
            }
            self.get_mut(id).resolved.height = height;
        }
    }

    /// Pass 2/3: the combined top-down step, run once per node with the
    /// parent already final. The order of the blocks below is load-bearing;
    /// later rules read the outputs of earlier ones.
    fn flow_pass(&mut self, id: NodeId) -> Result<()> {
        let Some(parent_id) = self.get(id).parent else {
            return Ok(());
        };
        let (parent_box, parent_direction, parent_padding) = {
            let parent = self.get(parent_id);
            (
                parent.resolved,
                parent.style.flex_direction,
                parent.style.padding,
            )
        };
        let style = self.get(id).style.clone();

        if let Some(flex) = style.flex {
            if flex < 0.0 {
                return Err(Error::invariant(format!(
                    "flex weight must not be negative, got {flex}"
                )));
            }
        }

        // Percentages against the parent's final size.
        {
            let resolved = &mut self.get_mut(id).resolved;
            if let Some(fraction) = style.width.percent() {
                resolved.width = fraction * parent_box.width;
            }
            if let Some(fraction) = style.height.percent() {
                resolved.height = fraction * parent_box.height;
            }
        }

        // Edge offsets. Both edges with an auto size derive the size from
        // the parent; otherwise a near offset adds to the flow position
        // (relative) or anchors to the parent origin (absolute), and a far
        // offset alone anchors to the far parent edge (absolute) or replaces
        // the position with parentOrigin - offset (relative). Absolute nodes
        // without offsets sit at the parent origin.
        let absolute = style.position == Position::Absolute;
        {
            let resolved = &mut self.get_mut(id).resolved;
            match (style.left, style.right) {
                (Some(left), Some(right)) if style.width.is_auto() => {
                    resolved.x = parent_box.x + left;
                    resolved.width = parent_box.width - left - right;
                }
                (Some(left), _) => {
                    if absolute {
                        resolved.x = parent_box.x + left;
                    } else {
                        resolved.x += left;
                    }
                }
                (None, Some(right)) => {
                    if absolute {
                        resolved.x = parent_box.x + parent_box.width - right - resolved.width;
                    } else {
                        resolved.x = parent_box.x - right;
                    }
                }
                (None, None) => {
                    if absolute {
                        resolved.x = parent_box.x;
                    }
                }
            }
            match (style.top, style.bottom) {
                (Some(top), Some(bottom)) if style.height.is_auto() => {
                    resolved.y = parent_box.y + top;
                    resolved.height = parent_box.height - top - bottom;
                }
                (Some(top), _) => {
                    if absolute {
                        resolved.y = parent_box.y + top;
                    } else {
                        resolved.y += top;
                    }
                }
                (None, Some(bottom)) => {
                    if absolute {
                        resolved.y = parent_box.y + parent_box.height - bottom - resolved.height;
                    } else {
                        resolved.y = parent_box.y - bottom;
                    }
                }
                (None, None) => {
                    if absolute {
                        resolved.y = parent_box.y;
                    }
                }
            }
        }

        // Self alignment on the parent's cross axis. Stretch fills the
        // parent's content box and re-anchors to the content start; center
        // ignores padding, end backs off the far padding.
        if !absolute && style.display != Display::None {
            let resolved = &mut self.get_mut(id).resolved;
            match parent_direction {
                FlexDirection::Row => match style.align_self {
                    AlignSelf::Center => {
                        resolved.y =
                            parent_box.y + parent_box.height / 2.0 - resolved.height / 2.0;
                    }
                    AlignSelf::End => {
                        resolved.y = parent_box.y + parent_box.height
                            - resolved.height
                            - parent_padding.bottom;
                    }
                    AlignSelf::Stretch => {
                        resolved.height = parent_box.height - parent_padding.vertical();
                        resolved.y = parent_box.y + parent_padding.top;
                    }
                    AlignSelf::Auto | AlignSelf::Start => {}
                },
                FlexDirection::Column => match style.align_self {
                    AlignSelf::Center => {
                        resolved.x = parent_box.x + parent_box.width / 2.0 - resolved.width / 2.0;
                    }
                    AlignSelf::End => {
                        resolved.x = parent_box.x + parent_box.width
                            - resolved.width
                            - parent_padding.right;
                    }
                    AlignSelf::Stretch => {
                        resolved.width = parent_box.width - parent_padding.horizontal();
                        resolved.x = parent_box.x + parent_padding.left;
                    }
                    AlignSelf::Auto | AlignSelf::Start => {}
                },
            }
        }

        // Aspect ratio derives the parent's main-axis extent from the cross
        // one.
        if let Some(ratio) = style.aspect_ratio {
            let resolved = &mut self.get_mut(id).resolved;
            match parent_direction {
                FlexDirection::Row => resolved.width = resolved.height * ratio,
                FlexDirection::Column => resolved.height = resolved.width / ratio,
            }
        }

        let own_size = {
            let resolved = self.get(id).resolved;
            (resolved.width, resolved.height)
        };

        // Children of the root resolve percentages in their own pass; for
        // everyone else this fan-out is what makes percentage child sizes
        // visible to the flex accounting below before the children run.
        let mut child = self.get(id).first_child;
        while let Some(c) = child {
            let node = self.get(c);
            let next = node.next_sibling;
            let fraction_w = node.style.width.percent();
            let fraction_h = node.style.height.percent();
            if fraction_w.is_some() || fraction_h.is_some() {
                let resolved = &mut self.get_mut(c).resolved;
                if let Some(fraction) = fraction_w {
                    resolved.width = fraction * own_size.0;
                }
                if let Some(fraction) = fraction_h {
                    resolved.height = fraction * own_size.1;
                }
            }
            child = next;
        }

        self.get_mut(id).resolved.z_index = style.z_index.unwrap_or(parent_box.z_index);

        // Available space: own size minus padding, gap slots (suppressed
        // under the space-* modes, which compute their own spacing) and the
        // sizes of relative non-flex children on the main axis. Margins
        // never enter this accounting.
        let mut available = (own_size.0, own_size.1);
        let mut relative_count = 0usize;
        let mut total_flex = 0.0f32;
        let mut child = self.get(id).first_child;
        while let Some(c) = child {
            let node = self.get(c);
            if node.style.position == Position::Relative {
                relative_count += 1;
                match node.style.flex {
                    Some(flex) => total_flex += flex,
                    None => match style.flex_direction {
                        FlexDirection::Row => available.0 -= node.resolved.width,
                        FlexDirection::Column => available.1 -= node.resolved.height,
                    },
                }
            }
            child = node.next_sibling;
        }
        available.0 -= style.padding.horizontal();
        available.1 -= style.padding.vertical();
        if !style.justify_content.distributes_space() {
            let slots = (relative_count as f32 - 1.0) * style.gap;
            match style.flex_direction {
                FlexDirection::Row => available.0 -= slots,
                FlexDirection::Column => available.1 -= slots,
            }
        }

        // Flex children share the leftover main-axis space by weight. A zero
        // total weight distributes nothing.
        if !style.justify_content.distributes_space() && total_flex > 0.0 {
            let main_available = match style.flex_direction {
                FlexDirection::Row => available.0,
                FlexDirection::Column => available.1,
            };
            let mut child = self.get(id).first_child;
            while let Some(c) = child {
                let node = self.get(c);
                let next = node.next_sibling;
                let share = match (node.style.position, node.style.flex) {
                    (Position::Relative, Some(flex)) => Some(flex / total_flex),
                    _ => None,
                };
                if let Some(share) = share {
                    let resolved = &mut self.get_mut(c).resolved;
                    match style.flex_direction {
                        FlexDirection::Row => resolved.width = share * main_available,
                        FlexDirection::Column => resolved.height = share * main_available,
                    }
                }
                child = next;
            }
        }

        // Only the near margins move the node itself; right/bottom margins
        // have no effect here (they count in hug sizing alone).
        {
            let resolved = &mut self.get_mut(id).resolved;
            resolved.x += style.margin.left;
            resolved.y += style.margin.top;
        }

        // Main-axis flow cursor. Absolute and hidden children keep their
        // own positions; everyone else is placed sequentially, with the
        // cross axis reset to the content start (align-items may move it
        // next).
        let own = self.get(id).resolved;
        let content = (own.x + style.padding.left, own.y + style.padding.top);
        let main_available = match style.flex_direction {
            FlexDirection::Row => available.0,
            FlexDirection::Column => available.1,
        };
        let (initial_offset, between) = main_axis_spacing(
            style.justify_content,
            style.gap,
            main_available,
            relative_count,
        );
        let mut cursor = match style.flex_direction {
            FlexDirection::Row => content.0,
            FlexDirection::Column => content.1,
        } + initial_offset;
        let cross_start = match style.flex_direction {
            FlexDirection::Row => content.1,
            FlexDirection::Column => content.0,
        };

        let mut child = self.get(id).first_child;
        while let Some(c) = child {
            let (next, placed, main_size) = {
                let node = self.get(c);
                let main = match style.flex_direction {
                    FlexDirection::Row => node.resolved.width,
                    FlexDirection::Column => node.resolved.height,
                };
                (node.next_sibling, self.in_flow(c), main)
            };
            if placed {
                let resolved = &mut self.get_mut(c).resolved;
                match style.flex_direction {
                    FlexDirection::Row => {
                        resolved.x = cursor;
                        resolved.y = cross_start;
                    }
                    FlexDirection::Column => {
                        resolved.y = cursor;
                        resolved.x = cross_start;
                    }
                }
                cursor += main_size + between;
            }
            child = next;
        }

        // Cross-axis alignment. Center ignores padding, end backs off the
        // far padding, stretch only fills when the child has no explicit
        // cross size. Absolute children are exempt.
        if style.align_items != AlignItems::Start {
            let mut child = self.get(id).first_child;
            while let Some(c) = child {
                let (next, child_absolute, child_cross, cross_auto) = {
                    let node = self.get(c);
                    let cross = match style.flex_direction {
                        FlexDirection::Row => node.resolved.height,
                        FlexDirection::Column => node.resolved.width,
                    };
                    let auto = match style.flex_direction {
                        FlexDirection::Row => node.style.height.is_auto(),
                        FlexDirection::Column => node.style.width.is_auto(),
                    };
                    (
                        node.next_sibling,
                        node.style.position == Position::Absolute,
                        cross,
                        auto,
                    )
                };
                if !child_absolute {
                    let resolved = &mut self.get_mut(c).resolved;
                    match style.flex_direction {
                        FlexDirection::Row => match style.align_items {
                            AlignItems::Center => {
                                resolved.y = own.y + own.height / 2.0 - child_cross / 2.0;
                            }
                            AlignItems::End => {
                                resolved.y =
                                    own.y + own.height - child_cross - style.padding.bottom;
                            }
                            AlignItems::Stretch if cross_auto => {
                                resolved.height = own.height - style.padding.vertical();
                            }
                            _ => {}
                        },
                        FlexDirection::Column => match style.align_items {
                            AlignItems::Center => {
                                resolved.x = own.x + own.width / 2.0 - child_cross / 2.0;
                            }
                            AlignItems::End => {
                                resolved.x = own.x + own.width - child_cross - style.padding.right;
                            }
                            AlignItems::Stretch if cross_auto => {
                                resolved.width = own.width - style.padding.horizontal();
                            }
                            _ => {}
                        },
                    }
                }
                child = next;
            }
        }

        // Snap to whole pixels, clamping sizes at zero.
        {
            let resolved = &mut self.get_mut(id).resolved;
            resolved.x = resolved.x.round();
            resolved.y = resolved.y.round();
            resolved.width = resolved.width.round().max(0.0);
            resolved.height = resolved.height.round().max(0.0);
        }

        Ok(())
    }
}

/// Initial cursor offset and between-child spacing for a justify mode. The
/// space-* modes replace the configured gap with computed shares of the
/// leftover main-axis space.
fn main_axis_spacing(
    justify: JustifyContent,
    gap: f32,
    available: f32,
    relative_count: usize,
) -> (f32, f32) {
    match justify {
        JustifyContent::Start => (0.0, gap),
        JustifyContent::Center => (available / 2.0, gap),
        JustifyContent::End => (available, gap),
        JustifyContent::SpaceBetween => {
            if relative_count > 1 {
                (0.0, available / (relative_count - 1) as f32)
            } else {
                (0.0, 0.0)
            }
        }
        JustifyContent::SpaceAround => {
            if relative_count > 0 {
                let share = available / relative_count as f32;
                (share / 2.0, share)
            } else {
                (0.0, 0.0)
            }
        }
        JustifyContent::SpaceEvenly => {
            let share = available / (relative_count + 1) as f32;
            (share, share)
        }
    }
}
