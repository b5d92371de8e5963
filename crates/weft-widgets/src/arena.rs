#![forbid(unsafe_code)]

//! The widget arena: a slotmap-backed parent-owned tree.
//!
//! Parents exclusively own their children; upward pointers are plain
//! ids resolved through the arena, so no reference cycles exist.
//! Destroying a node releases its whole subtree.

use slotmap::SlotMap;

use weft_canvas::Canvas;
use weft_core::geometry::{Point, Rect, Size};
use weft_layout::{solve_box, solve_grid, Orientation, Placement, SizeHint};

use crate::widget::{LayoutSpec, Widget, WidgetCore, WidgetId};

/// One node: core state, behavior, and tree links.
pub struct WidgetNode {
    /// The node-owned half of the widget.
    pub core: WidgetCore,
    behavior: Option<Box<dyn Widget>>,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
}

/// The widget tree.
pub struct WidgetArena {
    nodes: SlotMap<WidgetId, WidgetNode>,
    root: WidgetId,
}

impl WidgetArena {
    /// Create an arena whose root is the given behavior at the given
    /// size.
    pub fn new(root_behavior: Box<dyn Widget>, size: Size) -> Self {
        let mut nodes = SlotMap::with_key();
        let mut core = WidgetCore::new();
        core.set_name("root");
        core.set_geometry_raw(Rect::from_size(size));
        let root = nodes.insert(WidgetNode {
            core,
            behavior: Some(root_behavior),
            parent: None,
            children: Vec::new(),
        });
        Self { nodes, root }
    }

    /// The root widget id.
    #[must_use]
    pub fn root(&self) -> WidgetId {
        self.root
    }

    /// Check whether an id is alive.
    #[must_use]
    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert a detached widget.
    pub fn insert(&mut self, behavior: Box<dyn Widget>) -> WidgetId {
        self.nodes.insert(WidgetNode {
            core: WidgetCore::new(),
            behavior: Some(behavior),
            parent: None,
            children: Vec::new(),
        })
    }

    /// Insert a widget as the last child of `parent`.
    pub fn insert_child(&mut self, parent: WidgetId, behavior: Box<dyn Widget>) -> WidgetId {
        let id = self.insert(behavior);
        self.set_parent(id, Some(parent));
        id
    }

    /// Re-parent a widget. `None` detaches it.
    ///
    /// A widget attached to a new parent is appended as the last (top)
    /// child.
    pub fn set_parent(&mut self, id: WidgetId, parent: Option<WidgetId>) {
        if let Some(old) = self.nodes.get(id).and_then(|n| n.parent) {
            if let Some(node) = self.nodes.get_mut(old) {
                node.children.retain(|&c| c != id);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
        }
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.push(id);
            }
        }
    }

    /// Destroy a widget and release its subtree.
    pub fn remove(&mut self, id: WidgetId) {
        if id == self.root {
            return;
        }
        if let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.retain(|&c| c != id);
            }
        }
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.remove(cur) {
                stack.extend(node.children);
            }
        }
    }

    /// The node's parent id.
    #[must_use]
    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// The node's children, bottom to top.
    #[must_use]
    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Immutable core access.
    #[must_use]
    pub fn core(&self, id: WidgetId) -> Option<&WidgetCore> {
        self.nodes.get(id).map(|n| &n.core)
    }

    /// Mutable core access.
    pub fn core_mut(&mut self, id: WidgetId) -> Option<&mut WidgetCore> {
        self.nodes.get_mut(id).map(|n| &mut n.core)
    }

    /// Typed behavior access.
    pub fn widget_mut<W: Widget>(&mut self, id: WidgetId) -> Option<&mut W> {
        self.nodes
            .get_mut(id)?
            .behavior
            .as_mut()?
            .as_any()
            .downcast_mut::<W>()
    }

    /// Run an event handler with a fully wired [`EventCtx`].
    ///
    /// The behavior is taken out of the node for the duration, so the
    /// handler may not re-enter its own widget through the arena.
    pub(crate) fn with_handler<R>(
        &mut self,
        id: WidgetId,
        clipboard: &mut crate::widget::Clipboard,
        queue: &mut Vec<crate::widget::UiCommand>,
        f: impl FnOnce(&mut dyn Widget, &mut crate::widget::EventCtx) -> R,
    ) -> Option<R> {
        let node = self.nodes.get_mut(id)?;
        let mut behavior = node.behavior.take()?;
        let mut ctx = crate::widget::EventCtx {
            id,
            core: &mut node.core,
            clipboard,
            queue,
        };
        let result = f(behavior.as_mut(), &mut ctx);
        node.behavior = Some(behavior);
        Some(result)
    }

    /// Run a closure with the node's behavior taken out of the tree.
    ///
    /// The behavior is restored afterwards; the closure gets the arena
    /// too, so it can traverse freely.
    pub fn with_behavior<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut Self) -> R,
    ) -> Option<R> {
        let mut behavior = self.nodes.get_mut(id)?.behavior.take()?;
        let result = f(behavior.as_mut(), self);
        if let Some(node) = self.nodes.get_mut(id) {
            node.behavior = Some(behavior);
        }
        Some(result)
    }

    /// Absolute (root-relative) position of a widget's origin.
    #[must_use]
    pub fn absolute_pos(&self, id: WidgetId) -> Point {
        let mut pos = Point::new(0, 0);
        let mut cur = Some(id);
        while let Some(i) = cur {
            let Some(node) = self.nodes.get(i) else { break };
            pos.x += node.core.geometry().x;
            pos.y += node.core.geometry().y;
            cur = node.parent;
        }
        pos
    }

    /// Absolute rectangle of a widget.
    #[must_use]
    pub fn absolute_rect(&self, id: WidgetId) -> Rect {
        let pos = self.absolute_pos(id);
        let size = self.core(id).map(WidgetCore::size).unwrap_or(Size::ZERO);
        Rect::new(pos.x, pos.y, size.width, size.height)
    }

    /// A widget is effectively visible when it and every ancestor is
    /// visible.
    #[must_use]
    pub fn is_effectively_visible(&self, id: WidgetId) -> bool {
        let mut cur = Some(id);
        while let Some(i) = cur {
            let Some(node) = self.nodes.get(i) else {
                return false;
            };
            if !node.core.is_visible() {
                return false;
            }
            cur = node.parent;
        }
        true
    }

    /// A widget is effectively enabled when it and every ancestor is
    /// enabled.
    #[must_use]
    pub fn is_effectively_enabled(&self, id: WidgetId) -> bool {
        let mut cur = Some(id);
        while let Some(i) = cur {
            let Some(node) = self.nodes.get(i) else {
                return false;
            };
            if !node.core.is_enabled() {
                return false;
            }
            cur = node.parent;
        }
        true
    }

    /// Check whether `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        let mut cur = Some(id);
        while let Some(i) = cur {
            if i == ancestor {
                return true;
            }
            cur = self.parent(i);
        }
        false
    }

    /// Pre-order depth-first walk from `start`, visiting `start` first.
    pub fn walk_preorder(&self, start: WidgetId, visit: &mut impl FnMut(WidgetId)) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            visit(id);
            if let Some(node) = self.nodes.get(id) {
                // Push reversed so children visit in order.
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
    }

    /// Set a widget's geometry, firing `resize_event` and re-running
    /// the child layout when the size changed.
    pub fn set_geometry(&mut self, id: WidgetId, rect: Rect) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let resized = node.core.set_geometry_raw(rect);
        if resized {
            let size = rect.size();
            self.with_behavior(id, |b, _| b.resize_event(size.width, size.height));
            self.relayout(id);
        }
    }

    /// The effective size hint of a widget (core bounds narrowed by the
    /// behavior's hint).
    #[must_use]
    pub fn hint(&mut self, id: WidgetId) -> SizeHint {
        let behavior_hint = self
            .with_behavior_hint(id)
            .unwrap_or(SizeHint::UNBOUNDED);
        self.core(id)
            .map(|c| c.effective_hint(behavior_hint))
            .unwrap_or(SizeHint::UNBOUNDED)
    }

    fn with_behavior_hint(&mut self, id: WidgetId) -> Option<SizeHint> {
        self.with_behavior(id, |b, _| b.size_hint())
    }

    /// Re-run the child layout of `id` and recurse into children.
    pub fn relayout(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get(id) else { return };
        let spec = node.core.layout();
        let size = node.core.size();
        let children: Vec<WidgetId> = node.children.clone();
        if children.is_empty() {
            return;
        }

        let visible: Vec<WidgetId> = children
            .iter()
            .copied()
            .filter(|&c| self.core(c).is_some_and(WidgetCore::is_visible))
            .collect();
        let hints: Vec<SizeHint> = visible.iter().map(|&c| self.hint(c)).collect();

        // A behavior may take over its children's geometry entirely.
        let custom = self
            .with_behavior(id, |b, _| b.layout_children(size, &hints))
            .flatten();

        let rects: Option<Vec<Rect>> = custom.or_else(|| match spec {
            LayoutSpec::Absolute => None,
            LayoutSpec::HBox | LayoutSpec::Linear(Orientation::Horizontal) => Some(solve_box(
                Rect::from_size(size),
                Orientation::Horizontal,
                &hints,
            )),
            LayoutSpec::VBox | LayoutSpec::Linear(Orientation::Vertical) => {
                Some(solve_box(Rect::from_size(size), Orientation::Vertical, &hints))
            }
            LayoutSpec::Grid => {
                let placements: Vec<Placement> = visible
                    .iter()
                    .zip(&hints)
                    .map(|(&c, &hint)| {
                        self.core(c)
                            .map(|core| core.placement(hint))
                            .unwrap_or(Placement::cell(0, 0, hint))
                    })
                    .collect();
                Some(solve_grid(Rect::from_size(size), &placements))
            }
        });

        match rects {
            Some(rects) => {
                for (&child, rect) in visible.iter().zip(rects) {
                    self.set_geometry(child, rect);
                }
            }
            None => {
                for &child in &children {
                    self.relayout(child);
                }
            }
        }
    }

    /// Repaint one widget's private canvas.
    pub fn paint_widget(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if !node.core.is_visible() || node.core.size().is_empty() {
            return;
        }
        let Some(mut behavior) = node.behavior.take() else {
            return;
        };
        let mut canvas = node.core.take_canvas();
        canvas.clean();
        behavior.paint(&mut canvas, &node.core);
        let node = self.nodes.get_mut(id).expect("node alive during paint");
        node.core.put_canvas(canvas);
        node.behavior = Some(behavior);
    }

    /// Repaint every visible widget (used for the first frame).
    pub fn paint_all(&mut self) {
        let mut ids = Vec::new();
        self.walk_preorder(self.root, &mut |id| ids.push(id));
        for id in ids {
            self.paint_widget(id);
        }
    }

    /// Composite all widget canvases into `target`, painter's order.
    pub fn compose(&self, target: &mut Canvas) {
        let bound = Rect::from_size(target.size());
        self.compose_node(self.root, Point::new(0, 0), bound, target);
    }

    fn compose_node(&self, id: WidgetId, parent_origin: Point, bound: Rect, target: &mut Canvas) {
        let Some(node) = self.nodes.get(id) else { return };
        if !node.core.is_visible() {
            return;
        }
        let geom = node.core.geometry();
        let origin = Point::new(parent_origin.x + geom.x, parent_origin.y + geom.y);
        let abs = Rect::new(origin.x, origin.y, geom.width, geom.height);
        let Some(visible) = abs.intersection_opt(&bound) else {
            return;
        };
        // Blit the visible slice of this widget's canvas.
        let src_rect = visible.translated(-origin.x, -origin.y);
        target.paint_canvas(node.core.canvas(), src_rect, visible.pos());
        for &child in &node.children {
            self.compose_node(child, origin, visible, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Container, Label};
    use weft_style::Color;

    fn arena() -> WidgetArena {
        WidgetArena::new(Box::new(Container::new()), Size::new(20, 10))
    }

    #[test]
    fn insert_child_links_both_ways() {
        let mut a = arena();
        let root = a.root();
        let id = a.insert_child(root, Box::new(Label::new("hi")));
        assert_eq!(a.parent(id), Some(root));
        assert_eq!(a.children(root), &[id]);
    }

    #[test]
    fn reparent_moves_node() {
        let mut a = arena();
        let root = a.root();
        let c1 = a.insert_child(root, Box::new(Container::new()));
        let c2 = a.insert_child(root, Box::new(Container::new()));
        let w = a.insert_child(c1, Box::new(Label::new("x")));
        a.set_parent(w, Some(c2));
        assert!(a.children(c1).is_empty());
        assert_eq!(a.children(c2), &[w]);
        assert_eq!(a.parent(w), Some(c2));
    }

    #[test]
    fn remove_releases_subtree() {
        let mut a = arena();
        let root = a.root();
        let c = a.insert_child(root, Box::new(Container::new()));
        let w = a.insert_child(c, Box::new(Label::new("x")));
        a.remove(c);
        assert!(!a.contains(c));
        assert!(!a.contains(w));
        assert!(a.children(root).is_empty());
    }

    #[test]
    fn absolute_position_sums_chain() {
        let mut a = arena();
        let root = a.root();
        let c = a.insert_child(root, Box::new(Container::new()));
        a.core_mut(c).unwrap().set_geometry_raw(Rect::new(2, 3, 10, 5));
        let w = a.insert_child(c, Box::new(Label::new("x")));
        a.core_mut(w).unwrap().set_geometry_raw(Rect::new(1, 1, 3, 1));
        assert_eq!(a.absolute_pos(w), Point::new(3, 4));
    }

    #[test]
    fn effective_visibility_includes_ancestors() {
        let mut a = arena();
        let root = a.root();
        let c = a.insert_child(root, Box::new(Container::new()));
        let w = a.insert_child(c, Box::new(Label::new("x")));
        assert!(a.is_effectively_visible(w));
        a.core_mut(c).unwrap().set_visible(false);
        assert!(!a.is_effectively_visible(w));
    }

    #[test]
    fn vbox_layout_assigns_children() {
        let mut a = arena();
        let root = a.root();
        a.core_mut(root).unwrap().set_layout(LayoutSpec::VBox);
        let top = a.insert_child(root, Box::new(Container::new()));
        a.core_mut(top)
            .unwrap()
            .set_max_size(Size::new(u16::MAX, 2));
        let bottom = a.insert_child(root, Box::new(Container::new()));
        a.relayout(root);
        assert_eq!(a.core(top).unwrap().geometry(), Rect::new(0, 0, 20, 2));
        assert_eq!(a.core(bottom).unwrap().geometry(), Rect::new(0, 2, 20, 8));
    }

    #[test]
    fn compose_paints_child_over_parent() {
        let mut a = arena();
        let root = a.root();
        let label = a.insert_child(root, Box::new(Label::styled("AB", Color::fg("#ff0000"))));
        a.set_geometry(label, Rect::new(1, 1, 2, 1));
        a.paint_all();
        let mut screen = Canvas::new(20, 10);
        a.compose(&mut screen);
        assert_eq!(screen.cell(1, 1).unwrap().text(), "A");
        assert_eq!(screen.cell(2, 1).unwrap().text(), "B");
    }

    #[test]
    fn compose_clips_child_to_parent_bounds() {
        let mut a = arena();
        let root = a.root();
        let c = a.insert_child(root, Box::new(Container::new()));
        a.set_geometry(c, Rect::new(0, 0, 5, 1));
        let label = a.insert_child(c, Box::new(Label::new("ABCDEFGH")));
        a.set_geometry(label, Rect::new(3, 0, 8, 1));
        a.paint_all();
        let mut screen = Canvas::new(20, 10);
        a.compose(&mut screen);
        // Child extends past the 5-wide parent; clipped at x=5.
        assert_eq!(screen.cell(3, 0).unwrap().text(), "A");
        assert_eq!(screen.cell(4, 0).unwrap().text(), "B");
        assert_eq!(screen.cell(5, 0).unwrap().text(), " ");
    }
}
