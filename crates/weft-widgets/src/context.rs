#![forbid(unsafe_code)]

//! The process-wide UI coordinator.
//!
//! The [`Context`] tracks the focused widget, the modal overlay stack,
//! the dirty-widget set, the mouse grab, and the clipboard. Widgets
//! receive it indirectly: event handlers queue [`UiCommand`]s which the
//! dispatcher applies here.

use std::collections::HashSet;

use crate::arena::WidgetArena;
use crate::widget::{Clipboard, FocusPolicy, OverlayMode, UiCommand, WidgetId};

/// Process-wide coordinator state.
#[derive(Default)]
pub struct Context {
    focused: Option<WidgetId>,
    overlays: Vec<(WidgetId, OverlayMode)>,
    dirty: HashSet<WidgetId>,
    mouse_grab: Option<WidgetId>,
    quit: bool,
    /// The single-slot process clipboard.
    pub clipboard: Clipboard,
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently focused widget.
    #[must_use]
    pub fn focused(&self) -> Option<WidgetId> {
        self.focused
    }

    /// The current mouse grabber.
    #[must_use]
    pub fn mouse_grab(&self) -> Option<WidgetId> {
        self.mouse_grab
    }

    pub(crate) fn set_mouse_grab(&mut self, id: Option<WidgetId>) {
        self.mouse_grab = id;
    }

    /// The top modal overlay, if any.
    #[must_use]
    pub fn top_overlay(&self) -> Option<(WidgetId, OverlayMode)> {
        self.overlays.last().copied()
    }

    /// Push a modal overlay. Only widgets inside the top overlay
    /// receive input.
    pub fn open_overlay(&mut self, arena: &WidgetArena, id: WidgetId, mode: OverlayMode) {
        if arena.contains(id) {
            self.overlays.push((id, mode));
            self.mark_dirty(id);
        }
    }

    /// Pop the top overlay.
    pub fn close_overlay(&mut self, arena: &WidgetArena) {
        if let Some((id, _)) = self.overlays.pop() {
            if arena.contains(id) {
                self.mark_dirty(arena.root());
            }
            if self
                .focused
                .is_some_and(|f| arena.is_ancestor_of(id, f))
            {
                self.focused = None;
            }
        }
    }

    /// Mark a widget dirty; the next repaint pass repaints it and
    /// re-composites its ancestors.
    pub fn mark_dirty(&mut self, id: WidgetId) {
        self.dirty.insert(id);
    }

    /// Whether any widget awaits repaint.
    #[must_use]
    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Drain the dirty set.
    pub fn take_dirty(&mut self) -> Vec<WidgetId> {
        self.dirty.drain().collect()
    }

    /// Move focus, firing `focus_out` on the previous holder and
    /// `focus_in` on the new one.
    pub fn set_focus(&mut self, arena: &mut WidgetArena, target: Option<WidgetId>) {
        let target = target.filter(|&id| arena.contains(id));
        if self.focused == target {
            return;
        }
        if let Some(old) = self.focused.take() {
            if let Some(core) = arena.core_mut(old) {
                core.set_focused(false);
            }
            arena.with_behavior(old, |b, _| b.focus_out());
            self.mark_dirty(old);
        }
        if let Some(new) = target {
            if let Some(core) = arena.core_mut(new) {
                core.set_focused(true);
            }
            arena.with_behavior(new, |b, _| b.focus_in());
            self.mark_dirty(new);
        }
        self.focused = target;
    }

    /// Widgets eligible for Tab traversal, in depth-first pre-order.
    ///
    /// Restricted to the top overlay's subtree when an overlay is
    /// active. A container with tab focus participates in its own
    /// right before its children.
    fn tab_chain(&self, arena: &WidgetArena) -> Vec<WidgetId> {
        let start = self
            .top_overlay()
            .map(|(id, _)| id)
            .unwrap_or_else(|| arena.root());
        let mut chain = Vec::new();
        arena.walk_preorder(start, &mut |id| {
            let Some(core) = arena.core(id) else { return };
            if core.focus_policy().contains(FocusPolicy::TAB)
                && arena.is_effectively_visible(id)
                && arena.is_effectively_enabled(id)
            {
                chain.push(id);
            }
        });
        chain
    }

    /// Move focus to the next tab-focusable widget, wrapping at the
    /// end.
    pub fn focus_next(&mut self, arena: &mut WidgetArena) {
        self.focus_step(arena, 1);
    }

    /// Move focus to the previous tab-focusable widget, wrapping at
    /// the start.
    pub fn focus_prev(&mut self, arena: &mut WidgetArena) {
        self.focus_step(arena, -1);
    }

    fn focus_step(&mut self, arena: &mut WidgetArena, step: i32) {
        let chain = self.tab_chain(arena);
        if chain.is_empty() {
            return;
        }
        let len = chain.len() as i32;
        let next = match self.focused.and_then(|f| chain.iter().position(|&c| c == f)) {
            Some(pos) => (pos as i32 + step).rem_euclid(len) as usize,
            // No current focus: Tab starts at the first, Shift-Tab at
            // the last.
            None => {
                if step > 0 {
                    0
                } else {
                    chain.len() - 1
                }
            }
        };
        self.set_focus(arena, Some(chain[next]));
    }

    /// Ask the event loop to exit at the end of the iteration.
    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    /// Whether a quit was requested.
    #[must_use]
    pub const fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Apply a batch of queued commands.
    pub fn apply_commands(&mut self, arena: &mut WidgetArena, commands: Vec<UiCommand>) {
        for command in commands {
            match command {
                UiCommand::Update(id) => self.mark_dirty(id),
                UiCommand::Relayout(id) => {
                    arena.relayout(id);
                    self.mark_dirty(id);
                }
                UiCommand::SetFocus(target) => self.set_focus(arena, target),
                UiCommand::GrabMouse(id) => self.mouse_grab = Some(id),
                UiCommand::ReleaseMouse => self.mouse_grab = None,
                UiCommand::OpenOverlay(id, mode) => self.open_overlay(arena, id, mode),
                UiCommand::CloseOverlay => self.close_overlay(arena),
                UiCommand::Quit => self.request_quit(),
            }
        }
    }

    /// Drop references to widgets that no longer exist.
    pub fn prune(&mut self, arena: &WidgetArena) {
        if self.focused.is_some_and(|id| !arena.contains(id)) {
            self.focused = None;
        }
        if self.mouse_grab.is_some_and(|id| !arena.contains(id)) {
            self.mouse_grab = None;
        }
        self.overlays.retain(|(id, _)| arena.contains(*id));
        self.dirty.retain(|id| arena.contains(*id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::WidgetArena;
    use crate::basic::{Container, Label};
    use weft_core::geometry::Size;

    fn focusable(arena: &mut WidgetArena, parent: WidgetId, name: &str) -> WidgetId {
        let id = arena.insert_child(parent, Box::new(Label::new(name)));
        let core = arena.core_mut(id).unwrap();
        core.set_name(name);
        core.set_focus_policy(FocusPolicy::TAB | FocusPolicy::CLICK);
        id
    }

    /// Tree from the focus traversal scenario:
    /// root(C1(w1, C2(w2, w3), w4)), all tab-focusable.
    fn scenario() -> (WidgetArena, Context, [WidgetId; 4]) {
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 10));
        let root = arena.root();
        let c1 = arena.insert_child(root, Box::new(Container::new()));
        let w1 = focusable(&mut arena, c1, "w1");
        let c2 = arena.insert_child(c1, Box::new(Container::new()));
        let w2 = focusable(&mut arena, c2, "w2");
        let w3 = focusable(&mut arena, c2, "w3");
        let w4 = focusable(&mut arena, c1, "w4");
        (arena, Context::new(), [w1, w2, w3, w4])
    }

    #[test]
    fn tab_traversal_visits_preorder_and_wraps() {
        let (mut arena, mut ctx, [w1, w2, w3, w4]) = scenario();
        ctx.set_focus(&mut arena, Some(w2));

        ctx.focus_next(&mut arena);
        assert_eq!(ctx.focused(), Some(w3));
        ctx.focus_next(&mut arena);
        assert_eq!(ctx.focused(), Some(w4));
        ctx.focus_next(&mut arena);
        assert_eq!(ctx.focused(), Some(w1), "wraps to the first");
    }

    #[test]
    fn shift_tab_walks_backwards() {
        let (mut arena, mut ctx, [_w1, w2, w3, w4]) = scenario();
        ctx.set_focus(&mut arena, Some(w2));
        ctx.focus_next(&mut arena);
        ctx.focus_next(&mut arena);
        ctx.focus_next(&mut arena);
        // Now at w1 (wrapped); three Shift-Tabs: w4, w3, w2.
        ctx.focus_prev(&mut arena);
        assert_eq!(ctx.focused(), Some(w4));
        ctx.focus_prev(&mut arena);
        assert_eq!(ctx.focused(), Some(w3));
        ctx.focus_prev(&mut arena);
        assert_eq!(ctx.focused(), Some(w2));
    }

    #[test]
    fn hidden_and_disabled_widgets_skipped() {
        let (mut arena, mut ctx, [w1, w2, w3, _w4]) = scenario();
        arena.core_mut(w2).unwrap().set_visible(false);
        arena.core_mut(w3).unwrap().set_enabled(false);
        ctx.set_focus(&mut arena, Some(w1));
        ctx.focus_next(&mut arena);
        assert_ne!(ctx.focused(), Some(w2));
        assert_ne!(ctx.focused(), Some(w3));
    }

    #[test]
    fn focus_change_updates_core_flags() {
        let (mut arena, mut ctx, [w1, w2, ..]) = scenario();
        ctx.set_focus(&mut arena, Some(w1));
        assert!(arena.core(w1).unwrap().has_focus());
        ctx.set_focus(&mut arena, Some(w2));
        assert!(!arena.core(w1).unwrap().has_focus());
        assert!(arena.core(w2).unwrap().has_focus());
    }

    #[test]
    fn overlay_restricts_tab_chain() {
        let (mut arena, mut ctx, [w1, ..]) = scenario();
        let root = arena.root();
        let overlay = arena.insert_child(root, Box::new(Container::new()));
        let o1 = focusable(&mut arena, overlay, "o1");
        let o2 = focusable(&mut arena, overlay, "o2");
        ctx.open_overlay(&arena, overlay, OverlayMode::Modal);

        ctx.focus_next(&mut arena);
        assert_eq!(ctx.focused(), Some(o1));
        ctx.focus_next(&mut arena);
        assert_eq!(ctx.focused(), Some(o2));
        ctx.focus_next(&mut arena);
        assert_eq!(ctx.focused(), Some(o1), "wraps inside the overlay");
        assert_ne!(ctx.focused(), Some(w1));
    }
}
