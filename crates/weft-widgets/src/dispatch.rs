#![forbid(unsafe_code)]

//! Event routing.
//!
//! Mouse events walk the tree top-down to pick a target (at each level
//! the last visible child containing the point wins, so later siblings
//! paint and hit on top), deliver to the leaf in local coordinates,
//! then bubble unconsumed events up the parent chain. A consumed press
//! grabs the mouse: the rest of the gesture (drag, release) goes
//! straight to the grabber regardless of position.
//!
//! Key and paste events go to the focused widget and bubble up;
//! Tab/Shift-Tab are intercepted by the focus coordinator before
//! delivery.

use tracing::trace;

use weft_core::event::{Event, KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use weft_core::geometry::Point;

use crate::arena::WidgetArena;
use crate::context::Context;
use crate::widget::{FocusPolicy, OverlayMode, WidgetId};

/// Route one decoded event. Returns `true` when a widget consumed it.
pub fn dispatch_event(arena: &mut WidgetArena, ctx: &mut Context, event: &Event) -> bool {
    match event {
        Event::Mouse(ev) => dispatch_mouse(arena, ctx, ev),
        Event::Key(ev) => dispatch_key(arena, ctx, ev),
        Event::Paste(ev) => dispatch_paste(arena, ctx, &ev.text),
        // Resize and raw events are the runtime's business.
        Event::Resize { .. } | Event::Raw(_) => false,
    }
}

/// Route a mouse event (root coordinates).
pub fn dispatch_mouse(arena: &mut WidgetArena, ctx: &mut Context, ev: &MouseEvent) -> bool {
    let mut queue = Vec::new();

    // Grabbed gestures bypass picking entirely.
    if let Some(grabber) = ctx.mouse_grab() {
        if matches!(
            ev.kind,
            MouseEventKind::Drag | MouseEventKind::Release | MouseEventKind::Move
        ) {
            let origin = arena.absolute_pos(grabber);
            let local = ev.translated(-origin.x, -origin.y);
            let consumed = deliver_mouse(arena, ctx, &mut queue, grabber, &local);
            if ev.kind == MouseEventKind::Release {
                ctx.set_mouse_grab(None);
            }
            ctx.apply_commands(arena, queue);
            return consumed;
        }
    }

    // Modal overlays narrow the pick root.
    let (pick_root, root_origin) = match ctx.top_overlay() {
        Some((overlay, mode)) => {
            let rect = arena.absolute_rect(overlay);
            if !rect.contains(ev.x, ev.y) {
                match mode {
                    OverlayMode::Modal => return true,
                    OverlayMode::Popup => {
                        if ev.kind == MouseEventKind::Press {
                            ctx.close_overlay(arena);
                        }
                        return true;
                    }
                }
            }
            (overlay, rect.pos())
        }
        None => (arena.root(), Point::new(0, 0)),
    };

    // Walk down, picking the last visible child containing the point.
    let mut chain: Vec<(WidgetId, Point)> = Vec::new();
    let mut id = pick_root;
    let mut local = Point::new(ev.x - root_origin.x, ev.y - root_origin.y);
    loop {
        chain.push((id, local));
        if arena.core(id).is_some_and(|c| !c.is_enabled()) {
            // Disabled subtrees intercept all input at their top.
            break;
        }
        let next = arena
            .children(id)
            .iter()
            .rev()
            .copied()
            .find(|&child| {
                arena
                    .core(child)
                    .is_some_and(|c| c.is_visible() && c.geometry().contains(local.x, local.y))
            });
        match next {
            Some(child) => {
                let geom = arena.core(child).expect("picked child alive").geometry();
                local = Point::new(local.x - geom.x, local.y - geom.y);
                id = child;
            }
            None => break,
        }
    }

    // Deliver leaf-first, bubbling up until consumed.
    let mut consumed = false;
    for &(id, local) in chain.iter().rev() {
        if arena.core(id).is_some_and(|c| !c.is_enabled()) {
            // Swallowed: disabled widgets still paint but eat input.
            consumed = true;
            break;
        }
        let local_ev = ev.translated(local.x - ev.x, local.y - ev.y);
        if deliver_mouse(arena, ctx, &mut queue, id, &local_ev) {
            if ev.kind == MouseEventKind::Press {
                ctx.set_mouse_grab(Some(id));
                let takes_click_focus = arena
                    .core(id)
                    .is_some_and(|c| c.focus_policy().contains(FocusPolicy::CLICK));
                if takes_click_focus {
                    ctx.set_focus(arena, Some(id));
                }
            }
            consumed = true;
            break;
        }
    }

    trace!(?consumed, kind = ?ev.kind, x = ev.x, y = ev.y, "mouse dispatched");
    ctx.apply_commands(arena, queue);
    consumed
}

fn deliver_mouse(
    arena: &mut WidgetArena,
    ctx: &mut Context,
    queue: &mut Vec<crate::widget::UiCommand>,
    id: WidgetId,
    local_ev: &MouseEvent,
) -> bool {
    // Plain motion only reaches widgets that asked for it.
    if local_ev.kind == MouseEventKind::Move
        && !arena.core(id).is_some_and(|c| c.mouse_tracking())
    {
        return false;
    }
    arena
        .with_handler(id, &mut ctx.clipboard, queue, |widget, ectx| {
            match local_ev.kind {
                MouseEventKind::Press => {
                    if local_ev.tap >= 2 {
                        widget.mouse_double_click(local_ev, ectx)
                            || widget.mouse_press(local_ev, ectx)
                    } else {
                        widget.mouse_press(local_ev, ectx)
                    }
                }
                MouseEventKind::Release => widget.mouse_release(local_ev, ectx),
                MouseEventKind::Drag => widget.mouse_drag(local_ev, ectx),
                MouseEventKind::Move => widget.mouse_move(local_ev, ectx),
                MouseEventKind::WheelUp
                | MouseEventKind::WheelDown
                | MouseEventKind::WheelLeft
                | MouseEventKind::WheelRight => widget.wheel(local_ev, ectx),
            }
        })
        .unwrap_or(false)
}

/// Route a key event: Tab traversal first, then the focused chain.
pub fn dispatch_key(arena: &mut WidgetArena, ctx: &mut Context, ev: &KeyEvent) -> bool {
    match ev.code {
        KeyCode::Tab => {
            ctx.focus_next(arena);
            return true;
        }
        KeyCode::BackTab => {
            ctx.focus_prev(arena);
            return true;
        }
        _ => {}
    }
    let mut queue = Vec::new();
    let mut consumed = false;
    let mut target = ctx.focused();
    while let Some(id) = target {
        if arena.core(id).is_some_and(|c| !c.is_enabled()) {
            consumed = true;
            break;
        }
        let handled = arena
            .with_handler(id, &mut ctx.clipboard, &mut queue, |widget, ectx| {
                widget.key_event(ev, ectx)
            })
            .unwrap_or(false);
        if handled {
            consumed = true;
            break;
        }
        target = arena.parent(id);
    }
    ctx.apply_commands(arena, queue);
    consumed
}

/// Route a paste to the focused chain.
pub fn dispatch_paste(arena: &mut WidgetArena, ctx: &mut Context, text: &str) -> bool {
    let mut queue = Vec::new();
    let mut consumed = false;
    let mut target = ctx.focused();
    while let Some(id) = target {
        let handled = arena
            .with_handler(id, &mut ctx.clipboard, &mut queue, |widget, ectx| {
                widget.paste_event(text, ectx)
            })
            .unwrap_or(false);
        if handled {
            consumed = true;
            break;
        }
        target = arena.parent(id);
    }
    ctx.apply_commands(arena, queue);
    consumed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::WidgetArena;
    use crate::basic::Container;
    use crate::widget::{EventCtx, Widget, WidgetCore};
    use std::any::Any;
    use std::cell::RefCell;
    use std::rc::Rc;
    use weft_canvas::Canvas;
    use weft_core::event::MouseButton;
    use weft_core::geometry::{Rect, Size};

    /// Records calls; consumes according to flags.
    struct Probe {
        log: Rc<RefCell<Vec<String>>>,
        name: &'static str,
        consume_press: bool,
        consume_key: bool,
    }

    impl Probe {
        fn new(log: &Rc<RefCell<Vec<String>>>, name: &'static str, consume: bool) -> Self {
            Self {
                log: log.clone(),
                name,
                consume_press: consume,
                consume_key: consume,
            }
        }
    }

    impl Widget for Probe {
        fn paint(&mut self, _canvas: &mut Canvas, _core: &WidgetCore) {}

        fn mouse_press(&mut self, ev: &MouseEvent, _ctx: &mut EventCtx) -> bool {
            self.log
                .borrow_mut()
                .push(format!("{}:press@{},{}", self.name, ev.x, ev.y));
            self.consume_press
        }

        fn mouse_drag(&mut self, _ev: &MouseEvent, _ctx: &mut EventCtx) -> bool {
            self.log.borrow_mut().push(format!("{}:drag", self.name));
            true
        }

        fn mouse_release(&mut self, _ev: &MouseEvent, _ctx: &mut EventCtx) -> bool {
            self.log.borrow_mut().push(format!("{}:release", self.name));
            true
        }

        fn key_event(&mut self, _ev: &KeyEvent, _ctx: &mut EventCtx) -> bool {
            self.log.borrow_mut().push(format!("{}:key", self.name));
            self.consume_key
        }

        fn as_any(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn press_at(x: i32, y: i32) -> MouseEvent {
        MouseEvent::new(x, y, MouseButton::Left, MouseEventKind::Press)
    }

    #[test]
    fn leaf_receives_local_coordinates() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 20));
        let mut ctx = Context::new();
        let root = arena.root();
        let outer = arena.insert_child(root, Box::new(Probe::new(&log, "outer", false)));
        arena.set_geometry(outer, Rect::new(5, 5, 20, 10));
        let inner = arena.insert_child(outer, Box::new(Probe::new(&log, "inner", true)));
        arena.set_geometry(inner, Rect::new(2, 2, 5, 5));

        assert!(dispatch_mouse(&mut arena, &mut ctx, &press_at(8, 9)));
        assert_eq!(log.borrow()[0], "inner:press@1,2");
    }

    #[test]
    fn unconsumed_press_bubbles_to_parent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 20));
        let mut ctx = Context::new();
        let root = arena.root();
        let outer = arena.insert_child(root, Box::new(Probe::new(&log, "outer", true)));
        arena.set_geometry(outer, Rect::new(0, 0, 20, 10));
        let inner = arena.insert_child(outer, Box::new(Probe::new(&log, "inner", false)));
        arena.set_geometry(inner, Rect::new(0, 0, 5, 5));

        assert!(dispatch_mouse(&mut arena, &mut ctx, &press_at(2, 2)));
        assert_eq!(
            *log.borrow(),
            vec!["inner:press@2,2", "outer:press@2,2"]
        );
    }

    #[test]
    fn last_child_wins_overlapping_hit() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 20));
        let mut ctx = Context::new();
        let root = arena.root();
        let below = arena.insert_child(root, Box::new(Probe::new(&log, "below", true)));
        arena.set_geometry(below, Rect::new(0, 0, 10, 10));
        let above = arena.insert_child(root, Box::new(Probe::new(&log, "above", true)));
        arena.set_geometry(above, Rect::new(0, 0, 10, 10));

        dispatch_mouse(&mut arena, &mut ctx, &press_at(3, 3));
        assert_eq!(log.borrow()[0], "above:press@3,3");
    }

    #[test]
    fn consumed_press_grabs_gesture() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 20));
        let mut ctx = Context::new();
        let root = arena.root();
        let target = arena.insert_child(root, Box::new(Probe::new(&log, "t", true)));
        arena.set_geometry(target, Rect::new(0, 0, 5, 5));

        dispatch_mouse(&mut arena, &mut ctx, &press_at(1, 1));
        assert_eq!(ctx.mouse_grab(), Some(target));

        // Drag far outside still reaches the grabber.
        let drag = MouseEvent::new(30, 15, MouseButton::Left, MouseEventKind::Drag);
        dispatch_mouse(&mut arena, &mut ctx, &drag);
        let release = MouseEvent::new(30, 15, MouseButton::Left, MouseEventKind::Release);
        dispatch_mouse(&mut arena, &mut ctx, &release);
        assert_eq!(ctx.mouse_grab(), None);
        assert_eq!(*log.borrow(), vec!["t:press@1,1", "t:drag", "t:release"]);
    }

    #[test]
    fn widget_that_declines_press_gets_no_gesture() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 20));
        let mut ctx = Context::new();
        let root = arena.root();
        let target = arena.insert_child(root, Box::new(Probe::new(&log, "t", false)));
        arena.set_geometry(target, Rect::new(0, 0, 5, 5));

        dispatch_mouse(&mut arena, &mut ctx, &press_at(1, 1));
        assert_eq!(ctx.mouse_grab(), None);
        let drag = MouseEvent::new(1, 1, MouseButton::Left, MouseEventKind::Drag);
        dispatch_mouse(&mut arena, &mut ctx, &drag);
        // Press was seen (and declined); no drag followed.
        assert_eq!(*log.borrow(), vec!["t:press@1,1"]);
    }

    #[test]
    fn disabled_widget_swallows_input() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 20));
        let mut ctx = Context::new();
        let root = arena.root();
        let target = arena.insert_child(root, Box::new(Probe::new(&log, "t", true)));
        arena.set_geometry(target, Rect::new(0, 0, 5, 5));
        arena.core_mut(target).unwrap().set_enabled(false);

        assert!(dispatch_mouse(&mut arena, &mut ctx, &press_at(1, 1)));
        assert!(log.borrow().is_empty(), "handler never ran");
    }

    #[test]
    fn key_goes_to_focused_and_bubbles() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 20));
        let mut ctx = Context::new();
        let root = arena.root();
        let parent = arena.insert_child(root, Box::new(Probe::new(&log, "parent", true)));
        let child = arena.insert_child(parent, Box::new(Probe::new(&log, "child", false)));
        ctx.set_focus(&mut arena, Some(child));

        assert!(dispatch_key(
            &mut arena,
            &mut ctx,
            &KeyEvent::text("x")
        ));
        assert_eq!(*log.borrow(), vec!["child:key", "parent:key"]);
    }

    #[test]
    fn tab_is_intercepted_before_delivery() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 20));
        let mut ctx = Context::new();
        let root = arena.root();
        let w = arena.insert_child(root, Box::new(Probe::new(&log, "w", true)));
        arena
            .core_mut(w)
            .unwrap()
            .set_focus_policy(FocusPolicy::TAB);
        ctx.set_focus(&mut arena, Some(w));

        dispatch_key(&mut arena, &mut ctx, &KeyEvent::new(KeyCode::Tab));
        assert!(log.borrow().is_empty(), "widget never saw the Tab");
    }

    #[test]
    fn modal_overlay_swallows_outside_clicks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 20));
        let mut ctx = Context::new();
        let root = arena.root();
        let behind = arena.insert_child(root, Box::new(Probe::new(&log, "behind", true)));
        arena.set_geometry(behind, Rect::new(0, 0, 40, 20));
        let overlay = arena.insert_child(root, Box::new(Probe::new(&log, "overlay", true)));
        arena.set_geometry(overlay, Rect::new(10, 5, 10, 5));
        ctx.open_overlay(&arena, overlay, OverlayMode::Modal);

        assert!(dispatch_mouse(&mut arena, &mut ctx, &press_at(1, 1)));
        assert!(log.borrow().is_empty(), "outside click swallowed");

        dispatch_mouse(&mut arena, &mut ctx, &press_at(12, 6));
        assert_eq!(log.borrow()[0], "overlay:press@2,1");
    }

    #[test]
    fn popup_overlay_closes_on_outside_click() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = WidgetArena::new(Box::new(Container::new()), Size::new(40, 20));
        let mut ctx = Context::new();
        let root = arena.root();
        let overlay = arena.insert_child(root, Box::new(Probe::new(&log, "overlay", true)));
        arena.set_geometry(overlay, Rect::new(10, 5, 10, 5));
        ctx.open_overlay(&arena, overlay, OverlayMode::Popup);

        dispatch_mouse(&mut arena, &mut ctx, &press_at(1, 1));
        assert!(ctx.top_overlay().is_none(), "overlay closed");
    }
}
