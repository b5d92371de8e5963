#![forbid(unsafe_code)]

//! Tree core: tree items in a slotmap arena plus the scrollable tree
//! view with expansion, sorting, drag-and-drop, and glob filtering.
//!
//! The view keeps a flat cache of `(item, level)` entries over the
//! visible (expanded, unfiltered) items, rebuilt on expand/collapse,
//! data change, sort, and filter changes. Painting and hit testing
//! walk the cache, never the tree.

use bitflags::bitflags;
use regex::Regex;
use slotmap::{new_key_type, SlotMap};
use tracing::warn;

use weft_canvas::Canvas;
use weft_core::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use weft_core::geometry::{Point, Size};
use weft_signal::Signal;
use weft_style::Color;
use weft_text::{Alignment, RichText};

use crate::scroll::{ScrollContainer, Viewport};
use crate::table::model::{CellValue, SortOrder};
use crate::widget::{EventCtx, WidgetCore};

new_key_type! {
    /// Arena key of a tree item.
    pub struct TreeItemId;
}

bitflags! {
    /// Drag-and-drop capabilities of a tree.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DndMode: u8 {
        /// Items may be dragged.
        const ALLOW_DRAG = 0b01;
        /// Items accept drops.
        const ALLOW_DROP = 0b10;
    }
}

/// When an item draws its expand indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildIndicatorPolicy {
    /// Indicator only when children exist.
    #[default]
    WhenChildren,
    /// Always draw the indicator.
    Always,
    /// Never draw the indicator.
    Never,
}

/// Where a drop lands relative to its target item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    /// Upper third: insert before the target.
    Before,
    /// Lower third: insert after the target.
    After,
    /// Middle: append as the target's child.
    Into,
}

impl DropPosition {
    /// Classify a drop from its fractional position within the target
    /// row (0 = top edge, 1 = bottom edge).
    #[must_use]
    pub fn from_fraction(frac: f32) -> Self {
        if frac < 1.0 / 3.0 {
            Self::Before
        } else if frac > 2.0 / 3.0 {
            Self::After
        } else {
            Self::Into
        }
    }
}

/// One tree item's data.
#[derive(Debug, Clone, Default)]
pub struct TreeItem {
    /// Per-column cell text.
    pub data: Vec<RichText>,
    /// Per-column alignment (missing columns default to left).
    pub alignment: Vec<Alignment>,
    /// Expanded flag.
    pub expanded: bool,
    /// Selected flag.
    pub selected: bool,
    /// Hidden flag (also driven by filtering).
    pub hidden: bool,
    /// Indicator policy.
    pub indicator: ChildIndicatorPolicy,
    /// Optional per-column sort keys overriding the display text.
    pub sort_data: Vec<Option<CellValue>>,
}

impl TreeItem {
    /// Create an item from per-column labels.
    #[must_use]
    pub fn new(labels: impl IntoIterator<Item = impl Into<RichText>>) -> Self {
        Self {
            data: labels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Column text (empty for missing columns).
    #[must_use]
    pub fn text(&self, col: usize) -> RichText {
        self.data.get(col).cloned().unwrap_or_default()
    }

    /// The sort key for a column: the override when present, the plain
    /// text otherwise.
    #[must_use]
    pub fn sort_key(&self, col: usize) -> CellValue {
        match self.sort_data.get(col).and_then(Clone::clone) {
            Some(v) => v,
            None => CellValue::Text(self.text(col).to_plain()),
        }
    }
}

struct TreeNode {
    item: TreeItem,
    parent: Option<TreeItemId>,
    children: Vec<TreeItemId>,
    /// Set by filtering: neither this item nor a descendant matched.
    filtered_out: bool,
}

/// One flat-cache entry: a visible item and its indentation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// The item.
    pub id: TreeItemId,
    /// Depth below the top level.
    pub level: usize,
}

/// A tree widget: the view wrapped in its scroll area.
pub type Tree = ScrollContainer<TreeWidget>;

/// Build a tree with the given header labels.
#[must_use]
pub fn tree(header: Vec<RichText>) -> Tree {
    ScrollContainer::new(TreeWidget::new(header))
}

/// Default column width.
const DEFAULT_COL_WIDTH: i32 = 20;

/// Column separators never drag left of `(index + 1) * 4`.
const MIN_COL_STRIDE: i32 = 4;

/// The scrollable tree viewport.
pub struct TreeWidget {
    nodes: SlotMap<TreeItemId, TreeNode>,
    /// Hidden root holding the top-level items.
    root: TreeItemId,
    header: Vec<RichText>,
    /// Column separator positions.
    col_edges: Vec<i32>,
    cache: Vec<CacheEntry>,
    cache_dirty: bool,
    selected: Option<TreeItemId>,
    sort_col: i32,
    sort_order: SortOrder,
    dnd: DndMode,
    /// Item picked up by an in-progress drag gesture.
    drag_item: Option<TreeItemId>,
    drag_moved: bool,
    sep_grab: Option<usize>,
    filter: Option<Regex>,
    last_offset: Point,
    style_line: Color,
    style_header: Color,
    style_selected: Color,
    /// Emitted when an item expands.
    pub item_expanded: Signal<TreeItemId>,
    /// Emitted when an item collapses.
    pub item_collapsed: Signal<TreeItemId>,
    /// Emitted on item click with the column index.
    pub item_clicked: Signal<(TreeItemId, i32)>,
}

impl TreeWidget {
    /// Create an empty tree with header labels.
    #[must_use]
    pub fn new(header: Vec<RichText>) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(TreeNode {
            item: TreeItem::default(),
            parent: None,
            children: Vec::new(),
            filtered_out: false,
        });
        let cols = header.len().max(1);
        Self {
            nodes,
            root,
            header,
            col_edges: (0..cols)
                .map(|c| (c as i32 + 1) * (DEFAULT_COL_WIDTH + 1) - 1)
                .collect(),
            cache: Vec::new(),
            cache_dirty: true,
            selected: None,
            sort_col: -1,
            sort_order: SortOrder::Ascending,
            dnd: DndMode::empty(),
            drag_item: None,
            drag_moved: false,
            sep_grab: None,
            filter: None,
            last_offset: Point::new(0, 0),
            style_line: Color::fg("bright black"),
            style_header: Color::fgbg("#dddddd", "#444444").bold(),
            style_selected: Color::bg("#004488"),
            item_expanded: Signal::new(),
            item_collapsed: Signal::new(),
            item_clicked: Signal::new(),
        }
    }

    /// Set the drag-and-drop mode.
    pub fn set_dnd_mode(&mut self, mode: DndMode) {
        self.dnd = mode;
    }

    /// The drag-and-drop mode.
    #[must_use]
    pub const fn dnd_mode(&self) -> DndMode {
        self.dnd
    }

    // --- item management --------------------------------------------

    /// Append a top-level item; returns its id.
    pub fn add_top_level_item(&mut self, item: TreeItem) -> TreeItemId {
        self.add_child(self.root, item)
    }

    /// Append a child item; returns its id.
    pub fn add_child(&mut self, parent: TreeItemId, item: TreeItem) -> TreeItemId {
        let id = self.nodes.insert(TreeNode {
            item,
            parent: Some(parent),
            children: Vec::new(),
            filtered_out: false,
        });
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(id);
        }
        self.invalidate_cache();
        id
    }

    /// Remove an item and its subtree.
    pub fn remove_item(&mut self, id: TreeItemId) {
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
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.invalidate_cache();
    }

    /// Item data access.
    #[must_use]
    pub fn item(&self, id: TreeItemId) -> Option<&TreeItem> {
        self.nodes.get(id).map(|n| &n.item)
    }

    /// Mutate an item's data, invalidating the cache.
    pub fn item_mut(&mut self, id: TreeItemId) -> Option<&mut TreeItem> {
        self.invalidate_cache();
        self.nodes.get_mut(id).map(|n| &mut n.item)
    }

    /// Top-level item ids.
    #[must_use]
    pub fn top_level_items(&self) -> &[TreeItemId] {
        self.nodes
            .get(self.root)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Child ids of an item.
    #[must_use]
    pub fn children(&self, id: TreeItemId) -> &[TreeItemId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Parent of an item (`None` for top-level items).
    #[must_use]
    pub fn parent(&self, id: TreeItemId) -> Option<TreeItemId> {
        self.nodes.get(id).and_then(|n| n.parent).filter(|&p| p != self.root)
    }

    /// Subtree size: 1 plus the children's sizes when expanded, else 1.
    #[must_use]
    pub fn size(&self, id: TreeItemId) -> usize {
        let Some(node) = self.nodes.get(id) else { return 0 };
        if node.item.expanded {
            1 + node
                .children
                .iter()
                .map(|&c| self.size(c))
                .sum::<usize>()
        } else {
            1
        }
    }

    /// The currently selected item.
    #[must_use]
    pub const fn selected_item(&self) -> Option<TreeItemId> {
        self.selected
    }

    /// Select an item, deselecting the previous one.
    pub fn select(&mut self, id: TreeItemId) {
        if let Some(old) = self.selected.take() {
            if let Some(node) = self.nodes.get_mut(old) {
                node.item.selected = false;
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.item.selected = true;
            self.selected = Some(id);
        }
    }

    /// Expand or collapse an item.
    pub fn set_expanded(&mut self, id: TreeItemId, expanded: bool) {
        let Some(node) = self.nodes.get_mut(id) else { return };
        if node.item.expanded == expanded {
            return;
        }
        node.item.expanded = expanded;
        self.invalidate_cache();
        if expanded {
            self.item_expanded.emit(&id);
        } else {
            self.item_collapsed.emit(&id);
        }
    }

    /// Expand every item.
    pub fn expand_all(&mut self) {
        let ids: Vec<TreeItemId> = self.nodes.keys().collect();
        for id in ids {
            if id != self.root {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.item.expanded = true;
                }
            }
        }
        self.invalidate_cache();
    }

    /// Collapse every item.
    pub fn collapse_all(&mut self) {
        let ids: Vec<TreeItemId> = self.nodes.keys().collect();
        for id in ids {
            if id != self.root {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.item.expanded = false;
                }
            }
        }
        self.invalidate_cache();
    }

    // --- flat cache -------------------------------------------------

    fn invalidate_cache(&mut self) {
        self.cache_dirty = true;
    }

    fn refresh_cache(&mut self) {
        if !self.cache_dirty {
            return;
        }
        let mut cache = Vec::new();
        let mut stack: Vec<(TreeItemId, usize)> = self
            .nodes
            .get(self.root)
            .map(|n| n.children.iter().rev().map(|&c| (c, 0)).collect())
            .unwrap_or_default();
        while let Some((id, level)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else { continue };
            if node.item.hidden || node.filtered_out {
                continue;
            }
            cache.push(CacheEntry { id, level });
            if node.item.expanded {
                for &child in node.children.iter().rev() {
                    stack.push((child, level + 1));
                }
            }
        }
        self.cache = cache;
        self.cache_dirty = false;
    }

    /// The flat cache of visible entries (refreshed on demand).
    pub fn cache(&mut self) -> &[CacheEntry] {
        self.refresh_cache();
        &self.cache
    }

    /// Number of visible entries.
    pub fn visible_count(&mut self) -> usize {
        self.cache().len()
    }

    // --- sorting ----------------------------------------------------

    /// Recursively stable-sort every level by a column.
    pub fn sort_items(&mut self, col: i32, order: SortOrder) {
        self.sort_col = col;
        self.sort_order = order;
        if col < 0 {
            return;
        }
        self.sort_children_of(self.root, col as usize, order);
        self.invalidate_cache();
    }

    fn sort_children_of(&mut self, id: TreeItemId, col: usize, order: SortOrder) {
        let Some(node) = self.nodes.get(id) else { return };
        let mut children = node.children.clone();
        children.sort_by(|&a, &b| {
            let ka = self.nodes.get(a).map(|n| n.item.sort_key(col));
            let kb = self.nodes.get(b).map(|n| n.item.sort_key(col));
            let ord = match (ka, kb) {
                (Some(a), Some(b)) => a.compare(&b),
                _ => std::cmp::Ordering::Equal,
            };
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        if let Some(node) = self.nodes.get_mut(id) {
            node.children = children.clone();
        }
        for child in children {
            self.sort_children_of(child, col, order);
        }
    }

    // --- drag and drop ----------------------------------------------

    /// Whether `ancestor` is `item` or one of its ancestors.
    fn is_in_subtree(&self, ancestor: TreeItemId, item: TreeItemId) -> bool {
        let mut cur = Some(item);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Drop `item` relative to `target`. Rejects drops that would
    /// create a cycle. Returns `true` when the tree changed.
    pub fn drop_item(
        &mut self,
        item: TreeItemId,
        target: TreeItemId,
        position: DropPosition,
    ) -> bool {
        if item == target || self.is_in_subtree(item, target) {
            warn!("rejected drop: would create a cycle");
            return false;
        }
        if !self.nodes.contains_key(item) || !self.nodes.contains_key(target) {
            return false;
        }
        // Detach.
        let old_parent = self.nodes.get(item).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(node) = self.nodes.get_mut(p) {
                node.children.retain(|&c| c != item);
            }
        }
        match position {
            DropPosition::Into => {
                if let Some(node) = self.nodes.get_mut(target) {
                    node.children.push(item);
                }
                if let Some(node) = self.nodes.get_mut(item) {
                    node.parent = Some(target);
                }
            }
            DropPosition::Before | DropPosition::After => {
                let parent = self
                    .nodes
                    .get(target)
                    .and_then(|n| n.parent)
                    .unwrap_or(self.root);
                let mut index = self
                    .nodes
                    .get(parent)
                    .and_then(|n| n.children.iter().position(|&c| c == target))
                    .unwrap_or(0);
                if position == DropPosition::After {
                    index += 1;
                }
                if let Some(node) = self.nodes.get_mut(parent) {
                    node.children.insert(index, item);
                }
                if let Some(node) = self.nodes.get_mut(item) {
                    node.parent = Some(parent);
                }
            }
        }
        self.invalidate_cache();
        true
    }

    // --- filtering --------------------------------------------------

    /// Compile a glob into a filter; items that neither match nor have
    /// a matching descendant are hidden.
    ///
    /// A glob that fails to compile returns the error and hides all
    /// children.
    pub fn set_filter(&mut self, glob: &str) -> Result<(), regex::Error> {
        if glob.is_empty() {
            self.filter = None;
            self.apply_filter();
            return Ok(());
        }
        match Regex::new(&glob_to_regex(glob)) {
            Ok(re) => {
                self.filter = Some(re);
                self.apply_filter();
                Ok(())
            }
            Err(err) => {
                warn!(%glob, "filter failed to compile; hiding all children");
                self.filter = None;
                let ids: Vec<TreeItemId> = self.nodes.keys().filter(|&k| k != self.root).collect();
                for id in ids {
                    if let Some(node) = self.nodes.get_mut(id) {
                        node.filtered_out = true;
                    }
                }
                self.invalidate_cache();
                Err(err)
            }
        }
    }

    fn apply_filter(&mut self) {
        let children = self.top_level_items().to_vec();
        for id in children {
            self.apply_filter_to(id);
        }
        self.invalidate_cache();
    }

    /// Returns whether the subtree rooted at `id` contains a match.
    fn apply_filter_to(&mut self, id: TreeItemId) -> bool {
        let self_match = match (&self.filter, self.nodes.get(id)) {
            (Some(re), Some(node)) => re.is_match(&node.item.text(0).to_plain()),
            (None, _) => true,
            _ => false,
        };
        let children = self.children(id).to_vec();
        let mut child_match = false;
        for child in children {
            child_match |= self.apply_filter_to(child);
        }
        let keep = self_match || child_match;
        if let Some(node) = self.nodes.get_mut(id) {
            node.filtered_out = !keep;
        }
        keep
    }

    // --- interaction ------------------------------------------------

    fn indicator_for(&self, id: TreeItemId) -> &'static str {
        let Some(node) = self.nodes.get(id) else { return " • " };
        let show = match node.item.indicator {
            ChildIndicatorPolicy::Always => true,
            ChildIndicatorPolicy::Never => false,
            ChildIndicatorPolicy::WhenChildren => !node.children.is_empty(),
        };
        if !show {
            " • "
        } else if node.item.expanded {
            " ▼ "
        } else {
            " ▶ "
        }
    }

    fn handle_press(&mut self, ev: &MouseEvent, offset: Point, ctx: &mut EventCtx) -> bool {
        let x = ev.x + offset.x;
        self.sep_grab = None;
        self.refresh_cache();

        // Header row.
        if ev.y == 0 {
            for (i, &edge) in self.col_edges.iter().enumerate() {
                if x == edge {
                    self.sep_grab = Some(i);
                    ctx.update();
                    return true;
                }
                if x < edge {
                    let order = if self.sort_col == i as i32 {
                        self.sort_order.toggled()
                    } else {
                        SortOrder::Ascending
                    };
                    self.sort_items(i as i32, order);
                    ctx.update();
                    return true;
                }
            }
            return true;
        }

        let row = ev.y + offset.y - 1;
        if row < 0 || row as usize >= self.cache.len() {
            return false;
        }
        let entry = self.cache[row as usize];
        let level = entry.level as i32;
        let has_indicator = self
            .nodes
            .get(entry.id)
            .is_some_and(|n| match n.item.indicator {
                ChildIndicatorPolicy::Always => true,
                ChildIndicatorPolicy::Never => false,
                ChildIndicatorPolicy::WhenChildren => !n.children.is_empty(),
            });

        if (level * 2..level * 2 + 3).contains(&x) && has_indicator {
            let expanded = self.nodes.get(entry.id).is_some_and(|n| n.item.expanded);
            self.set_expanded(entry.id, !expanded);
        } else {
            self.select(entry.id);
            if self.dnd.contains(DndMode::ALLOW_DRAG) {
                self.drag_item = Some(entry.id);
                self.drag_moved = false;
            }
        }
        let col = self
            .col_edges
            .iter()
            .position(|&e| x < e)
            .map(|c| c as i32)
            .unwrap_or(-1);
        self.item_clicked.emit(&(entry.id, col));
        ctx.update();
        true
    }

    fn handle_drag(&mut self, ev: &MouseEvent, offset: Point, ctx: &mut EventCtx) -> bool {
        if let Some(sep) = self.sep_grab {
            let x = ev.x + offset.x;
            let pos = x.max((sep as i32 + 1) * MIN_COL_STRIDE);
            let diff = pos - self.col_edges[sep];
            // Push earlier separators left if squeezed.
            for i in 0..sep {
                let limit = pos - (sep as i32 - i as i32) * MIN_COL_STRIDE;
                self.col_edges[i] = self.col_edges[i].min(limit);
            }
            for edge in self.col_edges.iter_mut().skip(sep) {
                *edge += diff;
            }
            ctx.update();
            return true;
        }
        if self.drag_item.is_some() {
            self.drag_moved = true;
            return true;
        }
        false
    }

    fn handle_release(&mut self, ev: &MouseEvent, offset: Point, ctx: &mut EventCtx) -> bool {
        self.sep_grab = None;
        let Some(item) = self.drag_item.take() else {
            return false;
        };
        if !self.drag_moved || !self.dnd.contains(DndMode::ALLOW_DROP) {
            return true;
        }
        self.refresh_cache();
        let row = ev.y + offset.y - 1;
        if row < 0 || row as usize >= self.cache.len() {
            return true;
        }
        let target = self.cache[row as usize].id;
        // Rows are one cell tall: the pointer sits at the row's middle.
        let position = DropPosition::from_fraction(0.5);
        if self.drop_item(item, target, position) {
            ctx.update();
        }
        true
    }

    fn full_width(&self) -> i32 {
        self.col_edges.last().copied().unwrap_or(0) + 1
    }
}

impl Viewport for TreeWidget {
    fn full_area_size(&self) -> Size {
        let width = self.full_width();
        // One header row plus the visible entries; the cache may be
        // stale here, so fall back to a conservative count.
        let height = 1 + if self.cache_dirty {
            self.nodes.len() as i32 - 1
        } else {
            self.cache.len() as i32
        };
        Size::new(
            width.clamp(0, i32::from(u16::MAX)) as u16,
            height.clamp(0, i32::from(u16::MAX)) as u16,
        )
    }

    fn paint(&mut self, canvas: &mut Canvas, displayed: Size, offset: Point, core: &WidgetCore) {
        self.refresh_cache();
        self.last_offset = offset;
        let (ox, oy) = (offset.x, offset.y);
        let base = core.current_style().clone();
        let h = i32::from(displayed.height);

        // Entries: one cache row per line, 2·level leading spaces and
        // the indicator glyph before column 0.
        for (row, entry) in self.cache.iter().enumerate() {
            let sy = row as i32 + 1 - oy;
            if sy < 1 {
                continue;
            }
            if sy > h {
                break;
            }
            let Some(node) = self.nodes.get(entry.id) else { continue };
            let selected = node.item.selected;
            let row_color = if selected {
                self.style_selected.clone()
            } else {
                base.mod_at(0, row as i32)
            };
            let indicator = self.indicator_for(entry.id);
            let lead = "  ".repeat(entry.level);

            for col in 0..self.col_edges.len() {
                let (xa, xb) = if col == 0 {
                    (0, self.col_edges[0])
                } else {
                    (self.col_edges[col - 1] + 1, self.col_edges[col])
                };
                let text = if col == 0 {
                    RichText::raw(&lead) + RichText::raw(indicator) + node.item.text(0)
                } else {
                    node.item.text(col)
                };
                let alignment = node
                    .item
                    .alignment
                    .get(col)
                    .copied()
                    .unwrap_or(Alignment::Left);
                canvas.draw_rich_text(
                    Point::new(xa - ox, sy),
                    &text,
                    Some((xb - xa) as usize),
                    alignment,
                    Some(row_color.clone()),
                );
                canvas.draw_char(Point::new(xb - ox, sy), '│', self.style_line.clone());
            }
        }

        // Header row, sticky on top.
        canvas.draw_rich_text(
            Point::new(0, 0),
            &RichText::new(),
            Some(displayed.width as usize),
            Alignment::Left,
            Some(self.style_header.clone()),
        );
        for col in 0..self.col_edges.len() {
            let (xa, xb) = if col == 0 {
                (0, self.col_edges[0])
            } else {
                (self.col_edges[col - 1] + 1, self.col_edges[col])
            };
            let width = (xb - xa) as usize;
            let mut label = self
                .header
                .get(col)
                .cloned()
                .unwrap_or_default()
                .align_ellipsis(width, Alignment::Left);
            if self.sort_col == col as i32 {
                let glyph = match self.sort_order {
                    SortOrder::Ascending => "▲",
                    SortOrder::Descending => "▼",
                };
                label = label.slice(0, width.saturating_sub(1)) + RichText::raw(glyph);
            }
            canvas.draw_rich_text(
                Point::new(xa - ox, 0),
                &label,
                Some(width),
                Alignment::Left,
                Some(self.style_header.clone()),
            );
            canvas.draw_char(Point::new(xb - ox, 0), '│', self.style_header.clone());
        }
    }

    fn mouse(&mut self, ev: &MouseEvent, offset: Point, ctx: &mut EventCtx) -> bool {
        match ev.kind {
            MouseEventKind::Press if ev.button == MouseButton::Left => {
                self.handle_press(ev, offset, ctx)
            }
            MouseEventKind::Drag => self.handle_drag(ev, offset, ctx),
            MouseEventKind::Release => self.handle_release(ev, offset, ctx),
            _ => false,
        }
    }

    fn key(&mut self, ev: &KeyEvent, ctx: &mut EventCtx) -> bool {
        self.refresh_cache();
        let Some(selected) = self.selected else {
            if matches!(ev.code, KeyCode::Up | KeyCode::Down) {
                if let Some(first) = self.cache.first() {
                    let id = first.id;
                    self.select(id);
                    ctx.update();
                    return true;
                }
            }
            return false;
        };
        let index = self.cache.iter().position(|e| e.id == selected);
        match ev.code {
            KeyCode::Up => {
                if let Some(i) = index {
                    if i > 0 {
                        let id = self.cache[i - 1].id;
                        self.select(id);
                    }
                }
            }
            KeyCode::Down => {
                if let Some(i) = index {
                    if i + 1 < self.cache.len() {
                        let id = self.cache[i + 1].id;
                        self.select(id);
                    }
                }
            }
            KeyCode::Right | KeyCode::Enter => {
                let expanded = self.nodes.get(selected).is_some_and(|n| n.item.expanded);
                self.set_expanded(selected, !expanded);
            }
            KeyCode::Left => {
                self.set_expanded(selected, false);
            }
            _ => return false,
        }
        ctx.update();
        true
    }

    fn desired_offset(&self, current: Point, displayed: Size) -> Option<Point> {
        let selected = self.selected?;
        let row = self.cache.iter().position(|e| e.id == selected)? as i32;
        let mut oy = current.y;
        let h = i32::from(displayed.height);
        // Row y in full-area coords is row + 1 (header).
        if row + 2 > oy + h {
            oy = row + 2 - h;
        }
        if row < oy {
            oy = row;
        }
        let target = Point::new(current.x, oy.max(0));
        (target != current).then_some(target)
    }
}

/// Translate a glob pattern into an anchored regex.
///
/// `*` and `?` map to `.*` and `.`; character classes (`[abc]`) pass
/// through, so an unterminated class is a compile error for the
/// caller to surface.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c if regex_syntax_special(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

const fn regex_syntax_special(c: char) -> bool {
    matches!(
        c,
        '.' | '+' | '(' | ')' | '{' | '}' | '^' | '$' | '|' | '\\'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Clipboard, WidgetId};
    use weft_core::geometry::Rect;

    fn labels(tree: &mut TreeWidget) -> Vec<(String, usize)> {
        tree.cache()
            .iter()
            .map(|e| (e.id, e.level))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|(id, level)| (tree.item(id).unwrap().text(0).to_plain(), level))
            .collect()
    }

    fn scenario() -> (TreeWidget, TreeItemId, TreeItemId) {
        let mut tree = TreeWidget::new(vec![RichText::raw("name")]);
        let a = tree.add_top_level_item(TreeItem::new(["A"]));
        let b = tree.add_top_level_item(TreeItem::new(["B"]));
        tree.add_child(b, TreeItem::new(["B1"]));
        tree.add_child(b, TreeItem::new(["B2"]));
        (tree, a, b)
    }

    #[test]
    fn expand_collapse_rebuilds_cache() {
        let (mut tree, _a, b) = scenario();
        assert_eq!(
            labels(&mut tree),
            vec![("A".to_string(), 0), ("B".to_string(), 0)]
        );
        tree.set_expanded(b, true);
        assert_eq!(
            labels(&mut tree),
            vec![
                ("A".to_string(), 0),
                ("B".to_string(), 0),
                ("B1".to_string(), 1),
                ("B2".to_string(), 1),
            ]
        );
        tree.set_expanded(b, false);
        assert_eq!(tree.visible_count(), 2);
    }

    #[test]
    fn size_invariant_matches_cache_when_fully_expanded() {
        let (mut tree, a, b) = scenario();
        tree.expand_all();
        let total: usize = tree
            .top_level_items()
            .to_vec()
            .iter()
            .map(|&id| tree.size(id))
            .sum();
        assert_eq!(total, tree.visible_count());
        assert_eq!(tree.size(a), 1);
        assert_eq!(tree.size(b), 3);
    }

    #[test]
    fn collapsed_size_is_one() {
        let (tree, _a, b) = scenario();
        assert_eq!(tree.size(b), 1);
    }

    #[test]
    fn sort_is_recursive_and_stable() {
        let mut tree = TreeWidget::new(vec![RichText::raw("n")]);
        let b = tree.add_top_level_item(TreeItem::new(["b"]));
        tree.add_top_level_item(TreeItem::new(["a"]));
        tree.add_child(b, TreeItem::new(["z"]));
        tree.add_child(b, TreeItem::new(["y"]));
        tree.expand_all();
        tree.sort_items(0, SortOrder::Ascending);
        assert_eq!(
            labels(&mut tree)
                .into_iter()
                .map(|(l, _)| l)
                .collect::<Vec<_>>(),
            vec!["a", "b", "y", "z"]
        );
        tree.sort_items(0, SortOrder::Descending);
        assert_eq!(
            labels(&mut tree)
                .into_iter()
                .map(|(l, _)| l)
                .collect::<Vec<_>>(),
            vec!["b", "z", "y", "a"]
        );
    }

    #[test]
    fn drop_before_and_after_reorder() {
        let mut tree = TreeWidget::new(vec![RichText::raw("n")]);
        let a = tree.add_top_level_item(TreeItem::new(["a"]));
        let b = tree.add_top_level_item(TreeItem::new(["b"]));
        let c = tree.add_top_level_item(TreeItem::new(["c"]));
        assert!(tree.drop_item(c, a, DropPosition::Before));
        assert_eq!(tree.top_level_items(), &[c, a, b]);
        assert!(tree.drop_item(c, b, DropPosition::After));
        assert_eq!(tree.top_level_items(), &[a, b, c]);
    }

    #[test]
    fn drop_into_reparents_subtree() {
        let (mut tree, a, b) = scenario();
        assert!(tree.drop_item(a, b, DropPosition::Into));
        assert_eq!(tree.parent(a), Some(b));
        assert_eq!(tree.top_level_items(), &[b]);
        // The subtree came along: B now has three children.
        assert_eq!(tree.children(b).len(), 3);
    }

    #[test]
    fn drop_rejects_cycles() {
        let (mut tree, _a, b) = scenario();
        let b1 = tree.children(b)[0];
        assert!(!tree.drop_item(b, b1, DropPosition::Into));
        assert!(!tree.drop_item(b, b, DropPosition::Before));
        assert_eq!(tree.parent(b1), Some(b), "tree unchanged");
    }

    #[test]
    fn drop_position_thirds() {
        assert_eq!(DropPosition::from_fraction(0.1), DropPosition::Before);
        assert_eq!(DropPosition::from_fraction(0.5), DropPosition::Into);
        assert_eq!(DropPosition::from_fraction(0.9), DropPosition::After);
    }

    #[test]
    fn filter_hides_non_matching_without_matching_descendants() {
        let (mut tree, _a, b) = scenario();
        tree.set_expanded(b, true);
        tree.set_filter("B1").unwrap();
        let visible: Vec<String> = labels(&mut tree).into_iter().map(|(l, _)| l).collect();
        // B stays: it has a matching descendant. A goes.
        assert_eq!(visible, vec!["B", "B1"]);
        tree.set_filter("").unwrap();
        assert_eq!(tree.visible_count(), 4);
    }

    #[test]
    fn filter_glob_translation() {
        assert_eq!(glob_to_regex("*.rs"), "^.*\\.rs$");
        assert_eq!(glob_to_regex("a?c"), "^a.c$");
    }

    #[test]
    fn invalid_filter_hides_all_children() {
        // A glob expanding to an invalid regex is hard to produce via
        // translation; drive the error path through a raw class.
        let (mut tree, _a, _b) = scenario();
        let result = tree.set_filter("[");
        assert!(result.is_err());
        assert_eq!(tree.visible_count(), 0);
    }

    #[test]
    fn mouse_press_on_indicator_toggles_expansion() {
        let (mut tree, _a, b) = scenario();
        let mut core = WidgetCore::new();
        core.set_geometry_raw(Rect::new(0, 0, 40, 10));
        let mut clipboard = Clipboard::default();
        let mut queue = Vec::new();
        let mut ctx = EventCtx {
            id: WidgetId::default(),
            core: &mut core,
            clipboard: &mut clipboard,
            queue: &mut queue,
        };
        // Row 2 (after header) is item B at level 0; x=1 hits the
        // indicator zone [0, 3).
        let ev = MouseEvent::new(1, 2, MouseButton::Left, MouseEventKind::Press);
        assert!(tree.mouse(&ev, Point::new(0, 0), &mut ctx));
        assert!(tree.item(b).unwrap().expanded);
        // Clicking the label selects instead.
        let ev = MouseEvent::new(6, 2, MouseButton::Left, MouseEventKind::Press);
        tree.mouse(&ev, Point::new(0, 0), &mut ctx);
        assert_eq!(tree.selected_item(), Some(b));
    }

    #[test]
    fn header_click_sorts() {
        let mut tree = TreeWidget::new(vec![RichText::raw("n")]);
        tree.add_top_level_item(TreeItem::new(["b"]));
        tree.add_top_level_item(TreeItem::new(["a"]));
        let mut core = WidgetCore::new();
        core.set_geometry_raw(Rect::new(0, 0, 40, 10));
        let mut clipboard = Clipboard::default();
        let mut queue = Vec::new();
        let mut ctx = EventCtx {
            id: WidgetId::default(),
            core: &mut core,
            clipboard: &mut clipboard,
            queue: &mut queue,
        };
        let ev = MouseEvent::new(2, 0, MouseButton::Left, MouseEventKind::Press);
        tree.mouse(&ev, Point::new(0, 0), &mut ctx);
        let first: Vec<String> = labels(&mut tree).into_iter().map(|(l, _)| l).collect();
        assert_eq!(first, vec!["a", "b"]);
    }

    #[test]
    fn drag_release_moves_item_under_pointer() {
        let mut tree = TreeWidget::new(vec![RichText::raw("n")]);
        let a = tree.add_top_level_item(TreeItem::new(["a"]));
        let b = tree.add_top_level_item(TreeItem::new(["b"]));
        tree.set_dnd_mode(DndMode::ALLOW_DRAG | DndMode::ALLOW_DROP);

        let mut core = WidgetCore::new();
        core.set_geometry_raw(Rect::new(0, 0, 40, 10));
        let mut clipboard = Clipboard::default();
        let mut queue = Vec::new();
        let mut ctx = EventCtx {
            id: WidgetId::default(),
            core: &mut core,
            clipboard: &mut clipboard,
            queue: &mut queue,
        };
        // Press item a's label (row 1), drag to row 2 (item b), release.
        let press = MouseEvent::new(6, 1, MouseButton::Left, MouseEventKind::Press);
        tree.mouse(&press, Point::new(0, 0), &mut ctx);
        let drag = MouseEvent::new(6, 2, MouseButton::Left, MouseEventKind::Drag);
        tree.mouse(&drag, Point::new(0, 0), &mut ctx);
        let release = MouseEvent::new(6, 2, MouseButton::Left, MouseEventKind::Release);
        tree.mouse(&release, Point::new(0, 0), &mut ctx);

        // Single-cell rows drop into the middle: a becomes b's child.
        assert_eq!(tree.parent(a), Some(b));
    }

    #[test]
    fn paint_smoke_draws_header_and_items() {
        let (mut tree, _a, b) = scenario();
        tree.set_expanded(b, true);
        let mut core = WidgetCore::new();
        core.set_geometry_raw(Rect::new(0, 0, 40, 10));
        let mut canvas = Canvas::new(40, 10);
        tree.paint(&mut canvas, Size::new(40, 10), Point::new(0, 0), &core);
        let rows = canvas.to_plain_rows();
        assert!(rows[0].contains("name"));
        assert!(rows[1].contains("• A") || rows[1].contains("A"));
        assert!(rows[2].contains("▼"));
        assert!(rows[3].contains("B1"));
        assert!(rows[3].starts_with("  ") , "level-1 indentation");
    }
}
