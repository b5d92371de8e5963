#![forbid(unsafe_code)]

//! Widget tree, focus model, event dispatch, and model/view widgets
//! for the Weft terminal UI framework.
//!
//! The tree is a slotmap arena of parent-owned nodes: every node
//! splits into a [`WidgetCore`] (geometry, flags, private canvas) and
//! a boxed [`Widget`] behavior. The [`Context`] coordinates focus, the
//! overlay stack, the dirty set, the mouse grab, and the clipboard;
//! [`dispatch`] routes decoded events into the tree.

pub mod arena;
pub mod basic;
pub mod context;
pub mod dispatch;
pub mod factory;
pub mod scroll;
pub mod splitter;
pub mod table;
pub mod treeview;
pub mod widget;

pub use arena::{WidgetArena, WidgetNode};
pub use basic::{Button, Container, Label, Spacer};
pub use context::Context;
pub use dispatch::{dispatch_event, dispatch_key, dispatch_mouse, dispatch_paste};
pub use factory::WidgetFactory;
pub use scroll::{ScrollBar, ScrollBarPolicy, ScrollContainer, Viewport};
pub use splitter::Splitter;
pub use table::{
    table, CellValue, HeaderOrientation, ItemFlags, SelectionFlag, SelectionProxy, SortOrder,
    Table, TableList, TableModel, TableModelSignals, TableView, UndoHistory,
};
pub use treeview::{
    tree, CacheEntry, ChildIndicatorPolicy, DndMode, DropPosition, Tree, TreeItem, TreeItemId,
    TreeWidget,
};
pub use widget::{
    Clipboard, ClipboardData, EventCtx, FocusPolicy, LayoutSpec, OverlayMode, StyleSet, UiCommand,
    Widget, WidgetCore, WidgetId,
};
