#![forbid(unsafe_code)]

//! Table core: abstract model, list model, selection proxy, undo
//! history, and the table view widget.

pub mod model;
pub mod selection;
pub mod undo;
pub mod view;

pub use model::{
    CellValue, HeaderOrientation, ItemFlags, SortOrder, TableList, TableModel, TableModelSignals,
    TableRegion,
};
pub use selection::{SelectionFlag, SelectionProxy};
pub use undo::{CellChange, Snapshot, UndoHistory};
pub use view::{table, SizeMode, Table, TableView};
