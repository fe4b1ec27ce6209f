//! Rope-backed source editor for the code pane.

mod buffer;

pub use buffer::{Cursor, Direction, EditorBuffer};
