// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. chart::ChartType)
    clippy::module_name_repetitions
)]

//! # chartpad
//!
//! A terminal editor for flowcharts and mind maps with a live preview.
//!
//! chartpad pairs a plain-text source editor with a rendered preview:
//! - Mermaid-style flowcharts and markdown-outline mind maps
//! - Debounced background rendering with a syntax error panel
//! - Zoom, pan and side-by-side or stacked layouts
//! - Saved history, a syntax tutorial and SVG/PNG/JPEG export
//!
//! ## Architecture
//!
//! chartpad uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`chart`]: Chart types, parsers and the renderer adapters
//! - [`document`]: The chart source being edited
//! - [`editor`]: Text buffer and cursor
//! - [`render`]: Debounced render pipeline
//! - [`history`]: Saved chart snapshots
//! - [`settings`]: Theme, font and colour settings
//! - [`store`]: Persisted application state
//! - [`export`]: SVG and raster export
//! - [`tutorial`]: Syntax tutorial content
//! - [`ui`]: Terminal UI components

pub mod app;
pub mod chart;
pub mod config;
pub mod document;
pub mod editor;
pub mod export;
pub mod history;
pub mod perf;
pub mod render;
pub mod settings;
pub mod store;
pub mod tutorial;
pub mod ui;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::chart::{ChartType, Visual};
    pub use crate::document::Document;
    pub use crate::render::RenderPipeline;
}
