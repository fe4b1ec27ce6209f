//! The document being edited: chart source plus its chart type.

use std::path::Path;

use crate::chart::ChartType;

/// Current chart source and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    source: String,
    chart_type: ChartType,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A flowchart document seeded with the flowchart template.
    pub fn new() -> Self {
        Self::with_type(ChartType::Flowchart)
    }

    /// A document of `chart_type` seeded with that type's template.
    pub fn with_type(chart_type: ChartType) -> Self {
        Self {
            source: chart_type.default_template().to_string(),
            chart_type,
        }
    }

    /// A document holding `source` as-is.
    pub const fn from_source(source: String, chart_type: ChartType) -> Self {
        Self { source, chart_type }
    }

    /// Build a document from file contents.
    ///
    /// The chart type comes from the file extension when it is recognized,
    /// otherwise `fallback` is used.
    pub fn from_file(path: &Path, content: String, fallback: ChartType) -> Self {
        let chart_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ChartType::from_extension)
            .unwrap_or(fallback);
        Self::from_source(content, chart_type)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub const fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    /// True when the source contains nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.source.trim().is_empty()
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// Switch chart type. The source resets to the new type's template only
    /// when the type actually changes. Returns whether it changed.
    pub fn set_chart_type(&mut self, chart_type: ChartType) -> bool {
        if self.chart_type == chart_type {
            return false;
        }
        self.chart_type = chart_type;
        self.source = chart_type.default_template().to_string();
        true
    }

    /// Switch chart type keeping the current source.
    pub const fn set_chart_type_preserving(&mut self, chart_type: ChartType) {
        self.chart_type = chart_type;
    }

    pub fn clear(&mut self) {
        self.source.clear();
    }
}
