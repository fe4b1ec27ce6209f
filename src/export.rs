//! Export of the displayed chart to SVG, PNG or JPEG.
//!
//! Flowcharts are drawn by `mermaid-rs-renderer` from the visual's source,
//! themed from its style. Mind maps are serialised from the visual's scene.
//! Raster formats rasterize that SVG with `resvg` onto a white background.
//! Files are fully encoded in memory before a single write.

use std::fs;
use std::io::Cursor;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use mermaid_rs_renderer::config::LayoutConfig;
use mermaid_rs_renderer::layout::compute_layout;
use mermaid_rs_renderer::parser::parse_mermaid;
use mermaid_rs_renderer::render::render_svg;
use mermaid_rs_renderer::theme::Theme;
use regex::{Captures, Regex};
use resvg::usvg::fontdb;

use crate::chart::{ChartType, Visual};
use crate::settings::StyleConfig;

/// Pixel density multiplier for PNG and JPEG output.
pub const RASTER_SCALE: f32 = 2.0;
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Svg,
    Png,
    Jpeg,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Svg, Self::Png, Self::Jpeg];

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Svg => "SVG",
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Nothing to export yet")]
    MissingVisual,
    #[error("Diagram rendering failed: {0}")]
    Render(String),
    #[error("Invalid SVG: {0}")]
    Svg(String),
    #[error("Rasterization failed: {0}")]
    Raster(String),
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `chart-<type>-<unix_ms>.<ext>`
pub fn export_file_name(chart_type: ChartType, format: ExportFormat, now_ms: u64) -> String {
    format!("chart-{}-{now_ms}.{}", chart_type.slug(), format.extension())
}

/// Standalone SVG for `visual`, its root size multiplied by `scale`.
pub fn chart_svg(visual: &Visual, scale: f32) -> Result<String, ExportError> {
    match visual.chart_type {
        ChartType::Flowchart => Ok(scale_svg_root(&flowchart_svg(visual)?, scale)),
        ChartType::MindMap => Ok(visual.to_svg(scale)),
    }
}

/// Parse, lay out and draw a flowchart source with a theme built from its style.
fn flowchart_svg(visual: &Visual) -> Result<String, ExportError> {
    let theme = export_theme(&visual.style);
    let layout_config = LayoutConfig::default();
    guard_engine(|| {
        let parsed =
            parse_mermaid(&visual.source).map_err(|err| ExportError::Render(err.to_string()))?;
        let laid_out = compute_layout(&parsed.graph, &theme, &layout_config);
        Ok(render_svg(&laid_out, &theme, &layout_config))
    })
}

/// Run a diagram engine call, turning a panic in it into `ExportError::Render`.
fn guard_engine<F>(draw: F) -> Result<String, ExportError>
where
    F: FnOnce() -> Result<String, ExportError>,
{
    catch_unwind(AssertUnwindSafe(draw))
        .unwrap_or_else(|_| Err(ExportError::Render("diagram engine panicked".to_string())))
}

fn export_theme(style: &StyleConfig) -> Theme {
    let palette = style.palette();
    Theme {
        font_family: style.font_stack(),
        font_size: style.font_px(),
        primary_color: palette.surface.to_string(),
        primary_text_color: palette.text.to_string(),
        primary_border_color: style.accent_hex(),
        line_color: palette.line.to_string(),
        secondary_color: palette.surface.to_string(),
        tertiary_color: palette.background.to_string(),
        edge_label_background: palette.background.to_string(),
        cluster_background: palette.surface.to_string(),
        cluster_border: palette.line.to_string(),
        background: palette.background.to_string(),
        text_color: palette.text.to_string(),
        ..Theme::modern()
    }
}

static SVG_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").expect("svg root regex is valid"));

static SIZE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(width|height)="([0-9]*\.?[0-9]+)(px)?""#).expect("size regex is valid")
});

/// Multiply the numeric `width`/`height` of the root `<svg>` tag by `scale`.
/// The viewBox is left alone so the drawing scales with the canvas.
fn scale_svg_root(svg: &str, scale: f32) -> String {
    if (scale - 1.0).abs() < f32::EPSILON {
        return svg.to_string();
    }
    let Some(root) = SVG_ROOT.find(svg) else {
        return svg.to_string();
    };
    let tag = SIZE_ATTR.replace_all(root.as_str(), |caps: &Captures<'_>| {
        let value: f32 = caps[2].parse().unwrap_or(0.0);
        format!("{}=\"{:.2}\"", &caps[1], value * scale)
    });
    format!("{}{tag}{}", &svg[..root.start()], &svg[root.end()..])
}

/// Encode `visual` in `format`. `scale` is the zoom applied to SVG output.
pub fn encode(visual: &Visual, format: ExportFormat, scale: f32) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Svg => Ok(chart_svg(visual, scale)?.into_bytes()),
        ExportFormat::Png => {
            let image = rasterize_svg(&chart_svg(visual, 1.0)?, RASTER_SCALE)?;
            let mut bytes = Vec::new();
            image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
            Ok(bytes)
        }
        ExportFormat::Jpeg => {
            let image = rasterize_svg(&chart_svg(visual, 1.0)?, RASTER_SCALE)?;
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let mut bytes = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)?;
            Ok(bytes)
        }
    }
}

/// Encode and write `visual` into `dir`. Returns the written path.
pub fn export_visual(
    visual: Option<&Visual>,
    format: ExportFormat,
    scale: f32,
    dir: &Path,
    now_ms: u64,
) -> Result<PathBuf, ExportError> {
    let visual = visual.ok_or(ExportError::MissingVisual)?;
    let bytes = encode(visual, format, scale)?;
    let path = dir.join(export_file_name(visual.chart_type, format, now_ms));
    let io_err = |source| ExportError::Io {
        path: path.clone(),
        source,
    };
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    fs::write(&path, &bytes).map_err(io_err)?;
    crate::perf::log_event(
        "export.write",
        format!("format={} bytes={} path={}", format.label(), bytes.len(), path.display()),
    );
    Ok(path)
}

/// Rasterize an SVG string at `scale` onto an opaque white background.
pub fn rasterize_svg(svg: &str, scale: f32) -> Result<DynamicImage, ExportError> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let opts = resvg::usvg::Options {
        fontdb: Arc::new(db),
        ..Default::default()
    };

    let tree =
        resvg::usvg::Tree::from_str(svg, &opts).map_err(|err| ExportError::Svg(err.to_string()))?;
    let size = tree.size();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let height = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ExportError::Raster(format!("failed to create pixmap {width}x{height}")))?;
    pixmap.fill(resvg::tiny_skia::Color::WHITE);

    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let rgba = pixmap.data().to_vec();
    let img_buf = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| ExportError::Raster("pixmap size mismatch".to_string()))?;

    Ok(DynamicImage::ImageRgba8(img_buf))
}
