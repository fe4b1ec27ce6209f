//! chartpad - a terminal editor with live flowchart and mind map previews.
//!
//! # Usage
//!
//! ```bash
//! chartpad
//! chartpad plan.mmd
//! chartpad --type mindmap notes.md
//! chartpad --debounce-ms 150 --save
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use chartpad::app::App;
use chartpad::chart::ChartType;
use chartpad::config::{
    ConfigFlags, clear_config_flags, default_state_path, global_config_path, load_config_flags,
    local_override_path, parse_chart_type, parse_flag_tokens, save_config_flags,
};
use chartpad::perf;

/// Edit flowcharts and mind maps with a live terminal preview
#[derive(Parser, Debug)]
#[command(name = "chartpad", version, about, long_about = None)]
struct Cli {
    /// Chart source to open (.mmd/.mermaid for flowcharts, .md for mind maps)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Chart type to start with (flowchart or mindmap)
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_type_arg)]
    chart_type: Option<ChartType>,

    /// Where history, settings and layout are persisted
    #[arg(long, value_name = "PATH")]
    state_file: Option<PathBuf>,

    /// Directory exported SVG/PNG/JPEG files are written to
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Quiet period after the last keystroke before the preview re-renders
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Enable performance logging to stderr
    #[arg(long)]
    perf: bool,

    /// Write render pipeline debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn parse_type_arg(value: &str) -> Result<ChartType, String> {
    parse_chart_type(value).ok_or_else(|| format!("unknown chart type '{value}'"))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(perf::debug_log_path_from_env);
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize render debug log {}: {}",
            render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    if let Some(file) = &cli.file
        && !file.exists()
    {
        anyhow::bail!("File not found: {}", file.display());
    }

    let state_file = effective
        .state_file
        .clone()
        .unwrap_or_else(default_state_path);
    let export_dir = effective
        .export_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let mut app = App::new()
        .with_source_path(cli.file)
        .with_chart_type(cli.chart_type.or(effective.chart_type))
        .with_state_file(Some(state_file))
        .with_export_dir(export_dir)
        .with_mouse(!effective.no_mouse)
        .with_config_paths(
            Some(global_path.clone()),
            if local_path.exists() {
                Some(local_path.clone())
            } else {
                None
            },
        );
    if let Some(ms) = effective.debounce_ms {
        app = app.with_debounce_ms(ms);
    }

    app.run().context("Application error")
}
