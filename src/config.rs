use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::chart::ChartType;

const APP_DIR: &str = "chartpad";
const LOCAL_RC: &str = ".chartpadrc";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub perf: bool,
    pub no_mouse: bool,
    pub chart_type: Option<ChartType>,
    pub debounce_ms: Option<u64>,
    pub state_file: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            perf: self.perf || other.perf,
            no_mouse: self.no_mouse || other.no_mouse,
            chart_type: other.chart_type.or(self.chart_type),
            debounce_ms: other.debounce_ms.or(self.debounce_ms),
            state_file: other.state_file.clone().or_else(|| self.state_file.clone()),
            export_dir: other.export_dir.clone().or_else(|| self.export_dir.clone()),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }
}

/// Directory holding the global config and the state file.
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return Some(PathBuf::from(appdata).join(APP_DIR));
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join(APP_DIR),
            );
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join(APP_DIR));
        }
        if let Some(home) = std::env::var_os("HOME") {
            return Some(PathBuf::from(home).join(".config").join(APP_DIR));
        }
    }

    None
}

pub fn global_config_path() -> PathBuf {
    config_dir().map_or_else(local_override_path, |dir| dir.join("config"))
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_RC)
}

/// Where the persisted application state lives unless `--state-file` is given.
pub fn default_state_path() -> PathBuf {
    config_dir().map_or_else(
        || PathBuf::from(".chartpad-state.json"),
        |dir| dir.join("state.json"),
    )
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# chartpad defaults (saved with --save)".to_string());
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if flags.no_mouse {
        lines.push("--no-mouse".to_string());
    }
    if let Some(chart_type) = flags.chart_type {
        lines.push(format!("--type {}", chart_type.slug()));
    }
    if let Some(ms) = flags.debounce_ms {
        lines.push(format!("--debounce-ms {ms}"));
    }
    if let Some(path) = &flags.state_file {
        lines.push(format!("--state-file {}", path.display()));
    }
    if let Some(path) = &flags.export_dir {
        lines.push(format!("--export-dir {}", path.display()));
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        match name {
            "--perf" => flags.perf = true,
            "--no-mouse" => flags.no_mouse = true,
            "--type" | "--debounce-ms" | "--state-file" | "--export-dir"
            | "--render-debug-log" => {
                let value = match inline {
                    Some(value) => Some(value),
                    None => {
                        let next = tokens.get(i + 1).map(String::as_str);
                        if next.is_some() {
                            i += 1;
                        }
                        next
                    }
                };
                if let Some(value) = value {
                    apply_value(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--type" => flags.chart_type = parse_chart_type(value),
        "--debounce-ms" => flags.debounce_ms = value.parse().ok(),
        "--state-file" => flags.state_file = Some(PathBuf::from(value)),
        "--export-dir" => flags.export_dir = Some(PathBuf::from(value)),
        "--render-debug-log" => flags.render_debug_log = Some(PathBuf::from(value)),
        _ => {}
    }
}

pub fn parse_chart_type(s: &str) -> Option<ChartType> {
    match s.to_ascii_lowercase().as_str() {
        "flowchart" | "mermaid" => Some(ChartType::Flowchart),
        "mindmap" | "markmap" => Some(ChartType::MindMap),
        _ => None,
    }
}
