//! Cosmetic rendering options.
//!
//! [`ViewSettings`] is the single current snapshot of theme, font and colour
//! choices. It is updated by shallow merges ([`SettingsPatch`]) and never
//! validated here: renderer adapters receive a [`StyleConfig`] derived from it
//! and are responsible for degrading gracefully on odd values.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Font families offered by the settings panel.
pub const FONT_OPTIONS: &[&str] = &[
    "Inter",
    "Arial",
    "Microsoft YaHei",
    "SimSun",
    "Times New Roman",
    "Helvetica",
    "Georgia",
];

/// Range the settings panel's font-size control moves within.
///
/// The model itself accepts any value; only the UI control is bounded.
pub const FONT_SIZE_RANGE: RangeInclusive<u16> = 12..=24;

/// Primary colour choices the settings panel cycles through.
pub const COLOR_PRESETS: &[&str] = &[
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#06B6D4", "#EC4899", "#64748B",
];

/// Branch colours for mind-map depths after the primary colour.
const BRANCH_COLORS: [&str; 7] = [
    "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#06B6D4", "#84CC16", "#F97316",
];

/// Named palettes a chart can be drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartTheme {
    #[default]
    Default,
    Dark,
    Forest,
    Neutral,
}

impl ChartTheme {
    pub const ALL: [Self; 4] = [Self::Default, Self::Dark, Self::Forest, Self::Neutral];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dark => "dark",
            Self::Forest => "forest",
            Self::Neutral => "neutral",
        }
    }

    /// The next theme in panel order, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// The previous theme in panel order, wrapping around.
    #[must_use]
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub const fn palette(self) -> Palette {
        match self {
            Self::Default => Palette {
                background: "#ffffff",
                surface: "#ECECFF",
                text: "#333333",
                line: "#333333",
                accent: "#9370DB",
            },
            Self::Dark => Palette {
                background: "#1f2020",
                surface: "#2b2b3b",
                text: "#cccccc",
                line: "#d3d3d3",
                accent: "#81B1DB",
            },
            Self::Forest => Palette {
                background: "#ffffff",
                surface: "#cde498",
                text: "#333333",
                line: "#008000",
                accent: "#13540c",
            },
            Self::Neutral => Palette {
                background: "#ffffff",
                surface: "#eeeeee",
                text: "#333333",
                line: "#666666",
                accent: "#999999",
            },
        }
    }
}

/// Fixed colours belonging to a [`ChartTheme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    /// Fill behind edge labels and secondary shapes.
    pub surface: &'static str,
    pub text: &'static str,
    pub line: &'static str,
    /// Used in place of the primary colour when that one cannot be parsed.
    pub accent: &'static str,
}

/// Current cosmetic settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewSettings {
    pub theme: ChartTheme,
    pub font_size: u16,
    pub font_family: String,
    pub primary_color: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            theme: ChartTheme::Default,
            font_size: 14,
            font_family: "Inter".to_string(),
            primary_color: "#3B82F6".to_string(),
        }
    }
}

impl ViewSettings {
    /// Shallow-merge the supplied fields over the current settings.
    pub fn update(&mut self, patch: SettingsPatch) {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(family) = patch.font_family {
            self.font_family = family;
        }
        if let Some(color) = patch.primary_color {
            self.primary_color = color;
        }
    }

    /// Restore the default tuple.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A partial settings update. Fields left as `None` are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub theme: Option<ChartTheme>,
    pub font_size: Option<u16>,
    pub font_family: Option<String>,
    pub primary_color: Option<String>,
}

impl SettingsPatch {
    pub fn theme(theme: ChartTheme) -> Self {
        Self {
            theme: Some(theme),
            ..Self::default()
        }
    }

    pub fn font_size(size: u16) -> Self {
        Self {
            font_size: Some(size),
            ..Self::default()
        }
    }

    pub fn font_family(family: impl Into<String>) -> Self {
        Self {
            font_family: Some(family.into()),
            ..Self::default()
        }
    }

    pub fn primary_color(color: impl Into<String>) -> Self {
        Self {
            primary_color: Some(color.into()),
            ..Self::default()
        }
    }
}

/// The style handed to renderer adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleConfig {
    pub theme: ChartTheme,
    pub font_family: String,
    pub font_size: u16,
    pub primary_color: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self::from(&ViewSettings::default())
    }
}

impl From<&ViewSettings> for StyleConfig {
    fn from(settings: &ViewSettings) -> Self {
        Self {
            theme: settings.theme,
            font_family: settings.font_family.clone(),
            font_size: settings.font_size,
            primary_color: settings.primary_color.clone(),
        }
    }
}

impl StyleConfig {
    pub const fn palette(&self) -> Palette {
        self.theme.palette()
    }

    /// The primary colour as RGB, falling back to the theme accent.
    pub fn accent_rgb(&self) -> (u8, u8, u8) {
        parse_hex_color(&self.primary_color)
            .or_else(|| parse_hex_color(self.palette().accent))
            .unwrap_or((0x33, 0x33, 0x33))
    }

    /// The primary colour normalised to `#rrggbb`.
    pub fn accent_hex(&self) -> String {
        let (r, g, b) = self.accent_rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Colour for a mind-map branch at `depth` (root is depth 0).
    pub fn branch_color(&self, depth: usize) -> String {
        let cycle = BRANCH_COLORS.len() + 1;
        match depth % cycle {
            0 => self.accent_hex(),
            n => BRANCH_COLORS[n - 1].to_string(),
        }
    }

    /// Font size in pixels, never zero.
    pub fn font_px(&self) -> f32 {
        f32::from(self.font_size.max(1))
    }

    /// Font family list for SVG output, with a generic fallback.
    pub fn font_stack(&self) -> String {
        let family = self.font_family.trim();
        if family.is_empty() {
            "sans-serif".to_string()
        } else {
            format!("'{}', sans-serif", family.replace(['\'', '"'], ""))
        }
    }
}

/// Parse `#rgb` or `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut parts = hex.chars().map(|c| {
                let v = c.to_digit(16).unwrap_or(0) as u8;
                v * 17
            });
            Some((parts.next()?, parts.next()?, parts.next()?))
        }
        6 => Some((
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults_match_fixed_tuple() {
        let s = ViewSettings::default();
        assert_eq!(s.theme, ChartTheme::Default);
        assert_eq!(s.font_size, 14);
        assert_eq!(s.font_family, "Inter");
        assert_eq!(s.primary_color, "#3B82F6");
    }

    #[test]
    fn test_partial_updates_accumulate() {
        let mut s = ViewSettings::default();
        s.update(SettingsPatch::font_size(18));
        s.update(SettingsPatch::theme(ChartTheme::Dark));
        assert_eq!(s.theme, ChartTheme::Dark);
        assert_eq!(s.font_size, 18);
        assert_eq!(s.font_family, "Inter");
        assert_eq!(s.primary_color, "#3B82F6");
    }

    #[test]
    fn test_update_accepts_invalid_values() {
        let mut s = ViewSettings::default();
        s.update(SettingsPatch::primary_color("not-a-colour"));
        s.update(SettingsPatch::font_family("No Such Font"));
        assert_eq!(s.primary_color, "not-a-colour");
        assert_eq!(s.font_family, "No Such Font");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut s = ViewSettings::default();
        s.update(SettingsPatch {
            theme: Some(ChartTheme::Forest),
            font_size: Some(22),
            font_family: Some("Georgia".into()),
            primary_color: Some("#000".into()),
        });
        s.reset();
        assert_eq!(s, ViewSettings::default());
    }

    #[test]
    fn test_invalid_primary_falls_back_to_theme_accent() {
        let style = StyleConfig {
            primary_color: "blue-ish".into(),
            theme: ChartTheme::Dark,
            ..StyleConfig::default()
        };
        assert_eq!(style.accent_hex(), "#81b1db");
    }

    #[test]
    fn test_parse_hex_color_forms() {
        assert_eq!(parse_hex_color("#3B82F6"), Some((0x3b, 0x82, 0xf6)));
        assert_eq!(parse_hex_color("fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn test_branch_colors_cycle_through_primary() {
        let style = StyleConfig::default();
        assert_eq!(style.branch_color(0), "#3b82f6");
        assert_eq!(style.branch_color(1), "#10B981");
        assert_eq!(style.branch_color(8), "#3b82f6");
    }

    #[test]
    fn test_theme_cycle_wraps() {
        assert_eq!(ChartTheme::Neutral.next(), ChartTheme::Default);
        assert_eq!(ChartTheme::Default.prev(), ChartTheme::Neutral);
    }

    #[test]
    fn test_settings_json_uses_camel_case() {
        let json = serde_json::to_value(ViewSettings::default()).unwrap();
        assert_eq!(json["fontSize"], 14);
        assert_eq!(json["primaryColor"], "#3B82F6");
        assert_eq!(json["theme"], "default");
    }

    #[test]
    fn test_font_stack_strips_quotes() {
        let style = StyleConfig {
            font_family: "Times \"New\" Roman".into(),
            ..StyleConfig::default()
        };
        assert_eq!(style.font_stack(), "'Times New Roman', sans-serif");
    }

    proptest! {
        #[test]
        fn font_size_patch_leaves_other_fields(size in 0u16..200) {
            let mut s = ViewSettings::default();
            s.update(SettingsPatch::font_size(size));
            prop_assert_eq!(s.font_size, size);
            prop_assert_eq!(s.theme, ChartTheme::Default);
            prop_assert_eq!(s.font_family.as_str(), "Inter");
            prop_assert_eq!(s.primary_color.as_str(), "#3B82F6");
        }
    }
}
