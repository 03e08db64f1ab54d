use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// Page color scheme, read from the root element's `data-theme` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// `"dark"` selects the dark theme; a missing or any other value is light.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

/// Live colors of a running field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub particle: Rgba,
    pub connection: Rgba,
    pub wave: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePalettes {
    pub light: Palette,
    pub dark: Palette,
}

impl ThemePalettes {
    pub fn for_theme(&self, theme: Theme) -> Palette {
        match theme {
            Theme::Light => self.light,
            Theme::Dark => self.dark,
        }
    }
}
