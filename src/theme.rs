use anyhow::Result;
use ratatui::style::Color;

use crate::repo::KeyValueStore;

pub const THEME_COLOR_KEY: &str = "themeColor";
pub const DARK_MODE_KEY: &str = "darkMode";
pub const DEFAULT_COLOR: &str = "#4f46e5";

const PALETTE: [&str; 6] = [
    DEFAULT_COLOR,
    "#0ea5e9",
    "#10b981",
    "#f59e0b",
    "#ef4444",
    "#d946ef",
];

/// Presentation settings persisted next to the tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    color: String,
    pub dark_mode: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_owned(),
            dark_mode: false,
        }
    }
}

impl Theme {
    /// Reads both keys; anything absent or unparseable falls back to the
    /// default.
    pub fn load(repo: &impl KeyValueStore) -> Result<Self> {
        let mut theme = Self::default();
        if let Some(color) = repo.get(THEME_COLOR_KEY)? {
            if !theme.set_color(&color) {
                tracing::warn!(color = %color, "ignoring invalid theme color");
            }
        }
        theme.dark_mode = repo
            .get(DARK_MODE_KEY)?
            .is_some_and(|raw| raw.trim() == "true");
        Ok(theme)
    }

    pub fn save(&self, repo: &mut impl KeyValueStore) -> Result<()> {
        repo.set(THEME_COLOR_KEY, &self.color)?;
        repo.set(DARK_MODE_KEY, if self.dark_mode { "true" } else { "false" })
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// Accepts `#rrggbb`; returns `false` and keeps the current color
    /// otherwise.
    pub fn set_color(&mut self, hex: &str) -> bool {
        let hex = hex.trim();
        if parse_hex(hex).is_none() {
            return false;
        }
        self.color = hex.to_ascii_lowercase();
        true
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
    }

    /// Steps to the next palette entry. Custom colors restart the palette.
    pub fn cycle_color(&mut self) {
        let next = PALETTE
            .iter()
            .position(|c| *c == self.color)
            .map_or(0, |idx| (idx + 1) % PALETTE.len());
        self.color = PALETTE[next].to_owned();
    }

    pub fn accent(&self) -> Color {
        parse_hex(&self.color)
            .map(|(r, g, b)| Color::Rgb(r, g, b))
            .unwrap_or(Color::Indexed(63))
    }

    pub fn background(&self) -> Color {
        if self.dark_mode {
            Color::Rgb(15, 23, 42)
        } else {
            Color::Rgb(248, 250, 252)
        }
    }

    pub fn text(&self) -> Color {
        if self.dark_mode {
            Color::Rgb(226, 232, 240)
        } else {
            Color::Rgb(31, 41, 55)
        }
    }

    pub fn muted(&self) -> Color {
        if self.dark_mode {
            Color::Rgb(148, 163, 184)
        } else {
            Color::Rgb(107, 114, 128)
        }
    }

    /// Unfilled part of the done/pending gauge.
    pub fn track(&self) -> Color {
        if self.dark_mode {
            Color::Rgb(51, 65, 85)
        } else {
            Color::Rgb(229, 231, 235)
        }
    }
}

fn parse_hex(raw: &str) -> Option<(u8, u8, u8)> {
    let digits = raw.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::memory::InMemoryStore;

    #[test]
    fn load_defaults_without_saved_settings() {
        let theme = Theme::load(&InMemoryStore::default()).unwrap();
        assert_eq!(theme, Theme::default());
        assert_eq!(theme.accent(), Color::Rgb(0x4f, 0x46, 0xe5));
    }

    #[test]
    fn load_reads_saved_settings_and_ignores_garbage() {
        let repo = InMemoryStore::with_seed([(THEME_COLOR_KEY, "#10B981"), (DARK_MODE_KEY, "true")]);
        let theme = Theme::load(&repo).unwrap();
        assert_eq!(theme.color(), "#10b981");
        assert!(theme.dark_mode);

        let repo = InMemoryStore::with_seed([(THEME_COLOR_KEY, "teal"), (DARK_MODE_KEY, "yes")]);
        assert_eq!(Theme::load(&repo).unwrap(), Theme::default());
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let mut repo = InMemoryStore::default();
        let mut theme = Theme::default();
        theme.toggle_dark_mode();
        theme.cycle_color();
        theme.save(&mut repo).unwrap();

        assert_eq!(repo.get(DARK_MODE_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(Theme::load(&repo).unwrap(), theme);
    }

    #[test]
    fn cycle_color_wraps_and_restarts_custom_colors() {
        let mut theme = Theme::default();
        for _ in 0..PALETTE.len() {
            theme.cycle_color();
        }
        assert_eq!(theme.color(), DEFAULT_COLOR);

        assert!(theme.set_color("#123456"));
        theme.cycle_color();
        assert_eq!(theme.color(), PALETTE[0]);
    }

    #[test]
    fn set_color_rejects_invalid_hex() {
        let mut theme = Theme::default();
        for bad in ["", "#12345", "123456", "#12345g", "#ééé"] {
            assert!(!theme.set_color(bad), "{bad}");
        }
        assert_eq!(theme.color(), DEFAULT_COLOR);
    }
}
