//! Theme color definitions for the UI
//!
//! Provides dark and light color palettes selected from the configuration.

use crate::config::Theme;
use ratatui::style::Color;

/// Complete color palette for the UI
#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    /// Panel background while idle
    pub bg: Color,
    /// Primary foreground text
    pub fg: Color,
    /// Dimmed/secondary text
    pub dim: Color,
    /// Accent color (titles, counts)
    pub accent: Color,
    /// Panel background right after a trigger is accepted
    pub flash: Color,
    /// Text drawn on the flash background
    pub text_on_flash: Color,
    /// Status bar background
    pub bar_bg: Color,
    /// Status messages
    pub warning: Color,
}

impl ThemeColors {
    /// Create a color palette for the given theme variant
    pub fn from_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(22, 22, 30),
            fg: Color::Rgb(200, 200, 210),
            dim: Color::Rgb(90, 90, 110),
            accent: Color::Rgb(80, 200, 220),
            flash: Color::Rgb(80, 200, 120),
            text_on_flash: Color::Rgb(20, 20, 25),
            bar_bg: Color::Rgb(40, 40, 50),
            warning: Color::Rgb(240, 180, 80),
        }
    }

    /// High contrast for bright terminals
    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(245, 245, 248),
            fg: Color::Rgb(30, 30, 40),
            dim: Color::Rgb(130, 130, 150),
            accent: Color::Rgb(0, 130, 160),
            flash: Color::Rgb(30, 150, 70),
            text_on_flash: Color::Rgb(255, 255, 255),
            bar_bg: Color::Rgb(220, 220, 228),
            warning: Color::Rgb(180, 120, 0),
        }
    }
}
