//! Herbal-themed color palette and styles.
//!
//! Colors chosen for:
//! - Calm, apothecary-adjacent appearance
//! - High contrast for accessibility

use ratatui::style::{Color, Modifier, Style};

use crate::domain::RecordStatus;

/// Herbal theme color palette.
pub struct HerbalTheme;

impl HerbalTheme {
    // === Primary Colors ===

    /// Deep green - Primary (herbal, trust)
    pub const PRIMARY: Color = Color::Rgb(22, 163, 74); // #16A34A

    /// Lighter green for highlights
    pub const PRIMARY_LIGHT: Color = Color::Rgb(74, 222, 128); // #4ADE80

    // === Secondary Colors ===

    /// Slate for borders and chrome
    pub const SECONDARY_LIGHT: Color = Color::Rgb(148, 163, 184); // #94A3B8

    // === Semantic Colors ===

    /// Emerald - Success / analyzed
    pub const SUCCESS: Color = Color::Rgb(16, 185, 129); // #10B981

    /// Amber - Warning / pending
    pub const WARNING: Color = Color::Rgb(251, 191, 36); // #FBBF24

    /// Rose - Error
    pub const DANGER: Color = Color::Rgb(244, 63, 94); // #F43F5E

    /// Blue - Info
    pub const INFO: Color = Color::Rgb(59, 130, 246); // #3B82F6

    // === Background ===

    /// Near-black with green tint
    pub const BG_DARK: Color = Color::Rgb(16, 24, 16); // #101810

    // === Text Colors ===

    /// Primary text (white)
    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC

    /// Secondary text (gray)
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8

    /// Muted text
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    // === Preset Styles ===

    /// Style for titles
    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for subtitles
    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for normal text
    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    /// Style for secondary text
    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Style for muted text
    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    /// Style for success messages
    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    /// Style for warning messages
    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    /// Style for danger/error messages
    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    /// Style for info messages
    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::INFO)
    }

    /// Style for selected rows
    #[must_use]
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::BG_DARK)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for focused elements
    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for borders
    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::SECONDARY_LIGHT)
    }

    /// Style for key hints
    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for key descriptions
    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Get status badge style
    #[must_use]
    pub fn status(status: RecordStatus) -> Style {
        let (r, g, b) = status.color();
        Style::default().fg(Color::Rgb(r, g, b))
    }
}
