//! Color palettes and the styles derived from them

use ratatui::style::{Color, Modifier, Style};

/// Usage at or above this is drawn in the warning color.
const WARN_PERCENT: u8 = 60;
/// Usage at or above this is drawn in the critical color.
const CRITICAL_PERCENT: u8 = 85;

/// Complete theme definition
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
    pub styles: ThemeStyles,
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub bg: Color,
    pub bg_panel: Color,

    pub fg: Color,
    pub fg_muted: Color,

    pub accent: Color,
    pub accent_alt: Color,

    // Usage levels
    pub ok: Color,
    pub warn: Color,
    pub critical: Color,
    pub info: Color,

    pub border: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeStyles {
    pub header: Style,
    pub footer: Style,
    pub panel_title: Style,
    pub panel_border: Style,
    pub label: Style,
    pub value: Style,
    pub muted: Style,
    pub sparkline: Style,
    pub keybind: Style,
    pub keybind_key: Style,
    pub level_ok: Style,
    pub level_warn: Style,
    pub level_critical: Style,
    pub notification_info: Style,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dracula" => Self::dracula(),
            "nord" => Self::nord(),
            "gruvbox" => Self::gruvbox(),
            _ => Self::tokyo_night(), // Default
        }
    }

    /// Tokyo Night theme (default)
    pub fn tokyo_night() -> Self {
        Self::from_colors(
            "Tokyo Night",
            ThemeColors {
                bg: Color::Rgb(26, 27, 38),
                bg_panel: Color::Rgb(36, 40, 59),
                fg: Color::Rgb(192, 202, 245),
                fg_muted: Color::Rgb(86, 95, 137),
                accent: Color::Rgb(122, 162, 247),
                accent_alt: Color::Rgb(187, 154, 247),
                ok: Color::Rgb(158, 206, 106),
                warn: Color::Rgb(224, 175, 104),
                critical: Color::Rgb(247, 118, 142),
                info: Color::Rgb(125, 207, 255),
                border: Color::Rgb(41, 46, 66),
            },
        )
    }

    pub fn dracula() -> Self {
        Self::from_colors(
            "Dracula",
            ThemeColors {
                bg: Color::Rgb(40, 42, 54),
                bg_panel: Color::Rgb(68, 71, 90),
                fg: Color::Rgb(248, 248, 242),
                fg_muted: Color::Rgb(98, 114, 164),
                accent: Color::Rgb(139, 233, 253),
                accent_alt: Color::Rgb(255, 121, 198),
                ok: Color::Rgb(80, 250, 123),
                warn: Color::Rgb(255, 184, 108),
                critical: Color::Rgb(255, 85, 85),
                info: Color::Rgb(139, 233, 253),
                border: Color::Rgb(68, 71, 90),
            },
        )
    }

    pub fn nord() -> Self {
        Self::from_colors(
            "Nord",
            ThemeColors {
                bg: Color::Rgb(46, 52, 64),
                bg_panel: Color::Rgb(59, 66, 82),
                fg: Color::Rgb(236, 239, 244),
                fg_muted: Color::Rgb(216, 222, 233),
                accent: Color::Rgb(136, 192, 208),
                accent_alt: Color::Rgb(129, 161, 193),
                ok: Color::Rgb(163, 190, 140),
                warn: Color::Rgb(235, 203, 139),
                critical: Color::Rgb(191, 97, 106),
                info: Color::Rgb(136, 192, 208),
                border: Color::Rgb(67, 76, 94),
            },
        )
    }

    pub fn gruvbox() -> Self {
        Self::from_colors(
            "Gruvbox",
            ThemeColors {
                bg: Color::Rgb(40, 40, 40),
                bg_panel: Color::Rgb(60, 56, 54),
                fg: Color::Rgb(235, 219, 178),
                fg_muted: Color::Rgb(168, 153, 132),
                accent: Color::Rgb(131, 165, 152),
                accent_alt: Color::Rgb(211, 134, 155),
                ok: Color::Rgb(184, 187, 38),
                warn: Color::Rgb(250, 189, 47),
                critical: Color::Rgb(251, 73, 52),
                info: Color::Rgb(131, 165, 152),
                border: Color::Rgb(80, 73, 69),
            },
        )
    }

    fn from_colors(name: &str, colors: ThemeColors) -> Self {
        let styles = ThemeStyles {
            header: Style::default().bg(colors.bg_panel).fg(colors.fg),
            footer: Style::default().bg(colors.bg_panel).fg(colors.fg_muted),
            panel_title: Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
            panel_border: Style::default().fg(colors.border),
            label: Style::default().fg(colors.fg_muted),
            value: Style::default().fg(colors.fg).add_modifier(Modifier::BOLD),
            muted: Style::default().fg(colors.fg_muted),
            sparkline: Style::default().fg(colors.accent),
            keybind: Style::default().fg(colors.fg_muted),
            keybind_key: Style::default()
                .fg(colors.accent_alt)
                .add_modifier(Modifier::BOLD),
            level_ok: Style::default().fg(colors.ok),
            level_warn: Style::default().fg(colors.warn),
            level_critical: Style::default()
                .fg(colors.critical)
                .add_modifier(Modifier::BOLD),
            notification_info: Style::default().fg(colors.info),
        };

        Self {
            name: name.to_string(),
            colors,
            styles,
        }
    }

    /// Style for a usage percentage; unknown values are muted.
    pub fn usage_style(&self, percent: Option<u8>) -> Style {
        match percent {
            None => self.styles.muted,
            Some(p) if p >= CRITICAL_PERCENT => self.styles.level_critical,
            Some(p) if p >= WARN_PERCENT => self.styles.level_warn,
            Some(_) => self.styles.level_ok,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::tokyo_night()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_falls_back_to_default() {
        assert_eq!(Theme::from_name("NORD").name, "Nord");
        assert_eq!(Theme::from_name("solarized").name, "Tokyo Night");
    }

    #[test]
    fn usage_levels() {
        let theme = Theme::default();
        assert_eq!(theme.usage_style(None), theme.styles.muted);
        assert_eq!(theme.usage_style(Some(10)), theme.styles.level_ok);
        assert_eq!(theme.usage_style(Some(60)), theme.styles.level_warn);
        assert_eq!(theme.usage_style(Some(97)), theme.styles.level_critical);
    }
}
