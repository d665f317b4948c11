//! Theme colors: a built-in palette with optional overrides from config.toml

use ratatui::style::Color;

use crate::config::ThemeOverrides;
use crate::metrics::Metric;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,       // Active borders, highlights
    pub danger: Color,       // Errors, reset
    pub success: Color,      // Loaded / ok indicators
    pub warning: Color,      // Status messages
    pub text: Color,         // Primary text
    pub text_dim: Color,     // Hints, empty states
    pub bg_selected: Color,  // Selection background
    pub inactive: Color,     // Inactive borders
    pub header: Color,       // Table and section headers
    pub users: Color,        // New users chart
    pub friendships: Color,  // New friendships chart
    pub interactions: Color, // Interactions chart
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(250, 179, 135),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
            users: Color::Rgb(16, 185, 129),
            friendships: Color::Rgb(59, 130, 246),
            interactions: Color::Rgb(234, 179, 8),
        }
    }
}

impl Theme {
    /// Default palette with any valid overrides applied
    pub fn load(overrides: &ThemeOverrides) -> Self {
        let mut theme = Self::default();

        let apply = |slot: &mut Color, value: &Option<String>| {
            if let Some(raw) = value {
                match Self::parse_hex_color(raw) {
                    Some(color) => *slot = color,
                    None => tracing::warn!("Ignoring invalid theme color: {}", raw),
                }
            }
        };

        apply(&mut theme.accent, &overrides.accent);
        apply(&mut theme.danger, &overrides.danger);
        apply(&mut theme.text, &overrides.text);
        apply(&mut theme.users, &overrides.users);
        apply(&mut theme.friendships, &overrides.friendships);
        apply(&mut theme.interactions, &overrides.interactions);

        theme
    }

    pub fn metric(&self, metric: Metric) -> Color {
        match metric {
            Metric::NewUsers => self.users,
            Metric::NewFriendships => self.friendships,
            Metric::Interactions => self.interactions,
        }
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(Theme::parse_hex_color("#10b981"), Some(Color::Rgb(16, 185, 129)));
        assert_eq!(Theme::parse_hex_color("fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Theme::parse_hex_color("#12345"), None);
        assert_eq!(Theme::parse_hex_color("#zzzzzz"), None);
        assert_eq!(Theme::parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_overrides_apply_and_invalid_are_ignored() {
        let overrides = ThemeOverrides {
            users: Some("#000000".to_string()),
            danger: Some("not-a-color".to_string()),
            ..Default::default()
        };
        let theme = Theme::load(&overrides);

        assert_eq!(theme.metric(Metric::NewUsers), Color::Rgb(0, 0, 0));
        assert_eq!(theme.danger, Theme::default().danger);
        assert_eq!(theme.metric(Metric::NewFriendships), Color::Rgb(59, 130, 246));
    }
}
