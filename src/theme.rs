//! Theme colors for the UI, overridable from the `[colors]` config table

use ratatui::style::Color;

use crate::config::ColorOverrides;

/// Semantic colors consumed by the rendering code
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, highlights
    pub success: Color,     // Open connection, sent markers
    pub danger: Color,      // Errors
    pub warning: Color,     // Transient status feedback
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Dimmed text
    pub inactive: Color,    // Inactive borders
    pub bg_selected: Color, // Selection background
    pub header: Color,      // Table/section headers
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired fallback palette
        Self {
            accent: Color::Rgb(250, 179, 135),
            success: Color::Rgb(166, 218, 149),
            danger: Color::Rgb(243, 139, 168),
            warning: Color::Rgb(238, 212, 159),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            bg_selected: Color::Rgb(69, 71, 90),
            header: Color::Rgb(243, 139, 168),
        }
    }
}

impl Theme {
    /// Apply `[colors]` overrides on top of the defaults. Unparseable hex
    /// values are ignored, keeping the default for that slot.
    pub fn from_overrides(overrides: &ColorOverrides) -> Self {
        let mut theme = Self::default();

        let slots: [(&Option<String>, &mut Color); 9] = [
            (&overrides.accent, &mut theme.accent),
            (&overrides.success, &mut theme.success),
            (&overrides.danger, &mut theme.danger),
            (&overrides.warning, &mut theme.warning),
            (&overrides.text, &mut theme.text),
            (&overrides.text_dim, &mut theme.text_dim),
            (&overrides.inactive, &mut theme.inactive),
            (&overrides.bg_selected, &mut theme.bg_selected),
            (&overrides.header, &mut theme.header),
        ];

        for (value, slot) in slots {
            if let Some(hex) = value {
                match parse_hex_color(hex) {
                    Some(color) => *slot = color,
                    None => tracing::warn!("ignoring invalid color override: {}", hex),
                }
            }
        }

        theme
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_hex() {
        assert_eq!(parse_hex_color("#ffc107"), Some(Color::Rgb(255, 193, 7)));
        assert_eq!(parse_hex_color("121212"), Some(Color::Rgb(18, 18, 18)));
    }

    #[test]
    fn parses_three_digit_hex() {
        assert_eq!(parse_hex_color("#f00"), Some(Color::Rgb(255, 0, 0)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#1234"), None);
        assert_eq!(parse_hex_color(""), None);
    }

    #[test]
    fn overrides_replace_only_named_slots() {
        let overrides = ColorOverrides {
            accent: Some("#102030".to_string()),
            danger: Some("not-a-color".to_string()),
            ..ColorOverrides::default()
        };
        let theme = Theme::from_overrides(&overrides);
        assert_eq!(theme.accent, Color::Rgb(16, 32, 48));
        assert_eq!(theme.danger, Theme::default().danger);
        assert_eq!(theme.text, Theme::default().text);
    }
}
