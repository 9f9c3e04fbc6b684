use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for each kind of terminal line the CLI prints
#[derive(Debug, Clone)]
pub struct Theme {
    pub heading: Style,
    pub ok: Style,
    pub failure: Style,
    pub caution: Style,
    pub marker: Style,
    pub label: Style,
    /// Canon symbols in bundle listings
    pub canon: Style,
}

impl Theme {
    /// Colored when `console` enables colors for stdout
    pub fn detect() -> Self {
        if console::colors_enabled() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            heading: Style::new().cyan().bold(),
            ok: Style::new().green().bold(),
            failure: Style::new().red().bold(),
            caution: Style::new().yellow().bold(),
            marker: Style::new().magenta(),
            label: Style::new().dimmed(),
            canon: Style::new().bold().underline(),
        }
    }

    pub fn plain() -> Self {
        let none = Style::new();
        Self {
            heading: none,
            ok: none,
            failure: none,
            caution: none,
            marker: none,
            label: none,
            canon: none,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_only_colored_theme_styles_canons() {
        let plain = "canon".style(Theme::plain().canon).to_string();
        let colored = "canon".style(Theme::colored().canon).to_string();
        assert!(plain.contains("canon"));
        assert!(colored.contains('\u{1b}'));
        assert_ne!(plain, colored);
    }
}
