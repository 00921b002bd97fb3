use crate::state::app_settings::ColorScheme;
use tui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaletteColor {
    Text,
    Border,
    Header,
    Accent,
    Dim,
    Live,
    Error,
}

pub fn resolve(color: PaletteColor, scheme: ColorScheme) -> Style {
    match (color, scheme) {
        (PaletteColor::Text, ColorScheme::Dark) => Style::default().fg(Color::White),
        (PaletteColor::Text, ColorScheme::Light) => Style::default().fg(Color::Black),
        (PaletteColor::Border, ColorScheme::Dark) => Style::default().fg(Color::Gray),
        (PaletteColor::Border, ColorScheme::Light) => Style::default().fg(Color::DarkGray),
        (PaletteColor::Header, ColorScheme::Dark) => Style::default()
            .fg(Color::Rgb(255, 208, 0))
            .add_modifier(Modifier::BOLD),
        (PaletteColor::Header, ColorScheme::Light) => Style::default()
            .fg(Color::Rgb(120, 60, 0))
            .add_modifier(Modifier::BOLD),
        (PaletteColor::Accent, ColorScheme::Dark) => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        (PaletteColor::Accent, ColorScheme::Light) => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        (PaletteColor::Dim, ColorScheme::Dark) => Style::default().fg(Color::Indexed(244)),
        (PaletteColor::Dim, ColorScheme::Light) => Style::default().fg(Color::Indexed(242)),
        (PaletteColor::Live, _) => Style::default().fg(Color::Green),
        (PaletteColor::Error, _) => Style::default().fg(Color::Red),
    }
}

/// Border color for blocks; `default_border` takes a bare color.
pub fn border_color(scheme: ColorScheme) -> Color {
    resolve(PaletteColor::Border, scheme).fg.unwrap_or(Color::Reset)
}
