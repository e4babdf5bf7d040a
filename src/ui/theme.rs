use crate::models::ThresholdRange;
use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    // Base colors
    pub const FG: Color = Color::White;
    pub const DIM: Color = Color::DarkGray;
    pub const ACCENT: Color = Color::Green;
    pub const HIGHLIGHT: Color = Color::Cyan;

    // Status colors
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    // Threshold band colors
    pub const TEMPERATURE: Color = Color::Yellow;
    pub const SOIL_MOISTURE: Color = Color::LightBlue;
    pub const HUMIDITY: Color = Color::Cyan;

    pub fn title() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header() -> Style {
        Style::default().fg(Self::FG).add_modifier(Modifier::BOLD)
    }

    pub fn normal() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn dim() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Self::FG)
            .add_modifier(Modifier::BOLD)
    }

    /// Crop that is the current selection in the list.
    pub fn chosen() -> Style {
        Style::default()
            .bg(Self::ACCENT)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR)
    }

    pub fn range_color(range: ThresholdRange) -> Color {
        match range {
            ThresholdRange::Temperature => Self::TEMPERATURE,
            ThresholdRange::SoilMoisture => Self::SOIL_MOISTURE,
            ThresholdRange::Humidity => Self::HUMIDITY,
        }
    }

    pub fn nav_key() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn nav_label() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::ACCENT)
    }
}
