//! Colors

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub border_color: Color,
    pub focus_border_color: Color,
    pub text_color: Color,
    pub dim_color: Color,
    pub accent_color: Color,
    pub success_color: Color,
    pub warning_color: Color,
    pub error_color: Color,
    pub chip_bg_color: Color,
    pub menu_bg_color: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border_color: Color::DarkGray,
            focus_border_color: Color::Gray,
            text_color: Color::White,
            dim_color: Color::DarkGray,
            accent_color: Color::Cyan,
            success_color: Color::Green,
            warning_color: Color::Yellow,
            error_color: Color::Red,
            chip_bg_color: Color::Rgb(40, 44, 52),
            menu_bg_color: Color::Rgb(30, 33, 40),
        }
    }
}
