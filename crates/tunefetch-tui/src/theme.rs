//! 配色方案

use ratatui::style::{Color, Modifier, Style};
use tunefetch_core::{Category, ThemeMode};

/// 一套界面配色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub card_bg: Color,
    pub border: Color,
    pub fg: Color,
    pub sub_fg: Color,
    pub accent: Color,
    pub accent_fg: Color,
    pub log_bg: Color,
    pub log_fg: Color,
    pub placeholder: Color,
    pub green: Color,
    pub red: Color,
    pub cyan: Color,
    pub yellow: Color,
}

#[allow(clippy::cast_possible_truncation)]
const fn hex(rgb: u32) -> Color {
    Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

pub const LIGHT: Palette = Palette {
    bg: hex(0xF2F2F7),
    card_bg: hex(0xFFFFFF),
    border: hex(0xC7C7CC),
    fg: hex(0x000000),
    sub_fg: hex(0x8E8E93),
    accent: hex(0xFA233B),
    accent_fg: hex(0xFFFFFF),
    log_bg: hex(0x1C1C1E),
    log_fg: hex(0x00FF00),
    placeholder: hex(0xC7C7CC),
    green: hex(0x34C759),
    red: hex(0xFF3B30),
    cyan: hex(0x007AFF),
    yellow: hex(0xFFCC00),
};

pub const DARK: Palette = Palette {
    bg: hex(0x000000),
    card_bg: hex(0x1C1C1E),
    border: hex(0x3A3A3C),
    fg: hex(0xFFFFFF),
    sub_fg: hex(0x98989D),
    accent: hex(0xFA233B),
    accent_fg: hex(0xFFFFFF),
    log_bg: hex(0x121212),
    log_fg: hex(0x00FF00),
    placeholder: hex(0x636366),
    green: hex(0x32D74B),
    red: hex(0xFF453A),
    cyan: hex(0x64D2FF),
    yellow: hex(0xFFD60A),
};

impl Palette {
    pub fn for_mode(mode: ThemeMode) -> &'static Palette {
        match mode {
            ThemeMode::Light => &LIGHT,
            ThemeMode::Dark => &DARK,
        }
    }

    /// 日志行样式，未分类的行使用日志默认前景色
    pub fn log_style(&self, category: Option<Category>) -> Style {
        let base = Style::default().bg(self.log_bg);
        match category {
            None => base.fg(self.log_fg),
            Some(Category::Success) => base.fg(self.green),
            Some(Category::Error) => base.fg(self.red),
            Some(Category::Highlight) => base.fg(self.cyan),
            Some(Category::Warning) => base.fg(self.yellow),
            // 反色标题
            Some(Category::Header) => Style::default()
                .fg(self.bg)
                .bg(self.fg)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// 主题切换按钮上显示的符号（切换后的模式）
    pub fn toggle_symbol(mode: ThemeMode) -> &'static str {
        match mode {
            ThemeMode::Light => "☾",
            ThemeMode::Dark => "☀",
        }
    }
}
