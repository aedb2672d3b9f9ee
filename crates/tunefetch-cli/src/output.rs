//! 终端输出：日志着色和进度条

use crossterm::style::{Color, Stylize};
use indicatif::{ProgressBar, ProgressStyle};
use tunefetch_core::{Category, LogEntry, Prefix};

/// 类别对应的终端颜色
fn color(category: Category) -> Color {
    match category {
        Category::Success => Color::Green,
        Category::Error => Color::Red,
        Category::Highlight => Color::Cyan,
        Category::Warning => Color::Yellow,
        Category::Header => Color::Reset,
    }
}

/// 渲染一条日志（带 ANSI 颜色）
pub fn render(entry: &LogEntry) -> String {
    // 段落前的空行不参与着色
    let (lead, body) = match entry.prefix {
        Prefix::SectionBreak => ("\n", entry.message.clone()),
        prefix => ("", prefix.apply(&entry.message)),
    };

    match entry.category {
        None => format!("{lead}{body}"),
        Some(Category::Header) => format!("{lead}{}", body.reverse().bold()),
        Some(category) => format!("{lead}{}", body.with(color(category))),
    }
}

/// 下载进度条（0-100）
pub fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.red/white}] {pos:>3}% {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▓░");
    pb.set_style(style);
    pb
}

/// 百分比转换为进度条位置
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn position(percent: f64) -> u64 {
    percent.clamp(0.0, 100.0).round() as u64
}
