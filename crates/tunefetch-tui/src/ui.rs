//! UI rendering module

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
};
use tunefetch_core::{LogEntry, Prefix};

use crate::app::{App, Field};
use crate::theme::Palette;

const URL_PLACEHOLDER: &str = "https://music.apple.com/...";

pub fn draw(frame: &mut Frame, app: &App) {
    let palette = Palette::for_mode(app.theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        frame.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(3), // URL
            Constraint::Length(5), // Settings
            Constraint::Length(1), // Download button
            Constraint::Length(3), // Progress
            Constraint::Min(5),    // Log
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, app, palette, chunks[0]);
    draw_url(frame, app, palette, chunks[1]);
    draw_settings(frame, app, palette, chunks[2]);
    draw_button(frame, app, palette, chunks[3]);
    draw_progress(frame, app, palette, chunks[4]);
    draw_log(frame, app, palette, chunks[5]);
    draw_status_bar(frame, app, palette, chunks[6]);

    if let Some(notice) = &app.notice {
        draw_notice(frame, notice, palette);
    }
}

fn card(title: &str, focused: bool, palette: &Palette) -> Block<'static> {
    let border = if focused { palette.accent } else { palette.border };
    Block::default()
        .borders(Borders::ALL)
        .title(format!(" {title} "))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(palette.card_bg).fg(palette.fg))
}

fn draw_header(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let header = Line::from(vec![
        Span::styled("Music Downloader", Style::default().fg(palette.fg).bold()),
        Span::styled(
            format!("  v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.sub_fg),
        ),
        Span::styled(
            format!("   [F2] {}", Palette::toggle_symbol(app.theme)),
            Style::default().fg(palette.sub_fg),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// 输入框内容：为空时显示占位文本，聚焦时追加光标
fn field_spans(
    value: &str,
    placeholder: String,
    focused: bool,
    palette: &Palette,
) -> Vec<Span<'static>> {
    let mut spans = if value.is_empty() {
        vec![Span::styled(placeholder, Style::default().fg(palette.placeholder))]
    } else {
        vec![Span::styled(value.to_string(), Style::default().fg(palette.fg))]
    };
    if focused {
        spans.push(Span::styled("█", Style::default().fg(palette.accent)));
    }
    spans
}

fn draw_url(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let focused = app.focus == Field::Url;
    let content = Line::from(field_spans(
        &app.url,
        URL_PLACEHOLDER.to_string(),
        focused,
        palette,
    ));
    let input = Paragraph::new(content).block(card("Link", focused, palette));
    frame.render_widget(input, area);
}

fn draw_settings(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let label_style = Style::default().fg(palette.sub_fg);
    let row = |label: &'static str, field: Field, mut value: Vec<Span<'static>>| {
        let marker = if app.focus == field { "› " } else { "  " };
        let mut spans = vec![
            Span::styled(marker, Style::default().fg(palette.accent)),
            Span::styled(format!("{label:<8}"), label_style),
        ];
        spans.append(&mut value);
        Line::from(spans)
    };

    let codec_focused = app.focus == Field::Codec;
    let codec = vec![Span::styled(
        format!("< {} >", app.codec.label()),
        if codec_focused {
            Style::default().fg(palette.accent).bold()
        } else {
            Style::default().fg(palette.fg)
        },
    )];

    let folder = field_spans(
        &app.folder,
        app.paths.default_output_dir.display().to_string(),
        app.focus == Field::Folder,
        palette,
    );
    let cookies = field_spans(
        &app.cookies,
        app.paths.documents_cookies.display().to_string(),
        app.focus == Field::Cookies,
        palette,
    );

    let lines = vec![
        row("Format", Field::Codec, codec),
        row("Folder", Field::Folder, folder),
        row("Cookies", Field::Cookies, cookies),
    ];

    let focused = app.focus != Field::Url;
    let settings = Paragraph::new(lines).block(card("Settings", focused, palette));
    frame.render_widget(settings, area);
}

fn draw_button(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let style = if app.busy {
        Style::default().fg(palette.sub_fg).bg(palette.card_bg)
    } else {
        Style::default().fg(palette.accent_fg).bg(palette.accent).bold()
    };
    let button = Paragraph::new(Line::from(" DOWNLOAD MUSIC  [Enter] ").style(style))
        .alignment(Alignment::Center);
    frame.render_widget(button, area);
}

fn draw_progress(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let ratio = (app.progress / 100.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(card("Progress", false, palette))
        .gauge_style(Style::default().fg(palette.accent).bg(palette.card_bg))
        .ratio(ratio)
        .label(format!("{:.1}%", app.progress));

    frame.render_widget(gauge, area);
}

/// 把日志条目转换成显示行，保留前缀（空行 / 缩进）
fn log_lines<'a>(entries: impl Iterator<Item = &'a LogEntry>, palette: &Palette) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for entry in entries {
        let text = match entry.prefix {
            Prefix::SectionBreak => {
                lines.push(Line::default());
                entry.message.clone()
            }
            Prefix::Indent(n) => format!("{}{}", " ".repeat(usize::from(n)), entry.message),
            Prefix::None => entry.message.clone(),
        };
        lines.push(Line::from(Span::styled(text, palette.log_style(entry.category))));
    }
    lines
}

fn draw_log(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let lines = log_lines(app.logs.iter(), palette);

    // 默认停留在底部，log_scroll 表示向上滚动的行数
    let height = usize::from(area.height.saturating_sub(2));
    let bottom = lines.len().saturating_sub(height);
    let top = bottom.saturating_sub(app.log_scroll);

    let title = if app.log_scroll > 0 {
        format!(" Log (↑{}) ", app.log_scroll)
    } else {
        " Log ".to_string()
    };

    let log = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(palette.border))
                .style(Style::default().bg(palette.log_bg).fg(palette.log_fg)),
        )
        .scroll((u16::try_from(top).unwrap_or(u16::MAX), 0));

    frame.render_widget(log, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let status = Line::from(vec![
        Span::styled(format!(" {} ", app.status), Style::default().fg(palette.fg).bold()),
        Span::styled(
            "│ [Tab]切换 [Enter]下载 [F2]主题 [Ctrl-L]清空 [PgUp/PgDn]滚动 [Esc]退出",
            Style::default().fg(palette.sub_fg),
        ),
    ]);
    frame.render_widget(Paragraph::new(status), area);
}

fn draw_notice(frame: &mut Frame, notice: &str, palette: &Palette) {
    let area = centered_rect(40, 20, frame.area());
    frame.render_widget(Clear, area);

    let popup = Paragraph::new(vec![
        Line::from(notice.to_string()).bold(),
        Line::default(),
        Line::from("按任意键关闭").style(Style::default().fg(palette.sub_fg)),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(card("Info", true, palette));

    frame.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
