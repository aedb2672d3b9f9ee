//! Tunefetch TUI - 交互式终端界面
//!
//! 使用 ratatui 提供链接输入、格式选择、下载进度和彩色日志。
//!
//! # 日志
//!
//! 日志默认显示在 TUI 的日志面板中。gamdl 的完整输出写入运行目录下的
//! `gamdl_output.log`。如需把内部日志输出到文件进行调试，设置 RUST_LOG：
//!
//! ```bash
//! RUST_LOG=debug cargo run -p tunefetch-tui 2>> /tmp/tunefetch.log
//! ```

mod app;
mod theme;
mod tui_log;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tunefetch_core::{AppSettings, RuntimePaths};

use app::{App, Field};
use tui_log::TuiLogLayer;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 可选参数：预填的链接
    let initial_url = std::env::args().nth(1);

    let settings_path = AppSettings::config_path();
    let settings = AppSettings::load_from(&settings_path);
    let mut app = App::new(RuntimePaths::discover(), settings, Some(settings_path));
    if let Some(url) = initial_url {
        app.url = url;
    }

    // 初始化日志系统，发送到 TUI 日志面板
    init_logging(app.event_tx.clone());
    app.check_environment();

    // Run app
    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

/// 初始化日志系统
///
/// - 总是将日志发送到 TUI 日志面板
/// - 如果设置了 RUST_LOG，同时输出到 stderr（用于调试）
fn init_logging(log_tx: tokio::sync::mpsc::Sender<app::AppEvent>) {
    // 桥接 log crate（tunefetch-core 使用）到 tracing
    let _ = tracing_log::LogTracer::init();

    let tui_layer = TuiLogLayer::new(log_tx);

    // 默认只显示 warn 及以上级别，避免内部日志淹没 gamdl 输出
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if std::env::var("RUST_LOG").is_ok() {
        use tracing_subscriber::fmt;

        let stderr_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tui_layer)
            .with(stderr_layer)
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tui_layer)
            .try_init();
    }
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        // 使用 poll 避免无限阻塞，同时保证事件及时被消费
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // 提示弹窗拦截所有按键
            if app.notice.is_some() {
                app.dismiss_notice();
                continue;
            }

            if !handle_key(&mut app, key) {
                return Ok(());
            }
        }

        // Update app state (handle async events)
        app.tick();

        // 让出执行权给后台任务
        tokio::task::yield_now().await;
    }
}

/// 处理按键，返回 `false` 表示退出
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Char('c') if ctrl => return false,
        KeyCode::Char('l') if ctrl => app.clear_logs(),
        KeyCode::F(2) => app.toggle_theme(),
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::Tab | KeyCode::Down => app.next_field(),
        KeyCode::BackTab | KeyCode::Up => app.previous_field(),
        KeyCode::PageUp => app.scroll_up(),
        KeyCode::PageDown => app.scroll_down(),
        KeyCode::Left | KeyCode::Right if app.focus == Field::Codec => app.cycle_codec(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(c) if !ctrl => app.input_char(c),
        _ => {}
    }
    true
}
