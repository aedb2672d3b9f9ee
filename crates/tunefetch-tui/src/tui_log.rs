//! TUI 日志层
//!
//! 把程序内部的 tracing 事件（包括经 LogTracer 转发的 `log` 记录）
//! 转换成日志面板条目，与 gamdl 的输出显示在同一个面板中。

use crate::app::AppEvent;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tunefetch_core::{LogEntry, LogLevel};

/// 发送日志到 TUI 的 Layer
pub struct TuiLogLayer {
    tx: mpsc::Sender<AppEvent>,
}

impl TuiLogLayer {
    pub fn new(tx: mpsc::Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl<S> Layer<S> for TuiLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));

        let entry = panel_entry(*metadata.level(), metadata.target(), &message);
        // 面板来不及消费时丢弃，避免阻塞调用方
        let _ = self.tx.try_send(AppEvent::Log(entry));
    }
}

fn log_level(level: Level) -> LogLevel {
    match level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warn,
        Level::INFO => LogLevel::Info,
        Level::DEBUG => LogLevel::Debug,
        Level::TRACE => LogLevel::Trace,
    }
}

/// 面板条目：`WARN tunefetch_core::environment: ...`，颜色由级别决定
fn panel_entry(level: Level, target: &str, message: &str) -> LogEntry {
    let level = log_level(level);
    let text = if message.is_empty() {
        format!("{} {target}", level.name())
    } else {
        format!("{} {target}: {message}", level.name())
    };
    LogEntry::new(level.category(), text)
}

/// 提取事件中的 `message` 字段，没有时使用第一个字段
struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
        } else if self.0.is_empty() {
            *self.0 = format!("{}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            *self.0 = value.to_string();
        } else if self.0.is_empty() {
            *self.0 = format!("{}={}", field.name(), value);
        }
    }
}
