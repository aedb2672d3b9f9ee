//! 日志模块
//!
//! 提供跨 UI 的统一日志类别、级别和条目定义。
//! CLI 和 TUI 都只根据这里的类型决定颜色和缩进，不关心日志来源。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 日志类别
///
/// 对应日志面板中的颜色标签，`None` 表示普通文本。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// 红色
    Error,
    /// 黄色
    Warning,
    /// 绿色
    Success,
    /// 青色，用于下载完成/目标文件提示
    Highlight,
    /// 反色标题行
    Header,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Error => "error",
            Category::Warning => "warning",
            Category::Success => "success",
            Category::Highlight => "highlight",
            Category::Header => "header",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 行前缀
///
/// 决定一行日志在面板中的排版方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prefix {
    #[default]
    None,
    /// 缩进若干空格
    Indent(u8),
    /// 在该行之前插入一个空行（新阶段）
    SectionBreak,
}

impl Prefix {
    /// 将前缀应用到文本上，得到最终显示的字符串
    pub fn apply(&self, text: &str) -> String {
        match self {
            Prefix::None => text.to_string(),
            Prefix::Indent(width) => format!("{:width$}{}", "", text, width = *width as usize),
            Prefix::SectionBreak => format!("\n{}", text),
        }
    }
}

/// 日志级别
///
/// 用于把 tracing/log 事件映射到日志面板。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// 获取显示名称
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// 对应的面板类别
    pub fn category(&self) -> Option<Category> {
        match self {
            LogLevel::Error => Some(Category::Error),
            LogLevel::Warn => Some(Category::Warning),
            _ => None,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ERROR" => Ok(LogLevel::Error),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "TRACE" => Ok(LogLevel::Trace),
            // 未知级别宽容处理为 Info
            _ => Ok(LogLevel::Info),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 日志面板中的一条记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub category: Option<Category>,
    #[serde(default)]
    pub prefix: Prefix,
    pub message: String,
}

impl LogEntry {
    pub fn new(category: Option<Category>, message: impl Into<String>) -> Self {
        Self {
            category,
            prefix: Prefix::None,
            message: message.into(),
        }
    }

    pub fn plain(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Some(Category::Error), message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Some(Category::Warning), message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Some(Category::Success), message)
    }

    pub fn header(message: impl Into<String>) -> Self {
        Self::new(Some(Category::Header), message)
    }

    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = prefix;
        self
    }

    /// 应用前缀后的显示文本（可能包含前导换行）
    pub fn display_text(&self) -> String {
        self.prefix.apply(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_apply() {
        assert_eq!(Prefix::None.apply("abc"), "abc");
        assert_eq!(Prefix::Indent(4).apply("abc"), "    abc");
        assert_eq!(Prefix::SectionBreak.apply("abc"), "\nabc");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("bogus".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!(LogLevel::Error.category(), Some(Category::Error));
        assert_eq!(LogLevel::Debug.category(), None);
    }

    #[test]
    fn test_entry_serialization() {
        let entry = LogEntry::success("Finished").with_prefix(Prefix::SectionBreak);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"category\":\"success\""));
        assert!(json.contains("\"prefix\":\"section_break\""));
    }
}
