//! gamdl 输出分类器
//!
//! 把子进程的一行原始输出转换为 [`ClassifiedLine`]：
//! 去除 ANSI 控制序列、提取下载百分比、判定颜色类别和前缀。
//!
//! 规则以有序表的形式给出，自上而下匹配，先命中者生效。

use crate::logging::{Category, LogEntry, Prefix};
use regex::Regex;
use std::sync::LazyLock;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").unwrap());

static PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\.?\d*)%").unwrap());

/// 下载进度行的标记
pub const PROGRESS_MARKER: &str = "[download]";

/// 进度行中表示"已完成"的标记
const COMPLETION_MARKERS: &[&str] = &["100%", "Destination"];

/// 完成/目标文件行的缩进
const DESTINATION_INDENT: u8 = 8;

/// 类别规则（按优先级排列）
const CATEGORY_RULES: &[(&[&str], Category)] = &[
    (&["ERROR", "Traceback"], Category::Error),
    (&["WARNING"], Category::Warning),
    (
        &["INFO", "Downloading", "Finished", "Processing"],
        Category::Success,
    ),
];

/// 前缀规则（按优先级排列）
const PREFIX_RULES: &[(&[&str], Prefix)] = &[
    (&["Processing", "Finished"], Prefix::SectionBreak),
    (&["Downloading"], Prefix::Indent(4)),
];

/// 分类结果
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine {
    /// 去除控制序列后的文本
    pub text: String,
    pub category: Option<Category>,
    /// 下载进度，范围 [0, 100]
    pub progress: Option<f64>,
    pub prefix: Prefix,
    /// 是否显示在日志面板（纯进度行不显示）
    pub visible: bool,
}

impl ClassifiedLine {
    /// 转换为日志面板条目，纯进度行返回 `None`
    pub fn entry(&self) -> Option<LogEntry> {
        self.visible
            .then(|| LogEntry::new(self.category, self.text.clone()).with_prefix(self.prefix))
    }
}

/// 去除 ANSI/VT 控制序列
pub fn strip_ansi(line: &str) -> String {
    ANSI_ESCAPE.replace_all(line, "").into_owned()
}

/// 分类一行输出
///
/// 去除控制序列后为空的行返回 `None`。
pub fn classify(raw: &str) -> Option<ClassifiedLine> {
    let stripped = strip_ansi(raw);
    let clean = stripped.trim();
    if clean.is_empty() {
        return None;
    }

    if clean.contains(PROGRESS_MARKER) {
        let progress = extract_percent(clean);
        let completed = COMPLETION_MARKERS.iter().any(|m| clean.contains(m));
        let prefix = if completed {
            Prefix::Indent(DESTINATION_INDENT)
        } else {
            Prefix::None
        };
        return Some(ClassifiedLine {
            text: clean.to_string(),
            category: completed.then_some(Category::Highlight),
            progress,
            prefix,
            visible: completed,
        });
    }

    Some(ClassifiedLine {
        text: clean.to_string(),
        category: match_rules(clean, CATEGORY_RULES),
        progress: None,
        prefix: match_rules(clean, PREFIX_RULES).unwrap_or_default(),
        visible: true,
    })
}

/// 提取第一个 `N%`，解析失败时静默忽略
fn extract_percent(text: &str) -> Option<f64> {
    let caps = PERCENT.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    if value.is_nan() {
        return None;
    }
    Some(value.clamp(0.0, 100.0))
}

fn match_rules<T: Copy>(text: &str, rules: &[(&[&str], T)]) -> Option<T> {
    rules
        .iter()
        .find(|(markers, _)| markers.iter().any(|m| text.contains(m)))
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[32mINFO\x1b[0m done"), "INFO done");
        assert_eq!(strip_ansi("\x1bMreverse"), "reverse");
        assert_eq!(strip_ansi("no escapes"), "no escapes");
    }

    #[test]
    fn test_empty_lines_dropped() {
        assert!(classify("").is_none());
        assert!(classify("   \t").is_none());
        assert!(classify("\x1b[2K\x1b[1G").is_none());
    }

    #[test]
    fn test_progress_extracted_exactly() {
        for value in [0.0, 1.0, 7.5, 42.5, 99.9, 100.0] {
            let line = classify(&format!("[download] {value}% of 3.2MiB")).unwrap();
            assert_eq!(line.progress, Some(value));
        }
    }

    #[test]
    fn test_progress_only_line_is_hidden() {
        let line = classify("[download]  12.3% of 4.00MiB at 1.2MiB/s ETA 00:03").unwrap();
        assert_eq!(line.progress, Some(12.3));
        assert!(!line.visible);
        assert!(line.entry().is_none());
    }

    #[test]
    fn test_progress_clamped() {
        let line = classify("[download] 250% overshoot").unwrap();
        assert_eq!(line.progress, Some(100.0));
    }

    #[test]
    fn test_malformed_percent_skips_progress() {
        let line = classify("[download] abc% of ???").unwrap();
        assert_eq!(line.progress, None);
        assert!(!line.visible);

        let line = classify("[download] Destination: track.m4a (%)").unwrap();
        assert_eq!(line.progress, None);
        assert_eq!(line.category, Some(Category::Highlight));
    }

    #[test]
    fn test_destination_line_highlighted() {
        let line = classify("[download] Destination: /music/song.m4a").unwrap();
        assert!(line.visible);
        assert_eq!(line.category, Some(Category::Highlight));
        assert_eq!(line.prefix, Prefix::Indent(8));
        assert_eq!(
            line.entry().unwrap().display_text(),
            "        [download] Destination: /music/song.m4a"
        );
    }

    #[test]
    fn test_error_takes_precedence() {
        let line = classify("INFO Downloading failed: ERROR 403").unwrap();
        assert_eq!(line.category, Some(Category::Error));

        let line = classify("WARNING: Traceback follows").unwrap();
        assert_eq!(line.category, Some(Category::Error));

        let line = classify("[INFO] WARNING retrying").unwrap();
        assert_eq!(line.category, Some(Category::Warning));
    }

    #[test]
    fn test_neutral_line() {
        let line = classify("some unrelated chatter").unwrap();
        assert_eq!(line.category, None);
        assert_eq!(line.prefix, Prefix::None);
        assert!(line.visible);
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(
            classify("Processing album").unwrap().prefix,
            Prefix::SectionBreak
        );
        assert_eq!(
            classify("Finished with 0 errors").unwrap().prefix,
            Prefix::SectionBreak
        );
        assert_eq!(
            classify("Downloading \"Song\"").unwrap().prefix,
            Prefix::Indent(4)
        );
        // Processing 优先于 Downloading
        assert_eq!(
            classify("Processing / Downloading").unwrap().prefix,
            Prefix::SectionBreak
        );
    }

    #[test]
    fn test_strip_is_idempotent_for_classification() {
        let raw_lines = [
            "\x1b[31mERROR\x1b[0m: boom",
            "\x1b[33mWARNING\x1b[0m: slow",
            "\x1b[1mProcessing\x1b[0m album",
            "  \x1b[32mDownloading\x1b[0m track 1",
            "[download] \x1b[36m55.0%\x1b[0m",
        ];
        for raw in raw_lines {
            let original = classify(raw).unwrap();
            let again = classify(&strip_ansi(raw)).unwrap();
            assert_eq!(original.category, again.category, "{raw:?}");
            assert_eq!(original.prefix, again.prefix, "{raw:?}");
            assert_eq!(original.progress, again.progress, "{raw:?}");
        }
    }
}
