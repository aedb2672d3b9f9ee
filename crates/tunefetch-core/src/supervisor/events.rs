//! 任务事件
//!
//! 工作任务通过 mpsc 通道按顺序发送这些事件，UI 线程在每个 tick 中消费。

use crate::logging::LogEntry;
use serde::Serialize;
use std::process::ExitStatus;

/// 一次下载任务的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessResult {
    /// 退出码为 0
    Success,
    /// 非零退出码；被信号终止时没有退出码
    Failed { code: Option<i32> },
    /// 子进程未能启动（或配置/日志文件无法写入）
    LaunchFailed { message: String },
}

impl ProcessResult {
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            ProcessResult::Success
        } else {
            ProcessResult::Failed {
                code: status.code(),
            }
        }
    }

    pub fn launch_failed(err: impl std::fmt::Display) -> Self {
        ProcessResult::LaunchFailed {
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessResult::Success)
    }

    /// 状态栏文本
    pub fn status_text(&self) -> &'static str {
        match self {
            ProcessResult::Success => "Done",
            ProcessResult::Failed { .. } | ProcessResult::LaunchFailed { .. } => "Error",
        }
    }

    /// 结束时追加到日志面板的一行
    pub fn summary(&self) -> LogEntry {
        match self {
            ProcessResult::Success => LogEntry::success("Download complete!"),
            ProcessResult::Failed { code: Some(code) } => LogEntry::error(format!("Code: {code}")),
            ProcessResult::Failed { code: None } => {
                LogEntry::error("Code: none (terminated by signal)")
            }
            ProcessResult::LaunchFailed { message } => {
                LogEntry::error(format!("Launch error: {message}"))
            }
        }
    }
}

/// 工作任务发出的事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    Progress { percent: f64 },
    Log { entry: LogEntry },
    Finished { result: ProcessResult },
}

impl JobEvent {
    pub fn log(entry: LogEntry) -> Self {
        JobEvent::Log { entry }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Category;

    #[test]
    fn test_summary_entries() {
        assert_eq!(ProcessResult::Success.status_text(), "Done");

        let failed = ProcessResult::Failed { code: Some(1) };
        assert_eq!(failed.status_text(), "Error");
        assert_eq!(failed.summary().message, "Code: 1");
        assert_eq!(failed.summary().category, Some(Category::Error));

        let launch = ProcessResult::launch_failed("No such file or directory");
        assert_eq!(
            launch.summary().message,
            "Launch error: No such file or directory"
        );
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(JobEvent::Finished {
            result: ProcessResult::Failed { code: Some(2) },
        })
        .unwrap();
        assert_eq!(json["type"], "finished");
        assert_eq!(json["result"]["status"], "failed");
        assert_eq!(json["result"]["code"], 2);

        let json = serde_json::to_value(JobEvent::Progress { percent: 42.5 }).unwrap();
        assert_eq!(json["percent"], 42.5);
    }
}
