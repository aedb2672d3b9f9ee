//! 运行环境检查
//!
//! 启动时检查 gamdl 及其依赖工具是否可用，并查找 cookies 文件。
//! 缺失的依赖只会报告，不会阻止程序启动。

use crate::logging::LogEntry;
use crate::paths::RuntimePaths;
use std::path::{Path, PathBuf};

/// 下载工具名称
pub const TOOL_NAME: &str = "gamdl";

/// gamdl 运行时依赖的辅助工具
const HELPER_TOOLS: &[&str] = &["ffmpeg", "mp4decrypt"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub name: &'static str,
    pub path: Option<PathBuf>,
}

impl ToolStatus {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

/// 环境检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentReport {
    /// 解析到的 gamdl 路径
    pub executable: Option<PathBuf>,
    pub helpers: Vec<ToolStatus>,
    pub cookies: Option<PathBuf>,
}

/// 解析 gamdl 路径
///
/// 设置中指定的路径优先；否则在 PATH 中查找。
pub fn resolve_executable(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        log::warn!(
            "Configured executable {:?} does not exist, falling back to PATH",
            path
        );
    }
    which::which(TOOL_NAME).ok()
}

/// 执行完整的环境检查
pub fn check_environment(paths: &RuntimePaths, override_path: Option<&Path>) -> EnvironmentReport {
    let executable = resolve_executable(override_path);
    let helpers = HELPER_TOOLS
        .iter()
        .map(|&name| ToolStatus {
            name,
            path: locate_helper(paths, name),
        })
        .collect();

    EnvironmentReport {
        executable,
        helpers,
        cookies: paths.find_cookies(),
    }
}

/// 在 PATH 或程序目录（`<name>.exe`）中查找辅助工具
fn locate_helper(paths: &RuntimePaths, name: &str) -> Option<PathBuf> {
    which::which(name).ok().or_else(|| {
        let bundled = paths.base_dir.join(format!("{name}.exe"));
        bundled.is_file().then_some(bundled)
    })
}

impl EnvironmentReport {
    /// 渲染为日志面板条目
    pub fn entries(&self) -> Vec<LogEntry> {
        let mut entries = vec![LogEntry::plain("--- SYSTEM CHECK ---")];

        match &self.executable {
            Some(path) => entries.push(LogEntry::success(format!(
                "[OK] Gamdl found: {}",
                path.display()
            ))),
            None => entries.push(LogEntry::error(
                "[ERROR] Gamdl not found in PATH! Install it via pip.",
            )),
        }

        for tool in &self.helpers {
            if tool.found() {
                entries.push(LogEntry::success(format!("[OK] {} found.", tool.name)));
            } else {
                entries.push(LogEntry::warning(format!(
                    "[WARNING] {} not found.",
                    tool.name
                )));
            }
        }

        match &self.cookies {
            Some(path) => entries.push(LogEntry::success(format!(
                "[OK] Cookies found: {}",
                path.display()
            ))),
            None => entries.push(LogEntry::warning("[WARNING] cookies.txt not found.")),
        }

        if self.executable.is_some() {
            entries.push(LogEntry::plain("--------------------------"));
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Category;

    #[test]
    fn test_report_entries_all_missing() {
        let report = EnvironmentReport {
            executable: None,
            helpers: vec![ToolStatus {
                name: "ffmpeg",
                path: None,
            }],
            cookies: None,
        };
        let entries = report.entries();
        assert_eq!(entries[0].message, "--- SYSTEM CHECK ---");
        assert_eq!(entries[1].category, Some(Category::Error));
        assert_eq!(entries[2].message, "[WARNING] ffmpeg not found.");
        assert_eq!(entries[3].category, Some(Category::Warning));
        // gamdl 缺失时不输出结尾分隔线
        assert_eq!(entries.len(), 4);
    }

    #[test]
    fn test_report_entries_all_found() {
        let report = EnvironmentReport {
            executable: Some(PathBuf::from("/usr/bin/gamdl")),
            helpers: vec![ToolStatus {
                name: "mp4decrypt",
                path: Some(PathBuf::from("/usr/bin/mp4decrypt")),
            }],
            cookies: Some(PathBuf::from("/tmp/cookies.txt")),
        };
        let entries = report.entries();
        assert_eq!(entries[1].message, "[OK] Gamdl found: /usr/bin/gamdl");
        assert_eq!(entries[2].message, "[OK] mp4decrypt found.");
        assert_eq!(entries[3].message, "[OK] Cookies found: /tmp/cookies.txt");
        assert!(
            entries[1..4]
                .iter()
                .all(|e| e.category == Some(Category::Success))
        );
        assert_eq!(entries.len(), 5);
    }

    #[test]
    fn test_override_must_exist() {
        let missing = Path::new("/nonexistent/tunefetch/gamdl");
        // 回退到 PATH 查找；结果取决于环境，只要不是无效路径即可
        assert_ne!(resolve_executable(Some(missing)).as_deref(), Some(missing));
    }

    #[test]
    fn test_bundled_helper_found_in_base_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = RuntimePaths::with_base_dir(dir.path());
        let name = "tunefetch-test-helper";
        std::fs::write(dir.path().join(format!("{name}.exe")), "").unwrap();
        assert_eq!(
            locate_helper(&paths, name),
            Some(dir.path().join(format!("{name}.exe")))
        );
    }
}
