//! Tunefetch Core Library
//!
//! gamdl（Apple Music 下载工具）前端的核心实现库。
//!
//! # 模块
//!
//! - **classify**: 输出行分类（ANSI 清理、进度提取、颜色类别、前缀）
//! - **supervisor**: 生成配置、启动 gamdl 并流式读取输出
//! - **job**: 下载请求校验和任务模型
//! - **environment**: 启动时的依赖检查
//! - **config**: 用户设置持久化
//!
//! # 使用示例
//!
//! ```ignore
//! use tunefetch_core::{DownloadRequest, RuntimePaths, Supervisor, resolve_executable};
//!
//! let paths = RuntimePaths::discover();
//! let exe = resolve_executable(None);
//!
//! // 1. 校验请求
//! let job = request.validate(&paths, exe.as_deref())?;
//!
//! // 2. 在后台运行，事件按顺序到达
//! let (tx, mut rx) = tokio::sync::mpsc::channel(256);
//! Supervisor::new(exe.unwrap(), paths).spawn(job, tx);
//! while let Some(event) = rx.recv().await {
//!     // Progress / Log / Finished
//! }
//! ```

pub mod classify;
pub mod config;
pub mod environment;
pub mod error;
pub mod job;
pub mod logging;
pub mod paths;
pub mod supervisor;
pub mod tool_config;

pub use classify::{ClassifiedLine, classify, strip_ansi};
pub use config::{AppSettings, ThemeMode};
pub use environment::{EnvironmentReport, TOOL_NAME, check_environment, resolve_executable};
pub use error::JobError;
pub use job::{Codec, DownloadJob, DownloadRequest};
pub use logging::{Category, LogEntry, LogLevel, Prefix};
pub use paths::RuntimePaths;
pub use supervisor::{JobEvent, ProcessResult, Supervisor};
