//! 错误类型

use std::path::PathBuf;

/// 提交下载请求时的校验错误
///
/// 这些错误会立即报告给用户，任务不会启动。
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Enter a link")]
    EmptyUrl,

    #[error("gamdl executable not found")]
    ExecutableNotFound,

    #[error("Folder creation error: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cookies file not found!")]
    CookiesNotFound(Option<PathBuf>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// 是否只是提示信息（而非错误）
    pub fn is_notice(&self) -> bool {
        matches!(self, JobError::EmptyUrl)
    }
}
