//! 运行时路径
//!
//! 临时配置文件和输出日志放在程序所在目录，
//! 默认下载目录和 cookies 位置由用户主目录推导。

use std::path::{Path, PathBuf};

const TEMP_CONFIG_NAME: &str = "temp_config.ini";
const TRANSCRIPT_NAME: &str = "gamdl_output.log";
const COOKIES_NAME: &str = "cookies.txt";
const OUTPUT_FOLDER_NAME: &str = "Apple Music Download";
const DOCUMENTS_FOLDER_NAME: &str = "Apple Music";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    /// 程序所在目录，也是子进程的工作目录
    pub base_dir: PathBuf,
    /// 每次任务前重写的 gamdl 配置
    pub temp_config_file: PathBuf,
    /// 子进程完整输出
    pub transcript_file: PathBuf,
    /// `~/Documents/Apple Music/cookies.txt`
    pub documents_cookies: PathBuf,
    /// `<base_dir>/cookies.txt`
    pub local_cookies: PathBuf,
    /// `~/Downloads/Apple Music Download`
    pub default_output_dir: PathBuf,
}

impl RuntimePaths {
    /// 根据当前可执行文件位置和用户目录推导路径
    pub fn discover() -> Self {
        let base_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let home = dirs::home_dir().unwrap_or_else(|| base_dir.clone());
        let documents = dirs::document_dir().unwrap_or_else(|| home.join("Documents"));
        let downloads = dirs::download_dir().unwrap_or_else(|| home.join("Downloads"));

        Self {
            temp_config_file: base_dir.join(TEMP_CONFIG_NAME),
            transcript_file: base_dir.join(TRANSCRIPT_NAME),
            documents_cookies: documents.join(DOCUMENTS_FOLDER_NAME).join(COOKIES_NAME),
            local_cookies: base_dir.join(COOKIES_NAME),
            default_output_dir: downloads.join(OUTPUT_FOLDER_NAME),
            base_dir,
        }
    }

    /// 所有路径都位于 `base_dir` 之下（便携模式 / 测试）
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            temp_config_file: base_dir.join(TEMP_CONFIG_NAME),
            transcript_file: base_dir.join(TRANSCRIPT_NAME),
            documents_cookies: base_dir
                .join("Documents")
                .join(DOCUMENTS_FOLDER_NAME)
                .join(COOKIES_NAME),
            local_cookies: base_dir.join(COOKIES_NAME),
            default_output_dir: base_dir.join(OUTPUT_FOLDER_NAME),
            base_dir,
        }
    }

    /// 查找已有的 cookies 文件，文档目录优先
    pub fn find_cookies(&self) -> Option<PathBuf> {
        [&self.documents_cookies, &self.local_cookies]
            .into_iter()
            .find(|p| p.is_file())
            .cloned()
    }
}
