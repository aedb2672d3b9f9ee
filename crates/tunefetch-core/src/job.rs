//! 下载任务模型
//!
//! [`DownloadRequest`] 是用户填写的原始表单，
//! 校验通过后得到一次性的 [`DownloadJob`]。

use crate::error::JobError;
use crate::paths::RuntimePaths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// 歌曲编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Codec {
    /// m4a (AAC)，原始音轨
    #[default]
    AacLegacy,
    /// 转换后的 mp3
    Mp3,
}

impl Codec {
    pub const ALL: [Codec; 2] = [Codec::AacLegacy, Codec::Mp3];

    /// 界面显示名称
    pub fn label(&self) -> &'static str {
        match self {
            Codec::AacLegacy => "m4a (AAC - Original)",
            Codec::Mp3 => "mp3 (Converted)",
        }
    }

    /// gamdl 配置中的 `codec_song` 值
    pub fn id(&self) -> &'static str {
        match self {
            Codec::AacLegacy => "aac-legacy",
            Codec::Mp3 => "mp3",
        }
    }

    /// 从显示名称解析，未知名称回退到 mp3
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == label)
            .unwrap_or(Codec::Mp3)
    }

    /// 切换到下一个编码
    pub fn next(&self) -> Self {
        match self {
            Codec::AacLegacy => Codec::Mp3,
            Codec::Mp3 => Codec::AacLegacy,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s || c.label() == s)
            .ok_or_else(|| format!("unknown codec: {s} (expected aac-legacy or mp3)"))
    }
}

/// 用户提交的下载请求
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    pub url: String,
    /// 为空时使用默认下载目录
    pub output_dir: Option<PathBuf>,
    pub cookies_path: Option<PathBuf>,
    pub codec: Codec,
}

/// 校验后的下载任务
///
/// 构造一次子进程调用后即被丢弃。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadJob {
    pub id: uuid::Uuid,
    pub url: String,
    pub output_dir: PathBuf,
    pub cookies_path: PathBuf,
    pub codec: Codec,
}

impl DownloadRequest {
    /// 校验请求并创建任务
    ///
    /// 顺序：链接 → 可执行文件 → 输出目录（不存在则创建）→ cookies 文件。
    pub fn validate(
        &self,
        paths: &RuntimePaths,
        executable: Option<&Path>,
    ) -> Result<DownloadJob, JobError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(JobError::EmptyUrl);
        }
        if executable.is_none() {
            return Err(JobError::ExecutableNotFound);
        }

        // gamdl 在程序目录下运行，相对路径必须先按当前目录展开
        let output_dir = non_empty(self.output_dir.as_deref())
            .map_or_else(|| paths.default_output_dir.clone(), Path::to_path_buf);
        let output_dir = std::path::absolute(&output_dir)?;
        if !output_dir.exists() {
            std::fs::create_dir_all(&output_dir).map_err(|source| JobError::OutputDir {
                path: output_dir.clone(),
                source,
            })?;
            log::debug!("Created output directory {:?}", output_dir);
        }

        let cookies = non_empty(self.cookies_path.as_deref())
            .ok_or(JobError::CookiesNotFound(None))?;
        if !cookies.is_file() {
            return Err(JobError::CookiesNotFound(Some(cookies.to_path_buf())));
        }
        let cookies_path = canonical_file(cookies)?;

        Ok(DownloadJob {
            id: uuid::Uuid::new_v4(),
            url: url.to_string(),
            output_dir,
            cookies_path,
            codec: self.codec,
        })
    }
}

impl DownloadJob {
    /// cookies 路径（统一使用正斜杠，写入配置文件和命令行）
    pub fn cookies_posix(&self) -> String {
        self.cookies_path.to_string_lossy().replace('\\', "/")
    }
}

/// 规范化文件路径（展开 `..` 和符号链接）
#[cfg(not(windows))]
fn canonical_file(path: &Path) -> std::io::Result<PathBuf> {
    std::fs::canonicalize(path)
}

/// Windows 上去掉 `\\?\` 前缀，gamdl 不接受这种路径
#[cfg(windows)]
fn canonical_file(path: &Path) -> std::io::Result<PathBuf> {
    let canonical = std::fs::canonicalize(path)?;
    let stripped = canonical
        .to_str()
        .and_then(|text| text.strip_prefix(r"\\?\"))
        .filter(|rest| !rest.starts_with("UNC"))
        .map(PathBuf::from);
    Ok(stripped.unwrap_or(canonical))
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty() && !p.to_string_lossy().trim().is_empty())
}
