//! 应用配置和持久化
//!
//! 提供下载目录、cookies 路径、编码和界面主题等设置的存储和读取。

use crate::job::Codec;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 界面主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggle(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

/// 应用设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    /// 下载目录（未设置时使用默认目录）
    pub output_dir: Option<PathBuf>,
    /// cookies 文件（未设置时自动查找）
    pub cookies_path: Option<PathBuf>,
    /// 歌曲编码
    pub codec: Codec,
    /// 界面主题
    pub theme: ThemeMode,
    /// 指定 gamdl 可执行文件（未设置时在 PATH 中查找）
    pub executable: Option<PathBuf>,
}

impl AppSettings {
    /// 获取配置文件路径
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tunefetch");
        config_dir.join("settings.toml")
    }

    /// 加载设置（如果文件不存在则使用默认值）
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(settings) => {
                        debug!("Loaded settings from {:?}", path);
                        return settings;
                    }
                    Err(e) => {
                        log::warn!("Failed to parse settings: {}, using defaults", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read settings file: {}, using defaults", e);
                }
            }
        }
        Self::default()
    }

    /// 保存设置
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        debug!("Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.codec, Codec::AacLegacy);
        assert_eq!(settings.theme, ThemeMode::Light);
        assert!(settings.output_dir.is_none());
    }

    #[test]
    fn test_roundtrip_and_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let settings = AppSettings {
            output_dir: Some(PathBuf::from("/music")),
            codec: Codec::Mp3,
            theme: ThemeMode::Dark,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("codec = \"mp3\""));
        assert!(content.contains("theme = \"dark\""));
        assert_eq!(AppSettings::load_from(&path), settings);

        // 缺少字段时使用默认值
        fs::write(&path, "theme = \"dark\"\n").unwrap();
        let loaded = AppSettings::load_from(&path);
        assert_eq!(loaded.theme, ThemeMode::Dark);
        assert_eq!(loaded.codec, Codec::AacLegacy);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "codec = [not valid").unwrap();
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());
        assert_eq!(
            AppSettings::load_from(&dir.path().join("missing.toml")),
            AppSettings::default()
        );
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(ThemeMode::Light.toggle(), ThemeMode::Dark);
        assert_eq!(ThemeMode::Dark.toggle().toggle(), ThemeMode::Dark);
    }
}
