// src/config.rs — 配置加载，支持文件覆盖

use crate::types::Encryption;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 深色模块颜色
    pub dark_color: String,
    /// 背景颜色
    pub light_color: String,
    /// PNG / SVG 导出边长（像素）
    pub png_size: u32,
    /// 纠错等级 L / M / Q / H
    pub ec_level: String,
    /// 是否保留四周静区
    pub quiet_zone: bool,
    /// generate 未指定 -e 时使用的加密方式
    pub default_encryption: Encryption,
    /// 导出文件目录，未设置则写到当前目录
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dark_color: "#000000".into(),
            light_color: "#FFFFFF".into(),
            png_size: 512,
            ec_level: "H".into(),
            quiet_zone: true,
            default_encryption: Encryption::Wpa2,
            output_dir: None,
        }
    }
}

impl Config {
    /// 按优先级查找并加载配置文件；显式路径不存在视为错误
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for path in &config_candidates() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        tracing::debug!("no config file found, using defaults");
        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let cfg = Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// 导出文件的完整路径
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

fn config_candidates() -> Vec<PathBuf> {
    let mut v = vec![];
    // 同目录下的 config.toml
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            v.push(dir.join("config.toml"));
        }
    }
    // ~/.config/wifi-qr/config.toml
    if let Some(dir) = dirs::config_dir() {
        v.push(dir.join("wifi-qr/config.toml"));
    }
    v
}
