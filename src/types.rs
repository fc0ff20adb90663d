// src/types.rs — 所有核心数据类型

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 加密类型（对应载荷中的 T 字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Encryption {
    #[value(name = "WPA")]
    #[serde(rename = "WPA")]
    Wpa,
    #[value(name = "WPA2")]
    #[serde(rename = "WPA2")]
    Wpa2,
    #[value(name = "WPA3")]
    #[serde(rename = "WPA3")]
    Wpa3,
    #[value(name = "WEP")]
    #[serde(rename = "WEP")]
    Wep,
    #[value(name = "nopass")]
    #[serde(rename = "nopass")]
    NoPass,
}

impl Encryption {
    pub fn needs_password(&self) -> bool {
        !matches!(self, Encryption::NoPass)
    }

    /// 载荷里的字面值
    pub fn as_str(&self) -> &'static str {
        match self {
            Encryption::Wpa => "WPA",
            Encryption::Wpa2 => "WPA2",
            Encryption::Wpa3 => "WPA3",
            Encryption::Wep => "WEP",
            Encryption::NoPass => "nopass",
        }
    }

    /// 严格匹配载荷字面值，未知值返回 None
    pub fn from_payload(s: &str) -> Option<Self> {
        match s {
            "WPA" => Some(Encryption::Wpa),
            "WPA2" => Some(Encryption::Wpa2),
            "WPA3" => Some(Encryption::Wpa3),
            "WEP" => Some(Encryption::Wep),
            "nopass" => Some(Encryption::NoPass),
            _ => None,
        }
    }
}

impl std::fmt::Display for Encryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 从载荷解出的 Wi-Fi 凭据
///
/// 可选字段保持原样：T/P 缺失时为 None，H 只有字面 "true" 才算隐藏。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredential {
    pub ssid: String,
    pub encryption: Option<String>,
    pub password: Option<String>,
    pub hidden: bool,
}

impl WifiCredential {
    /// 用于展示的加密方式
    pub fn encryption_label(&self) -> &str {
        match self.encryption.as_deref() {
            Some(s) if Encryption::from_payload(s) == Some(Encryption::NoPass) => "None/Open",
            Some(s) if !s.is_empty() => s,
            _ => "Unknown",
        }
    }

    /// 用于展示的密码，空或缺失显示 N/A
    pub fn password_label(&self) -> &str {
        match self.password.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => "N/A",
        }
    }

    /// 可直接复制的凭据文本
    pub fn credentials_text(&self) -> String {
        let pass = match self.password.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => "None",
        };
        format!("SSID: {}\nPassword: {}", self.ssid, pass)
    }

    /// 多行扫描报告
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("{:<10}: {}", "SSID", self.ssid)];
        if self.hidden {
            lines.push(format!("{:<10}: Yes", "Hidden"));
        }
        lines.push(format!("{:<10}: {}", "Encryption", self.encryption_label()));
        lines.push(format!("{:<10}: {}", "Password", self.password_label()));
        lines
    }
}

/// 载荷解析失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// 缺少 WIFI: 前缀
    #[error("Not a valid Wi-Fi QR code.")]
    NotWifiFormat,

    /// 有前缀但没有 S 字段
    #[error("Not a valid Wi-Fi QR code. SSID (S:) is missing.")]
    MissingSsid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(encryption: Option<&str>, password: Option<&str>, hidden: bool) -> WifiCredential {
        WifiCredential {
            ssid: "Home".into(),
            encryption: encryption.map(str::to_string),
            password: password.map(str::to_string),
            hidden,
        }
    }

    #[test]
    fn encryption_literals_match_payload() {
        for enc in [
            Encryption::Wpa,
            Encryption::Wpa2,
            Encryption::Wpa3,
            Encryption::Wep,
            Encryption::NoPass,
        ] {
            assert_eq!(Encryption::from_payload(enc.as_str()), Some(enc));
        }
        assert_eq!(Encryption::from_payload("wpa"), None);
        assert!(!Encryption::NoPass.needs_password());
        assert!(Encryption::Wep.needs_password());
    }

    #[test]
    fn labels_for_open_and_unknown() {
        assert_eq!(cred(Some("nopass"), None, false).encryption_label(), "None/Open");
        assert_eq!(cred(None, None, false).encryption_label(), "Unknown");
        assert_eq!(cred(Some("SAE"), None, false).encryption_label(), "SAE");
        assert_eq!(cred(None, Some(""), false).password_label(), "N/A");
    }

    #[test]
    fn credentials_text_defaults_password() {
        assert_eq!(
            cred(Some("WPA2"), Some("s3cret"), false).credentials_text(),
            "SSID: Home\nPassword: s3cret"
        );
        assert_eq!(
            cred(Some("nopass"), None, false).credentials_text(),
            "SSID: Home\nPassword: None"
        );
    }

    #[test]
    fn report_mentions_hidden_only_when_set() {
        let shown = cred(Some("WPA"), Some("x"), true).report_lines();
        assert!(shown.iter().any(|l| l.starts_with("Hidden")));
        let plain = cred(Some("WPA"), Some("x"), false).report_lines();
        assert!(!plain.iter().any(|l| l.starts_with("Hidden")));
        assert_eq!(plain.len(), 3);
    }
}
