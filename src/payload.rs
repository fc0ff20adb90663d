// src/payload.rs — Wi-Fi 二维码载荷的编码与解析
//
// 格式: WIFI:S:<ssid>;T:<WPA|WPA2|WPA3|WEP|nopass>;P:<password>;H:true;;
// 字段值中的 \ ; , " ' 一律加反斜杠转义。

use crate::types::{Encryption, ParseError, WifiCredential};
use std::collections::HashMap;

const PREFIX: &str = "WIFI:";

/// 需要转义的保留字符
fn is_reserved(c: char) -> bool {
    matches!(c, '\\' | ';' | ',' | '"' | '\'')
}

/// 转义单个字段值（必须逐字段转义，不能对拼好的整串转义）
pub fn escape_field(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if is_reserved(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// 反转义：只去掉保留字符前的反斜杠，其余反斜杠原样保留
pub fn unescape_field(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if is_reserved(next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// 生成载荷字符串。空 SSID 不做特殊处理，由调用方决定是否生成
pub fn encode(ssid: &str, password: &str, encryption: Encryption, hidden: bool) -> String {
    let mut out = format!("{PREFIX}S:{};T:{};", escape_field(ssid), encryption);
    if encryption.needs_password() {
        out.push_str(&format!("P:{};", escape_field(password)));
    }
    if hidden {
        out.push_str("H:true;");
    }
    out.push(';');
    out
}

/// 表单侧的生成策略：SSID 为空时不产生载荷
pub fn build(ssid: &str, password: &str, encryption: Encryption, hidden: bool) -> Option<String> {
    if ssid.is_empty() {
        return None;
    }
    Some(encode(ssid, password, encryption, hidden))
}

/// 解析载荷字符串
pub fn decode(raw: &str) -> Result<WifiCredential, ParseError> {
    let body = raw.strip_prefix(PREFIX).ok_or(ParseError::NotWifiFormat)?;

    let mut fields: HashMap<String, String> = HashMap::new();
    for chunk in split_fields(body) {
        let (key, value) = split_key_value(chunk);
        // 重复的键以最后一次为准
        fields.insert(key.to_string(), unescape_field(value));
    }
    tracing::debug!(keys = ?fields.keys().collect::<Vec<_>>(), "payload fields");

    let ssid = match fields.remove("S") {
        Some(s) if !s.is_empty() => s,
        _ => return Err(ParseError::MissingSsid),
    };

    Ok(WifiCredential {
        ssid,
        encryption: fields.remove("T"),
        password: fields.remove("P"),
        hidden: fields.get("H").map(String::as_str) == Some("true"),
    })
}

/// 按未转义的 ';' 切分字段，跳过空块（末尾的终止符会产生空块）
fn split_fields(body: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ';' => {
                if i > start {
                    out.push(&body[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < body.len() {
        out.push(&body[start..]);
    }
    out
}

/// 在第一个未转义的 ':' 处切成键和值；值里后续的 ':' 保持原样
fn split_key_value(chunk: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in chunk.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ':' => return (&chunk[..i], &chunk[i + 1..]),
            _ => {}
        }
    }
    (chunk, "")
}
