// src/qr.rs — 用 qrcode crate 把载荷渲染成终端块字符 / SVG / PNG

use crate::config::Config;
use anyhow::{anyhow, bail, Context, Result};
use base64::Engine as _;
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use qrcode::render::{svg, unicode};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Logo 文件大小上限（1 MiB）
const MAX_LOGO_BYTES: u64 = 1024 * 1024;

/// Logo 占二维码边长的比例
const LOGO_RATIO: f32 = 0.2;

/// 标准二维码四周静区宽度（模块数）
const QUIET_ZONE_MODULES: u32 = 4;

/// 每个模块至少占的像素数，低于此值扫描器无法可靠识别
const MIN_MODULE_PX: u32 = 3;

/// 导出样式
#[derive(Debug, Clone)]
pub struct QrStyle {
    /// 深色模块颜色（#RRGGBB）
    pub dark: String,
    /// 背景颜色（#RRGGBB）
    pub light: String,
    /// 导出边长（像素）
    pub size: u32,
    pub ec_level: EcLevel,
    pub quiet_zone: bool,
    /// 居中叠加的 logo
    pub logo: Option<PathBuf>,
}

impl QrStyle {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let style = Self {
            dark: normalize_hex(&cfg.dark_color)?,
            light: normalize_hex(&cfg.light_color)?,
            size: cfg.png_size,
            ec_level: parse_ec_level(&cfg.ec_level)?,
            quiet_zone: cfg.quiet_zone,
            logo: None,
        };
        Ok(style)
    }

    /// 含静区在内的边长（模块数）
    fn modules(&self, code: &QrCode) -> u32 {
        let quiet = if self.quiet_zone { 2 * QUIET_ZONE_MODULES } else { 0 };
        code.width() as u32 + quiet
    }

    /// 单个模块的像素数：不小于 size 的最小整数倍
    fn module_px(&self, code: &QrCode) -> u32 {
        self.size.div_ceil(self.modules(code))
    }
}

/// 生成终端可显示的二维码字符串（UTF-8 块字符）
pub fn render_terminal(data: &str) -> Result<String> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)?;
    let image = code
        .render::<unicode::Dense1x2>()
        .quiet_zone(true)
        .build();

    // 每行加两个前导空格，终端里看起来不贴边
    let padded = image
        .lines()
        .map(|l| format!("  {l}"))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(padded)
}

/// 载荷在当前样式下可导出的最小边长
pub fn min_size(data: &str, style: &QrStyle) -> Result<u32> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), style.ec_level)?;
    Ok(style.modules(&code) * MIN_MODULE_PX)
}

fn encode_checked(data: &str, style: &QrStyle) -> Result<QrCode> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), style.ec_level)?;
    let min = style.modules(&code) * MIN_MODULE_PX;
    if style.size < min {
        bail!(
            "Size {}px is too small for this QR code; use at least {min}px.",
            style.size
        );
    }
    Ok(code)
}

/// 生成 SVG 文本，有 logo 时以 data URI 内嵌
pub fn render_svg(data: &str, style: &QrStyle) -> Result<String> {
    let code = encode_checked(data, style)?;
    let px = style.module_px(&code);
    let mut svg = code
        .render()
        .module_dimensions(px, px)
        .dark_color(svg::Color(&style.dark))
        .light_color(svg::Color(&style.light))
        .quiet_zone(style.quiet_zone)
        .build();

    if let Some(path) = &style.logo {
        let side_total = style.modules(&code) * px;
        let side = logo_side(side_total);
        let offset = (side_total - side) / 2;
        let logo = load_logo(path, side)?;
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(logo).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        let href = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let overlay = format!(
            r#"<rect x="{offset}" y="{offset}" width="{side}" height="{side}" fill="{light}"/><image x="{offset}" y="{offset}" width="{side}" height="{side}" href="{href}"/>"#,
            light = style.light,
        );
        let end = svg
            .rfind("</svg>")
            .ok_or_else(|| anyhow!("renderer produced malformed SVG"))?;
        svg.insert_str(end, &overlay);
    }
    Ok(svg)
}

/// 生成 size × size 的位图，可选居中 logo
pub fn render_image(data: &str, style: &QrStyle) -> Result<RgbaImage> {
    let code = encode_checked(data, style)?;
    let dark = parse_hex_color(&style.dark)?;
    let light = parse_hex_color(&style.light)?;
    let px = style.module_px(&code);

    let raw = code
        .render::<Rgba<u8>>()
        .dark_color(dark)
        .light_color(light)
        .quiet_zone(style.quiet_zone)
        .module_dimensions(px, px)
        .build();

    // 整数倍渲染后缩到精确尺寸；最近邻保持模块边缘锐利
    let mut img = if raw.width() == style.size && raw.height() == style.size {
        raw
    } else {
        imageops::resize(&raw, style.size, style.size, imageops::FilterType::Nearest)
    };

    if let Some(path) = &style.logo {
        overlay_logo(&mut img, path, light)?;
    }

    Ok(img)
}

/// 生成 PNG 字节
pub fn render_png(data: &str, style: &QrStyle) -> Result<Vec<u8>> {
    let img = render_image(data, style)?;
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn logo_side(total: u32) -> u32 {
    ((total as f32) * LOGO_RATIO).round().max(1.0) as u32
}

/// 读取 logo 并缩放成 side × side；超过 1 MiB 直接拒绝
fn load_logo(path: &Path, side: u32) -> Result<RgbaImage> {
    let len = std::fs::metadata(path)
        .with_context(|| format!("cannot read logo {}", path.display()))?
        .len();
    if len > MAX_LOGO_BYTES {
        bail!("Logo image is too large. Please use an image under 1MB.");
    }
    let logo = image::open(path)
        .with_context(|| format!("cannot decode logo {}", path.display()))?
        .resize_exact(side, side, imageops::FilterType::Triangle)
        .to_rgba8();
    Ok(logo)
}

/// 把 logo 贴到中心，下方区域先挖空成背景色
fn overlay_logo(img: &mut RgbaImage, path: &Path, background: Rgba<u8>) -> Result<()> {
    let side = logo_side(img.width());
    let logo = load_logo(path, side)?;

    let x = (img.width() - side) / 2;
    let y = (img.height() - side) / 2;
    for py in y..y + side {
        for px in x..x + side {
            img.put_pixel(px, py, background);
        }
    }
    imageops::overlay(img, &logo, i64::from(x), i64::from(y));
    tracing::debug!(side, "logo overlaid");
    Ok(())
}

/// 导出文件名：wifi-qr-<ssid>.<ext>，非字母数字替换成 _
pub fn export_file_name(ssid: &str, ext: &str) -> String {
    let slug: String = ssid
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let slug = if slug.is_empty() { "qrcode".to_string() } else { slug };
    format!("wifi-qr-{slug}.{ext}")
}

/// 解析 #RGB / #RRGGBB
pub fn parse_hex_color(s: &str) -> Result<Rgba<u8>> {
    let hex = normalize_hex(s)?;
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    Ok(Rgba([channel(1)?, channel(3)?, channel(5)?, 255]))
}

/// 统一成大写 #RRGGBB
pub fn normalize_hex(s: &str) -> Result<String> {
    let body = s
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| anyhow!("colour must start with '#': {s}"))?;
    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("invalid hex colour: {s}");
    }
    let full = match body.len() {
        3 => body.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => body.to_string(),
        _ => bail!("hex colour must have 3 or 6 digits: {s}"),
    };
    Ok(format!("#{}", full.to_ascii_uppercase()))
}

/// 纠错等级 L / M / Q / H
pub fn parse_ec_level(s: &str) -> Result<EcLevel> {
    match s.trim().to_ascii_uppercase().as_str() {
        "L" => Ok(EcLevel::L),
        "M" => Ok(EcLevel::M),
        "Q" => Ok(EcLevel::Q),
        "H" => Ok(EcLevel::H),
        _ => bail!("unknown error correction level: {s}"),
    }
}

/// 测试用：在临时目录写一个纯色 logo 文件
#[cfg(test)]
pub(crate) fn write_test_logo(name: &str, side: u32) -> PathBuf {
    let path = std::env::temp_dir().join(format!("wifi-qr-{}-{name}.png", std::process::id()));
    RgbaImage::from_pixel(side, side, Rgba([0xE1, 0x1D, 0x48, 255]))
        .save(&path)
        .unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = "WIFI:S:Net;T:WPA;P:pw;;";

    fn style() -> QrStyle {
        QrStyle::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn hex_colours() {
        assert_eq!(parse_hex_color("#000000").unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_hex_color("#fA0").unwrap(), Rgba([0xFF, 0xAA, 0x00, 255]));
        assert_eq!(normalize_hex(" #abcdef ").unwrap(), "#ABCDEF");
        assert!(parse_hex_color("000000").is_err());
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#GGGGGG").is_err());
    }

    #[test]
    fn ec_levels() {
        assert_eq!(parse_ec_level("h").unwrap(), EcLevel::H);
        assert_eq!(parse_ec_level("L").unwrap(), EcLevel::L);
        assert!(parse_ec_level("X").is_err());
    }

    #[test]
    fn file_names_are_slugged() {
        assert_eq!(export_file_name("My Café-Net", "png"), "wifi-qr-my_caf__net.png");
        assert_eq!(export_file_name("", "svg"), "wifi-qr-qrcode.svg");
    }

    #[test]
    fn image_has_exact_size_and_colours() {
        let mut st = style();
        st.size = 300;
        st.dark = "#112233".into();
        st.light = "#FFEEDD".into();
        let img = render_image(DATA, &st).unwrap();
        assert_eq!(img.dimensions(), (300, 300));
        // 静区是背景色
        assert_eq!(*img.get_pixel(0, 0), Rgba([0xFF, 0xEE, 0xDD, 255]));
        assert!(img.pixels().any(|p| *p == Rgba([0x11, 0x22, 0x33, 255])));
    }

    #[test]
    fn size_below_symbol_width_is_rejected() {
        let mut st = style();
        let min = min_size(DATA, &st).unwrap();
        // 版本 1 以上的符号加静区至少 29 个模块
        assert!(min >= 29 * MIN_MODULE_PX);

        for size in [20, 40, 50, min - 1] {
            st.size = size;
            let err = render_image(DATA, &st).unwrap_err();
            assert!(err.to_string().contains("too small"), "{err}");
            assert!(render_svg(DATA, &st).is_err());
        }

        st.size = min;
        assert_eq!(render_image(DATA, &st).unwrap().dimensions(), (min, min));
    }

    #[test]
    fn quiet_zone_counts_toward_minimum() {
        let mut st = style();
        let with_quiet = min_size(DATA, &st).unwrap();
        st.quiet_zone = false;
        let without = min_size(DATA, &st).unwrap();
        assert_eq!(with_quiet - without, 2 * QUIET_ZONE_MODULES * MIN_MODULE_PX);
    }

    #[test]
    fn png_bytes_have_signature() {
        let bytes = render_png("WIFI:S:Net;T:nopass;;", &style()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn svg_uses_requested_colours() {
        let mut st = style();
        st.dark = "#123456".into();
        let svg = render_svg(DATA, &st).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#123456"));
        assert!(svg.contains("#FFFFFF"));
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn svg_embeds_logo() {
        let mut st = style();
        st.logo = Some(write_test_logo("svg-logo", 64));
        let svg = render_svg(DATA, &st).unwrap();
        let image_at = svg.find("<image").unwrap();
        assert!(image_at < svg.rfind("</svg>").unwrap());
        assert!(svg.contains(r#"href="data:image/png;base64,iVBORw0KGgo"#));
        // logo 下方先铺一块背景色
        assert!(svg[..image_at].ends_with(r##"fill="#FFFFFF"/>"##));
    }

    #[test]
    fn terminal_render_is_padded() {
        let text = render_terminal(DATA).unwrap();
        assert!(text.lines().count() > 10);
        assert!(text.lines().all(|l| l.starts_with("  ")));
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let huge = "x".repeat(8000);
        assert!(render_png(&huge, &style()).is_err());
    }

    #[test]
    fn missing_logo_is_an_error() {
        let mut st = style();
        st.logo = Some(PathBuf::from("/nonexistent/logo.png"));
        assert!(render_image("WIFI:S:Net;;", &st).is_err());
    }

    #[test]
    fn logo_over_limit_is_rejected() {
        let path = std::env::temp_dir().join(format!("wifi-qr-{}-big-logo.png", std::process::id()));
        std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();
        let mut st = style();
        st.logo = Some(path.clone());

        let err = render_image(DATA, &st).unwrap_err();
        assert_eq!(err.to_string(), "Logo image is too large. Please use an image under 1MB.");
        assert!(render_svg(DATA, &st).is_err());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn logo_is_centred_on_excavated_area() {
        let mut st = style();
        st.logo = Some(write_test_logo("centred", 64));
        let img = render_image(DATA, &st).unwrap();
        let mid = st.size / 2;
        assert_eq!(*img.get_pixel(mid, mid), Rgba([0xE1, 0x1D, 0x48, 255]));
    }
}
