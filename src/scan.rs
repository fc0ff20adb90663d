// src/scan.rs — 从图片里识别二维码并解析出 Wi-Fi 凭据

use crate::payload;
use crate::types::{ParseError, WifiCredential};
use image::DynamicImage;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// 图片无法读取或解码
    #[error("Could not read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("No QR code found in the image.")]
    NoCodeFound,

    /// 识别到了二维码但不是 Wi-Fi 载荷
    #[error(transparent)]
    Payload(#[from] ParseError),
}

/// 识别图片里的第一个可解码二维码，返回原始文本
///
/// rqrr 在部分模糊或过小的图片上会触发内部断言，这里把 panic 当作未识别处理。
pub fn decode_image(img: &DynamicImage) -> Result<String, ScanError> {
    let luma = img.to_luma8();
    let found = panic::catch_unwind(AssertUnwindSafe(move || {
        let mut prepared = rqrr::PreparedImage::prepare(luma);
        let grids = prepared.detect_grids();
        tracing::debug!(count = grids.len(), "qr grids detected");

        grids.iter().find_map(|grid| match grid.decode() {
            Ok((_, content)) => Some(content),
            Err(e) => {
                tracing::debug!("grid decode failed: {e}");
                None
            }
        })
    }));

    match found {
        Ok(Some(content)) => Ok(content),
        Ok(None) => Err(ScanError::NoCodeFound),
        Err(_) => {
            tracing::warn!("qr reader panicked on this image");
            Err(ScanError::NoCodeFound)
        }
    }
}

/// 扫描已加载的图片
pub fn scan_image(img: &DynamicImage) -> Result<WifiCredential, ScanError> {
    let text = decode_image(img)?;
    Ok(payload::decode(&text)?)
}

/// 打开图片文件并扫描
pub fn scan_file(path: &Path) -> Result<WifiCredential, ScanError> {
    let img = image::open(path)?;
    tracing::info!(path = %path.display(), width = img.width(), height = img.height(), "scanning image");
    scan_image(&img)
}
