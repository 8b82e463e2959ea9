//! # 解码与放大流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 规范尺寸位图”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先读取 header 尺寸做像素检查，再进行完整解码；放大目标同样受像素上限约束，
//! 避免极端长宽比的小图被放大成超大位图。
//!
//! ## 实现思路
//!
//! 1. 读取 header 尺寸，按像素上限快速拒绝
//! 2. 完整解码并复核尺寸
//! 3. 任一边小于最小边长时，按统一比例放大（只放大，不缩小）
//! 4. 优先 `fast_image_resize`，失败时回退 `image::resize_exact`

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageReader, Rgba};
use std::io::Cursor;

use super::source::{Bitmap, RawImageData};
use super::{FetchConfig, ImageError, ImageFetcher};

/// 计算放大目标尺寸。
///
/// 宽、高都不小于 `min_dimension` 时返回 `None`（保持原样）。否则取
/// `max(min/width, min/height)` 作为统一缩放因子，乘积向下取整；
/// 浮点误差可能让较短边落到 `min - 1`，因此结果再钳制到 `min_dimension`。
/// 零尺寸输入返回 `None`，由调用方在此之前拒绝。
pub fn upscale_target(width: u32, height: u32, min_dimension: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    if width >= min_dimension && height >= min_dimension {
        return None;
    }

    let min = min_dimension as f64;
    let scale = (min / width as f64).max(min / height as f64);

    let target_width = ((width as f64 * scale).floor() as u32).max(min_dimension);
    let target_height = ((height as f64 * scale).floor() as u32).max(min_dimension);

    Some((target_width, target_height))
}

impl ImageFetcher {
    /// 解码原始字节，并把尺寸规范到最小边长以上。
    pub(super) fn decode_and_normalize(&self, raw: RawImageData) -> Result<Bitmap, ImageError> {
        let config = &self.config;

        let (header_width, header_height) = inspect_dimensions_from_memory(&raw.bytes)?;
        validate_pixel_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;

        let (raw_width, raw_height) = decoded.dimensions();
        if raw_width == 0 || raw_height == 0 {
            return Err(ImageError::Decode("图片尺寸为零".to_string()));
        }
        validate_pixel_limits(config, raw_width, raw_height)?;

        let normalized = match upscale_target(raw_width, raw_height, config.min_dimension) {
            Some((target_width, target_height)) => {
                validate_pixel_limits(config, target_width, target_height)?;
                log::info!(
                    "🔍 图片小于 {}px，放大：{}x{} -> {}x{}（filter={:?}）",
                    config.min_dimension,
                    raw_width,
                    raw_height,
                    target_width,
                    target_height,
                    config.resize_filter
                );
                resize(decoded, target_width, target_height, config.resize_filter)
            }
            None => decoded,
        };

        let bitmap = Bitmap::from_dynamic(normalized);

        log::info!(
            "✅ 图片解码成功 - 来源: {} 原始尺寸: {}x{} 输出尺寸: {}x{}",
            raw.source_hint,
            raw_width,
            raw_height,
            bitmap.width(),
            bitmap.height()
        );

        Ok(bitmap)
    }
}

/// 仅通过内存中的图片头信息读取宽高。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

    reader
        .into_dimensions()
        .map_err(|e| ImageError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
}

fn validate_pixel_limits(config: &FetchConfig, width: u32, height: u32) -> Result<(), ImageError> {
    let pixels = (width as u64)
        .checked_mul(height as u64)
        .ok_or_else(|| ImageError::ResourceLimit("图片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(ImageError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    Ok(())
}

fn resize(image: DynamicImage, target_width: u32, target_height: u32, filter: FilterType) -> DynamicImage {
    match resize_with_fast_image_resize(&image, target_width, target_height, filter) {
        Ok(resized) => resized,
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 放大失败，回退 image::resize_exact：{}", err);
            image.resize_exact(target_width, target_height, filter)
        }
    }
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<DynamicImage, ImageError> {
    let src = image.to_rgba8();
    let (src_width, src_height) = src.dimensions();

    let src_image = fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
        .map_err(|e| ImageError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImageError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| ImageError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

    Ok(DynamicImage::ImageRgba8(rgba))
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_fetcher::fetcher::tests::{create_png_bytes, local_fetcher};
    use proptest::prelude::*;

    fn raw(bytes: Vec<u8>) -> RawImageData {
        RawImageData {
            bytes,
            source_hint: "test".to_string(),
        }
    }

    #[test]
    fn upscale_target_matches_known_cases() {
        assert_eq!(upscale_target(256, 128, 512), Some((1024, 512)));
        assert_eq!(upscale_target(1024, 768, 512), None);
        assert_eq!(upscale_target(512, 512, 512), None);
        assert_eq!(upscale_target(300, 1000, 512), Some((512, 1706)));
        assert_eq!(upscale_target(0, 10, 512), None);
    }

    #[test]
    fn decode_upscales_small_image() {
        let fetcher = local_fetcher();
        let bitmap = fetcher
            .decode_and_normalize(raw(create_png_bytes(256, 128)))
            .expect("decode should succeed");

        assert_eq!(bitmap.dimensions(), (1024, 512));
    }

    #[test]
    fn decode_keeps_large_image() {
        let fetcher = local_fetcher();
        let bitmap = fetcher
            .decode_and_normalize(raw(create_png_bytes(1024, 768)))
            .expect("decode should succeed");

        assert_eq!(bitmap.dimensions(), (1024, 768));
    }

    #[test]
    fn decode_rejects_upscale_beyond_pixel_limit() {
        let mut fetcher = local_fetcher();
        fetcher.config.max_decoded_pixels = 100_000;

        let result = fetcher.decode_and_normalize(raw(create_png_bytes(64, 64)));

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn thin_strip_whose_target_exceeds_default_cap_is_refused() {
        let fetcher = local_fetcher();

        let result = fetcher.decode_and_normalize(raw(create_png_bytes(20, 8000)));

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn decode_rejects_junk_bytes() {
        let fetcher = local_fetcher();
        let result = fetcher.decode_and_normalize(raw(b"definitely not an image".to_vec()));

        assert!(matches!(result, Err(ImageError::InvalidFormat(_))));
    }

    #[test]
    fn fast_filter_mapping_keeps_lanczos() {
        assert!(matches!(to_fast_filter(FilterType::Lanczos3), fr::FilterType::Lanczos3));
    }

    proptest! {
        #[test]
        fn upscale_target_never_below_minimum(width in 1u32..2048, height in 1u32..2048) {
            match upscale_target(width, height, 512) {
                Some((w, h)) => {
                    prop_assert!(w >= 512 && h >= 512);
                    prop_assert!(w >= width && h >= height);
                }
                None => prop_assert!(width >= 512 && height >= 512),
            }
        }
    }
}
