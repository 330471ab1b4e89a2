//! # 解码与变换流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → RGBA → 缩放裁剪 → 套用遮罩 → PNG → Base64”的过程集中管理，
//! 并在关键节点增加资源上限控制。优先读取 header 尺寸做像素检查，再完整解码。
//!
//! ## 实现思路
//!
//! 1. 读取 header 尺寸并按像素上限快速拒绝，完整解码后统一转为 RGBA
//! 2. 计算覆盖式缩放（cover-fit）：`scale = max(mw / sw, mh / sh)`
//! 3. 把裁剪窗口（水平居中、顶部对齐）换算回源图坐标，先裁剪再缩放，
//!    不构造完整的放大中间图
//! 4. 使用 `fast_image_resize` 直接重采样到遮罩尺寸，失败时回退 `image::imageops::resize`
//! 5. 直接用遮罩透明通道替换结果透明通道（非混合）
//! 6. 无损 PNG 编码，再做不换行的标准 Base64 编码

use base64::{Engine as _, engine::general_purpose};
use fast_image_resize as fr;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};
use std::io::Cursor;

use super::source::{MaskAsset, RawImageData, SourceImage, TransformedImage};
use super::{MaskConfig, MaskError, MaskHandler};

/// 覆盖式缩放后的尺寸与裁剪起点。
///
/// `left/top` 位于缩放后的坐标系；`source_*` 是同一窗口换算回源图后的区域。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    pub scale: f64,
    pub resized_width: u32,
    pub resized_height: u32,
    pub left: u32,
    pub top: u32,
    pub source_left: u32,
    pub source_width: u32,
    pub source_height: u32,
}

impl CoverFit {
    /// 计算覆盖式缩放。
    ///
    /// 结果保证 `resized_width >= mask_width` 且 `resized_height >= mask_height`，
    /// 裁剪窗口 `[left, top, left + mask_width, top + mask_height]` 不会越界。
    pub fn compute(source_width: u32, source_height: u32, mask_width: u32, mask_height: u32) -> Self {
        let scale = f64::max(
            mask_width as f64 / source_width as f64,
            mask_height as f64 / source_height as f64,
        );

        // 浮点误差可能让结果比遮罩少 1 像素。
        let resized_width = ((source_width as f64 * scale).round() as u32).max(mask_width);
        let resized_height = ((source_height as f64 * scale).round() as u32).max(mask_height);

        // 同一裁剪窗口在源图坐标下的区域。
        let window_width = ((mask_width as f64 / scale).round() as u32).clamp(1, source_width);
        let window_height = ((mask_height as f64 / scale).round() as u32).clamp(1, source_height);

        Self {
            scale,
            resized_width,
            resized_height,
            left: (resized_width - mask_width) / 2,
            top: 0,
            source_left: (source_width - window_width) / 2,
            source_width: window_width,
            source_height: window_height,
        }
    }
}

impl MaskHandler {
    /// 将原始字节解码为 RGBA 源图。
    pub(crate) fn decode(raw: &RawImageData, config: &MaskConfig) -> Result<SourceImage, MaskError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| MaskError::UnreadableImage(format!("图片解码失败：{}", e)))?;

        // 无透明通道的格式在这里补齐为完全不透明。
        let pixels = decoded.to_rgba8();
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(MaskError::UnreadableImage(format!("图片尺寸无效：{}x{}", width, height)));
        }
        Self::validate_pixel_limits(config, width, height)?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 类型: {} 尺寸: {}x{}",
            raw.source_hint,
            raw.content_type,
            width,
            height
        );

        Ok(SourceImage { pixels })
    }

    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), MaskError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| MaskError::UnreadableImage(format!("无法识别图片格式：{}", e)))?;

        if reader.format().is_none() {
            return Err(MaskError::UnreadableImage("无法识别图片格式".to_string()));
        }

        reader
            .into_dimensions()
            .map_err(|e| MaskError::UnreadableImage(format!("无法读取图片尺寸：{}", e)))
    }

    fn validate_pixel_limits(config: &MaskConfig, width: u32, height: u32) -> Result<(), MaskError> {
        let pixels = (width as u64) * (height as u64);

        if pixels > config.max_decoded_pixels {
            return Err(MaskError::ImageTooLarge {
                pixels,
                limit: config.max_decoded_pixels,
            });
        }

        Ok(())
    }

    /// 覆盖式缩放并裁剪到遮罩尺寸。
    ///
    /// 先在源图上裁出窗口，再直接缩放到遮罩尺寸；中间图不会超过源图大小。
    pub(crate) fn fit_and_crop(
        source: &SourceImage,
        mask_width: u32,
        mask_height: u32,
        config: &MaskConfig,
    ) -> Result<RgbaImage, MaskError> {
        let fit = CoverFit::compute(source.width(), source.height(), mask_width, mask_height);

        log::debug!(
            "🧩 覆盖缩放：{}x{} -> {}x{}（scale={:.4}）裁剪起点 ({}, {})，源图窗口 {}x{}@{}",
            source.width(),
            source.height(),
            fit.resized_width,
            fit.resized_height,
            fit.scale,
            fit.left,
            fit.top,
            fit.source_width,
            fit.source_height,
            fit.source_left
        );

        let window = image::imageops::crop_imm(
            &source.pixels,
            fit.source_left,
            0,
            fit.source_width,
            fit.source_height,
        )
        .to_image();

        if window.dimensions() == (mask_width, mask_height) {
            return Ok(window);
        }

        match Self::resize_with_fast_image_resize(&window, mask_width, mask_height, config.resize_filter) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 重采样失败，回退 image::imageops::resize：{}", err);
                Ok(image::imageops::resize(&window, mask_width, mask_height, config.resize_filter))
            }
        }
    }

    fn resize_with_fast_image_resize(
        src: &RgbaImage,
        target_width: u32,
        target_height: u32,
        filter: FilterType,
    ) -> Result<RgbaImage, MaskError> {
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            src.as_raw().clone(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| MaskError::Internal(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(Self::to_fast_filter(filter)));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| MaskError::Internal(format!("fast_image_resize 执行失败：{}", e)))?;

        RgbaImage::from_raw(target_width, target_height, dst_image.into_vec())
            .ok_or_else(|| MaskError::Internal("fast_image_resize 输出缓冲长度异常".to_string()))
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

    /// 用遮罩透明通道整体替换裁剪结果的透明通道。
    pub(crate) fn composite(cropped: RgbaImage, mask: &MaskAsset) -> Result<TransformedImage, MaskError> {
        if cropped.dimensions() != (mask.width, mask.height) {
            return Err(MaskError::Internal(format!(
                "裁剪尺寸 {}x{} 与遮罩 {}x{} 不一致",
                cropped.width(),
                cropped.height(),
                mask.width,
                mask.height
            )));
        }

        let mut pixels = cropped;
        for (pixel, alpha) in pixels.pixels_mut().zip(mask.alpha.iter()) {
            pixel.0[3] = *alpha;
        }

        Ok(TransformedImage { pixels })
    }

    /// 无损 PNG 编码。
    pub(crate) fn encode_png(image: &TransformedImage) -> Result<Vec<u8>, MaskError> {
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new_with_quality(
            &mut buffer,
            CompressionType::Best,
            PngFilterType::Adaptive,
        );

        encoder
            .write_image(
                image.pixels.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| MaskError::Internal(format!("PNG 编码失败：{}", e)))?;

        Ok(buffer)
    }

    /// 标准 Base64（不换行）。
    pub(crate) fn to_transport_text(bytes: &[u8]) -> String {
        general_purpose::STANDARD.encode(bytes)
    }
}

/// 将传输文本还原为 PNG 字节。
pub fn decode_transport_text(text: &str) -> Result<Vec<u8>, MaskError> {
    general_purpose::STANDARD
        .decode(text.trim())
        .map_err(|e| MaskError::UnreadableImage(format!("Base64 解码失败：{}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
    use proptest::prelude::*;

    fn raw(bytes: Vec<u8>, content_type: &str) -> RawImageData {
        RawImageData {
            bytes: Bytes::from(bytes),
            content_type: content_type.to_string(),
            source_hint: "test",
        }
    }

    fn create_rgb_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8])
        });
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageFormat::Jpeg)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn gradient_mask(width: u32, height: u32) -> MaskAsset {
        let alpha = (0..height)
            .flat_map(|y| (0..width).map(move |x| ((x * 7 + y * 13) % 256) as u8))
            .collect();
        MaskAsset {
            identifier: "mask_test.png".to_string(),
            width,
            height,
            alpha,
        }
    }

    #[test]
    fn cover_fit_matches_portrait_scenario() {
        let fit = CoverFit::compute(800, 600, 512, 768);

        assert!((fit.scale - 1.28).abs() < 1e-9);
        assert_eq!((fit.resized_width, fit.resized_height), (1024, 768));
        assert_eq!((fit.left, fit.top), (256, 0));
    }

    #[test]
    fn cover_fit_maps_window_back_to_source() {
        let fit = CoverFit::compute(800, 600, 512, 768);

        assert_eq!((fit.source_left, fit.source_width, fit.source_height), (200, 400, 600));
    }

    #[test]
    fn crop_is_top_anchored_for_tall_sources() {
        let fit = CoverFit::compute(100, 400, 100, 100);

        assert_eq!((fit.resized_width, fit.resized_height), (100, 400));
        assert_eq!((fit.left, fit.top), (0, 0));
        assert_eq!((fit.source_left, fit.source_width, fit.source_height), (0, 100, 100));
    }

    proptest! {
        #[test]
        fn cover_fit_always_covers_mask(
            sw in 1u32..5000,
            sh in 1u32..5000,
            mw in 1u32..2000,
            mh in 1u32..2000,
        ) {
            let fit = CoverFit::compute(sw, sh, mw, mh);
            prop_assert!(fit.resized_width >= mw);
            prop_assert!(fit.resized_height >= mh);
            prop_assert!(fit.left + mw <= fit.resized_width);
            prop_assert_eq!(fit.top, 0);
            prop_assert!(fit.source_width >= 1 && fit.source_height >= 1);
            prop_assert!(fit.source_left + fit.source_width <= sw);
            prop_assert!(fit.source_height <= sh);
        }

        #[test]
        fn composite_copies_mask_alpha_exactly(w in 1u32..24, h in 1u32..24, seed in any::<u8>()) {
            let cropped = ImageBuffer::from_fn(w, h, |x, y| {
                Rgba([seed, (x % 256) as u8, (y % 256) as u8, 255])
            });
            let mask = gradient_mask(w, h);

            let out = MaskHandler::composite(cropped.clone(), &mask).expect("composite failed");
            prop_assert_eq!(out.pixels().dimensions(), (w, h));
            for (x, y, pixel) in out.pixels().enumerate_pixels() {
                prop_assert_eq!(pixel.0[3], mask.alpha_at(x, y));
                prop_assert_eq!(&pixel.0[..3], &cropped.get_pixel(x, y).0[..3]);
            }
        }
    }

    #[test]
    fn decode_adds_opaque_alpha_to_rgb_sources() {
        let config = MaskConfig::default();
        let source = MaskHandler::decode(&raw(create_rgb_jpeg_bytes(32, 16), "image/jpeg"), &config)
            .expect("decode should succeed");

        assert_eq!((source.width(), source.height()), (32, 16));
        assert!(source.pixels().pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn decode_rejects_garbage() {
        let config = MaskConfig::default();
        let result = MaskHandler::decode(&raw(b"definitely not an image".to_vec(), "image/png"), &config);

        assert!(matches!(result, Err(MaskError::UnreadableImage(_))));
    }

    #[test]
    fn decode_rejects_too_many_pixels() {
        let mut config = MaskConfig::default();
        config.max_decoded_pixels = 100;
        let result = MaskHandler::decode(&raw(create_rgb_jpeg_bytes(20, 20), "image/jpeg"), &config);

        assert!(matches!(result, Err(MaskError::ImageTooLarge { pixels: 400, limit: 100 })));
    }

    #[test]
    fn fit_and_crop_produces_mask_dimensions() {
        let config = MaskConfig::default();
        let source = MaskHandler::decode(&raw(create_rgb_jpeg_bytes(80, 60), "image/jpeg"), &config)
            .expect("decode should succeed");

        let cropped = MaskHandler::fit_and_crop(&source, 51, 77, &config).expect("fit failed");
        assert_eq!(cropped.dimensions(), (51, 77));
    }

    #[test]
    fn thin_strip_fills_square_mask_without_pixel_limit_error() {
        let config = MaskConfig::default();
        let pixels = ImageBuffer::from_fn(10, 10_000, |x, y| {
            Rgba([(x * 20) as u8, if y < 10 { 200 } else { 0 }, 0, 255])
        });
        let source = SourceImage { pixels };

        let cropped = MaskHandler::fit_and_crop(&source, 512, 512, &config)
            .expect("small source must not be rejected as too large");

        assert_eq!(cropped.dimensions(), (512, 512));
        // 顶部对齐：只取源图最上方 10x10 的区域。
        assert!(cropped.pixels().all(|p| p.0[1] > 100));
    }

    #[test]
    fn fit_and_crop_takes_horizontal_center_of_identity_scale() {
        let config = MaskConfig::default();
        let pixels = ImageBuffer::from_fn(10, 4, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let source = SourceImage { pixels };

        let cropped = MaskHandler::fit_and_crop(&source, 4, 4, &config).expect("fit failed");

        assert_eq!(cropped.dimensions(), (4, 4));
        assert_eq!(cropped.get_pixel(0, 0).0[0], 3);
        assert_eq!(cropped.get_pixel(3, 3).0[..2], [6, 3]);
    }

    #[test]
    fn composite_rejects_mismatched_dimensions() {
        let cropped = ImageBuffer::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        let result = MaskHandler::composite(cropped, &gradient_mask(5, 4));

        assert!(matches!(result, Err(MaskError::Internal(_))));
    }

    #[test]
    fn png_transport_roundtrip_is_lossless() {
        let cropped = ImageBuffer::from_fn(9, 7, |x, y| Rgba([(x * 20) as u8, (y * 30) as u8, 77, 255]));
        let transformed = MaskHandler::composite(cropped, &gradient_mask(9, 7)).expect("composite failed");

        let png = MaskHandler::encode_png(&transformed).expect("encode failed");
        let text = MaskHandler::to_transport_text(&png);
        assert!(!text.contains('\n'));

        let decoded_png = decode_transport_text(&text).expect("base64 decode failed");
        let restored = image::load_from_memory_with_format(&decoded_png, ImageFormat::Png)
            .expect("png decode failed")
            .to_rgba8();

        assert_eq!(restored.dimensions(), (9, 7));
        assert_eq!(restored.as_raw(), transformed.pixels().as_raw());
    }
}
