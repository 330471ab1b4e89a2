//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义（上传 / URL）
//! - `RawImageData` 表示已获取但未解码的字节与声明类型
//! - `SourceImage` 表示解码后的 RGBA 像素
//! - `MaskAsset` 表示已加载的遮罩（尺寸 + 透明通道）
//! - `TransformedImage` 表示裁剪并套用遮罩透明度后的结果
//! - `MaskedImage` 表示可直接返回给调用方的编码结果
//!
//! 所有模型只存活于单次请求内，不做持久化。

use bytes::Bytes;
use image::RgbaImage;

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 网络地址来源。
    Url(String),
    /// 直接上传的字节，附带客户端声明的内容类型（可缺省）。
    Upload {
        bytes: Bytes,
        content_type: Option<String>,
    },
}

/// 获取阶段输出：原始字节与声明的内容类型。
#[derive(Debug, Clone)]
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Bytes,
    /// 规范化后的内容类型（小写、不含参数）。
    pub(crate) content_type: String,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 解码后的源图片，始终为 4 通道 RGBA，宽高均为正数。
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub(crate) pixels: RgbaImage,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// 单个遮罩素材。
///
/// `alpha` 按行优先存放，每像素一个字节，长度恒为 `width * height`。
#[derive(Debug, Clone)]
pub struct MaskAsset {
    /// 遮罩标识（文件名）。
    pub identifier: String,
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
}

impl MaskAsset {
    /// 读取指定像素的不透明度。
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.alpha[(y as usize) * (self.width as usize) + x as usize]
    }
}

/// 套用遮罩后的图片，宽高与遮罩完全一致。
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub(crate) pixels: RgbaImage,
}

impl TransformedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// 编码完成的处理结果。
#[derive(Debug, Clone)]
pub struct MaskedImage {
    /// 本次使用的遮罩标识。
    pub mask_used: String,
    /// Base64（无换行）编码的 PNG。
    pub image_data: String,
    /// 输出内容类型，恒为 `image/png`。
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}
