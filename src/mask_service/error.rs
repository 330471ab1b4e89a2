//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载遮罩链路中的所有失败来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! ## 实现思路
//!
//! - `code()`：稳定的机器可读错误码，供 API 响应使用。
//! - `stage()`：失败所处的流水线阶段，便于日志与排障。
//! - `status()`：HTTP 风格的状态分类（400 / 401 / 413 / 500）。
//!
//! 错误文案只携带重建失败条件所需的信息（内容类型、字节数、HTTP 状态码），
//! 不包含遮罩文件的磁盘路径。

/// 遮罩处理统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum MaskError {
    #[error("API Key 无效")]
    AuthFailure,

    #[error("不支持的内容类型：{0}")]
    UnsupportedContentType(String),

    #[error("图片过大：{size} 字节（限制：{limit} 字节）")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("图片像素过大：{pixels} 像素（限制：{limit} 像素）")]
    ImageTooLarge { pixels: u64, limit: u64 },

    #[error("无法读取图片：{0}")]
    UnreadableImage(String),

    #[error("URL 无效：{0}")]
    InvalidUrl(String),

    #[error("请求超时（{0}秒）")]
    NetworkTimeout(u64),

    #[error("HTTP 错误：{0}")]
    UnreachableOrHttpError(u16),

    #[error("请求失败：{0}")]
    NetworkError(String),

    #[error("没有可用的遮罩文件")]
    NoMasksAvailable,

    #[error("遮罩文件不可用：{0}")]
    MaskUnreadable(String),

    #[error("内部错误：{0}")]
    Internal(String),
}

impl MaskError {
    /// 稳定错误码，API 响应与日志共用。
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthFailure => "auth_failure",
            Self::UnsupportedContentType(_) => "unsupported_content_type",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::ImageTooLarge { .. } => "image_too_large",
            Self::UnreadableImage(_) => "unreadable_image",
            Self::InvalidUrl(_) => "invalid_url",
            Self::NetworkTimeout(_) => "network_timeout",
            Self::UnreachableOrHttpError(_) => "http_error",
            Self::NetworkError(_) => "network_error",
            Self::NoMasksAvailable => "no_masks_available",
            Self::MaskUnreadable(_) => "mask_unreadable",
            Self::Internal(_) => "internal_error",
        }
    }

    /// 失败所处的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::AuthFailure => "auth",
            Self::NoMasksAvailable | Self::MaskUnreadable(_) => "catalog",
            Self::InvalidUrl(_)
            | Self::NetworkTimeout(_)
            | Self::UnreachableOrHttpError(_)
            | Self::NetworkError(_) => "acquire",
            Self::UnsupportedContentType(_) | Self::PayloadTooLarge { .. } => "validate",
            Self::UnreadableImage(_) | Self::ImageTooLarge { .. } => "decode",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP 风格的状态分类。
    pub fn status(&self) -> u16 {
        match self {
            Self::AuthFailure => 401,
            Self::PayloadTooLarge { .. } | Self::ImageTooLarge { .. } => 413,
            Self::NoMasksAvailable | Self::MaskUnreadable(_) | Self::Internal(_) => 500,
            Self::UnsupportedContentType(_)
            | Self::UnreadableImage(_)
            | Self::InvalidUrl(_)
            | Self::NetworkTimeout(_)
            | Self::UnreachableOrHttpError(_)
            | Self::NetworkError(_) => 400,
        }
    }
}
