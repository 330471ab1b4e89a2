//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `MaskConfig`，启动时构建一次，之后以只读方式
//! 显式传入各组件，不依赖全局可变状态。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的配置（10 MiB 上限、30 秒超时、Lanczos3 重采样）。
//! - `from_env` 按环境变量覆盖默认值，无法解析的值回退为默认值。
//! - `parse_resize_filter` 负责滤镜名称解析与反向输出。

use std::env;
use std::path::PathBuf;

use image::imageops::FilterType;

use super::MaskError;

/// 默认允许的图片内容类型。
pub const DEFAULT_ALLOWED_CONTENT_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// 遮罩服务配置。
///
/// 字段覆盖了遮罩目录、输入校验、网络下载与解码限制四个方面。
#[derive(Debug, Clone)]
pub struct MaskConfig {
    /// 遮罩素材目录。
    pub masks_dir: PathBuf,
    /// 遮罩文件名前缀（`mask_*.png`）。
    pub mask_prefix: String,
    /// 遮罩文件扩展名（不含点）。
    pub mask_extension: String,
    /// 允许的内容类型白名单（小写、不含参数）。
    pub allowed_content_types: Vec<String>,
    /// 输入图片允许的最大字节数。
    pub max_file_size: u64,
    /// 网络下载超时时间（秒），覆盖连接与读取。
    pub download_timeout: u64,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 下载时携带的 User-Agent。
    pub user_agent: String,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 重采样滤镜。
    pub resize_filter: FilterType,
    /// 调用方需提供的 API Key；为 `None` 时跳过校验（本地开发模式）。
    pub api_key: Option<String>,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            masks_dir: PathBuf::from("masks"),
            mask_prefix: "mask_".to_string(),
            mask_extension: "png".to_string(),
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|ct| ct.to_string())
                .collect(),
            max_file_size: 10 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 10,
            max_redirects: 10,
            user_agent: "PhotoMaskingAPI/1.0".to_string(),
            max_decoded_pixels: 40_000_000,
            resize_filter: FilterType::Lanczos3,
            api_key: None,
        }
    }
}

impl MaskConfig {
    /// 从环境变量读取配置。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use photo_mask::mask_service::MaskConfig;
    ///
    /// let config = MaskConfig::from_env()?;
    /// assert!(config.max_file_size > 0);
    /// # Ok::<(), photo_mask::mask_service::MaskError>(())
    /// ```
    pub fn from_env() -> Result<Self, MaskError> {
        let defaults = Self::default();

        let masks_dir = env::var("MASKS_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.masks_dir);

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .ok()
            .map(|raw| parse_content_type_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.allowed_content_types);

        let max_file_size = parse_u64("MAX_IMAGE_SIZE_MB", defaults.max_file_size / 1024 / 1024)
            .saturating_mul(1024 * 1024);

        let resize_filter = match env::var("RESIZE_FILTER") {
            Ok(raw) => parse_resize_filter(&raw)?,
            Err(_) => defaults.resize_filter,
        };

        let api_key = env::var("API_KEY").ok().filter(|key| !key.is_empty());

        Ok(Self {
            masks_dir,
            mask_prefix: defaults.mask_prefix,
            mask_extension: defaults.mask_extension,
            allowed_content_types,
            max_file_size,
            download_timeout: parse_u64("REQUEST_TIMEOUT", defaults.download_timeout).max(1),
            connect_timeout: parse_u64("CONNECT_TIMEOUT", defaults.connect_timeout).max(1),
            max_redirects: parse_usize("MAX_REDIRECTS", defaults.max_redirects),
            user_agent: defaults.user_agent,
            max_decoded_pixels: parse_u64("MAX_DECODED_PIXELS", defaults.max_decoded_pixels),
            resize_filter,
            api_key,
        })
    }
}

/// 解析重采样滤镜名称。
pub(crate) fn parse_resize_filter(name: &str) -> Result<FilterType, MaskError> {
    match name.trim().to_lowercase().as_str() {
        "nearest" => Ok(FilterType::Nearest),
        "triangle" | "bilinear" => Ok(FilterType::Triangle),
        "catmullrom" | "catmull-rom" => Ok(FilterType::CatmullRom),
        "gaussian" => Ok(FilterType::Gaussian),
        "lanczos3" | "lanczos" => Ok(FilterType::Lanczos3),
        other => Err(MaskError::Internal(format!(
            "未知重采样滤镜：{}（可选：nearest / triangle / catmullrom / gaussian / lanczos3）",
            other
        ))),
    }
}

/// 解析逗号分隔的内容类型列表，统一为小写并去掉参数。
fn parse_content_type_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
