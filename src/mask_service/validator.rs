//! # 输入校验模块
//!
//! 内容类型白名单与体积上限在这里统一执行，上传与 URL 两条链路共用，
//! 保证同一输入不论来源都得到相同的结论。

use super::{MaskConfig, MaskError};

/// 规范化内容类型：去掉 `;` 之后的参数，去空白并转小写。
pub(crate) fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// 校验内容类型是否在白名单内。
pub(crate) fn validate_content_type(content_type: &str, config: &MaskConfig) -> Result<(), MaskError> {
    let normalized = normalize_content_type(content_type);
    if config
        .allowed_content_types
        .iter()
        .any(|allowed| *allowed == normalized)
    {
        return Ok(());
    }

    Err(MaskError::UnsupportedContentType(if normalized.is_empty() {
        "<missing>".to_string()
    } else {
        normalized
    }))
}

/// 校验字节数是否超过上限。
pub(crate) fn validate_size(byte_length: u64, config: &MaskConfig) -> Result<(), MaskError> {
    if byte_length > config.max_file_size {
        return Err(MaskError::PayloadTooLarge {
            size: byte_length,
            limit: config.max_file_size,
        });
    }

    Ok(())
}

/// 同时执行内容类型与体积校验。
pub fn validate(content_type: &str, byte_length: u64, config: &MaskConfig) -> Result<(), MaskError> {
    validate_content_type(content_type, config)?;
    validate_size(byte_length, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_types_with_parameters() {
        let config = MaskConfig::default();

        assert!(validate("image/png", 10, &config).is_ok());
        assert!(validate("IMAGE/JPEG; charset=binary", 10, &config).is_ok());
        assert!(validate("image/webp", 10, &config).is_ok());
        assert!(validate("image/gif", 10, &config).is_ok());
    }

    #[test]
    fn rejects_html_and_missing_type() {
        let config = MaskConfig::default();

        assert!(matches!(
            validate("text/html; charset=utf-8", 10, &config),
            Err(MaskError::UnsupportedContentType(ct)) if ct == "text/html"
        ));
        assert!(matches!(
            validate("", 10, &config),
            Err(MaskError::UnsupportedContentType(ct)) if ct == "<missing>"
        ));
    }

    #[test]
    fn size_limit_is_inclusive() {
        let config = MaskConfig::default();
        let limit = config.max_file_size;

        assert!(validate("image/png", limit, &config).is_ok());
        assert!(matches!(
            validate("image/png", limit + 1, &config),
            Err(MaskError::PayloadTooLarge { size, .. }) if size == limit + 1
        ));
    }
}
