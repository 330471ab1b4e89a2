//! # 获取与校验模块
//!
//! ## 设计思路
//!
//! 统一处理两种来源（上传 / URL）的原始字节获取，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败，减少不必要的内存与带宽消耗。
//!
//! ## 实现思路
//!
//! - 上传：直接使用请求体；声明类型缺失时按文件签名（magic bytes）推断。
//! - URL：协议校验 → 发送请求（跟随重定向、超时、专用 User-Agent）
//!   → 响应头内容类型与 `Content-Length` 预检 → 流式读取并按实际字节数再次限流。
//! - 网络错误统一映射到 `MaskError`，日志与错误文案中的 URL 均做脱敏。

use bytes::{Bytes, BytesMut};

use super::source::RawImageData;
use super::validator::{normalize_content_type, validate_content_type, validate_size};
use super::{MaskConfig, MaskError, MaskHandler};

const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

impl MaskHandler {
    /// 上传适配器：读取请求体与客户端声明的内容类型。
    pub(super) fn load_from_upload(
        bytes: Bytes,
        declared_content_type: Option<&str>,
    ) -> RawImageData {
        let content_type = match declared_content_type.map(normalize_content_type) {
            Some(ct) if !ct.is_empty() => ct,
            _ => Self::sniff_content_type(&bytes).unwrap_or_default(),
        };

        log::info!(
            "📤 收到上传图片 - {} bytes, content-type: {}",
            bytes.len(),
            if content_type.is_empty() { "<missing>" } else { content_type.as_str() }
        );

        RawImageData {
            bytes,
            content_type,
            source_hint: "upload",
        }
    }

    /// URL 适配器：下载远程图片并在下载前后执行校验。
    pub(super) async fn load_from_url(
        &self,
        url: &str,
        config: &MaskConfig,
    ) -> Result<RawImageData, MaskError> {
        let parsed = Self::validate_url(url)?;
        log::info!("🌐 开始下载图片 - URL: {}", Self::redact_url_for_log(url));

        let response = self
            .http_client
            .get(parsed)
            .header(reqwest::header::ACCEPT, "image/*")
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, url, config))?;

        if !response.status().is_success() {
            return Err(MaskError::UnreachableOrHttpError(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(normalize_content_type)
            .unwrap_or_default();
        validate_content_type(&content_type, config)?;

        let declared_len = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|cl| cl.to_str().ok())
            .and_then(|cl| cl.trim().parse::<u64>().ok());

        if let Some(size) = declared_len {
            validate_size(size, config)?;
        }

        let initial_capacity = declared_len
            .map(|len| len.min(config.max_file_size).min(usize::MAX as u64) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = BytesMut::with_capacity(initial_capacity);
        let mut response = response;
        let mut total: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Self::map_reqwest_error(e, url, config))?
        {
            total = total.saturating_add(chunk.len() as u64);
            validate_size(total, config)?;
            buffer.extend_from_slice(&chunk);
        }

        log::debug!("✅ 下载完成 - {} bytes", total);

        Ok(RawImageData {
            bytes: buffer.freeze(),
            content_type,
            source_hint: "url",
        })
    }

    /// 仅允许可解析的 HTTP/HTTPS 地址。
    fn validate_url(url: &str) -> Result<reqwest::Url, MaskError> {
        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|e| MaskError::InvalidUrl(format!("URL 格式错误：{}", e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(MaskError::InvalidUrl("仅支持 HTTP/HTTPS".to_string()));
        }

        if parsed.host_str().is_none() {
            return Err(MaskError::InvalidUrl("URL 缺少主机地址".to_string()));
        }

        Ok(parsed)
    }

    /// 通过文件签名推断图片内容类型。
    fn sniff_content_type(bytes: &[u8]) -> Option<String> {
        infer::get(bytes).map(|kind| kind.mime_type().to_string())
    }

    /// 构建复用型 HTTP 客户端。
    pub(super) fn build_http_client(config: &MaskConfig) -> Result<reqwest::Client, MaskError> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.download_timeout))
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MaskError::Internal(format!("无法创建 HTTP 客户端：{}", e)))
    }

    /// 统一映射 reqwest 错误到业务错误。
    fn map_reqwest_error(e: reqwest::Error, url: &str, config: &MaskConfig) -> MaskError {
        if e.is_timeout() {
            return MaskError::NetworkTimeout(config.download_timeout);
        }

        let err_msg = Self::sanitize_error_message_with_redacted_url(&e.to_string(), url);
        if e.is_redirect() {
            MaskError::NetworkError(format!("重定向次数超过限制（{}）：{}", config.max_redirects, err_msg))
        } else if e.is_connect() {
            MaskError::NetworkError(format!("无法连接：{}", err_msg))
        } else {
            MaskError::NetworkError(err_msg)
        }
    }

    pub(crate) fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = parsed.path();

        format!("{}://{}{}{}", parsed.scheme(), host, port, path)
    }

    fn sanitize_error_message_with_redacted_url(error_msg: &str, url: &str) -> String {
        let redacted = Self::redact_url_for_log(url);
        let normalized = reqwest::Url::parse(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        error_msg.replace(&normalized, &redacted).replace(url, &redacted)
    }
}
