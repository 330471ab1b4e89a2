//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `MaskServiceState` 作为外部框架注入的状态，替代全局单例函数。
//! 好处：
//! 1. 生命周期清晰（由 `main.rs` 统一管理）
//! 2. 测试可创建独立实例，减少共享状态副作用
//!
//! ## 实现思路
//!
//! 对外仅暴露少量稳定 API：
//! - `verify_api_key`：比对调用方提供的 Key 与配置的密钥
//! - `mask_by_url` / `mask_by_upload`：执行完整链路并整理为 `ApiResult`

use std::sync::Arc;

use bytes::Bytes;

use super::api::ApiResult;
use super::catalog::RandomSource;
use super::{ImageSource, MaskConfig, MaskError, MaskHandler};

/// 判断调用方是否通过 API Key 校验。
///
/// 未配置密钥时视为本地开发模式，直接放行。
pub fn verify_api_key(configured: Option<&str>, provided: Option<&str>) -> bool {
    match configured {
        None => true,
        Some(expected) => provided == Some(expected),
    }
}

/// 遮罩服务状态。
pub struct MaskServiceState {
    handler: MaskHandler,
}

impl MaskServiceState {
    /// 使用给定配置创建服务状态。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use photo_mask::mask_service::{MaskConfig, MaskServiceState};
    ///
    /// let service = MaskServiceState::with_config(MaskConfig::default())?;
    /// # Ok::<(), photo_mask::mask_service::MaskError>(())
    /// ```
    pub fn with_config(config: MaskConfig) -> Result<Self, MaskError> {
        Ok(Self {
            handler: MaskHandler::new(config)?,
        })
    }

    /// 注入随机源，用于测试或可复现的调用。
    pub fn with_random(config: MaskConfig, random: Arc<dyn RandomSource>) -> Result<Self, MaskError> {
        Ok(Self {
            handler: MaskHandler::with_random(config, random)?,
        })
    }

    pub fn config(&self) -> &MaskConfig {
        self.handler.config()
    }

    pub fn verify_api_key(&self, provided: Option<&str>) -> bool {
        verify_api_key(self.config().api_key.as_deref(), provided)
    }

    /// 下载远程图片并套用随机遮罩。
    pub async fn mask_by_url(&self, url: &str, api_key: Option<&str>) -> ApiResult {
        let authorized = self.verify_api_key(api_key);
        let result = self
            .handler
            .process(ImageSource::Url(url.to_string()), authorized)
            .await;
        Self::finish("mask_by_url", result)
    }

    /// 对上传的图片套用随机遮罩。
    pub async fn mask_by_upload(
        &self,
        bytes: Bytes,
        content_type: Option<&str>,
        api_key: Option<&str>,
    ) -> ApiResult {
        let authorized = self.verify_api_key(api_key);
        let source = ImageSource::Upload {
            bytes,
            content_type: content_type.map(str::to_string),
        };
        let result = self.handler.process(source, authorized).await;
        Self::finish("mask_by_upload", result)
    }

    fn finish(operation: &str, result: Result<super::MaskedImage, MaskError>) -> ApiResult {
        if let Err(err) = &result {
            if err.status() >= 500 {
                log::error!("❌ {} 失败 [{} / {}]：{}", operation, err.stage(), err.code(), err);
            } else {
                log::warn!("⚠️ {} 失败 [{} / {}]：{}", operation, err.stage(), err.code(), err);
            }
        }
        ApiResult::from(result)
    }
}
