//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `MaskHandler` 只负责流程编排，不绑定任何网络框架。
//! 处理链路固定为：
//! 1. 授权门禁（由调用方给出布尔结果）
//! 2. 扫描遮罩目录（为空则在获取图片前失败）
//! 3. 按来源获取原始字节
//! 4. 内容类型与体积校验（两种来源共用）
//! 5. 解码 → 随机选遮罩 → 覆盖缩放裁剪 → 套用透明通道 → 编码
//!
//! ## 实现思路
//!
//! - 配置以 `Arc<MaskConfig>` 只读共享，请求之间没有可变共享状态。
//! - 网络获取在异步上下文中等待；目录扫描与 CPU 密集的第 5 步放到 `spawn_blocking`，
//!   避免单张大图阻塞其他并发请求。
//! - 任一阶段失败立即返回，不产出部分结果。
//! - 记录 `acquire/decode/transform/encode/total` 阶段耗时，便于性能诊断。

use std::sync::Arc;
use std::time::Instant;

use super::catalog::{MaskCatalog, MaskEntry, RandomSource, ThreadRandom};
use super::source::{ImageSource, MaskedImage, RawImageData};
use super::validator;
use super::{MaskConfig, MaskError};

/// 遮罩处理器。
///
/// 封装了只读配置、遮罩目录、随机源与复用型 HTTP 客户端。
pub struct MaskHandler {
    pub(super) config: Arc<MaskConfig>,
    pub(super) http_client: reqwest::Client,
    pub(super) catalog: MaskCatalog,
    pub(super) random: Arc<dyn RandomSource>,
}

impl MaskHandler {
    /// 使用线程本地随机源创建处理器。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use photo_mask::mask_service::{MaskConfig, MaskHandler};
    ///
    /// let handler = MaskHandler::new(MaskConfig::default())?;
    /// # Ok::<(), photo_mask::mask_service::MaskError>(())
    /// ```
    pub fn new(config: MaskConfig) -> Result<Self, MaskError> {
        Self::with_random(config, Arc::new(ThreadRandom))
    }

    /// 注入自定义随机源，测试中用于断言确切的遮罩选择。
    pub fn with_random(config: MaskConfig, random: Arc<dyn RandomSource>) -> Result<Self, MaskError> {
        let http_client = Self::build_http_client(&config)?;
        let catalog = MaskCatalog::new(&config);

        Ok(Self {
            config: Arc::new(config),
            http_client,
            catalog,
            random,
        })
    }

    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    /// 处理主入口：获取图片并套用随机遮罩。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use photo_mask::mask_service::{ImageSource, MaskConfig, MaskHandler};
    ///
    /// # async fn demo() -> Result<(), photo_mask::mask_service::MaskError> {
    /// let handler = MaskHandler::new(MaskConfig::default())?;
    /// let masked = handler
    ///     .process(ImageSource::Url("https://example.com/a.jpg".into()), true)
    ///     .await?;
    /// println!("{}", masked.mask_used);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn process(&self, source: ImageSource, authorized: bool) -> Result<MaskedImage, MaskError> {
        if !authorized {
            return Err(MaskError::AuthFailure);
        }

        let total_start = Instant::now();
        let catalog = self.catalog.clone();
        let entries = tokio::task::spawn_blocking(move || catalog.scan())
            .await
            .map_err(|e| MaskError::Internal(format!("遮罩扫描线程执行失败：{}", e)))??;

        let acquire_start = Instant::now();
        let raw = match source {
            ImageSource::Url(url) => self.load_from_url(&url, &self.config).await?,
            ImageSource::Upload {
                bytes,
                content_type,
            } => Self::load_from_upload(bytes, content_type.as_deref()),
        };
        validator::validate(&raw.content_type, raw.bytes.len() as u64, &self.config)?;
        let acquire_elapsed = acquire_start.elapsed();

        let config = Arc::clone(&self.config);
        let catalog = self.catalog.clone();
        let random = Arc::clone(&self.random);

        let masked = tokio::task::spawn_blocking(move || {
            Self::transform(raw, &entries, &catalog, random.as_ref(), &config)
        })
        .await
        .map_err(|e| MaskError::Internal(format!("图片处理线程执行失败：{}", e)))??;

        log::info!(
            "✅ 遮罩处理完成 - mask={} acquire={}ms total={}ms",
            masked.mask_used,
            acquire_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(masked)
    }

    /// CPU 密集阶段：解码、选遮罩、缩放裁剪、套用透明通道、编码。
    fn transform(
        raw: RawImageData,
        entries: &[MaskEntry],
        catalog: &MaskCatalog,
        random: &dyn RandomSource,
        config: &MaskConfig,
    ) -> Result<MaskedImage, MaskError> {
        let decode_start = Instant::now();
        let source = Self::decode(&raw, config)?;
        drop(raw);
        let decode_elapsed = decode_start.elapsed();

        let transform_start = Instant::now();
        let mask = catalog.pick_from(entries, random)?;
        let cropped = Self::fit_and_crop(&source, mask.width, mask.height, config)?;
        drop(source);
        let transformed = Self::composite(cropped, &mask)?;
        let transform_elapsed = transform_start.elapsed();

        let encode_start = Instant::now();
        let png = Self::encode_png(&transformed)?;
        let image_data = Self::to_transport_text(&png);
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "🎨 阶段耗时 - decode={}ms transform={}ms encode={}ms output={}KB",
            decode_elapsed.as_millis(),
            transform_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            png.len() / 1024
        );

        Ok(MaskedImage {
            mask_used: mask.identifier,
            image_data,
            content_type: "image/png",
            width: transformed.width(),
            height: transformed.height(),
        })
    }
}
