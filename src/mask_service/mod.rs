//! # 遮罩处理模块（mask_service）
//!
//! ## 设计思路
//!
//! 该模块将“来源获取 → 校验 → 解码 → 选遮罩 → 缩放裁剪 → 套用透明通道 → 编码”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `service`：承载可注入状态（`MaskServiceState`）与 API Key 门禁
//! - `handler`：编排整条处理流水线
//! - `loader`：负责上传/URL 获取与下载期安全校验
//! - `validator`：内容类型白名单与体积上限
//! - `catalog`：遮罩目录扫描与随机选择
//! - `pipeline`：解码、覆盖缩放、裁剪、套用透明通道、编码
//! - `api/config/error/source`：响应模型、配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 调用方（HTTP 框架 / CLI）
//!    ↓
//! service.rs（API Key 门禁、结果整理为 ApiResult）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ catalog.rs（扫描遮罩，空目录立即失败）
//!    ├─ loader.rs（上传 / URL 获取 + 响应头预检）
//!    ├─ validator.rs（类型 + 体积）
//!    └─ pipeline.rs（spawn_blocking 中执行解码 → 变换 → 编码）
//!    ↓
//! 返回 ApiResult 给调用方
//! ```

pub mod api;
mod catalog;
mod config;
mod error;
mod handler;
mod loader;
mod pipeline;
mod service;
mod source;
mod validator;

pub use api::{ApiResult, HealthStatus, MaskErrorResponse, MaskResponse, ServiceInfo};
pub use catalog::{MaskCatalog, MaskEntry, RandomSource, SeededRandom, ThreadRandom};
pub use config::{DEFAULT_ALLOWED_CONTENT_TYPES, MaskConfig};
pub use error::MaskError;
pub use handler::MaskHandler;
pub use pipeline::{CoverFit, decode_transport_text};
pub use service::{MaskServiceState, verify_api_key};
pub use source::{ImageSource, MaskAsset, MaskedImage, SourceImage, TransformedImage};
pub use validator::validate;
