//! # 照片遮罩服务：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            调用方（HTTP 框架 / 命令行 photo-mask）        │
//! │       路由、请求头解析、CORS 均不在本库范围内             │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ ApiResult（success / failure + 状态分类）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────────── AppError（命令行与启动期错误）       │
//! │  │                                                       │
//! │  └─ mask_service     遮罩处理链路                         │
//! │      ├─ service      API Key 门禁 + 结果整理              │
//! │      ├─ handler      编排（异步获取 + 阻塞线程变换）      │
//! │      ├─ loader       上传 / URL 获取                      │
//! │      ├─ validator    内容类型 + 体积上限                  │
//! │      ├─ catalog      遮罩扫描 + 随机选择                  │
//! │      └─ pipeline     解码·覆盖缩放·裁剪·透明通道·编码     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 应用级错误类型 `AppError`，命令行入口的返回类型 |
//! | [`mask_service`] | 获取图片、套用随机遮罩并编码为 Base64 PNG |

pub mod error;
pub mod mask_service;
