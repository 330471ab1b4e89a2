//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError`，承载启动配置、文件读写与遮罩链路三类失败，
//! 替代入口处分散的 `.map_err(|e| e.to_string())`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `MaskError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于直接输出 JSON。

use serde::Serialize;

use crate::mask_service::MaskError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 遮罩处理链路错误（获取 / 校验 / 解码 / 编码）
    #[error("{0}")]
    Mask(#[from] MaskError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置无效
    #[error("配置错误: {0}")]
    Config(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_errors_keep_their_message() {
        let err = AppError::from(MaskError::NoMasksAvailable);
        assert_eq!(err.to_string(), MaskError::NoMasksAvailable.to_string());

        let json = serde_json::to_string(&err).expect("serialize failed");
        assert_eq!(json, format!("\"{}\"", MaskError::NoMasksAvailable));
    }
}
