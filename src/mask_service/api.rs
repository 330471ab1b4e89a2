//! # 对外响应模型
//!
//! 只负责把处理结果整理为稳定的序列化结构，不承载业务逻辑。
//! 成功与失败两种形态通过 `ApiResult` 表达，失败形态携带错误码、阶段与状态分类。

use serde::Serialize;

use super::source::MaskedImage;
use super::MaskError;

/// 成功响应。
#[derive(Debug, Clone, Serialize)]
pub struct MaskResponse {
    pub success: bool,
    pub mask_used: String,
    pub image_data: String,
    pub content_type: String,
}

impl From<MaskedImage> for MaskResponse {
    fn from(masked: MaskedImage) -> Self {
        Self {
            success: true,
            mask_used: masked.mask_used,
            image_data: masked.image_data,
            content_type: masked.content_type.to_string(),
        }
    }
}

/// 失败响应。
#[derive(Debug, Clone, Serialize)]
pub struct MaskErrorResponse {
    pub success: bool,
    pub code: &'static str,
    pub stage: &'static str,
    pub status: u16,
    pub message: String,
}

impl From<MaskError> for MaskErrorResponse {
    fn from(error: MaskError) -> Self {
        Self {
            success: false,
            code: error.code(),
            stage: error.stage(),
            status: error.status(),
            message: error.to_string(),
        }
    }
}

/// 单次请求的最终结果。
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ApiResult {
    Success(MaskResponse),
    Failure(MaskErrorResponse),
}

impl ApiResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// HTTP 风格状态码：成功为 200，失败取错误分类。
    pub fn status(&self) -> u16 {
        match self {
            Self::Success(_) => 200,
            Self::Failure(failure) => failure.status,
        }
    }
}

impl From<Result<MaskedImage, MaskError>> for ApiResult {
    fn from(result: Result<MaskedImage, MaskError>) -> Self {
        match result {
            Ok(masked) => Self::Success(masked.into()),
            Err(error) => Self::Failure(error.into()),
        }
    }
}

/// 服务描述。
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointInfo {
    pub name: &'static str,
    pub route: &'static str,
}

impl ServiceInfo {
    pub fn current() -> Self {
        Self {
            service: "Photo Masking API",
            version: env!("CARGO_PKG_VERSION"),
            endpoints: vec![
                EndpointInfo {
                    name: "mask_by_url",
                    route: "POST /mask-by-url",
                },
                EndpointInfo {
                    name: "mask_by_upload",
                    route: "POST /mask-by-upload",
                },
            ],
        }
    }
}

/// 存活探针。
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self { status: "healthy" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_serializes_to_public_shape() {
        let result = ApiResult::from(Ok(MaskedImage {
            mask_used: "mask_heart.png".to_string(),
            image_data: "iVBORw0KGgo=".to_string(),
            content_type: "image/png",
            width: 2,
            height: 2,
        }));

        let json = serde_json::to_value(&result).expect("serialize failed");
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "mask_used": "mask_heart.png",
                "image_data": "iVBORw0KGgo=",
                "content_type": "image/png",
            })
        );
        assert_eq!(result.status(), 200);
    }

    #[test]
    fn failure_carries_code_stage_and_status() {
        let result = ApiResult::from(Err(MaskError::PayloadTooLarge {
            size: 20_000_000,
            limit: 10_485_760,
        }));

        assert!(!result.is_success());
        assert_eq!(result.status(), 413);

        let json = serde_json::to_value(&result).expect("serialize failed");
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "payload_too_large");
        assert_eq!(json["stage"], "validate");
        assert_eq!(json["status"], 413);
    }

    #[test]
    fn service_info_lists_both_endpoints() {
        let info = serde_json::to_value(ServiceInfo::current()).expect("serialize failed");

        assert_eq!(info["service"], "Photo Masking API");
        assert_eq!(info["endpoints"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(
            serde_json::to_value(HealthStatus::healthy()).expect("serialize failed")["status"],
            "healthy"
        );
    }
}
