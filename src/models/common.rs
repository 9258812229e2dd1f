use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 失败响应体
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    #[schema(example = "OUT_OF_STOCK")]
    pub error_code: String,
}
