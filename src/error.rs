use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 用户已经中过奖
    #[error("User has already drawn")]
    AlreadyDrawn,

    /// 奖品 / 奖项库存已抽完
    #[error("Prize is out of stock")]
    OutOfStock,

    /// 公司下没有任何有库存的奖品
    #[error("No prizes available")]
    NoPrizesAvailable,

    /// 没有可抽奖（未中奖）的用户
    #[error("No eligible users to draw")]
    NoCandidates,

    /// 整批抽奖一个都没成功
    #[error("Operation failed")]
    OperationFailed,

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// 并发竞争下预期内的失败（已中奖 / 库存抽完 / 记录消失），区别于存储层异常
    pub fn is_expected_draw_failure(&self) -> bool {
        matches!(
            self,
            AppError::AlreadyDrawn
                | AppError::OutOfStock
                | AppError::NoPrizesAvailable
                | AppError::NotFound(_)
        )
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::AuthError(_) | AppError::JwtError(_) => {
                (StatusCode::UNAUTHORIZED, "AUTH_ERROR")
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            AppError::AlreadyDrawn => (StatusCode::CONFLICT, "ALREADY_DRAWN"),
            AppError::OutOfStock => (StatusCode::CONFLICT, "OUT_OF_STOCK"),
            AppError::NoPrizesAvailable => (StatusCode::CONFLICT, "NO_PRIZES_AVAILABLE"),
            AppError::NoCandidates => (StatusCode::BAD_REQUEST, "NO_CANDIDATES"),
            AppError::OperationFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "OPERATION_FAILED")
            }
            AppError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_and_code().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code) = self.status_and_code();

        // 存储层 / 内部错误只写日志，不把细节返回给调用方
        let message = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                msg.clone()
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                msg.clone()
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                "Invalid access token".to_string()
            }
            AppError::Forbidden(msg) => {
                log::warn!("Forbidden access: {msg}");
                msg.clone()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::AlreadyDrawn
            | AppError::OutOfStock
            | AppError::NoPrizesAvailable
            | AppError::NoCandidates => self.to_string(),
            AppError::OperationFailed => {
                log::error!("Draw batch produced no winners");
                "Operation failed, please try again later".to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            AppError::InternalError(msg) => {
                log::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": message,
            "error_code": error_code
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_errors_map_to_conflict() {
        assert_eq!(AppError::AlreadyDrawn.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::OutOfStock.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NoCandidates.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::OperationFailed.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_expected_draw_failure() {
        assert!(AppError::AlreadyDrawn.is_expected_draw_failure());
        assert!(AppError::OutOfStock.is_expected_draw_failure());
        assert!(!AppError::DatabaseError(DbErr::Custom("boom".into())).is_expected_draw_failure());
        assert!(!AppError::NoCandidates.is_expected_draw_failure());
    }

    #[test]
    fn test_database_error_hides_detail() {
        let resp = AppError::DatabaseError(DbErr::Custom("secret table".into())).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_internal_error_hides_detail() {
        let err = AppError::InternalError("encoder exploded".into());
        assert!(!err.is_expected_draw_failure());

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error_code"], "INTERNAL_ERROR");
        assert_eq!(body["error"], "Internal server error");
    }
}
