use crate::database::DbPool;
use actix_web::{HttpResponse, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "服务与数据库均正常"),
        (status = 503, description = "数据库不可用")
    )
)]
pub async fn health(pool: web::Data<DbPool>) -> Result<HttpResponse> {
    match pool.ping().await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "status": "ok", "database": "ok" }))),
        Err(e) => {
            log::error!("Health check database ping failed: {e}");
            Ok(HttpResponse::ServiceUnavailable()
                .json(json!({ "status": "degraded", "database": "unreachable" })))
        }
    }
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
