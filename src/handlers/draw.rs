use crate::error::{AppError, AppResult};
use crate::middlewares::current_principal;
use crate::models::*;
use crate::services::{ClientInfo, CompanyService, DrawService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use std::net::SocketAddr;

/// 提取客户端 IP（优先代理头）与 User-Agent
pub fn client_info(req: &HttpRequest) -> ClientInfo {
    let raw = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    let ip = raw
        .parse::<SocketAddr>()
        .map(|addr| addr.ip().to_string())
        .unwrap_or(raw);

    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    ClientInfo { ip, user_agent }
}

#[utoipa::path(
    post,
    path = "/draw",
    tag = "draw",
    params(
        ("company_code" = String, Query, description = "公司代码")
    ),
    request_body = DrawRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "抽奖成功，返回本次全部中奖记录", body = [DrawRecordResponse]),
        (status = 400, description = "参数错误 / 没有可抽奖用户", body = ApiError),
        (status = 401, description = "未授权", body = ApiError),
        (status = 403, description = "无抽奖权限", body = ApiError),
        (status = 404, description = "公司 / 奖项等级 / 指定用户不存在", body = ApiError),
        (status = 409, description = "已中奖 / 库存不足", body = ApiError),
        (status = 500, description = "整批抽奖全部失败", body = ApiError)
    )
)]
/// 执行抽奖（管理员）
///
/// - level_id 为空或 0 时按服务端默认方式（或请求里的 mode）跨奖项抽取
/// - count 会被收敛到未中奖人数，指定等级时还会收敛到剩余库存
/// - user_phone 指定的用户固定为第 1 位中奖者
/// - 单个中奖位失败会被跳过，返回的记录数可能少于请求人数
pub async fn draw(
    draw_service: web::Data<DrawService>,
    company_service: web::Data<CompanyService>,
    req: HttpRequest,
    query: web::Query<CompanyCodeQuery>,
    body: web::Json<DrawRequest>,
) -> Result<HttpResponse> {
    let result: AppResult<DrawResultResponse> = async {
        let principal = current_principal(&req)
            .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))?;
        // 角色检查早于公司解析
        principal.require_admin()?;
        let company = company_service.find_active_by_code(query.require()?).await?;
        draw_service
            .draw(&principal, company.id, &body, &client_info(&req))
            .await
    }
    .await;

    match result {
        Ok(records) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": records }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/draw", web::post().to(draw));
}
