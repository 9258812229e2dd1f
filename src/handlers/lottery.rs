//! 抽奖大屏使用的公开只读接口，全部按 company_code 区分租户

use crate::models::*;
use crate::services::{CompanyService, LotteryService};
use crate::utils::{normalize_phone, validate_phone};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/public/prize-levels",
    tag = "lottery",
    params(
        ("company_code" = String, Query, description = "公司代码")
    ),
    responses(
        (status = 200, description = "奖项等级及汇总库存", body = [PrizeLevelWithStock]),
        (status = 404, description = "公司不存在", body = ApiError)
    )
)]
/// 获取启用的奖项等级（按排序），库存为等级下所有奖品之和
pub async fn get_prize_levels(
    company_service: web::Data<CompanyService>,
    lottery_service: web::Data<LotteryService>,
    query: web::Query<CompanyCodeQuery>,
) -> Result<HttpResponse> {
    let result = async {
        let company = company_service.find_active_by_code(query.require()?).await?;
        lottery_service.prize_levels_with_stock(company.id).await
    }
    .await;

    match result {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/public/draw-records",
    tag = "lottery",
    params(
        ("company_code" = String, Query, description = "公司代码"),
        ("page" = Option<u64>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u64>, Query, description = "每页数量 (默认20，最大100)")
    ),
    responses(
        (status = 200, description = "中奖记录（倒序）", body = DrawRecordPage),
        (status = 404, description = "公司不存在", body = ApiError)
    )
)]
pub async fn get_draw_records(
    company_service: web::Data<CompanyService>,
    lottery_service: web::Data<LotteryService>,
    query: web::Query<DrawRecordQuery>,
) -> Result<HttpResponse> {
    let result = async {
        let code = require_param(query.company_code.as_deref(), "company_code")?;
        let company = company_service.find_active_by_code(code).await?;
        let params = PaginationParams::new(query.page, query.per_page);
        lottery_service.draw_records(company.id, &params).await
    }
    .await;

    match result {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/public/users/available",
    tag = "lottery",
    params(
        ("company_code" = String, Query, description = "公司代码")
    ),
    responses(
        (status = 200, description = "未中奖用户", body = [UserSummary]),
        (status = 404, description = "公司不存在", body = ApiError)
    )
)]
pub async fn get_available_users(
    company_service: web::Data<CompanyService>,
    lottery_service: web::Data<LotteryService>,
    query: web::Query<CompanyCodeQuery>,
) -> Result<HttpResponse> {
    let result = async {
        let company = company_service.find_active_by_code(query.require()?).await?;
        lottery_service.available_users(company.id).await
    }
    .await;

    match result {
        Ok(users) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": users }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/public/users/stats",
    tag = "lottery",
    params(
        ("company_code" = String, Query, description = "公司代码")
    ),
    responses(
        (status = 200, description = "用户抽奖统计", body = UserStatsResponse),
        (status = 404, description = "公司不存在", body = ApiError)
    )
)]
pub async fn get_user_stats(
    company_service: web::Data<CompanyService>,
    lottery_service: web::Data<LotteryService>,
    query: web::Query<CompanyCodeQuery>,
) -> Result<HttpResponse> {
    let result = async {
        let company = company_service.find_active_by_code(query.require()?).await?;
        lottery_service.user_stats(company.id).await
    }
    .await;

    match result {
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": stats }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/public/my-prize",
    tag = "lottery",
    params(
        ("company_code" = String, Query, description = "公司代码"),
        ("phone" = String, Query, description = "手机号")
    ),
    responses(
        (status = 200, description = "中奖记录；未中奖时 data 为 null", body = DrawRecordResponse),
        (status = 400, description = "手机号格式错误", body = ApiError),
        (status = 404, description = "公司或用户不存在", body = ApiError)
    )
)]
/// 按手机号查询自己的中奖结果
pub async fn get_my_prize(
    company_service: web::Data<CompanyService>,
    lottery_service: web::Data<LotteryService>,
    query: web::Query<MyPrizeQuery>,
) -> Result<HttpResponse> {
    let result = async {
        let code = require_param(query.company_code.as_deref(), "company_code")?;
        let phone = normalize_phone(require_param(query.phone.as_deref(), "phone")?);
        validate_phone(&phone)?;
        let company = company_service.find_active_by_code(code).await?;
        lottery_service.my_prize(company.id, &phone).await
    }
    .await;

    match result {
        Ok(Some(record)) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": record }))),
        Ok(None) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null,
            "message": "You have not won a prize yet"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn lottery_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/public")
            .route("/prize-levels", web::get().to(get_prize_levels))
            .route("/draw-records", web::get().to(get_draw_records))
            .route("/users/available", web::get().to(get_available_users))
            .route("/users/stats", web::get().to(get_user_stats))
            .route("/my-prize", web::get().to(get_my_prize)),
    );
}
