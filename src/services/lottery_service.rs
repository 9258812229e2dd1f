//! 抽奖大屏的只读查询：奖项库存、中奖记录、候选用户、统计

use crate::database::DbPool;
use crate::entities::{
    draw_record_entity as records, prize_entity as prizes, prize_level_entity as levels,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    DrawRecordResponse, PaginatedResponse, PaginationParams, PrizeLevelWithStock,
    UserStatsResponse, UserSummary,
};
use crate::services::stock_ledger;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct LotteryService {
    pool: DbPool,
}

impl LotteryService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 启用的奖项等级（按 sort_order），库存从奖品汇总
    pub async fn prize_levels_with_stock(
        &self,
        company_id: i32,
    ) -> AppResult<Vec<PrizeLevelWithStock>> {
        let snapshot = stock_ledger::load_company_stock(&self.pool, company_id).await?;

        Ok(snapshot
            .levels
            .into_iter()
            .map(|stock| PrizeLevelWithStock {
                total_stock: stock.total_stock(),
                used_stock: stock.used_stock(),
                level: stock.level.into(),
                prizes: stock.prizes.into_iter().map(Into::into).collect(),
            })
            .collect())
    }

    /// 中奖记录分页（按时间倒序）
    pub async fn draw_records(
        &self,
        company_id: i32,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<DrawRecordResponse>> {
        let base_query =
            records::Entity::find().filter(records::Column::CompanyId.eq(company_id));

        let total = base_query.clone().count(&self.pool).await?;

        let page = base_query
            .order_by_desc(records::Column::CreatedAt)
            .order_by_desc(records::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let items = resolve_records(&self.pool, page).await?;
        Ok(PaginatedResponse::new(items, params, total))
    }

    /// 可抽奖（未中奖）用户
    pub async fn available_users(&self, company_id: i32) -> AppResult<Vec<UserSummary>> {
        let list = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::HasDrawn.eq(false))
            .order_by_asc(users::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn user_stats(&self, company_id: i32) -> AppResult<UserStatsResponse> {
        let total_users = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .count(&self.pool)
            .await?;
        let drawn_users = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::HasDrawn.eq(true))
            .count(&self.pool)
            .await?;

        Ok(UserStatsResponse {
            total_users,
            drawn_users,
            undrawn_users: total_users.saturating_sub(drawn_users),
        })
    }

    /// 按手机号查询中奖结果
    ///
    /// 用户不存在返回 NotFound；未中奖返回 None
    pub async fn my_prize(
        &self,
        company_id: i32,
        phone: &str,
    ) -> AppResult<Option<DrawRecordResponse>> {
        let candidates = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::Phone.eq(phone))
            .order_by_asc(users::Column::Id)
            .all(&self.pool)
            .await?;

        if candidates.is_empty() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        // 同号多人时优先返回已中奖的那一个
        let Some(winner) = candidates.into_iter().find(|u| u.has_drawn) else {
            return Ok(None);
        };

        let record = records::Entity::find()
            .filter(records::Column::UserId.eq(winner.id))
            .one(&self.pool)
            .await?;

        match record {
            Some(record) => Ok(resolve_records(&self.pool, vec![record]).await?.pop()),
            None => {
                log::warn!("User {} is marked as drawn but has no draw record", winner.id);
                Ok(None)
            }
        }
    }
}

/// 为中奖记录批量补齐 用户 / 奖项等级 / 奖品 信息，保持原顺序
pub async fn resolve_records<C: ConnectionTrait>(
    db: &C,
    list: Vec<records::Model>,
) -> AppResult<Vec<DrawRecordResponse>> {
    if list.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<i32> = list.iter().map(|r| r.user_id).collect();
    let level_ids: Vec<i32> = list.iter().map(|r| r.level_id).collect();
    let prize_ids: Vec<i32> = list.iter().map(|r| r.prize_id).collect();

    let user_map: HashMap<i32, users::Model> = users::Entity::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let level_map: HashMap<i32, levels::Model> = levels::Entity::find()
        .filter(levels::Column::Id.is_in(level_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let prize_map: HashMap<i32, prizes::Model> = prizes::Entity::find()
        .filter(prizes::Column::Id.is_in(prize_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    Ok(list
        .into_iter()
        .map(|record| {
            let user = user_map.get(&record.user_id).cloned();
            let level = level_map.get(&record.level_id).cloned();
            let prize = prize_map.get(&record.prize_id).cloned();
            DrawRecordResponse::new(record, user, level, prize)
        })
        .collect())
}
