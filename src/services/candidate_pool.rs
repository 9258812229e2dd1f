use crate::database::DbPool;
use crate::entities::{company_entity as companies, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::services::stock_ledger::{self, LevelStock};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

/// 一次抽奖可用的候选池（只读快照）
#[derive(Debug, Clone)]
pub struct CandidatePool {
    pub company_id: i32,
    /// 未中奖用户，按 id 升序
    pub users: Vec<users::Model>,
    /// 指定奖项等级时的库存快照
    pub level: Option<LevelStock>,
}

impl CandidatePool {
    /// 把请求人数收敛到候选人数，指定等级时再收敛到剩余库存
    pub fn clamp_count(&self, requested: usize) -> usize {
        let mut count = requested.min(self.users.len());
        if let Some(level) = &self.level {
            count = count.min(level.remaining().max(0) as usize);
        }
        count
    }
}

#[derive(Clone)]
pub struct CandidatePoolResolver {
    pool: DbPool,
}

impl CandidatePoolResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 解析候选池
    ///
    /// 1. 公司必须存在且启用
    /// 2. 指定等级时校验归属与启用状态，并按奖品汇总库存，已用 >= 总量视为抽完
    /// 3. 未中奖用户为空时返回 NoCandidates
    pub async fn resolve(&self, company_id: i32, level_id: Option<i32>) -> AppResult<CandidatePool> {
        companies::Entity::find_by_id(company_id)
            .filter(companies::Column::IsActive.eq(true))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

        let level = match level_id {
            Some(id) => {
                let stock = stock_ledger::load_level_stock(&self.pool, company_id, id).await?;
                if stock.used_stock() >= stock.total_stock() {
                    return Err(AppError::OutOfStock);
                }
                Some(stock)
            }
            None => None,
        };

        let users = self.eligible_users(company_id).await?;
        if users.is_empty() {
            return Err(AppError::NoCandidates);
        }

        Ok(CandidatePool {
            company_id,
            users,
            level,
        })
    }

    /// 公司下所有未中奖用户
    pub async fn eligible_users(&self, company_id: i32) -> AppResult<Vec<users::Model>> {
        let list = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::HasDrawn.eq(false))
            .order_by_asc(users::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    /// 按手机号找到指定中奖者
    ///
    /// 同一手机号可能对应多条用户记录，取第一个未中奖的；
    /// 全部已中奖返回 AlreadyDrawn，查无此人返回 NotFound
    pub async fn find_pinned(&self, company_id: i32, phone: &str) -> AppResult<users::Model> {
        let matches = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::Phone.eq(phone))
            .order_by_asc(users::Column::Id)
            .all(&self.pool)
            .await?;

        if matches.is_empty() {
            return Err(AppError::NotFound(
                "Specified user not found in this company".to_string(),
            ));
        }

        matches
            .into_iter()
            .find(|u| !u.has_drawn)
            .ok_or(AppError::AlreadyDrawn)
    }
}
