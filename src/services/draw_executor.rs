use crate::database::DbPool;
use crate::entities::{
    draw_record_entity as records, prize_entity as prizes, prize_level_entity as levels,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::utils::SharedRandom;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

/// 一次单人抽奖的输入
#[derive(Debug, Clone)]
pub struct DrawTicket {
    pub company_id: i32,
    pub user_id: i32,
    pub level_id: i32,
    /// 为 None 时在事务内从该等级有库存的奖品中等概率选一个
    pub prize_id: Option<i32>,
    pub ip: String,
}

/// 抽奖事务执行器
///
/// 库存和中奖资格的唯一写入方。选奖阶段的快照不可信，
/// 这里在事务内加行锁重新读取，再用带条件的更新兜底：
/// - 奖品: `used_stock = used_stock + 1 WHERE used_stock < total_stock`
/// - 用户: `has_drawn = true WHERE has_drawn = false`
///
/// 加锁顺序固定为先奖品后用户。
#[derive(Clone)]
pub struct DrawExecutor {
    pool: DbPool,
    rng: SharedRandom,
}

impl DrawExecutor {
    pub fn new(pool: DbPool, rng: SharedRandom) -> Self {
        Self { pool, rng }
    }

    /// 在单个事务内完成 校验 -> 写记录 -> 扣库存 -> 标记已中奖，任何一步失败整体回滚
    pub async fn execute(&self, ticket: &DrawTicket) -> AppResult<records::Model> {
        let txn = self.pool.begin().await?;

        match self.apply(&txn, ticket).await {
            Ok(record) => {
                txn.commit().await?;
                Ok(record)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    log::error!(
                        "Failed to roll back draw for user {}: {}",
                        ticket.user_id,
                        rollback_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        txn: &DatabaseTransaction,
        ticket: &DrawTicket,
    ) -> AppResult<records::Model> {
        levels::Entity::find_by_id(ticket.level_id)
            .filter(levels::Column::CompanyId.eq(ticket.company_id))
            .filter(levels::Column::IsActive.eq(true))
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Prize level not found or inactive".to_string()))?;

        let prize = self.lock_prize(txn, ticket).await?;

        let user = users::Entity::find_by_id(ticket.user_id)
            .filter(users::Column::CompanyId.eq(ticket.company_id))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if user.has_drawn {
            return Err(AppError::AlreadyDrawn);
        }

        settle(txn, ticket, prize.id).await
    }

    /// 锁定并返回本次要扣减的奖品
    async fn lock_prize(
        &self,
        txn: &DatabaseTransaction,
        ticket: &DrawTicket,
    ) -> AppResult<prizes::Model> {
        match ticket.prize_id {
            Some(prize_id) => {
                let prize = prizes::Entity::find_by_id(prize_id)
                    .filter(prizes::Column::LevelId.eq(ticket.level_id))
                    .lock_exclusive()
                    .one(txn)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Prize not found".to_string()))?;
                if !prize.is_available() {
                    return Err(AppError::OutOfStock);
                }
                Ok(prize)
            }
            None => {
                // 按 id 顺序锁住整个等级的奖品
                let mut available: Vec<prizes::Model> = prizes::Entity::find()
                    .filter(prizes::Column::LevelId.eq(ticket.level_id))
                    .order_by_asc(prizes::Column::Id)
                    .lock_exclusive()
                    .all(txn)
                    .await?
                    .into_iter()
                    .filter(prizes::Model::is_available)
                    .collect();
                if available.is_empty() {
                    return Err(AppError::OutOfStock);
                }
                let index = self.rng.next_below(available.len());
                Ok(available.swap_remove(index))
            }
        }
    }
}

/// 写入阶段：记录 + 条件扣库存 + 条件标记已中奖
///
/// 不依赖前面的行锁读取，两个条件更新本身就能挡住超发和重复中奖。
async fn settle(
    txn: &DatabaseTransaction,
    ticket: &DrawTicket,
    prize_id: i32,
) -> AppResult<records::Model> {
    let now = Utc::now();
    let record = records::ActiveModel {
        company_id: Set(ticket.company_id),
        user_id: Set(ticket.user_id),
        level_id: Set(ticket.level_id),
        prize_id: Set(prize_id),
        ip: Set(ticket.ip.clone()),
        created_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(map_record_conflict)?;

    let stock = prizes::Entity::update_many()
        .col_expr(
            prizes::Column::UsedStock,
            Expr::col(prizes::Column::UsedStock).add(1),
        )
        .col_expr(prizes::Column::UpdatedAt, Expr::value(now))
        .filter(prizes::Column::Id.eq(prize_id))
        .filter(Expr::col(prizes::Column::UsedStock).lt(Expr::col(prizes::Column::TotalStock)))
        .exec(txn)
        .await?;
    if stock.rows_affected != 1 {
        return Err(AppError::OutOfStock);
    }

    let flag = users::Entity::update_many()
        .col_expr(users::Column::HasDrawn, Expr::value(true))
        .col_expr(users::Column::UpdatedAt, Expr::value(now))
        .filter(users::Column::Id.eq(ticket.user_id))
        .filter(users::Column::HasDrawn.eq(false))
        .exec(txn)
        .await?;
    if flag.rows_affected != 1 {
        return Err(AppError::AlreadyDrawn);
    }

    Ok(record)
}

/// user_id 唯一索引冲突说明该用户已经有中奖记录
fn map_record_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::AlreadyDrawn,
        _ => AppError::DatabaseError(err),
    }
}
