use crate::entities::{prize_entity as prizes, prize_level_entity as levels};
use crate::error::{AppError, AppResult};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;

/// 某个奖项等级及其下所有奖品的库存快照
///
/// 快照只用于选奖和展示，最终是否还有库存以执行器事务内的重新读取为准。
#[derive(Debug, Clone)]
pub struct LevelStock {
    pub level: levels::Model,
    pub prizes: Vec<prizes::Model>,
}

impl LevelStock {
    /// 汇总总库存
    pub fn total_stock(&self) -> i64 {
        self.prizes.iter().map(|p| p.total_stock as i64).sum()
    }

    /// 汇总已用库存
    pub fn used_stock(&self) -> i64 {
        self.prizes.iter().map(|p| p.used_stock as i64).sum()
    }

    /// 剩余可抽数量
    pub fn remaining(&self) -> i64 {
        self.prizes.iter().map(|p| p.remaining() as i64).sum()
    }

    pub fn is_available(&self) -> bool {
        self.prizes.iter().any(prizes::Model::is_available)
    }

    pub fn available_prizes(&self) -> impl Iterator<Item = &prizes::Model> {
        self.prizes.iter().filter(|p| p.is_available())
    }
}

/// 公司下所有启用奖项等级的库存快照（按 sort_order, id 排序）
#[derive(Debug, Clone, Default)]
pub struct StockSnapshot {
    pub levels: Vec<LevelStock>,
}

impl StockSnapshot {
    /// 还有库存的奖项等级
    pub fn available_levels(&self) -> Vec<&LevelStock> {
        self.levels.iter().filter(|l| l.is_available()).collect()
    }

    /// 平铺后的所有有库存奖品
    pub fn available_prizes(&self) -> Vec<&prizes::Model> {
        self.levels
            .iter()
            .flat_map(LevelStock::available_prizes)
            .collect()
    }
}

/// 读取公司库存快照
pub async fn load_company_stock<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
) -> AppResult<StockSnapshot> {
    let level_list = levels::Entity::find()
        .filter(levels::Column::CompanyId.eq(company_id))
        .filter(levels::Column::IsActive.eq(true))
        .order_by_asc(levels::Column::SortOrder)
        .order_by_asc(levels::Column::Id)
        .all(db)
        .await?;

    if level_list.is_empty() {
        return Ok(StockSnapshot::default());
    }

    let level_ids: Vec<i32> = level_list.iter().map(|l| l.id).collect();
    let prize_list = prizes::Entity::find()
        .filter(prizes::Column::LevelId.is_in(level_ids))
        .order_by_asc(prizes::Column::Id)
        .all(db)
        .await?;

    let mut grouped: HashMap<i32, Vec<prizes::Model>> = HashMap::new();
    for prize in prize_list {
        grouped.entry(prize.level_id).or_default().push(prize);
    }

    let levels = level_list
        .into_iter()
        .map(|level| {
            let prizes = grouped.remove(&level.id).unwrap_or_default();
            LevelStock { level, prizes }
        })
        .collect();

    Ok(StockSnapshot { levels })
}

/// 读取单个奖项等级的库存快照
/// 等级不存在、不属于该公司或已停用时返回 NotFound
pub async fn load_level_stock<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    level_id: i32,
) -> AppResult<LevelStock> {
    let level = levels::Entity::find_by_id(level_id)
        .filter(levels::Column::CompanyId.eq(company_id))
        .filter(levels::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Prize level not found or inactive".to_string()))?;

    let prizes = prizes::Entity::find()
        .filter(prizes::Column::LevelId.eq(level.id))
        .order_by_asc(prizes::Column::Id)
        .all(db)
        .await?;

    Ok(LevelStock { level, prizes })
}
