use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 奖品实体（库存单位）
/// 不变式: 0 <= used_stock <= total_stock
/// used_stock 只由抽奖执行器在事务内 +1
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "prizes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub level_id: i32,
    pub name: String,
    pub image: String,
    pub total_stock: i32,
    pub used_stock: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 是否还有库存
    pub fn is_available(&self) -> bool {
        self.used_stock < self.total_stock
    }

    /// 剩余库存（不会为负）
    pub fn remaining(&self) -> i32 {
        (self.total_stock - self.used_stock).max(0)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::prize_levels::Entity",
        from = "Column::LevelId",
        to = "super::prize_levels::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Level,
}

impl Related<super::prize_levels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Level.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
