use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 操作日志（审计）实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "operation_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub admin_id: i32,
    /// NULL 表示超级管理员操作
    pub company_id: Option<i32>,
    /// draw / create / update ...
    pub action: String,
    pub resource: String,
    pub resource_id: Option<i32>,
    /// JSON 字符串
    pub details: String,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
