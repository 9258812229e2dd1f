use crate::database::DbPool;
use crate::entities::company_entity as companies;
use crate::error::{AppError, AppResult};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

#[derive(Clone)]
pub struct CompanyService {
    pool: DbPool,
}

impl CompanyService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 按公司代码查找启用中的公司，不存在或已停用返回 NotFound
    pub async fn find_active_by_code(&self, code: &str) -> AppResult<companies::Model> {
        companies::Entity::find()
            .filter(companies::Column::Code.eq(code))
            .filter(companies::Column::IsActive.eq(true))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))
    }
}
