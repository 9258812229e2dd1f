use crate::database::DbPool;
use crate::entities::operation_log_entity as logs;
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;

/// 发起请求的客户端信息
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

/// 一条待写入的操作日志
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub admin_id: i32,
    pub company_id: Option<i32>,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<i32>,
    pub details: Value,
    pub client: ClientInfo,
}

/// 操作日志服务
///
/// 写日志失败只记录错误，不影响业务本身。
#[derive(Clone)]
pub struct AuditService {
    pool: DbPool,
}

impl AuditService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 后台异步写入，不等待结果
    pub fn record(&self, entry: AuditEntry) {
        let service = self.clone();
        tokio::spawn(async move {
            let action = entry.action.clone();
            if let Err(e) = service.insert(entry).await {
                log::error!("Failed to write operation log ({action}): {e}");
            }
        });
    }

    pub async fn insert(&self, entry: AuditEntry) -> AppResult<logs::Model> {
        let details = serde_json::to_string(&entry.details).map_err(|e| {
            AppError::InternalError(format!("Failed to encode operation log details: {e}"))
        })?;
        let model = logs::ActiveModel {
            admin_id: Set(entry.admin_id),
            company_id: Set(entry.company_id),
            action: Set(entry.action),
            resource: Set(entry.resource),
            resource_id: Set(entry.resource_id),
            details: Set(details),
            ip_address: Set(entry.client.ip),
            user_agent: Set(entry.client.user_agent),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestDb;
    use sea_orm::EntityTrait;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_operation_log() {
        let db = TestDb::new().await;
        let service = AuditService::new(db.conn.clone());

        let saved = service
            .insert(AuditEntry {
                admin_id: 3,
                company_id: Some(1),
                action: "draw".to_string(),
                resource: "draw_record".to_string(),
                resource_id: Some(42),
                details: json!({ "prize_id": 7 }),
                client: ClientInfo {
                    ip: "10.0.0.1".to_string(),
                    user_agent: "curl/8".to_string(),
                },
            })
            .await
            .unwrap();

        let loaded = logs::Entity::find_by_id(saved.id)
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.action, "draw");
        assert_eq!(loaded.resource_id, Some(42));
        let details: Value = serde_json::from_str(&loaded.details).unwrap();
        assert_eq!(details["prize_id"], 7);
    }
}
