use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 令牌中携带的角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

/// 已认证的调用方（由鉴权中间件注入请求扩展）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    /// 超级管理员为 None
    pub company_id: Option<i32>,
    pub is_admin: bool,
    pub is_super_admin: bool,
}

impl Principal {
    pub fn new(id: i32, company_id: Option<i32>, role: Role) -> Self {
        Self {
            id,
            company_id,
            is_admin: matches!(role, Role::Admin | Role::SuperAdmin),
            is_super_admin: role == Role::SuperAdmin,
        }
    }

    pub fn role(&self) -> Role {
        if self.is_super_admin {
            Role::SuperAdmin
        } else if self.is_admin {
            Role::Admin
        } else {
            Role::User
        }
    }

    /// 抽奖等管理操作要求管理员身份，在解析公司之前检查
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin || self.is_super_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin privileges required".to_string()))
        }
    }

    /// 是否可以对指定公司执行抽奖
    /// 超级管理员不受公司限制；普通管理员只能操作自己所属公司
    pub fn can_draw_for(&self, company_id: i32) -> bool {
        if self.is_super_admin {
            return true;
        }
        self.is_admin && self.company_id.is_none_or(|own| own == company_id)
    }
}
