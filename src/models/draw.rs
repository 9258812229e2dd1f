use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::entities::{
    draw_record_entity as record_entity, prize_entity, prize_level_entity as level_entity,
    user_entity,
};

/// 未指定奖项等级时的选奖方式
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    /// 所有有库存的奖品平铺后等概率抽取（默认）
    #[default]
    Uniform,
    /// 按奖项等级的 probability 加权选等级，再在等级内等概率选奖品
    Weighted,
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawMode::Uniform => write!(f, "uniform"),
            DrawMode::Weighted => write!(f, "weighted"),
        }
    }
}

impl FromStr for DrawMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(DrawMode::Uniform),
            "weighted" => Ok(DrawMode::Weighted),
            other => Err(format!("unknown draw mode: {other}")),
        }
    }
}

/// 公司代码查询参数（所有抽奖接口必填）
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CompanyCodeQuery {
    pub company_code: Option<String>,
}

impl CompanyCodeQuery {
    pub fn require(&self) -> AppResult<&str> {
        require_param(self.company_code.as_deref(), "company_code")
    }
}

/// 必填查询参数，去掉首尾空白后不能为空
pub fn require_param<'a>(value: Option<&'a str>, name: &str) -> AppResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::ValidationError(format!(
            "{name} parameter is required"
        ))),
    }
}

/// 抽奖请求
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct DrawRequest {
    /// 指定奖项等级ID，0 或不传表示不指定
    #[schema(example = 1)]
    pub level_id: Option<i32>,
    /// 抽取人数（<=0 按 1 处理）
    #[schema(example = 3)]
    pub count: Option<i64>,
    /// 指定中奖用户的手机号（作为第 1 位中奖者）
    #[schema(example = "13812345678")]
    pub user_phone: Option<String>,
    /// 未指定奖项等级时的选奖方式，不传使用服务端默认值
    pub mode: Option<DrawMode>,
}

impl DrawRequest {
    pub fn level_id(&self) -> Option<i32> {
        self.level_id.filter(|id| *id > 0)
    }

    pub fn requested_count(&self) -> usize {
        match self.count {
            Some(n) if n > 0 => n as usize,
            _ => 1,
        }
    }

    pub fn pinned_phone(&self) -> Option<&str> {
        self.user_phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// 按手机号查询中奖结果
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct MyPrizeQuery {
    pub company_code: Option<String>,
    pub phone: Option<String>,
}

/// 中奖记录分页查询
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DrawRecordQuery {
    pub company_code: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub phone: String,
    pub has_drawn: bool,
}

impl From<user_entity::Model> for UserSummary {
    fn from(m: user_entity::Model) -> Self {
        UserSummary {
            id: m.id,
            username: m.username,
            name: m.name,
            phone: m.phone,
            has_drawn: m.has_drawn,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrizeLevelSummary {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub probability: f64,
    pub sort_order: i32,
}

impl From<level_entity::Model> for PrizeLevelSummary {
    fn from(m: level_entity::Model) -> Self {
        PrizeLevelSummary {
            id: m.id,
            name: m.name,
            description: m.description,
            probability: m.probability,
            sort_order: m.sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrizeSummary {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub total_stock: i32,
    pub used_stock: i32,
}

impl From<prize_entity::Model> for PrizeSummary {
    fn from(m: prize_entity::Model) -> Self {
        PrizeSummary {
            id: m.id,
            name: m.name,
            image: m.image,
            total_stock: m.total_stock,
            used_stock: m.used_stock,
        }
    }
}

/// 中奖记录（带用户 / 奖项 / 奖品信息，用于展示）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawRecordResponse {
    pub id: i32,
    pub company_id: i32,
    pub user_id: i32,
    pub level_id: i32,
    pub prize_id: i32,
    pub ip: String,
    pub created_at: DateTime<Utc>,
    pub user: Option<UserSummary>,
    pub level: Option<PrizeLevelSummary>,
    pub prize: Option<PrizeSummary>,
}

impl DrawRecordResponse {
    pub fn new(
        record: record_entity::Model,
        user: Option<user_entity::Model>,
        level: Option<level_entity::Model>,
        prize: Option<prize_entity::Model>,
    ) -> Self {
        DrawRecordResponse {
            id: record.id,
            company_id: record.company_id,
            user_id: record.user_id,
            level_id: record.level_id,
            prize_id: record.prize_id,
            ip: record.ip,
            created_at: record.created_at.unwrap_or_else(Utc::now),
            user: user.map(Into::into),
            level: level.map(Into::into),
            prize: prize.map(Into::into),
        }
    }
}

/// 奖项等级 + 汇总库存（库存从该等级下所有奖品汇总）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrizeLevelWithStock {
    #[serde(flatten)]
    pub level: PrizeLevelSummary,
    pub total_stock: i64,
    pub used_stock: i64,
    pub prizes: Vec<PrizeSummary>,
}

/// 用户抽奖统计
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserStatsResponse {
    pub total_users: u64,
    pub drawn_users: u64,
    pub undrawn_users: u64,
}

/// 抽奖结果列表
pub type DrawResultResponse = Vec<DrawRecordResponse>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_request_normalization() {
        let req = DrawRequest {
            level_id: Some(0),
            count: Some(-3),
            user_phone: Some("   ".to_string()),
            mode: None,
        };
        assert_eq!(req.level_id(), None);
        assert_eq!(req.requested_count(), 1);
        assert_eq!(req.pinned_phone(), None);

        let req = DrawRequest {
            level_id: Some(4),
            count: Some(100),
            user_phone: Some(" 13812345678 ".to_string()),
            mode: Some(DrawMode::Weighted),
        };
        assert_eq!(req.level_id(), Some(4));
        assert_eq!(req.requested_count(), 100);
        assert_eq!(req.pinned_phone(), Some("13812345678"));
    }

    #[test]
    fn test_draw_request_from_json() {
        let req: DrawRequest =
            serde_json::from_str(r#"{"level_id": 2, "count": 3, "mode": "weighted"}"#).unwrap();
        assert_eq!(req.level_id(), Some(2));
        assert_eq!(req.mode, Some(DrawMode::Weighted));
        assert!(serde_json::from_str::<DrawRequest>(r#"{"mode": "loaded"}"#).is_err());
    }

    #[test]
    fn test_draw_mode_from_str() {
        assert_eq!("Weighted".parse::<DrawMode>().unwrap(), DrawMode::Weighted);
        assert_eq!(" uniform ".parse::<DrawMode>().unwrap(), DrawMode::Uniform);
        assert!("random".parse::<DrawMode>().is_err());
    }

    #[test]
    fn test_company_code_required() {
        let q = CompanyCodeQuery { company_code: None };
        assert!(q.require().is_err());
        let q = CompanyCodeQuery {
            company_code: Some(" acme ".to_string()),
        };
        assert_eq!(q.require().unwrap(), "acme");
        assert!(require_param(Some("  "), "phone").is_err());
    }
}
