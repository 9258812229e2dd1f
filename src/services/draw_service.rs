use crate::database::DbPool;
use crate::entities::{draw_record_entity as records, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{DrawMode, DrawRequest, DrawResultResponse, Principal};
use crate::services::audit_service::{AuditEntry, AuditService, ClientInfo};
use crate::services::candidate_pool::{CandidatePool, CandidatePoolResolver};
use crate::services::draw_executor::{DrawExecutor, DrawTicket};
use crate::services::lottery_service::resolve_records;
use crate::services::selection::{self, Selection};
use crate::services::stock_ledger;
use crate::utils::{SharedRandom, normalize_phone, random_indices, validate_phone};
use serde_json::json;

/// 抽奖编排
///
/// 每次调用都是无状态的：解析候选池 -> 收敛人数 -> 逐个中奖位选奖并执行事务。
/// 单个中奖位失败只跳过该位，整批一个都没成功才返回 OperationFailed。
#[derive(Clone)]
pub struct DrawService {
    pool: DbPool,
    resolver: CandidatePoolResolver,
    executor: DrawExecutor,
    audit: AuditService,
    rng: SharedRandom,
    default_mode: DrawMode,
}

impl DrawService {
    pub fn new(
        pool: DbPool,
        audit: AuditService,
        rng: SharedRandom,
        default_mode: DrawMode,
    ) -> Self {
        Self {
            resolver: CandidatePoolResolver::new(pool.clone()),
            executor: DrawExecutor::new(pool.clone(), rng.clone()),
            pool,
            audit,
            rng,
            default_mode,
        }
    }

    pub async fn draw(
        &self,
        principal: &Principal,
        company_id: i32,
        req: &DrawRequest,
        client: &ClientInfo,
    ) -> AppResult<DrawResultResponse> {
        principal.require_admin()?;
        if !principal.can_draw_for(company_id) {
            return Err(AppError::Forbidden(
                "Cannot draw for another company".to_string(),
            ));
        }

        let pinned_phone = match req.pinned_phone() {
            Some(raw) => {
                let phone = normalize_phone(raw);
                validate_phone(&phone)?;
                Some(phone)
            }
            None => None,
        };

        let level_id = req.level_id();
        let mode = req.mode.unwrap_or(self.default_mode);

        let pool = self.resolver.resolve(company_id, level_id).await?;
        let pinned = match &pinned_phone {
            Some(phone) => Some(self.resolver.find_pinned(company_id, phone).await?),
            None => None,
        };

        let requested = req.requested_count();
        let count = pool.clamp_count(requested);
        let winners = self.pick_winners(&pool, pinned, count);

        log::info!(
            "Draw started: company={} level={:?} mode={} requested={} slots={}",
            company_id,
            level_id,
            mode,
            requested,
            winners.len()
        );

        let mut created: Vec<records::Model> = Vec::with_capacity(winners.len());
        for user in &winners {
            match self.draw_slot(&pool, user, mode, &client.ip).await {
                Ok(record) => created.push(record),
                Err(AppError::NoPrizesAvailable) => {
                    log::warn!(
                        "Company {company_id} ran out of prizes, stopping batch at user {}",
                        user.id
                    );
                    break;
                }
                Err(e) if e.is_expected_draw_failure() => {
                    log::warn!("Draw slot skipped for user {}: {e}", user.id);
                }
                Err(e) => {
                    log::error!("Draw slot failed for user {}: {e}", user.id);
                }
            }
        }

        if created.is_empty() {
            return Err(AppError::OperationFailed);
        }

        log::info!(
            "Draw finished: company={} succeeded={}/{}",
            company_id,
            created.len(),
            winners.len()
        );

        for record in &created {
            self.audit.record(AuditEntry {
                admin_id: principal.id,
                company_id: Some(company_id),
                action: "draw".to_string(),
                resource: "draw_record".to_string(),
                resource_id: Some(record.id),
                details: json!({
                    "user_id": record.user_id,
                    "level_id": record.level_id,
                    "prize_id": record.prize_id,
                    "mode": mode,
                }),
                client: client.clone(),
            });
        }

        resolve_records(&self.pool, created).await
    }

    /// 确定中奖位：指定用户占第 1 位，其余从剩下的候选人中无放回随机抽取
    fn pick_winners(
        &self,
        pool: &CandidatePool,
        pinned: Option<users::Model>,
        count: usize,
    ) -> Vec<users::Model> {
        let mut winners = Vec::with_capacity(count);
        let mut remaining = count;

        let pinned_id = pinned.as_ref().map(|u| u.id);
        if let Some(user) = pinned
            && remaining > 0
        {
            winners.push(user);
            remaining -= 1;
        }

        let rest: Vec<&users::Model> = pool
            .users
            .iter()
            .filter(|u| Some(u.id) != pinned_id)
            .collect();
        for index in random_indices(self.rng.as_ref(), rest.len(), remaining) {
            winners.push(rest[index].clone());
        }

        winners
    }

    /// 单个中奖位
    ///
    /// 指定等级时由执行器在事务内锁住该等级的奖品再挑选；
    /// 跨等级抽取先读最新库存快照选出等级和奖品，再交给执行器。
    async fn draw_slot(
        &self,
        pool: &CandidatePool,
        user: &users::Model,
        mode: DrawMode,
        ip: &str,
    ) -> AppResult<records::Model> {
        let (level_id, prize_id) = match &pool.level {
            Some(level) => (level.level.id, None),
            None => {
                let snapshot = stock_ledger::load_company_stock(&self.pool, pool.company_id).await?;
                let selection: Selection = selection::select(mode, &snapshot, self.rng.as_ref())?;
                (selection.level_id, Some(selection.prize_id))
            }
        };

        self.executor
            .execute(&DrawTicket {
                company_id: pool.company_id,
                user_id: user.id,
                level_id,
                prize_id,
                ip: ip.to_string(),
            })
            .await
    }
}
