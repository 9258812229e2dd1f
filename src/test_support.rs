//! 测试辅助：内存 SQLite + 真实迁移 + 种子数据

use crate::entities::{
    company_entity as companies, draw_record_entity as records, prize_entity as prizes,
    prize_level_entity as levels, user_entity as users,
};
use crate::utils::RandomSource;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, Set,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

static FILE_SEQ: AtomicUsize = AtomicUsize::new(0);

pub struct TestDb {
    pub conn: DatabaseConnection,
    path: Option<PathBuf>,
}

impl TestDb {
    /// 单连接的内存库：所有事务串行执行，适合验证库存 / 资格的原子性
    pub async fn new() -> Self {
        Self::connect("sqlite::memory:".to_string(), 1, None).await
    }

    /// 多连接的文件库，事务会真正交错执行
    ///
    /// 写锁冲突时等待 sqlx 默认的 busy_timeout（5 秒），
    /// 检测到死锁的一方直接拿到 "database is locked" 并回滚。
    pub async fn shared_file(max_connections: u32) -> Self {
        let path = std::env::temp_dir().join(format!(
            "lottery-test-{}-{}.db",
            std::process::id(),
            FILE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        remove_db_files(&path);
        let url = format!("sqlite://{}?mode=rwc", path.display());
        Self::connect(url, max_connections, Some(path)).await
    }

    async fn connect(url: String, max_connections: u32, path: Option<PathBuf>) -> Self {
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);
        let conn = Database::connect(options).await.unwrap();
        Migrator::up(&conn, None).await.unwrap();
        Self { conn, path }
    }

    pub async fn company(&self, code: &str) -> companies::Model {
        companies::ActiveModel {
            code: Set(code.to_string()),
            name: Set(format!("{code} Inc.")),
            is_active: Set(true),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .unwrap()
    }

    pub async fn deactivate_company(&self, id: i32) {
        let mut am = companies::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .unwrap()
            .unwrap()
            .into_active_model();
        am.is_active = Set(false);
        am.update(&self.conn).await.unwrap();
    }

    pub async fn user(&self, company_id: i32, name: &str, phone: &str) -> users::Model {
        users::ActiveModel {
            company_id: Set(company_id),
            username: Set(name.to_lowercase()),
            name: Set(name.to_string()),
            phone: Set(phone.to_string()),
            has_drawn: Set(false),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .unwrap()
    }

    /// 批量创建用户，手机号 13800000000 + i
    pub async fn users(&self, company_id: i32, n: usize) -> Vec<users::Model> {
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            out.push(
                self.user(company_id, &format!("User{i}"), &phone_for(i))
                    .await,
            );
        }
        out
    }

    pub async fn mark_drawn(&self, user_id: i32) {
        let mut am = self.reload_user(user_id).await.into_active_model();
        am.has_drawn = Set(true);
        am.update(&self.conn).await.unwrap();
    }

    pub async fn level(
        &self,
        company_id: i32,
        name: &str,
        probability: f64,
        sort_order: i32,
    ) -> levels::Model {
        levels::ActiveModel {
            company_id: Set(company_id),
            name: Set(name.to_string()),
            description: Set(String::new()),
            probability: Set(probability),
            total_stock: Set(0),
            used_stock: Set(0),
            sort_order: Set(sort_order),
            is_active: Set(true),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .unwrap()
    }

    pub async fn deactivate_level(&self, id: i32) {
        let mut am = levels::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .unwrap()
            .unwrap()
            .into_active_model();
        am.is_active = Set(false);
        am.update(&self.conn).await.unwrap();
    }

    pub async fn prize(&self, level_id: i32, name: &str, total: i32, used: i32) -> prizes::Model {
        prizes::ActiveModel {
            level_id: Set(level_id),
            name: Set(name.to_string()),
            image: Set(String::new()),
            total_stock: Set(total),
            used_stock: Set(used),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .unwrap()
    }

    pub async fn reload_prize(&self, id: i32) -> prizes::Model {
        prizes::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn reload_user(&self, id: i32) -> users::Model {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn record_count(&self, company_id: i32) -> u64 {
        records::Entity::find()
            .filter(records::Column::CompanyId.eq(company_id))
            .count(&self.conn)
            .await
            .unwrap()
    }

    pub async fn records_for_user(&self, user_id: i32) -> u64 {
        records::Entity::find()
            .filter(records::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .unwrap()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            remove_db_files(path);
        }
    }
}

fn remove_db_files(path: &Path) {
    for suffix in ["", "-journal", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

pub fn phone_for(i: usize) -> String {
    format!("138{:08}", i)
}

/// 不落库的奖项等级
pub fn level_model(id: i32, probability: f64) -> levels::Model {
    levels::Model {
        id,
        company_id: 1,
        name: format!("Level {id}"),
        description: String::new(),
        probability,
        total_stock: 0,
        used_stock: 0,
        sort_order: id,
        is_active: true,
        created_at: None,
        updated_at: None,
    }
}

/// 不落库的奖品
pub fn prize_model(id: i32, level_id: i32, total: i32, used: i32) -> prizes::Model {
    prizes::Model {
        id,
        level_id,
        name: format!("Prize {id}"),
        image: String::new(),
        total_stock: total,
        used_stock: used,
        created_at: None,
        updated_at: None,
    }
}

/// 固定输出的随机源，用于边界测试
pub struct FixedRandom {
    value: f64,
    index: usize,
}

impl FixedRandom {
    pub fn new(value: f64, index: usize) -> Self {
        Self { value, index }
    }
}

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.value
    }

    fn next_below(&self, upper: usize) -> usize {
        self.index.min(upper - 1)
    }
}
