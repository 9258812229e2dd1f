pub use sea_orm_migration::prelude::*;

mod m20260125_000001_create_lottery_tables;
mod m20260126_000002_add_operation_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260125_000001_create_lottery_tables::Migration),
            Box::new(m20260126_000002_add_operation_logs::Migration),
        ]
    }
}
