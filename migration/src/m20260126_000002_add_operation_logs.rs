use sea_orm_migration::prelude::*;

/// 操作日志（审计）
#[derive(DeriveIden)]
enum OperationLogs {
    Table,
    Id,
    AdminId,
    CompanyId,
    Action,
    Resource,
    ResourceId,
    Details,
    IpAddress,
    UserAgent,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OperationLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OperationLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OperationLogs::AdminId).integer().not_null())
                    // NULL 表示超级管理员的跨公司操作
                    .col(ColumnDef::new(OperationLogs::CompanyId).integer().null())
                    .col(ColumnDef::new(OperationLogs::Action).string_len(50).not_null())
                    .col(
                        ColumnDef::new(OperationLogs::Resource)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(OperationLogs::ResourceId).integer().null())
                    .col(ColumnDef::new(OperationLogs::Details).text().not_null().default(""))
                    .col(
                        ColumnDef::new(OperationLogs::IpAddress)
                            .string_len(50)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(OperationLogs::UserAgent)
                            .string_len(500)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(OperationLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_operation_logs_admin")
                    .table(OperationLogs::Table)
                    .col(OperationLogs::AdminId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_operation_logs_company")
                    .table(OperationLogs::Table)
                    .col(OperationLogs::CompanyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(OperationLogs::Table)
                    .to_owned(),
            )
            .await
    }
}
