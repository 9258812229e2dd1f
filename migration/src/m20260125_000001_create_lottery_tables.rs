use sea_orm_migration::prelude::*;

/// 公司（租户）
#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
    Code,
    Name,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// 参与抽奖的用户
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    CompanyId,
    Username,
    Name,
    Phone,
    HasDrawn,
    CreatedAt,
    UpdatedAt,
}

/// 奖项等级（一等奖、二等奖...）
#[derive(DeriveIden)]
enum PrizeLevels {
    Table,
    Id,
    CompanyId,
    Name,
    Description,
    Probability,
    TotalStock,
    UsedStock,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// 具体奖品（真正的库存单位）
#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    LevelId,
    Name,
    Image,
    TotalStock,
    UsedStock,
    CreatedAt,
    UpdatedAt,
}

/// 中奖记录（只追加）
#[derive(DeriveIden)]
enum DrawRecords {
    Table,
    Id,
    CompanyId,
    UserId,
    LevelId,
    PrizeId,
    Ip,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 说明:
/// - prize_levels.total_stock / used_stock 仅作展示，真实库存在 prizes 上
/// - draw_records.user_id 唯一索引：同一用户最多一条中奖记录
/// - 外键在建表时声明（SQLite 不支持对已有表追加外键）
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Companies::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Companies::Code).string_len(50).not_null())
                    .col(ColumnDef::new(Companies::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Companies::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Companies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Companies::UpdatedAt)
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
                    .name("idx_companies_code_unique")
                    .table(Companies::Table)
                    .col(Companies::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::CompanyId).integer().not_null())
                    .col(ColumnDef::new(Users::Username).string_len(100).not_null())
                    .col(ColumnDef::new(Users::Name).string_len(100).not_null().default(""))
                    .col(ColumnDef::new(Users::Phone).string_len(20).not_null().default(""))
                    .col(
                        ColumnDef::new(Users::HasDrawn)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_company")
                            .from(Users::Table, Users::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 候选池查询: company_id + has_drawn
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_company_has_drawn")
                    .table(Users::Table)
                    .col(Users::CompanyId)
                    .col(Users::HasDrawn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_phone")
                    .table(Users::Table)
                    .col(Users::Phone)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PrizeLevels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrizeLevels::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PrizeLevels::CompanyId).integer().not_null())
                    .col(ColumnDef::new(PrizeLevels::Name).string_len(50).not_null())
                    .col(
                        ColumnDef::new(PrizeLevels::Description)
                            .string_len(200)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PrizeLevels::Probability)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(PrizeLevels::TotalStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PrizeLevels::UsedStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PrizeLevels::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PrizeLevels::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PrizeLevels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PrizeLevels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prize_levels_company")
                            .from(PrizeLevels::Table, PrizeLevels::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prize_levels_company")
                    .table(PrizeLevels::Table)
                    .col(PrizeLevels::CompanyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prizes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prizes::LevelId).integer().not_null())
                    .col(ColumnDef::new(Prizes::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Prizes::Image).string_len(255).not_null().default(""))
                    .col(
                        ColumnDef::new(Prizes::TotalStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Prizes::UsedStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Prizes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Prizes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prizes_level")
                            .from(Prizes::Table, Prizes::LevelId)
                            .to(PrizeLevels::Table, PrizeLevels::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prizes_level")
                    .table(Prizes::Table)
                    .col(Prizes::LevelId)
                    .to_owned(),
            )
            .await?;

        // 中奖记录: 外键不级联删除，保证历史记录可回溯
        manager
            .create_table(
                Table::create()
                    .table(DrawRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrawRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DrawRecords::CompanyId).integer().not_null())
                    .col(ColumnDef::new(DrawRecords::UserId).integer().not_null())
                    .col(ColumnDef::new(DrawRecords::LevelId).integer().not_null())
                    .col(ColumnDef::new(DrawRecords::PrizeId).integer().not_null())
                    .col(ColumnDef::new(DrawRecords::Ip).string_len(50).not_null().default(""))
                    .col(
                        ColumnDef::new(DrawRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draw_records_company")
                            .from(DrawRecords::Table, DrawRecords::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draw_records_user")
                            .from(DrawRecords::Table, DrawRecords::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draw_records_level")
                            .from(DrawRecords::Table, DrawRecords::LevelId)
                            .to(PrizeLevels::Table, PrizeLevels::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draw_records_prize")
                            .from(DrawRecords::Table, DrawRecords::PrizeId)
                            .to(Prizes::Table, Prizes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_records_user_unique")
                    .table(DrawRecords::Table)
                    .col(DrawRecords::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_records_company_created")
                    .table(DrawRecords::Table)
                    .col(DrawRecords::CompanyId)
                    .col(DrawRecords::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：记录 -> 奖品 -> 等级 -> 用户 -> 公司
        manager
            .drop_table(Table::drop().if_exists().table(DrawRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(PrizeLevels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Companies::Table).to_owned())
            .await?;
        Ok(())
    }
}
