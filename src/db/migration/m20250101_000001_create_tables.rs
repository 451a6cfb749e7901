use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
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
                    .col(ColumnDef::new(Users::TgId).big_integer().null().unique_key())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(250)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::HashedPassword).string().not_null())
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Monitors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Monitors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Monitors::UserId).integer().not_null())
                    .col(ColumnDef::new(Monitors::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Monitors::Url).string_len(2048).not_null())
                    .col(
                        ColumnDef::new(Monitors::Method)
                            .string_len(10)
                            .not_null()
                            .default("GET")
                            .check(Expr::col(Monitors::Method).is_in([
                                "GET", "POST", "HEAD", "PUT", "DELETE",
                            ])),
                    )
                    .col(
                        ColumnDef::new(Monitors::ExpectedStatus)
                            .integer()
                            .not_null()
                            .default(200),
                    )
                    .col(
                        ColumnDef::new(Monitors::IntervalS)
                            .integer()
                            .not_null()
                            .default(60)
                            .check(Expr::col(Monitors::IntervalS).between(10, 86400)),
                    )
                    .col(
                        ColumnDef::new(Monitors::TimeoutMs)
                            .integer()
                            .not_null()
                            .default(2500)
                            .check(Expr::col(Monitors::TimeoutMs).between(100, 60000)),
                    )
                    .col(
                        ColumnDef::new(Monitors::IsPaused)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Monitors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_monitors_user_id")
                            .from(Monitors::Table, Monitors::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_monitor_user_url")
                    .table(Monitors::Table)
                    .col(Monitors::UserId)
                    .col(Monitors::Url)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uq_monitor_user_name")
                    .table(Monitors::Table)
                    .col(Monitors::UserId)
                    .col(Monitors::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ix_monitor_user_created")
                    .table(Monitors::Table)
                    .col(Monitors::UserId)
                    .col(Monitors::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Checks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Checks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Checks::MonitorId).integer().not_null())
                    .col(
                        ColumnDef::new(Checks::Ts)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Checks::LatencyMs)
                            .integer()
                            .not_null()
                            .check(Expr::col(Checks::LatencyMs).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Checks::StatusCode).integer().null().check(
                            Expr::col(Checks::StatusCode)
                                .is_null()
                                .or(Expr::col(Checks::StatusCode).between(100, 599)),
                        ),
                    )
                    .col(ColumnDef::new(Checks::Ok).boolean().not_null())
                    .col(ColumnDef::new(Checks::Error).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_checks_monitor_id")
                            .from(Checks::Table, Checks::MonitorId)
                            .to(Monitors::Table, Monitors::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ix_checks_monitor_ts")
                    .table(Checks::Table)
                    .col(Checks::MonitorId)
                    .col(Checks::Ts)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RequestLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RequestLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RequestLogs::Method).string_len(8).not_null())
                    .col(ColumnDef::new(RequestLogs::Path).string_len(512).not_null())
                    .col(ColumnDef::new(RequestLogs::Status).integer().not_null())
                    .col(ColumnDef::new(RequestLogs::LatencyMs).integer().not_null())
                    .col(ColumnDef::new(RequestLogs::Ip).string_len(64).null())
                    .col(
                        ColumnDef::new(RequestLogs::CreatedAt)
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
                    .name("ix_request_logs_created")
                    .table(RequestLogs::Table)
                    .col(RequestLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    TgId,
    Email,
    HashedPassword,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Monitors {
    Table,
    Id,
    UserId,
    Name,
    Url,
    Method,
    ExpectedStatus,
    IntervalS,
    TimeoutMs,
    IsPaused,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Checks {
    Table,
    Id,
    MonitorId,
    Ts,
    LatencyMs,
    StatusCode,
    Ok,
    Error,
}

#[derive(DeriveIden)]
enum RequestLogs {
    Table,
    Id,
    Method,
    Path,
    Status,
    LatencyMs,
    Ip,
    CreatedAt,
}
