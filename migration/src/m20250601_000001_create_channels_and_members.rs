// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 频道、成员与屏蔽关系表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    /// 应用数据库迁移
    ///
    /// # 参数
    ///
    /// * `manager` - 数据库模式管理器
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 迁移成功
    /// * `Err(DbErr)` - 迁移失败
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. channels (no dependencies)
        manager
            .create_table(
                Table::create()
                    .table(Channels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Channels::ChannelId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Channels::Inviter).string().not_null())
                    .col(ColumnDef::new(Channels::ConnectionMode).string().not_null())
                    .col(ColumnDef::new(Channels::Interval).string().not_null())
                    .col(ColumnDef::new(Channels::Weekday).string().not_null())
                    .col(ColumnDef::new(Channels::Hour).integer().not_null())
                    .col(
                        ColumnDef::new(Channels::NextRound)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Channels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Channels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. members (depends on channels)
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Members::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Members::ChannelId).string().not_null())
                    .col(ColumnDef::new(Members::UserId).string().not_null())
                    .col(ColumnDef::new(Members::Gender).string().not_null())
                    .col(
                        ColumnDef::new(Members::HasGenderPreference)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Members::ConnectionMode).string().not_null())
                    .col(
                        ColumnDef::new(Members::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Members::Profile).json().not_null())
                    .col(
                        ColumnDef::new(Members::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Members::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_members_channel")
                            .from(Members::Table, Members::ChannelId)
                            .to(Channels::Table, Channels::ChannelId)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_members_channel_user")
                    .table(Members::Table)
                    .col(Members::ChannelId)
                    .col(Members::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 3. blocked_members (depends on channels)
        manager
            .create_table(
                Table::create()
                    .table(BlockedMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlockedMembers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlockedMembers::ChannelId).string().not_null())
                    .col(ColumnDef::new(BlockedMembers::UserId).string().not_null())
                    .col(ColumnDef::new(BlockedMembers::MemberId).string().not_null())
                    .col(
                        ColumnDef::new(BlockedMembers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blocked_members_channel")
                            .from(BlockedMembers::Table, BlockedMembers::ChannelId)
                            .to(Channels::Table, Channels::ChannelId)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_blocked_members_unique")
                    .table(BlockedMembers::Table)
                    .col(BlockedMembers::ChannelId)
                    .col(BlockedMembers::UserId)
                    .col(BlockedMembers::MemberId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlockedMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Channels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Channels {
    Table,
    ChannelId,
    Inviter,
    ConnectionMode,
    Interval,
    Weekday,
    Hour,
    NextRound,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Members {
    Table,
    Id,
    ChannelId,
    UserId,
    Gender,
    HasGenderPreference,
    ConnectionMode,
    IsActive,
    Profile,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BlockedMembers {
    Table,
    Id,
    ChannelId,
    UserId,
    MemberId,
    CreatedAt,
}
