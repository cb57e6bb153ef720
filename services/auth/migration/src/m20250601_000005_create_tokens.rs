use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [TokenTable::AccessTokens, TokenTable::RefreshTokens] {
            manager.create_table(token_table(table)).await?;
            manager
                .create_index(
                    Index::create()
                        .table(table)
                        .col(Tokens::UserId)
                        .name(format!("idx_{}_user_id", table.to_string()))
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [TokenTable::RefreshTokens, TokenTable::AccessTokens] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

/// Access and refresh tokens share one column layout.
fn token_table(table: TokenTable) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(Tokens::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Tokens::UserId).uuid().not_null())
        .col(ColumnDef::new(Tokens::Token).string().not_null().unique_key())
        .col(
            ColumnDef::new(Tokens::Status)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(
            ColumnDef::new(Tokens::ExpiresAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(Tokens::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .from(table, Tokens::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(Iden, Clone, Copy)]
enum TokenTable {
    AccessTokens,
    RefreshTokens,
}

#[derive(Iden)]
enum Tokens {
    Id,
    UserId,
    Token,
    Status,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
