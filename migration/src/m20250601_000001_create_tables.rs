use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MovieCache::Table)
                    .if_not_exists()
                    .col(string(MovieCache::MovieName).primary_key())
                    .col(string_null(MovieCache::Link))
                    .col(string(MovieCache::TitleRu))
                    .col(string(MovieCache::TitleEn))
                    .col(string(MovieCache::DescriptionRu))
                    .col(string(MovieCache::DescriptionEn))
                    .col(string(MovieCache::GenresRu))
                    .col(string(MovieCache::GenresEn))
                    .col(double_null(MovieCache::Rating))
                    .col(integer_null(MovieCache::Year))
                    .col(big_integer(MovieCache::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SearchHistory::Table)
                    .if_not_exists()
                    .col(pk_auto(SearchHistory::Id))
                    .col(big_integer(SearchHistory::UserId))
                    .col(string(SearchHistory::Query))
                    .col(string(SearchHistory::MovieName))
                    .col(big_integer(SearchHistory::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_history_user_created")
                    .table(SearchHistory::Table)
                    .col(SearchHistory::UserId)
                    .col(SearchHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieStats::Table)
                    .if_not_exists()
                    .col(big_integer(MovieStats::UserId))
                    .col(string(MovieStats::MovieName))
                    .col(big_integer(MovieStats::Count))
                    .col(double_null(MovieStats::Rating))
                    .primary_key(
                        Index::create()
                            .col(MovieStats::UserId)
                            .col(MovieStats::MovieName),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(big_integer(Users::UserId).primary_key())
                    .col(string(Users::Lang))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieStats::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(SearchHistory::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieCache::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum MovieCache {
    Table,
    MovieName,
    Link,
    TitleRu,
    TitleEn,
    DescriptionRu,
    DescriptionEn,
    GenresRu,
    GenresEn,
    Rating,
    Year,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SearchHistory {
    Table,
    Id,
    UserId,
    Query,
    MovieName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MovieStats {
    Table,
    UserId,
    MovieName,
    Count,
    Rating,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    UserId,
    Lang,
}
