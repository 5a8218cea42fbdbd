use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(string_len(Movie::Title, 200))
                    .col(string_len(Movie::OriginalTitle, 200).default(""))
                    .col(text(Movie::Overview).default(""))
                    .col(string_len(Movie::ReleaseDate, 10))
                    .col(double(Movie::Revenue).default(0.0))
                    .col(double(Movie::Budget).default(0.0))
                    .col(integer(Movie::Runtime).default(0))
                    .col(string_len(Movie::Status, 50))
                    .col(double(Movie::VoteAverage).default(0.0))
                    .col(integer(Movie::VoteCount).default(0))
                    .col(string_len(Movie::OriginalLanguage, 50))
                    .col(integer(Movie::ProductionCompanyId))
                    .col(integer(Movie::GenreId))
                    .col(text(Movie::Languages).default(""))
                    .col(string_len(Movie::Homepage, 200).default(""))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_release_date")
                    .table(Movie::Table)
                    .col(Movie::ReleaseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_vote_average")
                    .table(Movie::Table)
                    .col(Movie::VoteAverage)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    Title,
    OriginalTitle,
    Overview,
    ReleaseDate,
    Revenue,
    Budget,
    Runtime,
    Status,
    VoteAverage,
    VoteCount,
    OriginalLanguage,
    ProductionCompanyId,
    GenreId,
    Languages,
    Homepage,
}
