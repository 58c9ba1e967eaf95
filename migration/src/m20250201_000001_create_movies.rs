use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(string(Movies::MovieId).primary_key())
                    .col(string_null(Movies::Slug).unique_key())
                    .col(string_null(Movies::Title))
                    .col(string_null(Movies::Poster))
                    .col(string_null(Movies::Backdrop))
                    .col(string_null(Movies::ReleaseDate))
                    .col(text_null(Movies::Overview))
                    .col(double_null(Movies::Rating))
                    .col(json_null(Movies::Genre))
                    .col(integer_null(Movies::Duration))
                    .col(string_null(Movies::Director))
                    // Money is kept as decimal text so nothing passes through a float.
                    .col(string_null(Movies::TotalCollection))
                    .col(string_null(Movies::Budget))
                    .col(string_null(Movies::AdvanceBookings))
                    .col(json_null(Movies::LanguageWise))
                    .col(json_null(Movies::CountryWise))
                    .col(json_null(Movies::DayWise))
                    .col(json_null(Movies::Occupancy))
                    .col(json(Movies::Tags))
                    .col(json(Movies::Reviews))
                    .col(double_null(Movies::Popularity))
                    .col(boolean(Movies::InCinemas).default(false))
                    .col(boolean(Movies::IsHotYear).default(false))
                    .col(boolean(Movies::IsUpcoming).default(false))
                    .col(boolean(Movies::Carousel).default(false))
                    .col(json(Movies::Extra))
                    .col(big_integer(Movies::CreatedAt))
                    .col(big_integer(Movies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_created_at")
                    .table(Movies::Table)
                    .col(Movies::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    MovieId,
    Slug,
    Title,
    Poster,
    Backdrop,
    ReleaseDate,
    Overview,
    Rating,
    Genre,
    Duration,
    Director,
    TotalCollection,
    Budget,
    AdvanceBookings,
    LanguageWise,
    CountryWise,
    DayWise,
    Occupancy,
    Tags,
    Reviews,
    Popularity,
    InCinemas,
    IsHotYear,
    IsUpcoming,
    Carousel,
    Extra,
    CreatedAt,
    UpdatedAt,
}
