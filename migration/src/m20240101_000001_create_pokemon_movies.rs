use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PokemonMovies::Table)
                    .if_not_exists()
                    .col(pk_auto(PokemonMovies::Id))
                    .col(text(PokemonMovies::Title).unique_key())
                    .col(text(PokemonMovies::ReleaseDate))
                    .col(text(PokemonMovies::SourceUrl))
                    .col(
                        ColumnDef::new(PokemonMovies::LastUpdated)
                            .custom(Alias::new("TIMESTAMP"))
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PokemonMovies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum PokemonMovies {
    Table,
    Id,
    Title,
    ReleaseDate,
    SourceUrl,
    LastUpdated,
}
