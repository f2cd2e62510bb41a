use jiff::Timestamp;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::OnConflict,
};
use tracing::{info, warn};

use crate::{
    db,
    entities::pokemon_movie,
    error::{AppError, AppResult},
    models::{LoadSummary, MovieRecord},
};

/// Handle over the `pokemon_movies` table.
pub struct MovieStore {
    db: DatabaseConnection,
}

/// Opens the store, upserts `records` in one transaction and closes it again.
/// An empty batch never touches the store.
pub async fn load(database_url: &str, records: &[MovieRecord]) -> AppResult<LoadSummary> {
    if records.is_empty() {
        info!("no movies to load");
        return Ok(LoadSummary::default());
    }

    info!(database_url = %database_url, "connecting to movie store");
    let store = MovieStore::open(database_url).await?;
    let summary = store.upsert(records).await?;
    let total = match store.count().await {
        Ok(total) => Some(total),
        Err(err) => {
            warn!(error = %err, "failed to count stored movies");
            None
        },
    };
    store.close().await;

    info!(
        processed = summary.processed,
        inserted = summary.inserted,
        updated = summary.updated,
        total = ?total,
        "processed records successfully"
    );
    Ok(summary)
}

impl MovieStore {
    pub async fn open(database_url: &str) -> AppResult<Self> {
        let db = db::connect_and_migrate(database_url).await?;
        Ok(Self { db })
    }

    #[cfg(test)]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn close(self) {
        if let Err(err) = self.db.close().await {
            warn!(error = %err, "failed to close movie store");
        }
    }

    pub async fn upsert(&self, records: &[MovieRecord]) -> AppResult<LoadSummary> {
        self.upsert_at(records, Timestamp::now()).await
    }

    /// Inserts new titles and refreshes `release_date`/`last_updated` of known
    /// ones. Either every record is written or none is.
    pub async fn upsert_at(
        &self,
        records: &[MovieRecord],
        now: Timestamp,
    ) -> AppResult<LoadSummary> {
        if records.is_empty() {
            return Ok(LoadSummary::default());
        }

        let stamp = format_timestamp(now);
        let txn = self.db.begin().await.map_err(AppError::StoreWrite)?;

        let (summary, new_titles) = match write_batch(&txn, records, &stamp).await {
            Ok(out) => out,
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                return Err(err);
            },
        };

        txn.commit().await.map_err(AppError::StoreWrite)?;

        for title in new_titles {
            info!(title = %title, "new movie");
        }
        Ok(summary)
    }

    /// Every stored row, oldest first.
    pub async fn movies(&self) -> AppResult<Vec<pokemon_movie::Model>> {
        pokemon_movie::Entity::find()
            .order_by_asc(pokemon_movie::Column::Id)
            .all(&self.db)
            .await
            .map_err(AppError::StoreRead)
    }

    pub async fn count(&self) -> AppResult<u64> {
        pokemon_movie::Entity::find().count(&self.db).await.map_err(AppError::StoreRead)
    }
}

async fn write_batch<'a>(
    txn: &DatabaseTransaction,
    records: &'a [MovieRecord],
    stamp: &str,
) -> AppResult<(LoadSummary, Vec<&'a str>)> {
    let mut summary = LoadSummary::default();
    let mut new_titles = Vec::new();

    for record in records {
        let existing = pokemon_movie::Entity::find()
            .filter(pokemon_movie::Column::Title.eq(record.title.as_str()))
            .one(txn)
            .await
            .map_err(AppError::StoreWrite)?;

        let model = pokemon_movie::ActiveModel {
            id: Default::default(),
            title: Set(record.title.clone()),
            release_date: Set(record.release_date.clone()),
            source_url: Set(record.source_url.clone()),
            last_updated: Set(stamp.to_string()),
        };

        pokemon_movie::Entity::insert(model)
            .on_conflict(
                OnConflict::column(pokemon_movie::Column::Title)
                    .update_columns([
                        pokemon_movie::Column::ReleaseDate,
                        pokemon_movie::Column::LastUpdated,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await
            .map_err(AppError::StoreWrite)?;

        summary.processed += 1;
        if existing.is_some() {
            summary.updated += 1;
        } else {
            summary.inserted += 1;
            new_titles.push(record.title.as_str());
        }
    }

    Ok((summary, new_titles))
}

/// UTC, in the shape SQLite's `CURRENT_TIMESTAMP` produces.
fn format_timestamp(ts: Timestamp) -> String {
    ts.strftime("%Y-%m-%d %H:%M:%S").to_string()
}
