use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::{MovieRecord, StoredMovie},
};

/// Where the display path reads curated records from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Looks a record up by identifier, falling back to its slug.
    async fn find_by_key(&self, key: &str) -> AppResult<Option<MovieRecord>>;
}

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.db.ping().await?;
        Ok(())
    }

    pub async fn find(&self, movie_id: &str) -> AppResult<Option<StoredMovie>> {
        let model = movie::Entity::find_by_id(movie_id.to_string()).one(&self.db).await?;
        model.map(from_model).transpose()
    }

    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<StoredMovie>> {
        let model = movie::Entity::find()
            .filter(movie::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;
        model.map(from_model).transpose()
    }

    /// Every record, newest first.
    pub async fn all(&self) -> AppResult<Vec<StoredMovie>> {
        movie::Entity::find()
            .order_by_desc(movie::Column::CreatedAt)
            .order_by_asc(movie::Column::MovieId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(from_model)
            .collect()
    }

    pub async fn create(&self, mut record: MovieRecord) -> AppResult<StoredMovie> {
        normalise_id(&mut record)?;
        record.strip_reserved();

        if self.find(&record.movie_id).await?.is_some() {
            return Err(AppError::Conflict("Movie with this ID already exists".to_string()));
        }

        let now = now_micros();
        movie::Entity::insert(to_active(&record, now, now)?).exec_without_returning(&self.db).await?;
        debug!(movie_id = %record.movie_id, "created movie");

        Ok(StoredMovie { record, created_at: now, updated_at: now })
    }

    /// Replaces the whole document; only the creation timestamp survives.
    pub async fn replace(&self, mut record: MovieRecord) -> AppResult<StoredMovie> {
        normalise_id(&mut record)?;
        record.strip_reserved();

        let Some(existing) = self.find(&record.movie_id).await? else {
            return Err(AppError::NotFound("Movie not found".to_string()));
        };

        let now = now_micros().max(existing.created_at);
        movie::Entity::update_many()
            .set(to_active(&record, existing.created_at, now)?)
            .filter(movie::Column::MovieId.eq(record.movie_id.as_str()))
            .exec(&self.db)
            .await?;
        debug!(movie_id = %record.movie_id, "replaced movie");

        Ok(StoredMovie { record, created_at: existing.created_at, updated_at: now })
    }

    pub async fn delete(&self, movie_id: &str) -> AppResult<StoredMovie> {
        let Some(existing) = self.find(movie_id).await? else {
            return Err(AppError::NotFound("Movie not found".to_string()));
        };
        movie::Entity::delete_by_id(movie_id.to_string()).exec(&self.db).await?;
        debug!(movie_id = %movie_id, "deleted movie");
        Ok(existing)
    }
}

#[async_trait]
impl RecordSource for MovieStore {
    async fn find_by_key(&self, key: &str) -> AppResult<Option<MovieRecord>> {
        if let Some(found) = self.find(key).await? {
            return Ok(Some(found.record));
        }
        Ok(self.find_by_slug(key).await?.map(|found| found.record))
    }
}

fn normalise_id(record: &mut MovieRecord) -> AppResult<()> {
    let trimmed = record.movie_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Movie ID (m_id) is required".to_string()));
    }
    if trimmed.len() != record.movie_id.len() {
        record.movie_id = trimmed.to_string();
    }
    if record.slug.as_deref().is_some_and(|s| s.trim().is_empty()) {
        record.slug = None;
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &Option<T>) -> AppResult<Option<Value>> {
    Ok(value.as_ref().map(serde_json::to_value).transpose()?)
}

fn to_active(record: &MovieRecord, created_at: i64, updated_at: i64) -> AppResult<movie::ActiveModel> {
    Ok(movie::ActiveModel {
        movie_id: Set(record.movie_id.clone()),
        slug: Set(record.slug.clone()),
        title: Set(record.title.clone()),
        poster: Set(record.poster.clone()),
        backdrop: Set(record.backdrop.clone()),
        release_date: Set(record.release_date.clone()),
        overview: Set(record.overview.clone()),
        rating: Set(record.rating),
        genre: Set(to_json(&record.genre)?),
        duration: Set(record.duration.map(|d| d as i32)),
        director: Set(record.director.clone()),
        total_collection: Set(record.total_collection.as_ref().map(|d| d.to_string())),
        budget: Set(record.budget.as_ref().map(|d| d.to_string())),
        advance_bookings: Set(record.advance_bookings.as_ref().map(|d| d.to_string())),
        language_wise: Set(to_json(&record.language_wise)?),
        country_wise: Set(to_json(&record.country_wise)?),
        day_wise: Set(to_json(&record.day_wise)?),
        occupancy: Set(to_json(&record.occupancy)?),
        tags: Set(serde_json::to_value(&record.tags)?),
        reviews: Set(serde_json::to_value(&record.reviews)?),
        popularity: Set(record.popularity),
        in_cinemas: Set(record.in_cinemas),
        is_hot_year: Set(record.is_hot_year),
        is_upcoming: Set(record.is_upcoming),
        carousel: Set(record.carousel),
        extra: Set(Value::Object(record.extra.clone())),
        created_at: Set(created_at),
        updated_at: Set(updated_at),
    })
}

fn decimal(raw: Option<String>) -> AppResult<Option<crate::decimal::DecimalString>> {
    raw.map(|s| crate::decimal::DecimalString::parse(&s))
        .transpose()
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("stored amount is corrupt")))
}

fn from_json<T: serde::de::DeserializeOwned>(value: Option<Value>) -> AppResult<Option<T>> {
    Ok(value.map(serde_json::from_value).transpose()?)
}

fn from_model(model: movie::Model) -> AppResult<StoredMovie> {
    let extra = match model.extra {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let record = MovieRecord {
        movie_id: model.movie_id,
        slug: model.slug,
        title: model.title,
        poster: model.poster,
        backdrop: model.backdrop,
        release_date: model.release_date,
        overview: model.overview,
        rating: model.rating,
        genre: from_json(model.genre)?,
        duration: model.duration.and_then(|d| u32::try_from(d).ok()),
        director: model.director,
        total_collection: decimal(model.total_collection)?,
        budget: decimal(model.budget)?,
        advance_bookings: decimal(model.advance_bookings)?,
        language_wise: from_json(model.language_wise)?,
        country_wise: from_json(model.country_wise)?,
        day_wise: from_json(model.day_wise)?,
        occupancy: from_json(model.occupancy)?,
        tags: serde_json::from_value(model.tags)?,
        reviews: serde_json::from_value(model.reviews)?,
        popularity: model.popularity,
        in_cinemas: model.in_cinemas,
        is_hot_year: model.is_hot_year,
        is_upcoming: model.is_upcoming,
        carousel: model.carousel,
        extra,
    };

    Ok(StoredMovie { record, created_at: model.created_at, updated_at: model.updated_at })
}

fn now_micros() -> i64 {
    jiff::Timestamp::now().as_microsecond()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        decimal::DecimalString,
        models::{CollectionEntry, Review},
    };

    fn record(id: &str) -> MovieRecord {
        MovieRecord { movie_id: id.to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn decimals_round_trip_exactly() {
        let store = MovieStore::new(db::memory().await);
        let mut input = record("998878");
        input.total_collection = Some(DecimalString::parse("123456789.50").unwrap());
        input.budget = Some(DecimalString::parse("99999999999999999999999").unwrap());
        input.day_wise = Some(vec![CollectionEntry {
            label: "Fri".into(),
            amount: DecimalString::parse("300000000.05").unwrap(),
        }]);
        store.create(input).await.unwrap();

        let found = store.find("998878").await.unwrap().unwrap().record;
        assert_eq!(found.total_collection.unwrap().as_str(), "123456789.50");
        assert_eq!(found.budget.unwrap().as_str(), "99999999999999999999999");
        assert_eq!(found.day_wise.unwrap()[0].amount.as_str(), "300000000.05");
        assert_eq!(found.advance_bookings, None);
    }

    #[tokio::test]
    async fn duplicate_create_conflicts_and_leaves_original() {
        let store = MovieStore::new(db::memory().await);
        let mut first = record("550");
        first.title = Some("Fight Club".into());
        store.create(first).await.unwrap();

        let mut second = record("550");
        second.title = Some("Impostor".into());
        let err = store.create(second).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let kept = store.find("550").await.unwrap().unwrap();
        assert_eq!(kept.record.title.as_deref(), Some("Fight Club"));
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let store = MovieStore::new(db::memory().await);
        let mut a = record("1");
        a.slug = Some("same-slug".into());
        let mut b = record("2");
        b.slug = Some("same-slug".into());
        store.create(a).await.unwrap();
        assert!(matches!(store.create(b).await.unwrap_err(), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn blank_slugs_do_not_collide() {
        let store = MovieStore::new(db::memory().await);
        let mut a = record("1");
        a.slug = Some("".into());
        store.create(a).await.unwrap();
        store.create(record("2")).await.unwrap();
        assert_eq!(store.all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = MovieStore::new(db::memory().await);
        assert!(store.find("nope").await.unwrap().is_none());
        assert!(matches!(store.replace(record("nope")).await.unwrap_err(), AppError::NotFound(_)));
        assert!(matches!(store.delete("nope").await.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn blank_id_is_rejected() {
        let store = MovieStore::new(db::memory().await);
        assert!(matches!(store.create(record("  ")).await.unwrap_err(), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn replace_drops_fields_not_resent() {
        let store = MovieStore::new(db::memory().await);
        let mut original = record("42");
        original.tags = vec!["Hit".into()];
        original.reviews = vec![Review { user: Some("a".into()), ..Default::default() }];
        original.language_wise = Some(vec![]);
        original.extra.insert("certificate".into(), Value::from("UA"));
        let created = store.create(original).await.unwrap();

        let mut replacement = record("42");
        replacement.is_upcoming = true;
        let updated = store.replace(replacement).await.unwrap();
        assert_eq!(updated.created_at, created.created_at);

        let found = store.find("42").await.unwrap().unwrap().record;
        assert!(found.is_upcoming);
        assert!(found.tags.is_empty());
        assert!(found.reviews.is_empty());
        assert_eq!(found.language_wise, None);
        assert!(found.extra.is_empty());
    }

    #[tokio::test]
    async fn extras_and_empty_tables_survive() {
        let store = MovieStore::new(db::memory().await);
        let mut input = record("7");
        input.country_wise = Some(vec![]);
        input.extra.insert("certificate".into(), Value::from("UA"));
        input.extra.insert("createdAt".into(), Value::from("ignored"));
        store.create(input).await.unwrap();

        let found = store.find("7").await.unwrap().unwrap().record;
        assert_eq!(found.country_wise, Some(vec![]));
        assert_eq!(found.extra.get("certificate"), Some(&Value::from("UA")));
        assert!(!found.extra.contains_key("createdAt"));
    }

    #[tokio::test]
    async fn lists_newest_first_and_deletes() {
        let store = MovieStore::new(db::memory().await);
        store.create(record("first")).await.unwrap();
        store.create(record("second")).await.unwrap();

        let ids: Vec<_> =
            store.all().await.unwrap().into_iter().map(|m| m.record.movie_id).collect();
        assert_eq!(ids, vec!["second", "first"]);

        store.delete("first").await.unwrap();
        assert!(store.find("first").await.unwrap().is_none());
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn key_lookup_falls_back_to_slug() {
        let store = MovieStore::new(db::memory().await);
        let mut input = record("tt0137523");
        input.slug = Some("fight-club-box-office-collection".into());
        store.create(input).await.unwrap();

        let by_id = store.find_by_key("tt0137523").await.unwrap();
        let by_slug = store.find_by_key("fight-club-box-office-collection").await.unwrap();
        assert_eq!(by_id, by_slug);
        assert!(store.find_by_key("other").await.unwrap().is_none());
    }
}
