use tracing::{debug, warn};

use crate::{
    defaults::StaticDefaults,
    error::AppResult,
    identifier::{PathId, title_from_slug},
    merge::{ExternalBundle, MergeInput, merge},
    models::{Category, DisplayRecord},
    store::RecordSource,
    tmdb::{ImageUrls, MetadataSource},
};

/// Builds the display record for one detail-page request.
pub struct Resolver<'a> {
    pub records: &'a dyn RecordSource,
    pub metadata: &'a dyn MetadataSource,
    pub defaults: &'a StaticDefaults,
    pub images: &'a ImageUrls,
}

impl Resolver<'_> {
    /// Never fails because of TMDB: every upstream error degrades to an empty
    /// field group. Only record-store errors propagate.
    pub async fn resolve(&self, category: Category, raw_id: &str) -> AppResult<DisplayRecord> {
        let raw_id = raw_id.trim();
        let record = self.records.find_by_key(raw_id).await?;
        let fallback_title = title_from_slug(raw_id);

        let target = match record.as_ref().map(|r| PathId::classify(&r.movie_id)) {
            Some(curated) if curated.is_metadata_key() => curated,
            _ => PathId::classify(raw_id),
        };

        let external = match self.native_id(category, target).await {
            Some(id) => self.fetch_bundle(category, id).await,
            None => {
                debug!(id = %raw_id, "no usable TMDB id; skipping metadata calls");
                ExternalBundle::default()
            },
        };

        Ok(merge(
            MergeInput {
                category,
                display_id: raw_id,
                fallback_title: &fallback_title,
                record: record.as_ref(),
                external: &external,
            },
            self.defaults,
            self.images,
        ))
    }

    async fn native_id(&self, category: Category, target: PathId) -> Option<u64> {
        match target {
            PathId::Native(id) => Some(id),
            PathId::Alias(alias) => match self.metadata.find_alias(category, &alias).await {
                Ok(Some(id)) => {
                    debug!(alias = %alias, tmdb_id = id, "resolved IMDb id");
                    Some(id)
                },
                Ok(None) => {
                    warn!(alias = %alias, "IMDb id not known to TMDB");
                    None
                },
                Err(err) => {
                    warn!(alias = %alias, error = %err, "failed to resolve IMDb id");
                    None
                },
            },
            PathId::Slug(slug) => {
                let query = title_from_slug(&slug);
                if query.is_empty() {
                    return None;
                }
                match self.metadata.search(category, &query, 1).await {
                    Ok(page) => {
                        let hit = page.results.first().map(|h| h.id);
                        match hit {
                            Some(id) => debug!(query = %query, tmdb_id = id, "resolved slug via search"),
                            None => warn!(query = %query, "slug did not match any TMDB title"),
                        }
                        hit
                    },
                    Err(err) => {
                        warn!(query = %query, error = %err, "TMDB search failed");
                        None
                    },
                }
            },
        }
    }

    async fn fetch_bundle(&self, category: Category, id: u64) -> ExternalBundle {
        let (detail, credits, videos, reviews) = futures::join!(
            self.metadata.detail(category, id),
            self.metadata.credits(category, id),
            self.metadata.videos(category, id),
            self.metadata.reviews(category, id),
        );

        ExternalBundle {
            detail: absorb(detail, "detail", id).flatten(),
            credits: absorb(credits, "credits", id).unwrap_or_default(),
            videos: absorb(videos, "videos", id).unwrap_or_default(),
            reviews: absorb(reviews, "reviews", id).unwrap_or_default(),
        }
    }
}

fn absorb<T>(result: AppResult<T>, call: &'static str, tmdb_id: u64) -> Option<T> {
    result
        .map_err(|err| warn!(call, tmdb_id, error = %err, "TMDB call failed; using empty result"))
        .ok()
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{
        decimal::DecimalString,
        error::AppError,
        models::MovieRecord,
        tmdb::{Credits, ExternalReview, ListKind, SearchHit, SearchPage, TitleDetail, Video},
    };

    #[derive(Default)]
    struct FakeTmdb {
        search_hit: Option<u64>,
        alias: Option<u64>,
        alias_fails: bool,
        reviews_fail: bool,
        detail_calls: AtomicUsize,
        searches: Mutex<Vec<String>>,
        requested: Mutex<Vec<u64>>,
    }

    fn upstream_down() -> AppError {
        AppError::Internal(anyhow::anyhow!("upstream unavailable"))
    }

    #[async_trait]
    impl MetadataSource for FakeTmdb {
        async fn detail(&self, _: Category, id: u64) -> AppResult<Option<TitleDetail>> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(id);
            Ok(Some(TitleDetail {
                id,
                title: Some(format!("Title {id}")),
                ..Default::default()
            }))
        }

        async fn credits(&self, _: Category, _: u64) -> AppResult<Credits> {
            Ok(Credits::default())
        }

        async fn videos(&self, _: Category, _: u64) -> AppResult<Vec<Video>> {
            Ok(vec![])
        }

        async fn reviews(&self, _: Category, _: u64) -> AppResult<Vec<ExternalReview>> {
            if self.reviews_fail { Err(upstream_down()) } else { Ok(vec![]) }
        }

        async fn search(&self, _: Category, query: &str, _: u32) -> AppResult<SearchPage> {
            self.searches.lock().unwrap().push(query.to_string());
            let results = self
                .search_hit
                .map(|id| SearchHit {
                    id,
                    title: None,
                    name: None,
                    poster_path: None,
                    backdrop_path: None,
                    overview: None,
                    release_date: None,
                    first_air_date: None,
                    vote_average: None,
                    popularity: None,
                })
                .into_iter()
                .collect();
            Ok(SearchPage { results, ..Default::default() })
        }

        async fn find_alias(&self, _: Category, _: &str) -> AppResult<Option<u64>> {
            if self.alias_fails { Err(upstream_down()) } else { Ok(self.alias) }
        }

        async fn list(&self, _: ListKind, _: u32) -> AppResult<SearchPage> {
            Ok(SearchPage::default())
        }
    }

    struct Records(Vec<MovieRecord>);

    #[async_trait]
    impl RecordSource for Records {
        async fn find_by_key(&self, key: &str) -> AppResult<Option<MovieRecord>> {
            Ok(self
                .0
                .iter()
                .find(|r| r.movie_id == key || r.slug.as_deref() == Some(key))
                .cloned())
        }
    }

    async fn resolve(records: &Records, tmdb: &FakeTmdb, id: &str) -> DisplayRecord {
        let defaults = StaticDefaults::default();
        let images = ImageUrls::new("https://img.test");
        Resolver { records, metadata: tmdb, defaults: &defaults, images: &images }
            .resolve(Category::Movie, id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn unresolvable_slug_uses_fallbacks_without_metadata_calls() {
        let tmdb = FakeTmdb::default();
        let out = resolve(&Records(vec![]), &tmdb, "some-unknown-film-box-office-collection").await;

        assert_eq!(out.title, "Some Unknown Film");
        assert_eq!(out.id, "some-unknown-film-box-office-collection");
        assert_eq!(out.total_collection, StaticDefaults::default().total_collection);
        assert_eq!(tmdb.detail_calls.load(Ordering::SeqCst), 0);
        assert_eq!(*tmdb.searches.lock().unwrap(), vec!["Some Unknown Film".to_string()]);
    }

    #[tokio::test]
    async fn slug_search_hit_feeds_detail() {
        let tmdb = FakeTmdb { search_hit: Some(42), ..Default::default() };
        let out = resolve(&Records(vec![]), &tmdb, "border-2-box-office-collection").await;

        assert_eq!(out.title, "Title 42");
        assert_eq!(out.id, "42");
        assert_eq!(*tmdb.requested.lock().unwrap(), vec![42]);
    }

    #[tokio::test]
    async fn numeric_id_goes_straight_to_tmdb() {
        let tmdb = FakeTmdb::default();
        let out = resolve(&Records(vec![]), &tmdb, "550").await;
        assert_eq!(out.title, "Title 550");
        assert!(tmdb.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn alias_is_exchanged_before_detail() {
        let tmdb = FakeTmdb { alias: Some(550), ..Default::default() };
        let out = resolve(&Records(vec![]), &tmdb, "tt0137523").await;
        assert_eq!(out.id, "550");
        assert_eq!(*tmdb.requested.lock().unwrap(), vec![550]);
    }

    #[tokio::test]
    async fn failed_alias_lookup_skips_dependent_calls() {
        let tmdb = FakeTmdb { alias_fails: true, ..Default::default() };
        let out = resolve(&Records(vec![]), &tmdb, "tt0137523").await;

        assert_eq!(out.id, "tt0137523");
        assert_eq!(tmdb.detail_calls.load(Ordering::SeqCst), 0);
        assert!(out.cast.is_empty());
        assert!(out.reviews.is_empty());
    }

    #[tokio::test]
    async fn one_failed_group_does_not_sink_the_rest() {
        let tmdb = FakeTmdb { reviews_fail: true, ..Default::default() };
        let out = resolve(&Records(vec![]), &tmdb, "550").await;
        assert_eq!(out.title, "Title 550");
        assert!(out.reviews.is_empty());
    }

    #[tokio::test]
    async fn curated_record_found_by_slug_supplies_the_tmdb_id() {
        let record = MovieRecord {
            movie_id: "777".into(),
            slug: Some("my-film-box-office-collection".into()),
            total_collection: Some(DecimalString::parse("10.25").unwrap()),
            ..Default::default()
        };
        let tmdb = FakeTmdb::default();
        let out = resolve(&Records(vec![record]), &tmdb, "my-film-box-office-collection").await;

        assert!(tmdb.searches.lock().unwrap().is_empty());
        assert_eq!(*tmdb.requested.lock().unwrap(), vec![777]);
        assert_eq!(out.total_collection.as_str(), "10.25");
    }

    #[tokio::test]
    async fn store_backed_resolution() {
        let store = crate::store::MovieStore::new(crate::db::memory().await);
        store
            .create(MovieRecord {
                movie_id: "550".into(),
                day_wise: Some(vec![]),
                ..Default::default()
            })
            .await
            .unwrap();

        let defaults = StaticDefaults::default();
        let images = ImageUrls::new("https://img.test");
        let tmdb = FakeTmdb::default();
        let out = Resolver { records: &store, metadata: &tmdb, defaults: &defaults, images: &images }
            .resolve(Category::Movie, "550")
            .await
            .unwrap();

        assert!(out.day_wise.is_empty());
        assert!(!out.in_cinemas);
    }
}
